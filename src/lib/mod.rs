pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{invocation, lifecycle, normalizer, reconcile, registry};
pub use cli::Cli;
pub use config::ServerSettings;
pub use domain::{naming, types};
pub use infrastructure::{directory, rpc, server};

use application::lifecycle::{AgentServer, StartupError};
use config::{ConfigError, LogLevel, load_env_file};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Loads configuration, serves until shutdown, and maps the outcome to an exit code.
pub async fn run(cli: Cli) -> ExitCode {
    let env_file = load_env_file(cli.env_file.as_deref());
    let level = LogLevel::from_lookup(|name| std::env::var(name).ok());
    init_tracing(level);
    info!("Starting azure-agent-mcp");
    debug!(env_file = ?cli.env_file, ?level, "CLI arguments parsed");

    match start(env_file).await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn start(env_file: Result<(), ConfigError>) -> Result<(), StartupError> {
    env_file?;
    let settings = ServerSettings::from_env()?;
    let server = AgentServer::initialize(settings)?;
    server.run_until(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl-C; relying on the serving loop to end");
        std::future::pending::<()>().await;
    }
}

fn init_tracing(level: LogLevel) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level.filter_directive())
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

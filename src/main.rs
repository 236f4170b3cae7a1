use azure_agent_mcp::{Cli, run};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(cli));
    // stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_secs(1));
    code
}

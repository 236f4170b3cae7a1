//! Server lifecycle and the periodic agent sync

use crate::application::invocation::{InvocationClient, RetryPolicy};
use crate::application::reconcile::Reconciler;
use crate::application::registry::ToolRegistryAdapter;
use crate::config::{ConfigError, ServerSettings};
use crate::constants::SHUTDOWN_GRACE;
use crate::infrastructure::directory::{
    AgentDirectory, DirectoryError, FoundryClient, default_credential,
};
use crate::rpc::McpService;
use crate::server::{self, ServerError, ToolRouter};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create agent directory client: {0}")]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Uninitialized => "UNINITIALIZED",
            LifecycleState::Initialized => "INITIALIZED",
            LifecycleState::Running => "RUNNING",
            LifecycleState::ShuttingDown => "SHUTTING_DOWN",
            LifecycleState::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

fn transition(state: &mut LifecycleState, next: LifecycleState) {
    debug!(from = %state, to = %next, "Lifecycle transition");
    *state = next;
}

pub struct AgentServer {
    settings: ServerSettings,
    reconciler: Reconciler,
    service: Arc<McpService>,
    state: LifecycleState,
}

impl AgentServer {
    /// Builds the Foundry-backed server described by `settings`.
    pub fn initialize(settings: ServerSettings) -> Result<Self, StartupError> {
        let credential = default_credential(settings.access_token.as_deref());
        let client = FoundryClient::new(&settings.endpoint, &settings.api_version, credential)?;
        info!(endpoint = %settings.endpoint, "Agent directory client created");
        Ok(Self::new(settings, Arc::new(client)))
    }

    pub fn new(settings: ServerSettings, directory: Arc<dyn AgentDirectory>) -> Self {
        Self::with_policy(settings, directory, RetryPolicy::default())
    }

    pub fn with_policy(
        settings: ServerSettings,
        directory: Arc<dyn AgentDirectory>,
        policy: RetryPolicy,
    ) -> Self {
        let mut state = LifecycleState::Uninitialized;
        let router = Arc::new(ToolRouter::new());
        let invoker = Arc::new(InvocationClient::with_policy(directory.clone(), policy));
        let tools = ToolRegistryAdapter::new(router.clone(), invoker);
        let reconciler = Reconciler::new(directory, tools);
        let service = Arc::new(McpService::new(router));
        transition(&mut state, LifecycleState::Initialized);
        Self {
            settings,
            reconciler,
            service,
            state,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn service(&self) -> Arc<McpService> {
        self.service.clone()
    }

    /// Syncs once, then serves and syncs periodically until the serving loop
    /// ends or `shutdown` resolves. `shutdown` is also watched during the
    /// initial sync.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        let AgentServer {
            settings,
            mut reconciler,
            service,
            mut state,
        } = self;
        transition(&mut state, LifecycleState::Running);
        tokio::pin!(shutdown);

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown signal received during initial agent sync");
                transition(&mut state, LifecycleState::ShuttingDown);
                info!("Shutting down...");
                transition(&mut state, LifecycleState::Stopped);
                return Ok(());
            }
            agents = reconciler.reconcile() => info!(
                count = agents.len(),
                tools = reconciler.registry().len(),
                "Initial agent sync complete"
            ),
        }

        let sync_cancel = CancellationToken::new();
        let mut periodic = tokio::spawn(run_periodic(
            reconciler,
            settings.update_interval,
            sync_cancel.clone(),
        ));

        let serve_cancel = CancellationToken::new();
        info!(transport = %settings.transport, "Starting MCP server");
        let serving = server::serve(&settings.transport, service, serve_cancel.clone());
        tokio::pin!(serving);

        let outcome = tokio::select! {
            result = &mut serving => {
                match &result {
                    Ok(()) => info!("Serving loop ended"),
                    Err(err) => error!(error = %err, "Serving loop failed"),
                }
                result
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                serve_cancel.cancel();
                serving.await
            }
        };

        transition(&mut state, LifecycleState::ShuttingDown);
        sync_cancel.cancel();
        match timeout(SHUTDOWN_GRACE, &mut periodic).await {
            Ok(Ok(_)) => debug!("Periodic agent sync stopped"),
            Ok(Err(err)) => error!(error = %err, "Periodic agent sync task failed"),
            Err(_) => {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "Periodic agent sync did not stop in time; aborting"
                );
                periodic.abort();
            }
        }

        info!("Shutting down...");
        transition(&mut state, LifecycleState::Stopped);
        outcome.map_err(StartupError::from)
    }
}

/// Sleeps `interval`, reconciles, repeats until `cancel` fires.
///
/// A failing or panicking pass is logged and the loop continues. A pass in
/// progress is not interrupted; cancellation is observed between passes.
pub async fn run_periodic(
    mut reconciler: Reconciler,
    interval: Duration,
    cancel: CancellationToken,
) -> Reconciler {
    info!(interval_secs = interval.as_secs(), "Starting periodic agent sync");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Periodic agent sync cancelled");
                break;
            }
            _ = sleep(interval) => {}
        }

        debug!("Running periodic agent sync");
        match AssertUnwindSafe(reconciler.reconcile()).catch_unwind().await {
            Ok(agents) => debug!(count = agents.len(), "Periodic agent sync complete"),
            Err(_) => error!("Periodic agent sync panicked; will retry next interval"),
        }
    }
    reconciler
}

mod error;
mod router;
pub mod stdio;
pub mod tools;

pub use error::ServerError;
pub use router::{SESSION_HEADER, bind, serve_listener};
pub use tools::{ToolCallError, ToolDefinition, ToolHandler, ToolOutput, ToolRouter};

use crate::config::Transport;
use crate::rpc::McpService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs the serving loop for the configured transport until it ends or
/// `shutdown` is cancelled.
pub async fn serve(
    transport: &Transport,
    service: Arc<McpService>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    match transport {
        Transport::Local => stdio::serve(service, shutdown).await,
        Transport::Web(web) => {
            let listener = bind(&web.bind_address()).await?;
            serve_listener(listener, service, &web.path, shutdown).await
        }
    }
}

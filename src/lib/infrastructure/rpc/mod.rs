pub mod server;
pub mod types;

pub use server::{McpService, SUPPORTED_PROTOCOL_VERSIONS};
pub use types::{RpcNotification, RpcRequest, RpcResponse};

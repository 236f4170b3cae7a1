pub mod directory;
pub mod rpc;
pub mod server;

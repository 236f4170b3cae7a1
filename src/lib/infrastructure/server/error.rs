use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
    #[error("stdin/stdout I/O error: {0}")]
    Stdio(#[source] std::io::Error),
}

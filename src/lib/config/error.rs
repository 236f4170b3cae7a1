use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEndpoint { name: &'static str },

    #[error("invalid server type: {value}. Must be 'local' or 'web'.")]
    InvalidServerType { value: String },

    #[error("invalid value '{value}' for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("failed to load environment file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

use super::credential::CredentialError;
use reqwest::StatusCode;
use thiserror::Error;

/// How the invocation path reacts to a directory failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The agent can no longer be resolved; retrying cannot help.
    NotFound,
    /// Network or service-side failure worth retrying.
    Transient,
    /// Anything the server does not know how to interpret.
    Unexpected,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("resource '{resource}' was not found")]
    NotFound { resource: String },
    #[error("agent service returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("network error calling agent service: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode {context} from agent service: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("failed to build agent service client: {0}")]
    Client(String),
}

impl DirectoryError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    pub fn failure_class(&self) -> FailureClass {
        match self {
            DirectoryError::NotFound { .. } => FailureClass::NotFound,
            DirectoryError::Status { .. } | DirectoryError::Network { .. } => {
                FailureClass::Transient
            }
            DirectoryError::Decode { .. }
            | DirectoryError::Credential(_)
            | DirectoryError::Client(_) => FailureClass::Unexpected,
        }
    }
}

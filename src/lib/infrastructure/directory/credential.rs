//! Bearer token providers for the Foundry data plane

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const FOUNDRY_RESOURCE: &str = "https://ai.azure.com";

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("configured access token is empty")]
    EmptyToken,
    #[error("failed to launch Azure CLI: {source}")]
    CliUnavailable {
        #[source]
        source: std::io::Error,
    },
    #[error("Azure CLI exited with {status}: {stderr}")]
    CliFailed { status: String, stderr: String },
    #[error("Azure CLI returned invalid token JSON: {source}")]
    InvalidOutput {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now,
            None => true,
        }
    }
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<AccessToken, CredentialError>;
}

/// Token supplied through configuration.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken, CredentialError> {
        if self.token.trim().is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: None,
        })
    }
}

/// Delegates to `az account get-access-token`, caching the result.
pub struct AzureCliCredential {
    resource: String,
    cached: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

impl AzureCliCredential {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<AccessToken, CredentialError> {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        debug!(resource = %self.resource, "Requesting access token from Azure CLI");
        let output = Command::new(program)
            .args([
                "account",
                "get-access-token",
                "--resource",
                &self.resource,
                "--output",
                "json",
            ])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CredentialError::CliUnavailable { source })?;

        if !output.status.success() {
            return Err(CredentialError::CliFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_cli_token(&output.stdout)
    }
}

fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken, CredentialError> {
    let parsed: CliToken = serde_json::from_slice(stdout)
        .map_err(|source| CredentialError::InvalidOutput { source })?;
    if parsed.access_token.trim().is_empty() {
        return Err(CredentialError::EmptyToken);
    }
    Ok(AccessToken {
        token: parsed.access_token,
        expires_at: parsed
            .expires_on
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn token(&self) -> Result<AccessToken, CredentialError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.clone());
        }
        let token = self.fetch().await?;
        info!(expires_at = ?token.expires_at, "Obtained access token from Azure CLI");
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Static token when one is configured, otherwise the Azure CLI.
pub fn default_credential(static_token: Option<&str>) -> Arc<dyn TokenCredential> {
    match static_token {
        Some(token) => Arc::new(StaticTokenCredential::new(token)),
        None => Arc::new(AzureCliCredential::new(FOUNDRY_RESOURCE)),
    }
}

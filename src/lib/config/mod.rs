pub mod error;
pub mod loader;
pub mod logging;
pub mod server;

pub use error::ConfigError;
pub use loader::load_env_file;
pub use logging::LogLevel;
pub use server::{ServerMode, Transport, WebConfig};

use std::time::Duration;

/// Validated runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub endpoint: String,
    pub api_version: String,
    pub access_token: Option<String>,
    pub update_interval: Duration,
    pub transport: Transport,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        loader::from_lookup(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_API_VERSION;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<ServerSettings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerSettings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn requires_endpoint() {
        assert!(matches!(
            settings(&[]),
            Err(ConfigError::MissingEndpoint { .. })
        ));
        assert!(matches!(
            settings(&[("PROJECT_ENDPOINT", "   ")]),
            Err(ConfigError::MissingEndpoint { .. })
        ));
    }

    #[test]
    fn applies_defaults() {
        let config = settings(&[("PROJECT_ENDPOINT", " https://demo.services.ai.azure.com/api/projects/p ")])
            .expect("settings");
        assert_eq!(
            config.endpoint,
            "https://demo.services.ai.azure.com/api/projects/p"
        );
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert_eq!(config.transport, Transport::Local);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn reads_web_transport() {
        let config = settings(&[
            ("PROJECT_ENDPOINT", "https://demo"),
            ("SERVER_TYPE", "WEB"),
            ("SERVER_PORT", "9100"),
            ("SERVER_PATH", "mcp"),
            ("UPDATE_INTERVAL", "60"),
            ("LOG_LEVEL", "info"),
        ])
        .expect("settings");
        assert_eq!(
            config.transport,
            Transport::Web(WebConfig {
                host: "0.0.0.0".to_string(),
                port: 9100,
                path: "/mcp".to_string(),
            })
        );
        assert_eq!(config.update_interval, Duration::from_secs(60));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            settings(&[("PROJECT_ENDPOINT", "https://demo"), ("SERVER_TYPE", "grpc")]),
            Err(ConfigError::InvalidServerType { .. })
        ));
        assert!(matches!(
            settings(&[("PROJECT_ENDPOINT", "https://demo"), ("UPDATE_INTERVAL", "soon")]),
            Err(ConfigError::InvalidNumber { name: "UPDATE_INTERVAL", .. })
        ));
        assert!(matches!(
            settings(&[("PROJECT_ENDPOINT", "https://demo"), ("UPDATE_INTERVAL", "0")]),
            Err(ConfigError::ZeroInterval { .. })
        ));
        assert!(matches!(
            settings(&[
                ("PROJECT_ENDPOINT", "https://demo"),
                ("SERVER_TYPE", "web"),
                ("SERVER_PORT", "70000"),
            ]),
            Err(ConfigError::InvalidNumber { name: "SERVER_PORT", .. })
        ));
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.env");
        assert!(matches!(
            load_env_file(Some(&missing)),
            Err(ConfigError::EnvFile { .. })
        ));
    }
}

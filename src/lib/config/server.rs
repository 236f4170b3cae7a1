use super::error::ConfigError;
use std::fmt;

/// Transport the MCP server listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Local,
    /// JSON-RPC over HTTP POST
    Web(WebConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl WebConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Route paths always start with a single slash.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches('/');
    format!("/{trimmed}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Local,
    Web,
}

impl ServerMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ServerMode::Local),
            "web" => Ok(ServerMode::Web),
            _ => Err(ConfigError::InvalidServerType {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Local => write!(f, "local"),
            Transport::Web(web) => write!(f, "web ({}{})", web.bind_address(), web.path),
        }
    }
}

//! Application constants
//!
//! Single source of truth for environment variable names and defaults.

use std::time::Duration;

pub const ENV_PROJECT_ENDPOINT: &str = "PROJECT_ENDPOINT";
pub const ENV_PROJECT_API_VERSION: &str = "PROJECT_API_VERSION";
pub const ENV_ACCESS_TOKEN: &str = "AZURE_AI_ACCESS_TOKEN";
pub const ENV_UPDATE_INTERVAL: &str = "UPDATE_INTERVAL";
pub const ENV_SERVER_TYPE: &str = "SERVER_TYPE";
pub const ENV_SERVER_HOST: &str = "SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "SERVER_PORT";
pub const ENV_SERVER_PATH: &str = "SERVER_PATH";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Default environment file path
pub const ENV_PATH: &str = ".env";

pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PATH: &str = "/";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// How long shutdown waits for the periodic task before aborting it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Name reported to MCP clients during `initialize`.
pub const SERVER_NAME: &str = "azure-agent";
pub const LOG_TARGET: &str = "azure_agent_mcp";

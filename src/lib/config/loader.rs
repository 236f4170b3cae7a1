use super::error::ConfigError;
use super::server::{ServerMode, Transport, WebConfig, normalize_path};
use super::ServerSettings;
use crate::constants::*;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Loads an environment file into the process environment.
///
/// The default `.env` is optional; an explicitly requested file must exist.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|_| ())
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => match dotenvy::from_filename(ENV_PATH) {
            Ok(_) => Ok(()),
            Err(err) if err.not_found() => Ok(()),
            Err(source) => Err(ConfigError::EnvFile {
                path: ENV_PATH.into(),
                source,
            }),
        },
    }
}

pub(super) fn from_lookup<F>(lookup: F) -> Result<ServerSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = match lookup(ENV_SERVER_TYPE) {
        Some(value) => ServerMode::parse(&value)?,
        None => ServerMode::Local,
    };

    let endpoint = lookup(ENV_PROJECT_ENDPOINT)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEndpoint {
            name: ENV_PROJECT_ENDPOINT,
        })?;

    let interval_secs: u64 = parse_number(&lookup, ENV_UPDATE_INTERVAL, DEFAULT_UPDATE_INTERVAL_SECS)?;
    if interval_secs == 0 {
        return Err(ConfigError::ZeroInterval {
            name: ENV_UPDATE_INTERVAL,
        });
    }

    let transport = match mode {
        ServerMode::Local => Transport::Local,
        ServerMode::Web => Transport::Web(WebConfig {
            host: non_empty(lookup(ENV_SERVER_HOST)).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number(&lookup, ENV_SERVER_PORT, DEFAULT_PORT)?,
            path: normalize_path(
                &non_empty(lookup(ENV_SERVER_PATH)).unwrap_or_else(|| DEFAULT_PATH.to_string()),
            ),
        }),
    };

    let settings = ServerSettings {
        endpoint,
        api_version: non_empty(lookup(ENV_PROJECT_API_VERSION))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        access_token: non_empty(lookup(ENV_ACCESS_TOKEN)),
        update_interval: Duration::from_secs(interval_secs),
        transport,
    };
    debug!(
        endpoint = %settings.endpoint,
        transport = %settings.transport,
        interval_secs,
        "Configuration loaded from environment"
    );
    Ok(settings)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = std::num::ParseIntError>,
{
    match non_empty(lookup(name)) {
        Some(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { name, value, source }),
        None => Ok(default),
    }
}

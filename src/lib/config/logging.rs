use crate::constants::{ENV_LOG_LEVEL, LOG_TARGET};

/// Levels accepted in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Critical,
    Error,
    #[default]
    Warning,
    Info,
    Debug,
    NotSet,
}

impl LogLevel {
    /// Reads `LOG_LEVEL`; this is the only place the variable is parsed.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::parse_lenient(lookup(ENV_LOG_LEVEL).as_deref())
    }

    /// Unknown values fall back to the default instead of failing startup.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
            Some("CRITICAL") => LogLevel::Critical,
            Some("ERROR") => LogLevel::Error,
            Some("WARNING") => LogLevel::Warning,
            Some("INFO") => LogLevel::Info,
            Some("DEBUG") => LogLevel::Debug,
            Some("NOTSET") => LogLevel::NotSet,
            _ => LogLevel::default(),
        }
    }

    /// Filter directive: dependencies at `warn`, this crate at the chosen level.
    pub fn filter_directive(self) -> String {
        let level = match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning | LogLevel::NotSet => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        format!("warn,{LOG_TARGET}={level}")
    }
}

//! # Service Configuration
//!
//! Read once from the environment at startup.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `PORT` | `8080` | listen port |
//! | `TCE_RULES_PATH` | bundled standard rules | rule document (`.json`, `.yaml`, `.yml`) |
//! | `DATABASE_URL` | unset (in-memory) | Postgres connection string |
//! | `TCE_RECORD_WARNING_ALERTS` | `false` | persist alerts for warning rules too |
//! | `TCE_LOG_JSON` | `false` | JSON log lines instead of text |

use std::path::PathBuf;

use thiserror::Error;

/// Runtime configuration of the API service.
#[derive(Clone, Default)]
pub struct ApiConfig {
    pub port: u16,
    pub rules_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub record_warning_alerts: bool,
    pub log_json: bool,
}

/// Never prints the connection string, which may carry credentials.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("port", &self.port)
            .field("rules_path", &self.rules_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("record_warning_alerts", &self.record_warning_alerts)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}: expected an integer between 0 and 65535")]
    InvalidPort(String),

    #[error("invalid boolean {value:?} for {var}: expected true/false, 1/0 or yes/no")]
    InvalidFlag { var: &'static str, value: String },
}

impl ApiConfig {
    /// Build the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unparsable value.
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 8080,
        };

        Ok(Self {
            port,
            rules_path: non_empty(lookup("TCE_RULES_PATH")).map(PathBuf::from),
            database_url: non_empty(lookup("DATABASE_URL")),
            record_warning_alerts: flag(
                "TCE_RECORD_WARNING_ALERTS",
                lookup("TCE_RECORD_WARNING_ALERTS"),
            )?,
            log_json: flag("TCE_LOG_JSON", lookup("TCE_LOG_JSON"))?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn flag(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = non_empty(value) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { var, value: raw }),
    }
}

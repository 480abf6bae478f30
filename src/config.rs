//! Environment-driven configuration, read once at process start.
//! Mirrors the deployment contract: the HTTP port, the database folder and the
//! token signing secret all arrive via `BLOGLIST_*` variables, and a missing
//! signing secret is a fatal startup condition.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BLOGLIST_SECRET is not set; refusing to start without a token signing secret")]
    MissingSecret,
    #[error("unrecognized BLOGLIST_ENV value: '{0}'")]
    UnknownMode(String),
    #[error("BLOGLIST_HTTP_PORT must be a port number: {0}")]
    BadPort(std::num::ParseIntError),
    #[error("BLOGLIST_TOKEN_TTL_SECS must be an integer number of seconds: {0}")]
    BadTokenTtl(std::num::ParseIntError),
}

/// Execution mode. Gates startup seeding and the `/api/testing` routes: the
/// testing router is only ever mounted for `Development` and `Test`, decided
/// once when the router is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
    Test,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "production" => Some(Mode::Production),
            "development" => Some(Mode::Development),
            "test" => Some(Mode::Test),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
            Mode::Test => "test",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// Root folder for the JSON snapshot store.
    pub db_root: String,
    /// HMAC secret for session tokens. Required; never logged.
    pub token_secret: String,
    /// Optional token lifetime. When unset, tokens carry no expiry and stay
    /// valid until the secret rotates.
    pub token_ttl: Option<Duration>,
    pub mode: Mode,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let mode = match std::env::var("BLOGLIST_ENV") {
            Ok(v) => Mode::parse(&v).ok_or(ConfigError::UnknownMode(v))?,
            Err(_) => Mode::Development,
        };
        let http_port: u16 = std::env::var("BLOGLIST_HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(ConfigError::BadPort)?;
        let db_root = std::env::var("BLOGLIST_DB_FOLDER").unwrap_or_else(|_| "data".to_string());
        let token_secret = match std::env::var("BLOGLIST_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => return Err(ConfigError::MissingSecret),
        };
        let token_ttl = match std::env::var("BLOGLIST_TOKEN_TTL_SECS") {
            Ok(v) => {
                let secs: u64 = v.parse().map_err(ConfigError::BadTokenTtl)?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };
        Ok(Config { http_port, db_root, token_secret, token_ttl, mode })
    }
}

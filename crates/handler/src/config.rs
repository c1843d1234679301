use anyhow::Context;
use thiserror::Error;

/// External id used when a request arrives without the user id header.
///
/// Requests lacking identity headers are served as this user instead of
/// being rejected, so the app keeps working outside the platform shell.
pub const FALLBACK_EXTERNAL_USER_ID: i64 = 123_456_789;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL not configured")]
    MissingDatabaseUrl,

    #[error("VK_FALLBACK_USER_ID must be an integer, got {0:?}")]
    InvalidFallbackUserId(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absence is reported per request, not at start-up.
    pub database_url: Option<String>,
    pub fallback_user_id: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let fallback_user_id = match var("VK_FALLBACK_USER_ID") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidFallbackUserId(raw))?,
            None => FALLBACK_EXTERNAL_USER_ID,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").filter(|url| !url.is_empty()),
            fallback_user_id,
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Bind address of the local development server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(port) => port.parse().context("PORT must be a number")?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// src/config.rs

use std::env;
use std::fmt;

/// Default token lifetime: 30 minutes.
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 1800;

pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Origins of the local frontend dev server.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Weekly hours used by the study-plan suggestion when the client does not send one.
pub const DEFAULT_WEEKLY_HOURS: i64 = 20;

/// Number of questions returned by an empty search.
pub const SEARCH_DEFAULT_LIMIT: i64 = 50;

/// Number of questions returned by an enunciado search inside `count-filtered`.
pub const SEARCH_PREVIEW_LIMIT: i64 = 5;

pub const LIST_DEFAULT_LIMIT: i64 = 100;
pub const LIST_MAX_LIMIT: i64 = 500;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, built once in `main` and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match lookup("JWT_EXPIRATION") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "JWT_EXPIRATION",
                value: raw.clone(),
            })?,
            None => DEFAULT_JWT_EXPIRATION_SECS,
        };

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_SERVER_PORT,
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let cors_origins = parse_origins(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        );

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
            cors_origins,
            admin_username: lookup("ADMIN_USERNAME").filter(|v| !v.is_empty()),
            admin_password: lookup("ADMIN_PASSWORD").filter(|v| !v.is_empty()),
            admin_email: lookup("ADMIN_EMAIL").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_absent() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.jwt_expiration, DEFAULT_JWT_EXPIRATION_SECS);
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.admin_username.is_none());
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_PORT", .. }));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" http://a.com , ,http://b.com"),
            vec!["http://a.com".to_string(), "http://b.com".to_string()]
        );
    }
}

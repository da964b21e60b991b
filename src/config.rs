use std::env;

use derive_more::Display;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Where notifications are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "missing required env variable '{}'", _0)]
    Missing(&'static str),

    #[display(fmt = "invalid value '{}' for env variable '{}'", _1, _0)]
    Invalid(&'static str, String),
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub token_ttl_secs: i64,
    pub notifications: NotificationBackend,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let host = lookup("BETHERE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("BETHERE_PORT", lookup("BETHERE_PORT"), DEFAULT_PORT)?;
        let max_connections = parse_or(
            "BETHERE_MAX_CONNECTIONS",
            lookup("BETHERE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let token_ttl_secs = parse_or(
            "BETHERE_TOKEN_TTL_SECS",
            lookup("BETHERE_TOKEN_TTL_SECS"),
            DEFAULT_TOKEN_TTL_SECS,
        )?;
        let notifications = match lookup("BETHERE_NOTIFICATIONS").as_deref() {
            None | Some("postgres") => NotificationBackend::Postgres,
            Some("memory") => NotificationBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid("BETHERE_NOTIFICATIONS", other.to_string()))
            }
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            max_connections,
            token_ttl_secs,
            notifications,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key, v)),
    }
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
    fn defaults_apply_when_only_required_values_are_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/bethere"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.token_ttl_secs, 86_400);
        assert_eq!(config.notifications, NotificationBackend::Postgres);
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "  "), ("JWT_SECRET", "s")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("BETHERE_PORT", "9000"),
            ("BETHERE_NOTIFICATIONS", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.notifications, NotificationBackend::Memory);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("BETHERE_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("BETHERE_PORT", "eighty".to_string()));
    }

    #[test]
    fn unknown_notification_backend_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("BETHERE_NOTIFICATIONS", "redis"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("BETHERE_NOTIFICATIONS", "redis".to_string()));
    }
}

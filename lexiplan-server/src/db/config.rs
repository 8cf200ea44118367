//! Database configuration from environment variables
//!
//! | variable                | required | fallback |
//! |-------------------------|----------|----------|
//! | `DB_HOST`               | yes      |          |
//! | `DB_PORT`               | no       | 5432     |
//! | `DB_USER`               | yes      |          |
//! | `DB_PASSWORD`           | no       | empty    |
//! | `DB_NAME`               | yes      |          |
//! | `DB_CONNECTION_LIMIT`   | no       | 10       |
//! | `DB_CONNECT_TIMEOUT_MS` | no       | 10000    |
//! | `DB_ACQUIRE_TIMEOUT_MS` | no       | 10000    |
//! | `DB_QUERY_RETRIES`      | no       | 2        |
//! | `DB_RETRY_DELAY_MS`     | no       | 200      |

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use super::executor::RetryPolicy;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECTION_LIMIT: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 10_000;

/// Configuration error, reported at startup
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Connection settings for the PostgreSQL pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Maximum connections per pool
    pub connection_limit: u32,
    /// Upper bound for establishing a pool
    pub connect_timeout: Duration,
    /// Upper bound for checking a connection out of the pool
    pub acquire_timeout: Duration,
    /// Retry policy for the query executor
    pub retry: RetryPolicy,
}

impl DatabaseConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let defaults = RetryPolicy::default();
        Ok(Self {
            host: required("DB_HOST")?,
            port: parse_or(&lookup, "DB_PORT", DEFAULT_PORT)?,
            user: required("DB_USER")?,
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: required("DB_NAME")?,
            connection_limit: parse_or(&lookup, "DB_CONNECTION_LIMIT", DEFAULT_CONNECTION_LIMIT)?,
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT_MS,
            )?),
            acquire_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_MS",
                DEFAULT_ACQUIRE_TIMEOUT_MS,
            )?),
            retry: RetryPolicy {
                retries: parse_or(&lookup, "DB_QUERY_RETRIES", defaults.retries)?,
                retry_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "DB_RETRY_DELAY_MS",
                    defaults.retry_delay.as_millis() as u64,
                )?),
            },
        })
    }

    /// sqlx connect options for this configuration.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .application_name("lexiplan")
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DB_HOST", "db.internal"),
        ("DB_USER", "lexi"),
        ("DB_NAME", "lexiplan"),
    ];

    #[test]
    fn fallbacks_apply() {
        let config = DatabaseConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5432);
        assert_eq!(config.password, "");
        assert_eq!(config.connection_limit, 10);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.retries, 2);
        assert_eq!(config.retry.retry_delay, Duration::from_millis(200));
    }

    #[test]
    fn overrides_apply() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("DB_PORT", "6543"),
            ("DB_PASSWORD", "secret"),
            ("DB_CONNECTION_LIMIT", "4"),
            ("DB_ACQUIRE_TIMEOUT_MS", "250"),
            ("DB_QUERY_RETRIES", "5"),
        ]);
        let config = DatabaseConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 6543);
        assert_eq!(config.password, "secret");
        assert_eq!(config.connection_limit, 4);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
        assert_eq!(config.retry.retries, 5);
    }

    #[test]
    fn missing_required() {
        let err = DatabaseConfig::from_lookup(lookup(&[("DB_HOST", "x"), ("DB_USER", "u")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DB_NAME"));
    }

    #[test]
    fn blank_required_counts_as_missing() {
        let err = DatabaseConfig::from_lookup(lookup(&[
            ("DB_HOST", "  "),
            ("DB_USER", "u"),
            ("DB_NAME", "n"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DB_HOST"));
    }

    #[test]
    fn invalid_number() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_PORT", "fifty"));
        let err = DatabaseConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DB_PORT", .. }));
    }
}

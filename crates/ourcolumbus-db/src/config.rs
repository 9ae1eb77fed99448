//! Database configuration loaded from the environment.
//!
//! Two credential tiers are required: a privileged URL used for writes,
//! dedup lookups and retention, and a read-only URL used by the query
//! engine. Enforcing the read-only boundary is the backend's job; this
//! layer only keeps the two pools apart.

use std::time::Duration;

use crate::error::DbError;
use crate::postgres::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS, PostgresConfig};

/// Privileged (read/write) connection URL.
pub const SERVICE_URL_VAR: &str = "DATABASE_SERVICE_URL";

/// Read-only connection URL.
pub const READONLY_URL_VAR: &str = "DATABASE_READONLY_URL";

/// Configuration for both connection pools.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Pool used by the store, dedup resolver and retention sweeper.
    pub service: PostgresConfig,
    /// Pool used by the query engine.
    pub reader: PostgresConfig,
    /// Budget applied to every individual backend call.
    pub query_timeout: Duration,
}

impl DatabaseConfig {
    /// Build a configuration from explicit URLs with default pool settings.
    pub fn new(service_url: &str, reader_url: &str) -> Self {
        Self {
            service: PostgresConfig::new(service_url),
            reader: PostgresConfig::new(reader_url),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DATABASE_SERVICE_URL` -- privileged connection string
    /// - `DATABASE_READONLY_URL` -- read-only connection string
    ///
    /// Optional variables:
    /// - `DATABASE_MAX_CONNECTIONS` -- pool size for each pool (default 10)
    /// - `DATABASE_CONNECT_TIMEOUT_SECS` -- pool acquire timeout (default 5)
    /// - `DATABASE_IDLE_TIMEOUT_SECS` -- idle connection lifetime (default 300)
    /// - `DATABASE_QUERY_TIMEOUT_SECS` -- per-call budget (default 30)
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] naming every missing credential, or the
    /// first optional variable that fails to parse.
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`DatabaseConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_url = lookup(SERVICE_URL_VAR).filter(|v| !v.trim().is_empty());
        let reader_url = lookup(READONLY_URL_VAR).filter(|v| !v.trim().is_empty());

        let (service_url, reader_url) = match (service_url, reader_url) {
            (Some(service), Some(reader)) => (service, reader),
            (service, reader) => {
                let missing: Vec<&str> = [(SERVICE_URL_VAR, service), (READONLY_URL_VAR, reader)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect();
                return Err(DbError::Config(format!(
                    "missing required environment variables: {}",
                    missing.join(", ")
                )));
            }
        };

        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let connect_timeout_secs: u64 = parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5)?;
        let idle_timeout_secs: u64 =
            parse_or(&lookup, "DATABASE_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?;
        let query_timeout_secs: u64 =
            parse_or(&lookup, "DATABASE_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;

        let connect_timeout = Duration::from_secs(connect_timeout_secs);
        let idle_timeout = Duration::from_secs(idle_timeout_secs);

        Ok(Self {
            service: PostgresConfig::new(&service_url)
                .with_max_connections(max_connections)
                .with_connect_timeout(connect_timeout)
                .with_idle_timeout(idle_timeout),
            reader: PostgresConfig::new(&reader_url)
                .with_max_connections(max_connections)
                .with_connect_timeout(connect_timeout)
                .with_idle_timeout(idle_timeout),
            query_timeout: Duration::from_secs(query_timeout_secs),
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, DbError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DbError::Config(format!("invalid {name}: {e}"))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn both_credentials_required() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[])).err();
        let message = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("DATABASE_SERVICE_URL"));
        assert!(message.contains("DATABASE_READONLY_URL"));
    }

    #[test]
    fn missing_reader_is_reported_alone() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[(
            SERVICE_URL_VAR,
            "postgresql://svc@db/reports",
        )]))
        .err();
        let message = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("DATABASE_READONLY_URL"));
        assert!(!message.contains("DATABASE_SERVICE_URL"));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let result = DatabaseConfig::from_lookup(lookup_from(&[
            (SERVICE_URL_VAR, "  "),
            (READONLY_URL_VAR, "postgresql://anon@db/reports"),
        ]));
        assert!(matches!(result, Err(DbError::Config(_))));
    }

    #[test]
    fn defaults_apply_to_optional_vars() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (SERVICE_URL_VAR, "postgresql://svc@db/reports"),
            (READONLY_URL_VAR, "postgresql://anon@db/reports"),
        ]));
        let Ok(config) = config else {
            panic!("expected a valid config");
        };
        assert_eq!(config.service.url, "postgresql://svc@db/reports");
        assert_eq!(config.reader.url, "postgresql://anon@db/reports");
        assert_eq!(config.service.max_connections, 10);
        assert_eq!(config.reader.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (SERVICE_URL_VAR, "postgresql://svc@db/reports"),
            (READONLY_URL_VAR, "postgresql://anon@db/reports"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("DATABASE_QUERY_TIMEOUT_SECS", "2"),
            ("DATABASE_IDLE_TIMEOUT_SECS", "45"),
        ]));
        let Ok(config) = config else {
            panic!("expected a valid config");
        };
        assert_eq!(config.reader.max_connections, 3);
        assert_eq!(config.query_timeout, Duration::from_secs(2));
        assert_eq!(config.service.idle_timeout, Duration::from_secs(45));
        assert_eq!(config.reader.idle_timeout, Duration::from_secs(45));
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let result = DatabaseConfig::from_lookup(lookup_from(&[
            (SERVICE_URL_VAR, "postgresql://svc@db/reports"),
            (READONLY_URL_VAR, "postgresql://anon@db/reports"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]));
        assert!(matches!(result, Err(DbError::Config(m)) if m.contains("DATABASE_MAX_CONNECTIONS")));
    }
}

//! Configuration for the retention job.
//!
//! Loaded from environment variables. Database credentials are handled by
//! [`ourcolumbus_db::DatabaseConfig`]; this covers only the schedule.

use std::time::Duration;

use ourcolumbus_db::DEFAULT_RETENTION_DAYS;

use crate::error::RetentionError;

/// Default minutes between sweeps.
const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Schedule and behavior of the retention job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Reports scraped more than this many days ago are deleted.
    pub days: u32,
    /// Time between sweeps.
    pub interval: Duration,
    /// Sweep once and exit instead of looping.
    pub run_once: bool,
    /// Apply schema migrations before the first sweep.
    pub run_migrations: bool,
}

impl RetentionConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `RETENTION_DAYS` -- age limit in days (default 90)
    /// - `RETENTION_INTERVAL_MINUTES` -- minutes between sweeps (default 60, must be positive)
    /// - `RETENTION_RUN_ONCE` -- sweep once and exit (default `false`)
    /// - `RUN_MIGRATIONS` -- apply migrations at startup (default `false`)
    pub fn from_env() -> Result<Self, RetentionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RetentionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let days: u32 = parse_or(&lookup, "RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?;
        let interval_minutes: u64 =
            parse_or(&lookup, "RETENTION_INTERVAL_MINUTES", DEFAULT_INTERVAL_MINUTES)?;
        if interval_minutes == 0 {
            return Err(RetentionError::Config(
                "RETENTION_INTERVAL_MINUTES must be at least 1".to_owned(),
            ));
        }
        let run_once: bool = parse_or(&lookup, "RETENTION_RUN_ONCE", false)?;
        let run_migrations: bool = parse_or(&lookup, "RUN_MIGRATIONS", false)?;

        Ok(Self {
            days,
            interval: Duration::from_secs(interval_minutes.saturating_mul(60)),
            run_once,
            run_migrations,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, RetentionError>
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
            .map_err(|e| RetentionError::Config(format!("invalid {name}: {e}"))),
    }
}

#[cfg(test)]
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
    fn defaults() {
        let config = RetentionConfig::from_lookup(lookup_from(&[]));
        assert_eq!(
            config.ok(),
            Some(RetentionConfig {
                days: 90,
                interval: Duration::from_secs(3600),
                run_once: false,
                run_migrations: false,
            })
        );
    }

    #[test]
    fn overrides() {
        let config = RetentionConfig::from_lookup(lookup_from(&[
            ("RETENTION_DAYS", "30"),
            ("RETENTION_INTERVAL_MINUTES", " 5 "),
            ("RETENTION_RUN_ONCE", "true"),
            ("RUN_MIGRATIONS", "true"),
        ]));
        assert_eq!(
            config.ok(),
            Some(RetentionConfig {
                days: 30,
                interval: Duration::from_secs(300),
                run_once: true,
                run_migrations: true,
            })
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result =
            RetentionConfig::from_lookup(lookup_from(&[("RETENTION_INTERVAL_MINUTES", "0")]));
        assert!(matches!(result, Err(RetentionError::Config(_))));
    }

    #[test]
    fn negative_days_are_rejected() {
        let result = RetentionConfig::from_lookup(lookup_from(&[("RETENTION_DAYS", "-1")]));
        assert!(matches!(result, Err(RetentionError::Config(m)) if m.contains("RETENTION_DAYS")));
    }

    #[test]
    fn bad_flag_is_rejected() {
        let result = RetentionConfig::from_lookup(lookup_from(&[("RETENTION_RUN_ONCE", "yes")]));
        assert!(matches!(result, Err(RetentionError::Config(_))));
    }
}

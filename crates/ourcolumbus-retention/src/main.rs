//! Retention job for the `OurColumbus` report store.
//!
//! Deletes reports older than `RETENTION_DAYS` days, once at startup and
//! then on a fixed interval, until interrupted. With `RETENTION_RUN_ONCE`
//! it performs a single sweep and exits, which suits an external cron.
//!
//! # Startup
//!
//! ```text
//! .env --> logging --> config --> connect pools --> [migrations] --> sweep loop
//! ```

mod config;
mod error;
mod job;

use ourcolumbus_db::{DatabaseConfig, ReportsDb};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RetentionConfig;
use crate::error::RetentionError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, connection or migrations fail, or
/// if the single sweep fails in run-once mode.
#[tokio::main]
async fn main() -> Result<(), RetentionError> {
    // .env must be loaded before the subscriber reads RUST_LOG.
    let env_file = dotenvy::dotenv();

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .init();

    info!("ourcolumbus-retention starting");

    match env_file {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to read environment file"),
    }

    let db_config = DatabaseConfig::from_env()?;
    let config = RetentionConfig::from_env()?;
    info!(
        days = config.days,
        interval_secs = config.interval.as_secs(),
        run_once = config.run_once,
        run_migrations = config.run_migrations,
        "configuration loaded"
    );

    let db = ReportsDb::connect(&db_config).await?;
    let result = run(&db, &config).await;
    db.close().await;
    result
}

/// Build the log filter from a `RUST_LOG` value, defaulting to `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

async fn run(db: &ReportsDb, config: &RetentionConfig) -> Result<(), RetentionError> {
    if config.run_migrations {
        db.run_migrations().await?;
    }

    let days = config.days;
    job::run_schedule(config.interval, config.run_once, shutdown_signal(), || {
        let sweeper = db.retention();
        async move { sweeper.delete_old_reports(days).await }
    })
    .await
}

/// Resolves on Ctrl-C. If the handler cannot be installed the job keeps
/// running until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn log_filter_honors_directives() {
        assert_eq!(
            log_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("not a [valid filter")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}

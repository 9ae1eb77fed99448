//! The sweep schedule: one immediate sweep, then one per interval.

use std::future::Future;
use std::time::Duration;

use ourcolumbus_db::DbError;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::RetentionError;

/// Drive `sweep` on a fixed schedule until `shutdown` resolves.
///
/// The first sweep runs immediately. In run-once mode the job returns
/// after that sweep and propagates its error. Otherwise a failed sweep is
/// logged and retried on the next tick; it never stops the job.
pub async fn run_schedule<S, Fut, Stop>(
    interval: Duration,
    run_once: bool,
    shutdown: Stop,
    mut sweep: S,
) -> Result<(), RetentionError>
where
    S: FnMut() -> Fut,
    Fut: Future<Output = Result<u64, DbError>>,
    Stop: Future<Output = ()>,
{
    if run_once {
        let deleted = sweep().await?;
        info!(deleted, "Single retention sweep finished");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        interval_secs = interval.as_secs(),
        "Retention job running, Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received, stopping retention job");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep().await {
                    error!(error = %e, "Retention sweep failed, retrying next interval");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn sweeps_immediately_then_every_interval() {
        let calls = Cell::new(0_u32);
        let stop = tokio::time::sleep(HOUR * 2 + HOUR / 2);

        let result = run_schedule(HOUR, false, stop, || {
            calls.set(calls.get() + 1);
            async { Ok(0) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_sweeps_do_not_stop_the_loop() {
        let calls = Cell::new(0_u32);
        let stop = tokio::time::sleep(HOUR + HOUR / 2);

        let result = run_schedule(HOUR, false, stop, || {
            calls.set(calls.get() + 1);
            async { Err(DbError::InvalidArgument("backend unavailable".to_owned())) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn run_once_sweeps_once() {
        let calls = Cell::new(0_u32);
        let result = run_schedule(HOUR, true, std::future::pending(), || {
            calls.set(calls.get() + 1);
            async { Ok(12) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn run_once_propagates_failure() {
        let result = run_schedule(HOUR, true, std::future::pending(), || async {
            Err(DbError::InvalidArgument("backend unavailable".to_owned()))
        })
        .await;

        assert!(matches!(result, Err(RetentionError::Db(_))));
    }
}

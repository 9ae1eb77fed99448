//! Cutoff instants for time-window filters and retention.
//!
//! Cutoffs are computed on the client clock, the same clock that stamps
//! `scraped_at` during serialization. Windows reaching past year 1
//! saturate at [`earliest_cutoff`] instead of panicking or sending a
//! timestamp `PostgreSQL` would reject, so an absurd retention age simply
//! matches nothing.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// The instant `hours` before `now`.
pub fn hours_before(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    saturating_sub(now, TimeDelta::try_hours(i64::from(hours)))
}

/// The instant `days` before `now`.
pub fn days_before(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    saturating_sub(now, TimeDelta::try_days(i64::from(days)))
}

/// `0001-01-01T00:00:00Z`, the floor for every computed cutoff.
pub fn earliest_cutoff() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |naive| naive.and_utc())
}

fn saturating_sub(now: DateTime<Utc>, delta: Option<TimeDelta>) -> DateTime<Utc> {
    let floor = earliest_cutoff();
    delta
        .and_then(|d| now.checked_sub_signed(d))
        .map_or(floor, |cutoff| cutoff.max(floor))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn zero_is_now() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(days_before(now, 0), now);
        assert_eq!(hours_before(now, 0), now);
    }

    #[test]
    fn day_window_crosses_month() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(
            days_before(now, 2),
            Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn twenty_four_hours() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(
            hours_before(now, 24),
            Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn huge_windows_saturate() {
        let now = Utc::now();
        assert_eq!(days_before(now, u32::MAX), earliest_cutoff());
        assert_eq!(days_before(now, 1_000_000), earliest_cutoff());
        assert!(days_before(now, 9999) > earliest_cutoff());
    }
}

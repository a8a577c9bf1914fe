use cacerts_core::time::{format_timestamp, saturating_add};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::types::ScheduleWindow;

/// Compute when the next update may run and when a failure stops being
/// transient.
///
/// Without a previous success both instants collapse to `now`: update right
/// away, and report any failure since there is no recent success to fall back
/// on. Otherwise each threshold is an independent offset from the last run.
pub fn compute(
    last_run: Option<DateTime<Utc>>,
    minimum_age: TimeDelta,
    maximum_age: TimeDelta,
    now: DateTime<Utc>,
) -> ScheduleWindow {
    let window = match last_run {
        None => ScheduleWindow {
            next_update_time: now,
            expire_time: now,
        },
        Some(last) => ScheduleWindow {
            next_update_time: saturating_add(last, minimum_age),
            expire_time: saturating_add(last, maximum_age),
        },
    };

    debug!("Next update time: {}", format_timestamp(window.next_update_time));
    debug!("Expire time: {}", format_timestamp(window.expire_time));
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn never_run_collapses_to_now() {
        for (min_h, max_h) in [(0, 0), (24, 72), (72, 24), (10_000, 1)] {
            let window = compute(None, TimeDelta::hours(min_h), TimeDelta::hours(max_h), now());
            assert_eq!(window.next_update_time, now());
            assert_eq!(window.expire_time, now());
            assert!(window.update_due(now()));
            assert!(window.expired(now()));
        }
    }

    #[test]
    fn offsets_are_independent() {
        let last = now() - TimeDelta::hours(5);
        let window = compute(Some(last), TimeDelta::hours(24), TimeDelta::hours(2), now());
        assert_eq!(window.next_update_time, last + TimeDelta::hours(24));
        assert_eq!(window.expire_time, last + TimeDelta::hours(2));
        assert!(!window.update_due(now()));
        assert!(window.expired(now()));
    }

    #[test]
    fn zero_thresholds_mean_due_and_expired_at_last_run() {
        let last = now() - TimeDelta::minutes(1);
        let window = compute(Some(last), TimeDelta::zero(), TimeDelta::zero(), now());
        assert_eq!(window.next_update_time, last);
        assert_eq!(window.expire_time, last);
    }

    #[test]
    fn boundary_is_inclusive() {
        let last = now() - TimeDelta::hours(24);
        let window = compute(Some(last), TimeDelta::hours(24), TimeDelta::hours(24), now());
        assert!(window.update_due(now()));
        assert!(window.expired(now()));
        assert!(!window.update_due(now() - TimeDelta::milliseconds(1)));
    }

    #[test]
    fn huge_threshold_saturates() {
        let window = compute(Some(now()), TimeDelta::MAX, TimeDelta::zero(), now());
        assert_eq!(window.next_update_time, DateTime::<Utc>::MAX_UTC);
    }
}

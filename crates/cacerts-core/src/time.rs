//! Conversions between operator units (real-valued hours and minutes) and
//! chrono / std time types.

use chrono::{DateTime, Local, TimeDelta, Utc};

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Convert a non-negative number of hours to a `TimeDelta` at millisecond
/// resolution. Values too large to represent saturate at `TimeDelta::MAX`;
/// negative or non-finite input yields zero.
pub fn hours_to_delta(hours: f64) -> TimeDelta {
    if !hours.is_finite() || hours <= 0.0 {
        return TimeDelta::zero();
    }
    let millis = (hours * SECONDS_PER_HOUR * 1000.0).round();
    if millis >= i64::MAX as f64 {
        return TimeDelta::MAX;
    }
    TimeDelta::try_milliseconds(millis as i64).unwrap_or(TimeDelta::MAX)
}

/// Convert a number of minutes to a std `Duration`. Invalid input means no
/// delay at all.
pub fn minutes_to_duration(minutes: f64) -> std::time::Duration {
    let secs = minutes * SECONDS_PER_MINUTE;
    std::time::Duration::try_from_secs_f64(secs).unwrap_or(std::time::Duration::ZERO)
}

/// `at + delta`, clamped to the latest representable instant.
pub fn saturating_add(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Human-readable local time, e.g. `2026-10-19 14:05:00`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%F %T").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_hours_convert_to_millis() {
        assert_eq!(hours_to_delta(1.5), TimeDelta::minutes(90));
        assert_eq!(hours_to_delta(0.0), TimeDelta::zero());
        assert_eq!(hours_to_delta(-3.0), TimeDelta::zero());
        assert_eq!(hours_to_delta(f64::NAN), TimeDelta::zero());
        assert_eq!(hours_to_delta(1e300), TimeDelta::MAX);
    }

    #[test]
    fn minutes_convert_and_fail_open() {
        assert_eq!(minutes_to_duration(2.5), std::time::Duration::from_secs(150));
        assert_eq!(minutes_to_duration(-1.0), std::time::Duration::ZERO);
        assert_eq!(minutes_to_duration(f64::NAN), std::time::Duration::ZERO);
    }

    #[test]
    fn add_saturates() {
        let now = Utc::now();
        assert_eq!(saturating_add(now, TimeDelta::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(saturating_add(now, TimeDelta::hours(1)), now + TimeDelta::hours(1));
    }
}

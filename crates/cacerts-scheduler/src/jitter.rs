//! Random pre-update delay, so a fleet of hosts on the same cron schedule
//! does not hit the repository servers at the same moment.

use std::time::Duration;

/// Pick a delay of a whole number of seconds in `[1, bound]`.
///
/// Bounds under one second mean no delay. The sampled value is never larger
/// than the bound, so a misconfigured bound can only shorten the wait.
pub fn sample_delay(rng: &mut fastrand::Rng, bound: Duration) -> Option<Duration> {
    let max_secs = bound.as_secs();
    if max_secs < 1 {
        return None;
    }
    Some(Duration::from_secs(rng.u64(1..=max_secs)))
}

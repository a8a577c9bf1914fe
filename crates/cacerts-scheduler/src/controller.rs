use std::time::Duration;

use cacerts_core::{
    config::{HELP_MAILTO, OSG_REPO_ADDR},
    time::{format_timestamp, hours_to_delta, minutes_to_duration},
    UpdaterConfig,
};
use cacerts_packages::UpdateAttempt;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::{
    jitter::sample_delay,
    schedule::compute,
    store::TimestampStore,
    types::{AttemptOutcome, RunOutcome, ScheduleWindow},
};

const ADJUST_MIN_AGE_MESSAGE: &str =
    "To change update frequency, adjust the -a/--minimum-age argument.";
const ADJUST_MAX_AGE_MESSAGE: &str = "To change the maximum time for which update failures are \
     tolerated without a notification, adjust the -x/--maximum-age argument.";

/// The operator's throttling and escalation knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePolicy {
    pub minimum_age_hours: f64,
    pub maximum_age_hours: f64,
    pub random_wait: Duration,
}

impl UpdatePolicy {
    pub fn new(minimum_age_hours: f64, maximum_age_hours: f64, random_wait: Duration) -> Self {
        Self {
            minimum_age_hours,
            maximum_age_hours,
            random_wait,
        }
    }

    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::new(
            config.minimum_age_hours,
            config.maximum_age_hours,
            minutes_to_duration(config.random_wait_minutes),
        )
    }

    pub fn minimum_age(&self) -> TimeDelta {
        hours_to_delta(self.minimum_age_hours)
    }

    pub fn maximum_age(&self) -> TimeDelta {
        hours_to_delta(self.maximum_age_hours)
    }
}

/// Drives one invocation: evaluate the window, maybe wait, maybe update,
/// classify the result and record success.
pub struct RunController {
    store: TimestampStore,
    attempt: UpdateAttempt,
    policy: UpdatePolicy,
    rng: fastrand::Rng,
}

impl RunController {
    pub fn new(store: TimestampStore, attempt: UpdateAttempt, policy: UpdatePolicy) -> Self {
        Self {
            store,
            attempt,
            policy,
            rng: fastrand::Rng::new(),
        }
    }

    /// Use a fixed jitter sequence.
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Run once at `now`. Every input to the decision comes from the store,
    /// the policy and `now`; the clock is never read here.
    pub async fn run(&mut self, now: DateTime<Utc>) -> RunOutcome {
        let last_run = self.store.load();
        let window = compute(
            last_run,
            self.policy.minimum_age(),
            self.policy.maximum_age(),
            now,
        );

        if !window.update_due(now) {
            self.log_skip(&window);
            return RunOutcome::Skipped {
                next_update_time: window.next_update_time,
            };
        }

        if let Some(delay) = sample_delay(&mut self.rng, self.policy.random_wait) {
            debug!("Waiting for {} seconds", delay.as_secs());
            tokio::time::sleep(delay).await;
        }

        RunOutcome::Attempted(self.attempt_update(&window, now).await)
    }

    async fn attempt_update(
        &mut self,
        window: &ScheduleWindow,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        let error = match self.attempt.run().await {
            Ok(()) => {
                info!("Update succeeded");
                let persisted = self.store.save(now);
                return AttemptOutcome::Success { persisted };
            }
            Err(error) => error,
        };

        warn!(code = error.code(), "Update failed: {error}");
        info!("Verify that this machine can reach the OSG repositories at {OSG_REPO_ADDR}.");
        info!("Also try clearing the yum cache with the following commands:");
        info!("'yum --enablerepo=\\* clean all; yum --enablerepo=\\* clean expire-cache'");
        info!("This may also be a transient error on the remote side.");
        info!("Send email to {HELP_MAILTO} if you are having persistent trouble.");

        if error.bypasses_grace_window() {
            info!("The package repositories cannot be used, so this failure is not considered transient.");
            return AttemptOutcome::FatalFailure { error };
        }

        if window.expired(now) {
            warn!(
                "Cert updates have failed for the past {} hours.",
                self.policy.maximum_age_hours
            );
            info!("Updates have failed for a long enough time that the failure is no longer considered transient.");
            info!("This run will now exit unsuccessfully, triggering a notification.");
            info!("{ADJUST_MAX_AGE_MESSAGE}");
            AttemptOutcome::FatalFailure { error }
        } else {
            info!(
                "Updates have not failed for longer than {} hours.",
                self.policy.maximum_age_hours
            );
            info!("Since updates have succeeded recently, this failure will be considered transient,");
            info!("and will not trigger a notification for the admin.");
            info!(
                "An update failure after {} will be considered a persistent error, triggering a notification.",
                format_timestamp(window.expire_time)
            );
            info!("{ADJUST_MAX_AGE_MESSAGE}");
            AttemptOutcome::TransientFailure {
                error,
                expires_at: window.expire_time,
            }
        }
    }

    fn log_skip(&self, window: &ScheduleWindow) {
        warn!("Not updating until {}.", format_timestamp(window.next_update_time));
        info!(
            "Since an update was performed in the past {} hours, another update will not be performed at this time.",
            self.policy.minimum_age_hours
        );
        info!("This is normal behavior.");
        info!("{ADJUST_MIN_AGE_MESSAGE}");
    }
}

use cacerts_core::UpdaterError;
use chrono::{DateTime, Utc};

/// Derived from the last successful run; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    /// An update may be attempted at or after this instant.
    pub next_update_time: DateTime<Utc>,
    /// A failed attempt at or after this instant is reported.
    pub expire_time: DateTime<Utc>,
}

impl ScheduleWindow {
    pub fn update_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_update_time
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_time
    }
}

/// Classified result of an update attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Packages updated. `persisted` is false when the new timestamp could
    /// not be written; the run still counts as a success.
    Success { persisted: bool },

    /// Failed inside the grace window. Becomes fatal at `expires_at`.
    TransientFailure {
        error: UpdaterError,
        expires_at: DateTime<Utc>,
    },

    /// Failed with no grace left: past `expire_time`, never succeeded before,
    /// or no repository offers the packages.
    FatalFailure { error: UpdaterError },
}

/// Terminal state of one controller run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Too soon since the last success; nothing was attempted.
    Skipped { next_update_time: DateTime<Utc> },
    Attempted(AttemptOutcome),
}

impl RunOutcome {
    /// The error to report to the exit-status layer, if any.
    ///
    /// Transient failures are deliberately silent here.
    pub fn reportable_error(&self) -> Option<&UpdaterError> {
        match self {
            RunOutcome::Attempted(AttemptOutcome::FatalFailure { error }) => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Skipped { .. } => "skipped",
            RunOutcome::Attempted(AttemptOutcome::Success { .. }) => "succeeded",
            RunOutcome::Attempted(AttemptOutcome::TransientFailure { .. }) => "transiently_failed",
            RunOutcome::Attempted(AttemptOutcome::FatalFailure { .. }) => "fatally_failed",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

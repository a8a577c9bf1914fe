//! `cacerts-scheduler` — update throttling and failure escalation.
//!
//! # Overview
//!
//! The last successful update is persisted by [`store::TimestampStore`]. Each
//! run, [`schedule::compute`] turns it into a [`ScheduleWindow`] and the
//! [`controller::RunController`] decides what to do:
//!
//! | Condition                                  | Outcome             |
//! |--------------------------------------------|---------------------|
//! | `now < next_update_time`                   | `Skipped`           |
//! | attempt succeeds                           | `Success` (+ save)  |
//! | attempt fails, `now < expire_time`         | `TransientFailure`  |
//! | attempt fails, `now >= expire_time`        | `FatalFailure`      |
//! | no repository offers the packages          | `FatalFailure`      |
//!
//! A host that has never succeeded always attempts and always reports.

pub mod controller;
pub mod jitter;
pub mod schedule;
pub mod store;
pub mod types;

pub use controller::{RunController, UpdatePolicy};
pub use store::TimestampStore;
pub use types::{AttemptOutcome, RunOutcome, ScheduleWindow};

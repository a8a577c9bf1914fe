//! `cacerts-core` — configuration, error taxonomy and time helpers shared by
//! the CA certificate updater crates.

pub mod config;
pub mod error;
pub mod time;

pub use config::{SyslogAddress, UpdaterConfig, PACKAGE_LIST};
pub use error::{Result, UpdaterError};

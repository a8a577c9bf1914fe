//! cacerts-packages — package-manager collaborators for the CA certificate
//! updater.
//!
//! - [`PackageBackend`]: the seam between update policy and the system tools
//! - [`YumBackend`]: `repoquery` + `yum update`, with optional timeout
//! - [`UpdateAttempt`]: repository availability check followed by the update

pub mod attempt;
pub mod backend;
pub mod error;
pub mod types;
pub mod yum;

pub use attempt::{external_repos, UpdateAttempt};
pub use backend::PackageBackend;
pub use error::{PackageError, Result};
pub use types::{CommandOptions, CommandOutput};
pub use yum::YumBackend;

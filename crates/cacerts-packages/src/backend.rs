use async_trait::async_trait;

use crate::{error::Result, types::CommandOutput};

/// The two package-manager calls an update attempt is made of.
///
/// Implementations only run the tools and capture what they print;
/// interpreting exit codes and output is left to [`crate::UpdateAttempt`].
#[async_trait]
pub trait PackageBackend: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// List the repositories offering a package that satisfies `requirement`,
    /// one repository id per stdout line.
    async fn query_providers(&self, requirement: &str) -> Result<CommandOutput>;

    /// Update `packages` non-interactively.
    async fn update_packages(&self, packages: &[String]) -> Result<CommandOutput>;
}

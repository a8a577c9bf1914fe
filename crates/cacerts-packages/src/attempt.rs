use cacerts_core::{Result, UpdaterError};
use tracing::{debug, info};

use crate::backend::PackageBackend;

/// Pseudo-repository that lists locally installed packages. It proves nothing
/// about whether an update source is reachable.
const INSTALLED_REPO: &str = "installed";

/// One update attempt: make sure every tracked requirement is offered by an
/// external repository, then update the whole package set.
///
/// The attempt only says whether it worked. Deciding whether a failure is
/// transient is the caller's job.
pub struct UpdateAttempt {
    backend: Box<dyn PackageBackend>,
    packages: Vec<String>,
}

impl UpdateAttempt {
    pub fn new(backend: Box<dyn PackageBackend>, packages: Vec<String>) -> Self {
        Self { backend, packages }
    }

    /// Run the attempt. Returns `RepositoryUnavailable` or `UpdateFailed`.
    pub async fn run(&self) -> Result<()> {
        for requirement in &self.packages {
            self.verify_requirement_available(requirement).await?;
        }
        self.update().await
    }

    /// With its repositories disabled yum finds nothing to update and exits 0,
    /// which looks exactly like "already up to date". Catch that case here.
    async fn verify_requirement_available(&self, requirement: &str) -> Result<()> {
        let output = self
            .backend
            .query_providers(requirement)
            .await
            .map_err(|e| UpdaterError::RepositoryUnavailable {
                requirement: requirement.to_string(),
                reason: format!("unable to query repository: {e}"),
            })?;

        if !output.success() {
            return Err(UpdaterError::RepositoryUnavailable {
                requirement: requirement.to_string(),
                reason: format!(
                    "unable to query repository (exit {}): {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            });
        }

        let repos = external_repos(&output.stdout);
        if repos.is_empty() {
            return Err(UpdaterError::RepositoryUnavailable {
                requirement: requirement.to_string(),
                reason: "no external repos provide it".to_string(),
            });
        }

        debug!(%requirement, repos = ?repos, "requirement available");
        Ok(())
    }

    async fn update(&self) -> Result<()> {
        let name = self.backend.name();
        let output = self
            .backend
            .update_packages(&self.packages)
            .await
            .map_err(|e| UpdaterError::UpdateFailed(e.to_string()))?;

        // Logged regardless of outcome, never parsed.
        let text = output.combined();
        if !text.is_empty() {
            info!("{name} output: {text}");
        }

        if !output.success() {
            return Err(UpdaterError::UpdateFailed(format!(
                "{name} exited with status {}",
                output.exit_code
            )));
        }
        Ok(())
    }
}

/// Repository ids from repoquery output, minus blank lines and the
/// installed-packages pseudo-repository.
pub fn external_repos(repoquery_stdout: &str) -> Vec<String> {
    repoquery_stdout
        .lines()
        .map(str::trim)
        .filter(|repo| !repo.is_empty() && !repo.contains(INSTALLED_REPO))
        .map(str::to_string)
        .collect()
}

use thiserror::Error;

use crate::config::{HELP_MAILTO, OSG_REPO_ADDR, PROGRAM_NAME};

/// Every failure the updater can classify.
///
/// Exit statuses are assigned here, at one place, so the binary boundary never
/// has to order its error handling by type.
#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("Usage error: {0}")]
    Config(String),

    #[error("State file error ({path}): {reason}")]
    Store { path: String, reason: String },

    #[error("Repository check for {requirement} failed: {reason}")]
    RepositoryUnavailable { requirement: String, reason: String },

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Unable to open {path} for writing logs to: {reason}")]
    LogSetup { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UpdaterError {
    /// Short error code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            UpdaterError::Config(_) => "CONFIG_ERROR",
            UpdaterError::Store { .. } => "STORE_ERROR",
            UpdaterError::RepositoryUnavailable { .. } => "REPOSITORY_UNAVAILABLE",
            UpdaterError::UpdateFailed(_) => "UPDATE_FAILED",
            UpdaterError::Interrupted => "INTERRUPTED",
            UpdaterError::LogSetup { .. } => "LOG_SETUP_ERROR",
            UpdaterError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for this error.
    ///
    /// 1 is the only status that should trigger an operator notification.
    pub fn exit_code(&self) -> u8 {
        match self {
            UpdaterError::RepositoryUnavailable { .. } | UpdaterError::UpdateFailed(_) => 1,
            UpdaterError::Config(_) => 2,
            UpdaterError::Interrupted => 3,
            UpdaterError::Store { .. } | UpdaterError::LogSetup { .. } => 4,
            UpdaterError::Internal(_) => 99,
        }
    }

    /// True for failures that come out of an update attempt.
    pub fn is_update_failure(&self) -> bool {
        matches!(
            self,
            UpdaterError::RepositoryUnavailable { .. } | UpdaterError::UpdateFailed(_)
        )
    }

    /// Repository unavailability is never tolerated as transient: it means
    /// yum would have reported "nothing to do" against disabled sources.
    pub fn bypasses_grace_window(&self) -> bool {
        matches!(self, UpdaterError::RepositoryUnavailable { .. })
    }

    /// Actionable hint for a human operator, if there is one.
    pub fn help(&self) -> Option<String> {
        match self {
            UpdaterError::Config(_) => Some(format!("To see usage, run {PROGRAM_NAME} --help")),
            UpdaterError::RepositoryUnavailable { .. } => Some(
                "Ensure that the osg repositories are enabled and accessible. \
                 Repository definition files are located in '/etc/yum.repos.d' by default."
                    .to_string(),
            ),
            UpdaterError::UpdateFailed(_) => Some(format!(
                "Verify that this machine can reach the OSG repositories at {OSG_REPO_ADDR}, \
                 and try clearing the yum cache with \
                 'yum --enablerepo=\\* clean all; yum --enablerepo=\\* clean expire-cache'."
            )),
            UpdaterError::Store { .. }
            | UpdaterError::Interrupted
            | UpdaterError::LogSetup { .. }
            | UpdaterError::Internal(_) => None,
        }
    }
}

/// Closing line for every reported update failure.
pub fn generic_help_message() -> String {
    format!("Send email to {HELP_MAILTO} if you are having difficulty diagnosing this error.")
}

pub type Result<T> = std::result::Result<T, UpdaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_update_failures_from_internal_errors() {
        let unavailable = UpdaterError::RepositoryUnavailable {
            requirement: "osg-ca-certs".to_string(),
            reason: "no external repos provide it".to_string(),
        };
        assert_eq!(unavailable.exit_code(), 1);
        assert_eq!(UpdaterError::UpdateFailed("yum exited 1".into()).exit_code(), 1);
        assert_eq!(UpdaterError::Config("bad".into()).exit_code(), 2);
        assert_eq!(UpdaterError::Interrupted.exit_code(), 3);
        assert_eq!(
            UpdaterError::LogSetup { path: "/x".into(), reason: "denied".into() }.exit_code(),
            4
        );
        assert_eq!(UpdaterError::Internal("boom".into()).exit_code(), 99);
    }

    #[test]
    fn only_repository_unavailable_bypasses_grace() {
        let unavailable = UpdaterError::RepositoryUnavailable {
            requirement: "igtf-ca-certs".to_string(),
            reason: "no external repos provide it".to_string(),
        };
        assert!(unavailable.bypasses_grace_window());
        assert!(unavailable.is_update_failure());
        assert!(!UpdaterError::UpdateFailed("x".into()).bypasses_grace_window());
        assert!(!UpdaterError::Internal("x".into()).is_update_failure());
    }

    #[test]
    fn display_includes_context() {
        let err = UpdaterError::RepositoryUnavailable {
            requirement: "osg-ca-certs".to_string(),
            reason: "no external repos provide it".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Repository check for osg-ca-certs failed: no external repos provide it"
        );
        assert_eq!(err.code(), "REPOSITORY_UNAVAILABLE");
        assert!(err.help().unwrap().contains("/etc/yum.repos.d"));
    }
}

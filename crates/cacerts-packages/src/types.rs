//! Shared data types for cacerts-packages.

use std::time::Duration;

/// Captured result of one package-tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code, or -1 when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, the way the tool would print them to a
    /// terminal.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Knobs shared by every tool invocation of a backend.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Repositories to enable in addition to the system defaults.
    pub enable_repos: Vec<String>,

    /// Kill the tool when it runs longer than this. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    /// Build options from the configured timeout in seconds (0 = none).
    pub fn new(enable_repos: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            enable_repos,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    /// `--enablerepo=<id>` arguments understood by both yum and repoquery.
    pub(crate) fn enablerepo_args(&self) -> Vec<String> {
        self.enable_repos
            .iter()
            .map(|repo| format!("--enablerepo={repo}"))
            .collect()
    }
}

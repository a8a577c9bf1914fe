//! `yum` / `repoquery` backend.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    backend::PackageBackend,
    error::{PackageError, Result},
    types::{CommandOptions, CommandOutput},
};

const YUM: &str = "yum";
const REPOQUERY: &str = "repoquery";

/// Runs the system `yum` and `repoquery` tools.
pub struct YumBackend {
    options: CommandOptions,
}

impl YumBackend {
    pub fn new(options: CommandOptions) -> Self {
        Self { options }
    }

    fn repoquery_args(&self, requirement: &str) -> Vec<String> {
        let mut args = vec![
            "--plugins".to_string(),
            "--whatprovides".to_string(),
            requirement.to_string(),
            "--queryformat=%{repoid}".to_string(),
        ];
        args.extend(self.options.enablerepo_args());
        args
    }

    fn update_args(&self, packages: &[String]) -> Vec<String> {
        let mut args = vec!["update".to_string(), "-y".to_string(), "-q".to_string()];
        args.extend(self.options.enablerepo_args());
        args.extend(packages.iter().cloned());
        args
    }
}

#[async_trait]
impl PackageBackend for YumBackend {
    fn name(&self) -> &str {
        "yum"
    }

    async fn query_providers(&self, requirement: &str) -> Result<CommandOutput> {
        run_command(REPOQUERY, &self.repoquery_args(requirement), self.options.timeout).await
    }

    async fn update_packages(&self, packages: &[String]) -> Result<CommandOutput> {
        run_command(YUM, &self.update_args(packages), self.options.timeout).await
    }
}

/// Run `program` to completion, capturing stdout and stderr.
///
/// With a `timeout`, the child is killed once the deadline passes: it is
/// spawned with `kill_on_drop`, and dropping the pending wait drops the child.
pub(crate) async fn run_command(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    debug!("exec: {program} {}", args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PackageError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                warn!(%program, "killed after {}ms", limit.as_millis());
                return Err(PackageError::Timeout {
                    program: program.to_string(),
                    ms: limit.as_millis() as u64,
                });
            }
        },
        None => child.wait_with_output().await?,
    };

    let exit_code = output.status.code().unwrap_or(-1);
    debug!(%program, exit_code, "exec finished");

    Ok(CommandOutput {
        exit_code,
        stdout: strip_text(&output.stdout),
        stderr: strip_text(&output.stderr),
    })
}

/// Strip ANSI escape codes (yum colours some of its output) and convert bytes
/// to a UTF-8 string.
fn strip_text(raw: &[u8]) -> String {
    let clean = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&clean).into_owned()
}

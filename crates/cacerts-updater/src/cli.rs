use cacerts_core::{config::PROGRAM_NAME, Result, UpdaterConfig};
use clap::Parser;
use tracing::level_filters::LevelFilter;

/// Keep the OSG and IGTF CA certificate packages up to date.
///
/// Meant to be run from cron. Exits 1 only when updates have been failing
/// for longer than --maximum-age (or have never succeeded).
#[derive(Debug, Parser)]
#[command(name = PROGRAM_NAME, version)]
pub struct Cli {
    /// Hours that must elapse since the last successful run before attempting
    /// an update. If absent or 0, always update.
    #[arg(short = 'a', long = "minimum-age", value_name = "HOURS", allow_negative_numbers = true)]
    pub minimum_age: Option<f64>,

    /// Hours since the last successful run after which a failed update is a
    /// critical error. Earlier failures are transient. If absent or 0, every
    /// failure is critical.
    #[arg(short = 'x', long = "maximum-age", value_name = "HOURS", allow_negative_numbers = true)]
    pub maximum_age: Option<f64>,

    /// Delay the update by a random duration between 0 and this many minutes,
    /// to spread load on the update servers. If absent or 0, update at once.
    #[arg(short = 'r', long = "random-wait", value_name = "MINUTES", allow_negative_numbers = true)]
    pub random_wait: Option<f64>,

    /// Additional repository to enable for repoquery and yum (repeatable).
    #[arg(long = "enablerepo", value_name = "REPO")]
    pub enable_repos: Vec<String>,

    /// File recording the last successful run.
    #[arg(long, value_name = "PATH")]
    pub state_path: Option<String>,

    /// Kill repoquery/yum after this many seconds (0 = never).
    #[arg(long = "command-timeout", value_name = "SECONDS")]
    pub command_timeout: Option<u64>,

    /// TOML configuration file. Command-line flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Display debugging information.
    #[arg(long, group = "verbosity")]
    pub debug: bool,

    /// Display detailed information.
    #[arg(short, long, group = "verbosity")]
    pub verbose: bool,

    /// Only display errors.
    #[arg(short, long, group = "verbosity")]
    pub quiet: bool,

    /// Write messages to the given file instead of the console.
    #[arg(short = 'l', long, value_name = "PATH")]
    pub logfile: Option<String>,

    /// Write messages to syslog instead of the console.
    #[arg(short = 's', long)]
    pub log_to_syslog: bool,

    /// Address to use for syslog: a socket path (e.g. /dev/log) or host:port.
    #[arg(long, value_name = "ADDRESS")]
    pub syslog_address: Option<String>,

    /// The syslog facility to log to (default: user).
    #[arg(long, value_name = "FACILITY")]
    pub syslog_facility: Option<String>,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else if self.verbose {
            LevelFilter::INFO
        } else if self.quiet {
            LevelFilter::ERROR
        } else {
            LevelFilter::WARN
        }
    }

    /// Load the config file / environment, lay the flags over it, then
    /// validate the result.
    pub fn resolve_config(&self) -> Result<UpdaterConfig> {
        let mut config = UpdaterConfig::extract(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut UpdaterConfig) {
        if let Some(hours) = self.minimum_age {
            config.minimum_age_hours = hours;
        }
        if let Some(hours) = self.maximum_age {
            config.maximum_age_hours = hours;
        }
        if let Some(minutes) = self.random_wait {
            config.random_wait_minutes = minutes;
        }
        if !self.enable_repos.is_empty() {
            config.enable_repos = self.enable_repos.clone();
        }
        if let Some(ref path) = self.state_path {
            config.state_path = path.clone();
        }
        if let Some(secs) = self.command_timeout {
            config.command_timeout_secs = secs;
        }
        if let Some(ref path) = self.logfile {
            config.logfile = Some(path.clone());
        }
        if self.log_to_syslog {
            config.log_to_syslog = true;
        }
        if let Some(ref address) = self.syslog_address {
            config.syslog_address = address.clone();
        }
        if let Some(ref facility) = self.syslog_facility {
            config.syslog_facility = facility.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacerts_core::UpdaterError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once(PROGRAM_NAME).chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn short_flags_match_cron_usage() {
        let cli = parse(&["-a", "23", "-x", "72", "-r", "30", "-q"]);
        assert_eq!(cli.minimum_age, Some(23.0));
        assert_eq!(cli.maximum_age, Some(72.0));
        assert_eq!(cli.random_wait, Some(30.0));
        assert_eq!(cli.log_level(), LevelFilter::ERROR);
    }

    #[test]
    fn default_level_is_warn() {
        assert_eq!(parse(&[]).log_level(), LevelFilter::WARN);
        assert_eq!(parse(&["--debug"]).log_level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["-v"]).log_level(), LevelFilter::INFO);
    }

    #[test]
    fn verbosity_flags_conflict() {
        let err = Cli::try_parse_from([PROGRAM_NAME, "-v", "-q"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn non_numeric_age_is_a_usage_error() {
        assert!(Cli::try_parse_from([PROGRAM_NAME, "-a", "daily"]).is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("updater.toml");
        std::fs::write(
            &config_path,
            "minimum_age_hours = 6\nmaximum_age_hours = 24\nenable_repos = [\"osg\"]\n",
        )
        .expect("write");

        let cli = parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "-x",
            "96.5",
            "--enablerepo",
            "osg-testing",
            "--enablerepo",
            "osg-upcoming",
            "--state-path",
            "/tmp/lastrun",
        ]);
        let config = cli.resolve_config().expect("config");
        assert_eq!(config.minimum_age_hours, 6.0);
        assert_eq!(config.maximum_age_hours, 96.5);
        assert_eq!(config.enable_repos, vec!["osg-testing", "osg-upcoming"]);
        assert_eq!(config.state_path, "/tmp/lastrun");
    }

    #[test]
    fn flag_overrides_bad_file_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("updater.toml");
        std::fs::write(&config_path, "minimum_age_hours = -4\n").expect("write");

        let cli = parse(&["--config", config_path.to_str().unwrap(), "-a", "5"]);
        let config = cli.resolve_config().expect("flag wins over the file");
        assert_eq!(config.minimum_age_hours, 5.0);
    }

    #[test]
    fn bad_syslog_address_is_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("none.toml");
        let missing = missing.to_str().unwrap();
        let socket = dir.path().join("no-such-socket");

        for address in [":514", "loghost:port", socket.to_str().unwrap()] {
            let cli = parse(&["--config", missing, "-s", "--syslog-address", address]);
            let err = cli.resolve_config().unwrap_err();
            assert!(matches!(err, UpdaterError::Config(_)), "{address}");
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn syslog_flags_layer_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("none.toml");
        let cli = parse(&[
            "--config",
            missing.to_str().unwrap(),
            "--log-to-syslog",
            "--syslog-address",
            "loghost.example.org:514",
            "--syslog-facility",
            "local3",
        ]);
        let config = cli.resolve_config().expect("config");
        assert!(config.log_to_syslog);
        assert_eq!(config.syslog_address, "loghost.example.org:514");
        assert_eq!(config.syslog_facility, "local3");
    }

    #[test]
    fn negative_age_rejected_before_anything_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("none.toml");
        let cli = parse(&["--config", missing.to_str().unwrap(), "-a", "-5"]);
        let err = cli.resolve_config().unwrap_err();
        assert!(matches!(err, UpdaterError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }
}

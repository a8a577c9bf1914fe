use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, UpdaterError};

pub const PROGRAM_NAME: &str = "osg-ca-certs-updater";
pub const HELP_MAILTO: &str = "goc@opensciencegrid.org";
pub const BUGREPORT_MAILTO: &str = "goc@opensciencegrid.org";
pub const OSG_REPO_ADDR: &str = "repo.grid.iu.edu";

pub const DEFAULT_STATE_PATH: &str = "/var/lib/osg-ca-certs-updater-lastrun";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/osg/ca-certs-updater.toml";
pub const ENV_PREFIX: &str = "CA_CERTS_UPDATER_";
pub const DEFAULT_SYSLOG_ADDRESS: &str = "/dev/log";
pub const DEFAULT_SYSLOG_FACILITY: &str = "user";

/// The trust bundles this tool keeps current. Also used as the requirement
/// names checked against the repositories before updating.
pub const PACKAGE_LIST: [&str; 4] = [
    "osg-ca-certs",
    "osg-ca-certs-compat",
    "igtf-ca-certs",
    "igtf-ca-certs-compat",
];

/// Operator configuration (ca-certs-updater.toml + CA_CERTS_UPDATER_* env
/// overrides). Command-line flags are applied on top by the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Hours that must elapse since the last success before another attempt.
    /// 0 means always update.
    pub minimum_age_hours: f64,
    /// Hours since the last success after which a failed attempt is reported.
    /// 0 means every failure is reported.
    pub maximum_age_hours: f64,
    /// Upper bound of the random delay before updating, in minutes.
    pub random_wait_minutes: f64,
    /// File holding the last successful run timestamp.
    pub state_path: String,
    /// Extra repositories passed to yum/repoquery as `--enablerepo`. The
    /// environment form is a comma-separated list.
    #[serde(deserialize_with = "repo_list")]
    pub enable_repos: Vec<String>,
    /// Kill yum/repoquery after this many seconds. 0 disables the limit.
    pub command_timeout_secs: u64,
    /// Log to this file instead of the console.
    pub logfile: Option<String>,
    /// Log to syslog instead of the console or a file.
    pub log_to_syslog: bool,
    /// Local socket path or `host:port` (UDP).
    pub syslog_address: String,
    /// Facility name, e.g. `user`, `daemon`, `local0`.
    pub syslog_facility: String,
}

/// Where syslog messages are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogAddress {
    Socket(PathBuf),
    Remote { host: String, port: u16 },
}

impl SyslogAddress {
    /// Anything with a colon is `host:port`; otherwise it must be an existing
    /// path.
    pub fn parse(address: &str) -> Result<Self> {
        match address.split_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(UpdaterError::Config(
                        "Invalid host specified for syslog-address.".to_string(),
                    ));
                }
                let port = port.parse::<u16>().map_err(|_| {
                    UpdaterError::Config(
                        "Invalid port specified for syslog-address. Port must be an integer."
                            .to_string(),
                    )
                })?;
                Ok(SyslogAddress::Remote {
                    host: host.to_string(),
                    port,
                })
            }
            None => {
                let path = PathBuf::from(address);
                if !path.exists() {
                    return Err(UpdaterError::Config(
                        "Invalid path specified for syslog-address.".to_string(),
                    ));
                }
                Ok(SyslogAddress::Socket(path))
            }
        }
    }
}

impl fmt::Display for SyslogAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyslogAddress::Socket(path) => write!(f, "{}", path.display()),
            SyslogAddress::Remote { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            minimum_age_hours: 0.0,
            maximum_age_hours: 0.0,
            random_wait_minutes: 0.0,
            state_path: DEFAULT_STATE_PATH.to_string(),
            enable_repos: Vec::new(),
            command_timeout_secs: 0,
            logfile: None,
            log_to_syslog: false,
            syslog_address: DEFAULT_SYSLOG_ADDRESS.to_string(),
            syslog_facility: DEFAULT_SYSLOG_FACILITY.to_string(),
        }
    }
}

impl UpdaterConfig {
    /// Merge the TOML file and CA_CERTS_UPDATER_* env vars over the defaults,
    /// without validating. Callers layering more values on top validate last.
    ///
    /// A missing file is not an error: every field has a default.
    pub fn extract(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| UpdaterError::Config(e.to_string()))
    }

    /// [`extract`](Self::extract) followed by [`validate`](Self::validate).
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = Self::extract(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduling policy cannot work with.
    ///
    /// Minimum and maximum age are deliberately not compared with each other.
    pub fn validate(&self) -> Result<()> {
        if !is_non_negative(self.minimum_age_hours) {
            return Err(UpdaterError::Config(
                "The value for minimum-age must be a non-negative number of hours.".to_string(),
            ));
        }
        if !is_non_negative(self.maximum_age_hours) {
            return Err(UpdaterError::Config(
                "The value for maximum-age must be a non-negative number of hours.".to_string(),
            ));
        }
        if !is_non_negative(self.random_wait_minutes) {
            return Err(UpdaterError::Config(
                "The value for random-wait must be a non-negative number of minutes.".to_string(),
            ));
        }
        if self.state_path.trim().is_empty() {
            return Err(UpdaterError::Config("state-path must not be empty.".to_string()));
        }
        if let Some(repo) = self.enable_repos.iter().find(|r| r.trim().is_empty()) {
            return Err(UpdaterError::Config(format!(
                "Invalid repository id {repo:?} for enablerepo."
            )));
        }
        self.syslog_target()?;
        Ok(())
    }

    /// The parsed syslog address when syslog logging is on.
    pub fn syslog_target(&self) -> Result<Option<SyslogAddress>> {
        if !self.log_to_syslog {
            return Ok(None);
        }
        if self.syslog_facility.trim().is_empty() {
            return Err(UpdaterError::Config(
                "syslog-facility must not be empty.".to_string(),
            ));
        }
        SyslogAddress::parse(&self.syslog_address).map(Some)
    }

    /// The fixed package set as owned strings, in update order.
    pub fn packages(&self) -> Vec<String> {
        PACKAGE_LIST.iter().map(|p| p.to_string()).collect()
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Accept either a list or a comma-separated string.
fn repo_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repos {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Repos::deserialize(deserializer)? {
        Repos::List(repos) => repos,
        Repos::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

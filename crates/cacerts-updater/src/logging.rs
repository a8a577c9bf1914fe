use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use cacerts_core::{config::PROGRAM_NAME, Result, SyslogAddress, UpdaterConfig, UpdaterError};
use syslog::{Facility, Formatter3164, LoggerBackend};
use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

type SyslogLogger = syslog::Logger<LoggerBackend, Formatter3164>;

/// Install the process-wide subscriber.
///
/// Syslog wins over a log file, and either replaces the console. Console
/// output is bare messages on stderr, which is what cron mails to the admin.
/// A log file gets timestamps and levels. Syslog lines are tagged with the
/// program name and carry the event level as severity. `RUST_LOG` overrides
/// the level chosen by the flags.
pub fn init(level: LevelFilter, config: &UpdaterConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let installed = if let Some(address) = config.syslog_target()? {
        let sink = SyslogSink::connect(&address, &config.syslog_facility)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(sink)
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_target(false)
            .try_init()
    } else if let Some(path) = config.logfile.as_deref() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| UpdaterError::LogSetup {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .without_time()
            .with_level(false)
            .with_target(false)
            .try_init()
    };

    installed.map_err(|e| {
        UpdaterError::Internal(format!("{PROGRAM_NAME}: logging already initialised: {e}"))
    })
}

/// Writer factory that sends each formatted event as one syslog message.
struct SyslogSink {
    logger: Arc<Mutex<SyslogLogger>>,
}

impl SyslogSink {
    fn connect(address: &SyslogAddress, facility: &str) -> Result<Self> {
        let facility: Facility = facility.trim().parse().map_err(|_| {
            UpdaterError::Config(format!("Invalid syslog-facility {facility:?}."))
        })?;
        let formatter = Formatter3164 {
            facility,
            hostname: None,
            process: PROGRAM_NAME.to_string(),
            pid: std::process::id(),
        };

        let logger = match address {
            SyslogAddress::Socket(path) => syslog::unix_custom(formatter, path),
            SyslogAddress::Remote { host, port } => {
                syslog::udp(formatter, "0.0.0.0:0".to_string(), format!("{host}:{port}"))
            }
        }
        .map_err(|e| UpdaterError::LogSetup {
            path: address.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            logger: Arc::new(Mutex::new(logger)),
        })
    }

    fn line(&self, level: Level) -> SyslogLine {
        SyslogLine {
            logger: Arc::clone(&self.logger),
            level,
            buf: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for SyslogSink {
    type Writer = SyslogLine;

    fn make_writer(&'a self) -> Self::Writer {
        self.line(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.line(*meta.level())
    }
}

/// Buffers one formatted event and sends it when dropped.
struct SyslogLine {
    logger: Arc<Mutex<SyslogLogger>>,
    level: Level,
    buf: Vec<u8>,
}

impl Write for SyslogLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogLine {
    fn drop(&mut self) {
        let message = String::from_utf8_lossy(&self.buf);
        let message = message.trim_end();
        if message.is_empty() {
            return;
        }
        let Ok(mut logger) = self.logger.lock() else {
            return;
        };
        // A lost log line must not take the run down with it.
        let _ = match self.level {
            Level::ERROR => logger.err(message),
            Level::WARN => logger.warning(message),
            Level::INFO => logger.info(message),
            _ => logger.debug(message),
        };
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cacerts_core::{time::format_timestamp, Result, UpdaterError};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// Persists the instant of the last successful update as decimal seconds
/// since the Unix epoch, one value per file.
///
/// Both directions fail soft. A record that cannot be read means "never run",
/// which only makes the next update happen sooner; a record that cannot be
/// written has the same effect. Writes are not atomic and nothing guards
/// against two processes sharing the file.
#[derive(Debug, Clone)]
pub struct TimestampStore {
    path: PathBuf,
}

impl TimestampStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last successful run, or `None` if there is no usable record.
    pub fn load(&self) -> Option<DateTime<Utc>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No last run recorded");
                return None;
            }
            Err(e) => {
                let e = self.store_error(e);
                error!(code = e.code(), "Unable to load or parse timestamp: {e}");
                return None;
            }
        };
        match parse_timestamp(&content).map_err(|reason| self.store_error(reason)) {
            Ok(at) => {
                debug!("Last run at {}", format_timestamp(at));
                Some(at)
            }
            Err(e) => {
                error!(code = e.code(), "Unable to load or parse timestamp: {e}");
                None
            }
        }
    }

    /// Overwrite the record with `at`. Returns false (after logging) when the
    /// write fails.
    pub fn save(&self, at: DateTime<Utc>) -> bool {
        debug!("Writing new timestamp {}", format_timestamp(at));
        match self.write_record(at) {
            Ok(()) => true,
            Err(e) => {
                error!(code = e.code(), "Unable to save timestamp: {e}");
                false
            }
        }
    }

    fn write_record(&self, at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.store_error(e))?;
        }
        std::fs::write(&self.path, format_record(at)).map_err(|e| self.store_error(e))
    }

    fn store_error(&self, reason: impl ToString) -> UpdaterError {
        UpdaterError::Store {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// `1760875200.250000\n`: seconds with microsecond precision.
fn format_record(at: DateTime<Utc>) -> String {
    format!("{:.6}\n", at.timestamp_micros() as f64 / 1_000_000.0)
}

/// Parse the first line of a record. Integer seconds are accepted too.
fn parse_timestamp(content: &str) -> std::result::Result<DateTime<Utc>, String> {
    let line = content.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err("empty timestamp file".to_string());
    }
    let secs: f64 = line
        .parse()
        .map_err(|e| format!("invalid timestamp {line:?}: {e}"))?;
    if !secs.is_finite() {
        return Err(format!("invalid timestamp {line:?}: not a finite number"));
    }
    let micros = (secs * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(format!("timestamp {line:?} out of range"));
    }
    DateTime::from_timestamp_micros(micros as i64)
        .ok_or_else(|| format!("timestamp {line:?} out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap() + TimeDelta::microseconds(250_123)
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TimestampStore::new(dir.path().join("lastrun"));

        assert!(store.save(sample()));
        assert_eq!(store.load(), Some(sample()));

        let later = sample() + TimeDelta::hours(30);
        assert!(store.save(later));
        assert_eq!(store.load(), Some(later));
    }

    #[test]
    fn missing_file_is_never_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TimestampStore::new(dir.path().join("lastrun"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn garbage_is_never_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lastrun");
        let store = TimestampStore::new(&path);

        for content in ["", "\n", "yesterday\n", "nan\n", "inf\n", "1e400\n"] {
            std::fs::write(&path, content).expect("write");
            assert_eq!(store.load(), None, "content {content:?}");
        }
    }

    #[test]
    fn unreadable_record_is_never_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lastrun");
        // Reading a directory fails with something other than NotFound.
        std::fs::create_dir(&path).expect("mkdir");

        let store = TimestampStore::new(&path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn integer_seconds_from_older_records_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lastrun");
        std::fs::write(&path, "1760875200\n\n").expect("write");

        let store = TimestampStore::new(&path);
        assert_eq!(store.load(), DateTime::from_timestamp(1_760_875_200, 0));
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TimestampStore::new(dir.path().join("var/lib/lastrun"));
        assert!(store.save(sample()));
        assert_eq!(store.load(), Some(sample()));
    }

    #[test]
    fn unwritable_location_reports_false() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("lastrun");
        std::fs::create_dir(&path).expect("mkdir");

        let store = TimestampStore::new(&path);
        assert!(!store.save(sample()));
    }

    #[test]
    fn record_format_is_decimal_seconds() {
        assert_eq!(format_record(sample()), "1792411200.250123\n");
    }
}

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use capsense_payload::SensorPayload;
use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Unable to open reading log {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to write reading log")]
    Write(#[source] std::io::Error),
}

/// Append-only, human readable log of sensor readings, one line per
/// entry
#[derive(Debug, Clone)]
pub struct ReadingLog {
    path: PathBuf,
}

impl ReadingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for `reading`, stamped with `at`. The file is
    /// created if missing and never truncated.
    pub fn append(&self, reading: &SensorPayload, at: DateTime<Local>) -> Result<(), LogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open {
                path: self.path.clone(),
                source,
            })?;

        writeln!(file, "{}", Self::format_line(reading, at)).map_err(LogError::Write)
    }

    pub fn format_line(reading: &SensorPayload, at: DateTime<Local>) -> String {
        format!(
            "Timestamp: {} capacitance={:.3} units={} sensor_time_ms={} ct_success={} ct_errors={}",
            at.format("%a %b %e %H:%M:%S %Y"),
            reading.capacitance,
            reading.units_str(),
            reading.sensor_time,
            reading.ct_success,
            reading.ct_errors,
        )
    }
}

/// Decides when the next reading gets logged: strictly more than one
/// interval after the last logged one
#[derive(Debug, Clone, Copy)]
pub struct LogSchedule {
    interval: Duration,
    last: DateTime<Local>,
}

impl LogSchedule {
    pub fn new(interval: Duration, start: DateTime<Local>) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn due(&self, now: DateTime<Local>) -> bool {
        matches!((now - self.last).to_std(), Ok(elapsed) if elapsed > self.interval)
    }

    pub fn mark(&mut self, now: DateTime<Local>) {
        self.last = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsense_payload::text::fixed_text;
    use chrono::TimeZone;

    fn reading() -> SensorPayload {
        SensorPayload {
            capacitance: 150.5,
            sensor_time: 2_950,
            ct_success: 12,
            ct_errors: 1,
            units: fixed_text("pF"),
            status_text: fixed_text("OK"),
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 9, 25, 14, 3, 7).unwrap()
    }

    #[test]
    fn line_format() {
        assert_eq!(
            ReadingLog::format_line(&reading(), at()),
            "Timestamp: Mon Sep 25 14:03:07 2023 capacitance=150.500 units=pF \
             sensor_time_ms=2950 ct_success=12 ct_errors=1"
        );
    }

    #[test]
    fn append_adds_one_line_and_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.txt");
        std::fs::write(&path, "earlier entry\n").unwrap();

        let log = ReadingLog::new(&path);
        log.append(&reading(), at()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "earlier entry");
        assert!(lines[1].starts_with("Timestamp: Mon Sep 25 14:03:07 2023"));
        assert!(lines[1].contains("capacitance=150.500"));
        assert!(lines[1].contains("ct_success=12"));

        log.append(&reading(), at()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReadingLog::new(dir.path().join("new.txt"));
        log.append(&reading(), at()).unwrap();
        assert_eq!(std::fs::read_to_string(log.path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReadingLog::new(dir.path().join("missing").join("readings.txt"));
        assert!(matches!(
            log.append(&reading(), at()),
            Err(LogError::Open { .. })
        ));
    }

    #[test]
    fn schedule_waits_a_full_interval() {
        let start = at();
        let mut schedule = LogSchedule::new(Duration::from_secs(3600), start);
        assert!(!schedule.due(start));
        assert!(!schedule.due(start + chrono::Duration::seconds(3600)));
        assert!(schedule.due(start + chrono::Duration::seconds(3601)));

        let later = start + chrono::Duration::seconds(4000);
        schedule.mark(later);
        assert!(!schedule.due(later + chrono::Duration::seconds(10)));
        // clock stepped backwards
        assert!(!schedule.due(start));
    }
}

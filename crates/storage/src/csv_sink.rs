//! CSV File Sink

use crate::sink::{PersistenceSink, RejectedSampleRecord};
use crate::StorageError;
use sample_validator::{Field, Sample};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Header of the accepted-sample session file
pub const SESSION_HEADER: [&str; 6] = [
    "LinearAccelerationX",
    "LinearAccelerationY",
    "LinearAccelerationZ",
    "WindSpeed",
    "WindAngle",
    "Time",
];

/// Header of the reject log
pub const REJECT_HEADER: [&str; 7] = [
    "LinearAccelerationX",
    "LinearAccelerationY",
    "LinearAccelerationZ",
    "WindSpeed",
    "WindAngle",
    "Time",
    "ReasonReject",
];

/// Marker written in the first column when no sample was received
const NULL_SAMPLE: &str = "NULL_SAMPLE";

/// Writes the session file once at session end and streams rejects as they arrive
pub struct CsvSink {
    /// Accepted-sample file
    session_path: PathBuf,
    /// Reject log
    rejects_path: PathBuf,
    /// Open reject log for the current session
    rejects: Mutex<Option<csv::Writer<File>>>,
}

impl CsvSink {
    /// Create a sink writing to the given paths
    pub fn new(session_path: impl Into<PathBuf>, rejects_path: impl Into<PathBuf>) -> Self {
        let session_path = session_path.into();
        let rejects_path = rejects_path.into();
        info!(
            "Creating CSV sink: session={}, rejects={}",
            session_path.display(),
            rejects_path.display()
        );
        Self {
            session_path,
            rejects_path,
            rejects: Mutex::new(None),
        }
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn rejects_path(&self) -> &Path {
        &self.rejects_path
    }

    fn lock_rejects(&self) -> Result<MutexGuard<'_, Option<csv::Writer<File>>>, StorageError> {
        self.rejects
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))
    }

    fn open_rejects(&self) -> Result<csv::Writer<File>, StorageError> {
        let mut writer = csv::Writer::from_path(&self.rejects_path)?;
        writer.write_record(REJECT_HEADER)?;
        writer.flush()?;
        Ok(writer)
    }
}

impl PersistenceSink for CsvSink {
    fn begin_session(&self) -> Result<(), StorageError> {
        let mut rejects = self.lock_rejects()?;
        *rejects = Some(self.open_rejects()?);
        debug!("Reject log truncated: {}", self.rejects_path.display());
        Ok(())
    }

    fn record_reject(&self, record: &RejectedSampleRecord) -> Result<(), StorageError> {
        let mut rejects = self.lock_rejects()?;
        if rejects.is_none() {
            *rejects = Some(self.open_rejects()?);
        }
        let Some(writer) = rejects.as_mut() else {
            return Err(StorageError::Unavailable("reject log not open".to_string()));
        };

        let mut row: Vec<String> = match &record.sample {
            Some(raw) => Field::ALL
                .iter()
                .map(|field| raw.get(*field).map(|v| v.to_string()).unwrap_or_default())
                .collect(),
            None => {
                let mut row = vec![String::new(); Field::ALL.len()];
                row[0] = NULL_SAMPLE.to_string();
                row
            }
        };
        row.push(record.reason.clone());

        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }

    fn flush_session(&self, samples: &[Sample]) -> Result<(), StorageError> {
        let mut writer = csv::Writer::from_path(&self.session_path)?;
        writer.write_record(SESSION_HEADER)?;
        for sample in samples {
            writer.write_record(Field::ALL.iter().map(|f| sample.value(*f).to_string()))?;
        }
        writer.flush()?;
        info!(
            "Wrote {} accepted samples to {}",
            samples.len(),
            self.session_path.display()
        );

        // the reject log is closed with the session
        if let Some(mut rejects) = self.lock_rejects()?.take() {
            rejects.flush()?;
        }
        Ok(())
    }
}

/// Read a session file written by [`CsvSink::flush_session`]
pub fn read_session_file(path: impl AsRef<Path>) -> Result<Vec<Sample>, StorageError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != SESSION_HEADER.len() {
            return Err(StorageError::MalformedRecord {
                line,
                reason: format!("expected {} columns, got {}", SESSION_HEADER.len(), record.len()),
            });
        }

        let mut values = [0.0f64; 6];
        for (slot, cell) in values.iter_mut().zip(record.iter()) {
            *slot = cell.trim().parse().map_err(|e| StorageError::MalformedRecord {
                line,
                reason: format!("'{}': {}", cell, e),
            })?;
        }
        let [ax, ay, az, ws, wa, t] = values;
        samples.push(Sample::new(ax, ay, az, ws, wa, t));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_validator::RawSample;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(0.1, -0.25, 9.81, 3.5, 200.0, 0.0),
            Sample::new(0.123456789, 0.0, 10.0, 4.0, 359.5, 0.5),
            Sample::new(-1.0, 1.0, -12.0, 0.001, 150.0, 100.0),
        ]
    }

    #[test]
    fn test_session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("session.csv"), dir.path().join("rejects.csv"));

        sink.begin_session().unwrap();
        sink.flush_session(&samples()).unwrap();

        let read = read_session_file(sink.session_path()).unwrap();
        assert_eq!(read.len(), 3);
        for (a, b) in read.iter().zip(samples()) {
            for field in Field::ALL {
                assert!((a.value(field) - b.value(field)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_session_file_header() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("session.csv"), dir.path().join("rejects.csv"));
        sink.flush_session(&samples()[..1]).unwrap();

        let text = std::fs::read_to_string(sink.session_path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("LinearAccelerationX,LinearAccelerationY,LinearAccelerationZ,WindSpeed,WindAngle,Time")
        );
        assert_eq!(lines.next(), Some("0.1,-0.25,9.81,3.5,200,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_reject_log() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("session.csv"), dir.path().join("rejects.csv"));
        sink.begin_session().unwrap();

        let partial = RawSample {
            time: None,
            ..RawSample::from(samples()[0])
        };
        sink.record_reject(&RejectedSampleRecord::new(Some(partial), "Missing required field: Time"))
            .unwrap();
        sink.record_reject(&RejectedSampleRecord::new(None, "Sample is missing"))
            .unwrap();

        let text = std::fs::read_to_string(sink.rejects_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(",Time,ReasonReject"));
        assert_eq!(lines[1], "0.1,-0.25,9.81,3.5,200,,Missing required field: Time");
        assert_eq!(lines[2], "NULL_SAMPLE,,,,,,Sample is missing");
    }

    #[test]
    fn test_begin_session_truncates_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("session.csv"), dir.path().join("rejects.csv"));
        sink.begin_session().unwrap();
        sink.record_reject(&RejectedSampleRecord::from_sample(&samples()[0], "band"))
            .unwrap();
        sink.flush_session(&[]).unwrap();

        sink.begin_session().unwrap();
        let text = std::fs::read_to_string(sink.rejects_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_flush_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(
            dir.path().join("missing").join("session.csv"),
            dir.path().join("rejects.csv"),
        );
        assert!(sink.flush_session(&samples()).is_err());
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "LinearAccelerationX,LinearAccelerationY,LinearAccelerationZ,WindSpeed,WindAngle,Time\n0.1,abc,9.8,3,200,1\n").unwrap();
        assert!(matches!(
            read_session_file(&path),
            Err(StorageError::MalformedRecord { .. })
        ));
    }
}

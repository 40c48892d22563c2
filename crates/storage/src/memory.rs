//! In-Memory Sink

use crate::sink::{PersistenceSink, RejectedSampleRecord};
use crate::StorageError;
use sample_validator::Sample;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Sink keeping everything in memory
pub struct MemorySink {
    /// Flushed sessions, oldest first
    sessions: Mutex<Vec<Vec<Sample>>>,
    /// Reject log (bounded)
    rejects: Mutex<VecDeque<RejectedSampleRecord>>,
    /// Max reject records kept
    max_reject_records: usize,
    /// When set, every flush fails
    fail_flushes: AtomicBool,
}

impl MemorySink {
    /// Create a new in-memory sink
    pub fn new() -> Self {
        info!("Creating in-memory sink");
        Self {
            sessions: Mutex::new(Vec::new()),
            rejects: Mutex::new(VecDeque::with_capacity(1000)),
            max_reject_records: 10_000,
            fail_flushes: AtomicBool::new(false),
        }
    }

    /// Make subsequent flushes fail (or succeed again)
    pub fn set_fail_flushes(&self, fail: bool) {
        self.fail_flushes.store(fail, Ordering::SeqCst);
    }

    /// All flushed sessions
    pub fn sessions(&self) -> Vec<Vec<Sample>> {
        self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Samples of the most recently flushed session
    pub fn last_session(&self) -> Option<Vec<Sample>> {
        self.sessions.lock().ok().and_then(|s| s.last().cloned())
    }

    /// Reject log, oldest first
    pub fn rejects(&self) -> Vec<RejectedSampleRecord> {
        self.rejects
            .lock()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn reject_count(&self) -> usize {
        self.rejects.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl PersistenceSink for MemorySink {
    fn record_reject(&self, record: &RejectedSampleRecord) -> Result<(), StorageError> {
        let mut rejects = self
            .rejects
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;

        // Enforce retention
        while rejects.len() >= self.max_reject_records {
            rejects.pop_front();
        }

        rejects.push_back(record.clone());
        Ok(())
    }

    fn flush_session(&self, samples: &[Sample]) -> Result<(), StorageError> {
        if self.fail_flushes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("flush disabled".to_string()));
        }

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;
        sessions.push(samples.to_vec());
        debug!("Stored session #{} with {} samples", sessions.len(), samples.len());
        Ok(())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

//! Persistence Sink Interface

use crate::StorageError;
use sample_validator::{RawSample, Sample};
use serde::{Deserialize, Serialize};

/// A rejected sample as received, plus the reason it was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSampleRecord {
    /// Field values as received; `None` when no sample was sent at all
    pub sample: Option<RawSample>,
    /// Human-readable rejection reason
    pub reason: String,
}

impl RejectedSampleRecord {
    pub fn new(sample: Option<RawSample>, reason: impl Into<String>) -> Self {
        Self {
            sample,
            reason: reason.into(),
        }
    }

    /// Record for a structurally complete sample
    pub fn from_sample(sample: &Sample, reason: impl Into<String>) -> Self {
        Self::new(Some(RawSample::from(*sample)), reason)
    }
}

/// Durable storage for session output
///
/// Implementations are shared behind `Arc` and must be safe to call from
/// whichever thread holds the session lock.
pub trait PersistenceSink: Send + Sync {
    /// Called when a session starts
    fn begin_session(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Append one rejected sample to the reject log
    fn record_reject(&self, record: &RejectedSampleRecord) -> Result<(), StorageError>;

    /// Write the accepted samples of a finished session, in arrival order
    fn flush_session(&self, samples: &[Sample]) -> Result<(), StorageError>;
}

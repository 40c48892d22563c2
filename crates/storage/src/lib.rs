//! Storage Layer
//!
//! Persistence sinks for finalized session samples and the reject log.

mod csv_sink;
mod memory;
mod sink;

pub use csv_sink::{read_session_file, CsvSink, REJECT_HEADER, SESSION_HEADER};
pub use memory::MemorySink;
pub use sink::{PersistenceSink, RejectedSampleRecord};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

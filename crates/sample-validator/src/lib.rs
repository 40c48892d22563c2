//! Telemetry Sample Validation
//!
//! Provides the drone telemetry sample types, structural (wire-shape) checks,
//! finiteness checks, and static physical range validation.

mod error;
mod sample;
mod validator;

pub use error::ValidationError;
pub use sample::{Field, RawMeta, RawSample, Sample, SessionMeta};
pub use validator::{BoundsConfig, TimePolicy, Validator};

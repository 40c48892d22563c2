//! Adaptive Threshold Tracking
//!
//! Maintains running per-field means over the samples accepted in a session
//! and decides whether a new sample falls inside the acceptance band.

mod statistics;
mod tracker;

pub use statistics::RunningMean;
pub use tracker::{AdaptiveThresholdTracker, BandPolicy, BandRule, BandViolation, BAND_FIELDS};

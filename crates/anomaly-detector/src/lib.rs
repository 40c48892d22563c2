//! Anomaly Detection
//!
//! Advisory, non-blocking checks over accepted samples: acceleration spikes,
//! out-of-band acceleration norms, and excessive lateral wind effect.

mod detector;
mod warning;

pub use detector::{AnomalyConfig, AnomalyDetector};
pub use warning::{Direction, Warning};

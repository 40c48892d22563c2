//! Anomaly Detector Implementation

use crate::warning::{Direction, Warning};
use sample_validator::Sample;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Anomaly detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Max change in acceleration norm between consecutive samples (A_threshold)
    pub acceleration_threshold: f64,
    /// Max lateral wind effect (W_threshold)
    pub wind_threshold: f64,
    /// Allowed deviation of the norm from its mean, in percent (ThresholdPercentage)
    pub threshold_percentage: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            acceleration_threshold: 2.0,
            wind_threshold: 10.0,
            threshold_percentage: 20.0,
        }
    }
}

/// Stateful cross-sample checks over accepted samples
pub struct AnomalyDetector {
    /// Configuration
    config: AnomalyConfig,
    /// Norm of the previous accepted sample
    previous_norm: Option<f64>,
    /// Every acceleration norm seen this session
    norm_history: Vec<f64>,
}

impl AnomalyDetector {
    /// Create a new detector
    pub fn new(config: AnomalyConfig) -> Self {
        info!("Creating anomaly detector with config: {:?}", config);
        Self {
            config,
            previous_norm: None,
            norm_history: Vec::new(),
        }
    }

    /// Inspect an accepted sample; warnings come back spike, out-of-band, wind
    pub fn inspect(&mut self, sample: &Sample) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let norm = sample.acceleration_norm();

        if let Some(warning) = self.check_spike(norm) {
            warnings.push(warning);
        }

        self.norm_history.push(norm);
        if let Some(warning) = self.check_out_of_band(norm) {
            warnings.push(warning);
        }

        if let Some(warning) = self.check_wind(sample) {
            warnings.push(warning);
        }

        self.previous_norm = Some(norm);
        if !warnings.is_empty() {
            debug!("Sample at t={} raised {} warning(s)", sample.time, warnings.len());
        }
        warnings
    }

    /// Mean of all acceleration norms seen this session
    pub fn mean_norm(&self) -> Option<f64> {
        if self.norm_history.is_empty() {
            None
        } else {
            Some(self.norm_history.iter().sum::<f64>() / self.norm_history.len() as f64)
        }
    }

    fn check_spike(&self, norm: f64) -> Option<Warning> {
        let previous = self.previous_norm?;
        let delta = norm - previous;
        if delta.abs() > self.config.acceleration_threshold {
            let direction = if delta > 0.0 {
                Direction::Above
            } else {
                Direction::Below
            };
            Some(Warning::AccelerationSpike { delta, direction })
        } else {
            None
        }
    }

    fn check_out_of_band(&self, norm: f64) -> Option<Warning> {
        let mean = self.mean_norm()?;
        let ratio = self.config.threshold_percentage / 100.0;
        let lower = mean * (1.0 - ratio);
        let upper = mean * (1.0 + ratio);

        let direction = if norm < lower {
            Direction::Below
        } else if norm > upper {
            Direction::Above
        } else {
            return None;
        };
        Some(Warning::OutOfBand {
            norm,
            mean,
            direction,
        })
    }

    fn check_wind(&self, sample: &Sample) -> Option<Warning> {
        let effect = sample.wind_effect();
        (effect > self.config.wind_threshold).then(|| Warning::WindEffect {
            effect,
            threshold: self.config.wind_threshold,
        })
    }
}

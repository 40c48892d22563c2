//! Adaptive Acceptance Band Tracker

use crate::statistics::RunningMean;
use sample_validator::{Field, Sample, SessionMeta};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Fields that must be in-band for a sample to be accepted, in check order
pub const BAND_FIELDS: [Field; 4] = [
    Field::WindSpeed,
    Field::LinearAccelerationX,
    Field::LinearAccelerationY,
    Field::LinearAccelerationZ,
];

/// How the percentage band and the absolute threshold combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandRule {
    /// In-band only if inside the percentage band AND within the absolute threshold
    Both,
    /// In-band if either condition holds
    Either,
}

/// Acceptance band policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandPolicy {
    /// Relative band half-width as a fraction of the mean (0.1 = 10%)
    pub percentage: f64,
    /// Maximum absolute deviation from the mean
    pub absolute_threshold: f64,
    /// Combination rule
    pub rule: BandRule,
}

impl Default for BandPolicy {
    fn default() -> Self {
        Self {
            percentage: 0.2,
            absolute_threshold: 5.0,
            rule: BandRule::Both,
        }
    }
}

impl BandPolicy {
    /// Percentage band around `mean`, ordered low to high
    pub fn band(&self, mean: f64) -> (f64, f64) {
        let lower = mean * (1.0 - self.percentage);
        let upper = mean * (1.0 + self.percentage);
        (lower.min(upper), lower.max(upper))
    }

    /// Whether `value` is acceptable around `mean`
    pub fn contains(&self, mean: f64, value: f64) -> bool {
        let (lower, upper) = self.band(mean);
        let in_percentage = value >= lower && value <= upper;
        let in_absolute = (value - mean).abs() <= self.absolute_threshold;

        match self.rule {
            BandRule::Both => in_percentage && in_absolute,
            BandRule::Either => in_percentage || in_absolute,
        }
    }
}

/// A field fell outside the acceptance band
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} value {value} is outside the acceptance band [{lower}, {upper}] (mean {mean}, max deviation {max_deviation})")]
pub struct BandViolation {
    pub field: Field,
    pub value: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub max_deviation: f64,
}

/// Per-session running means and band checks
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdTracker {
    policy: BandPolicy,
    /// Running means indexed like `Field::PHYSICAL`
    means: [RunningMean; 5],
}

impl AdaptiveThresholdTracker {
    /// Create a tracker seeded from session metadata
    pub fn new(policy: BandPolicy, seed: &SessionMeta) -> Self {
        let mut tracker = Self {
            policy,
            means: Default::default(),
        };
        tracker.reset(seed);
        tracker
    }

    /// Reseed all means and forget accepted samples
    pub fn reset(&mut self, seed: &SessionMeta) {
        for (mean, field) in self.means.iter_mut().zip(Field::PHYSICAL) {
            mean.reset(seed.value(field));
        }
    }

    /// Current mean of a physical field; time is not tracked
    pub fn mean(&self, field: Field) -> Option<f64> {
        Self::index(field).map(|i| self.means[i].mean())
    }

    /// Number of samples folded in since the last reset
    pub fn count(&self) -> usize {
        self.means[0].count()
    }

    /// Check a candidate sample against the current band
    pub fn check(&self, sample: &Sample) -> Result<(), BandViolation> {
        for field in BAND_FIELDS {
            let Some(mean) = self.mean(field) else {
                continue;
            };
            let value = sample.value(field);
            if !self.policy.contains(mean, value) {
                let (lower, upper) = self.policy.band(mean);
                debug!("{} = {} outside band around mean {}", field, value, mean);
                return Err(BandViolation {
                    field,
                    value,
                    mean,
                    lower,
                    upper,
                    max_deviation: self.policy.absolute_threshold,
                });
            }
        }
        Ok(())
    }

    /// Fold an accepted sample into the running means
    pub fn record(&mut self, sample: &Sample) {
        for (mean, field) in self.means.iter_mut().zip(Field::PHYSICAL) {
            mean.record(sample.value(field));
        }
    }

    fn index(field: Field) -> Option<usize> {
        Field::PHYSICAL.iter().position(|f| *f == field)
    }
}

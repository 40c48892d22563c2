//! Advisory Warnings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a deviation relative to what was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => f.write_str("above expected"),
            Direction::Below => f.write_str("below expected"),
        }
    }
}

/// Advisory warning raised for an accepted sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Acceleration norm jumped relative to the previous accepted sample
    AccelerationSpike { delta: f64, direction: Direction },

    /// Acceleration norm left the band around its session mean
    OutOfBand {
        norm: f64,
        mean: f64,
        direction: Direction,
    },

    /// Lateral wind effect exceeded the threshold
    WindEffect { effect: f64, threshold: f64 },
}

impl Warning {
    /// Short label used for log fields
    pub fn label(&self) -> &'static str {
        match self {
            Warning::AccelerationSpike { .. } => "acceleration_spike",
            Warning::OutOfBand { .. } => "out_of_band",
            Warning::WindEffect { .. } => "wind_effect",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AccelerationSpike { delta, direction } => {
                write!(f, "[Acceleration Spike] dA={:.2}, direction: {}", delta, direction)
            }
            Warning::OutOfBand {
                norm,
                mean,
                direction,
            } => write!(
                f,
                "[Out Of Bound Warning] A={:.2}, Amean={:.2}, direction: {}",
                norm, mean, direction
            ),
            Warning::WindEffect { effect, threshold } => write!(
                f,
                "[Wind Spike] Weffect={:.2} exceeds {:.2}, direction: {}",
                effect,
                threshold,
                Direction::Above
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let warning = Warning::AccelerationSpike {
            delta: -2.5,
            direction: Direction::Below,
        };
        assert_eq!(
            warning.to_string(),
            "[Acceleration Spike] dA=-2.50, direction: below expected"
        );
    }

    #[test]
    fn test_serialized_tag() {
        let warning = Warning::WindEffect {
            effect: 12.0,
            threshold: 10.0,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "wind_effect");
        assert_eq!(warning.label(), "wind_effect");
    }
}

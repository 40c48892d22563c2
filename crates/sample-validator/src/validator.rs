//! Sample Validator for Structural and Range Checking

use crate::error::ValidationError;
use crate::sample::{Field, RawMeta, RawSample, Sample, SessionMeta};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Static physical bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Linear acceleration X valid range
    pub accel_x_range: (f64, f64),
    /// Linear acceleration Y valid range
    pub accel_y_range: (f64, f64),
    /// Linear acceleration Z valid range
    pub accel_z_range: (f64, f64),
    /// Wind speed must be strictly greater than this
    pub wind_speed_min: f64,
    /// Wind angle valid range (degrees)
    pub wind_angle_range: (f64, f64),
    /// Time valid range (seconds)
    pub time_range: (f64, f64),
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            accel_x_range: (-1.0, 1.0),
            accel_y_range: (-1.0, 1.0),
            accel_z_range: (-12.0, 15.0),
            wind_speed_min: 0.0,
            wind_angle_range: (150.0, 360.0),
            time_range: (0.0, 100.0),
        }
    }
}

impl BoundsConfig {
    /// Bounds applied to session metadata (full compass for wind angle)
    pub fn meta() -> Self {
        Self {
            wind_angle_range: (0.0, 360.0),
            ..Default::default()
        }
    }

    /// Deserialize a possibly partial section on top of [`BoundsConfig::meta`]
    pub fn deserialize_meta<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = BoundsOverrides::deserialize(deserializer)?;
        Ok(overrides.apply(Self::meta()))
    }
}

/// Bounds section where every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BoundsOverrides {
    accel_x_range: Option<(f64, f64)>,
    accel_y_range: Option<(f64, f64)>,
    accel_z_range: Option<(f64, f64)>,
    wind_speed_min: Option<f64>,
    wind_angle_range: Option<(f64, f64)>,
    time_range: Option<(f64, f64)>,
}

impl BoundsOverrides {
    fn apply(self, base: BoundsConfig) -> BoundsConfig {
        BoundsConfig {
            accel_x_range: self.accel_x_range.unwrap_or(base.accel_x_range),
            accel_y_range: self.accel_y_range.unwrap_or(base.accel_y_range),
            accel_z_range: self.accel_z_range.unwrap_or(base.accel_z_range),
            wind_speed_min: self.wind_speed_min.unwrap_or(base.wind_speed_min),
            wind_angle_range: self.wind_angle_range.unwrap_or(base.wind_angle_range),
            time_range: self.time_range.unwrap_or(base.time_range),
        }
    }
}

/// Which time checks are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimePolicy {
    /// Check time against `BoundsConfig::time_range`
    pub check_range: bool,
    /// Require time to strictly increase across accepted samples
    pub require_monotonic: bool,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            check_range: true,
            require_monotonic: false,
        }
    }
}

/// Stateless validator for drone telemetry samples
#[derive(Debug, Clone, Default)]
pub struct Validator {
    bounds: BoundsConfig,
    meta_bounds: BoundsConfig,
    time_policy: TimePolicy,
}

impl Validator {
    /// Create a new validator
    pub fn new(bounds: BoundsConfig, meta_bounds: BoundsConfig, time_policy: TimePolicy) -> Self {
        Self {
            bounds,
            meta_bounds,
            time_policy,
        }
    }

    /// Turn a wire sample into a complete one, or report the first missing piece
    pub fn parse_sample(&self, raw: Option<&RawSample>) -> Result<Sample, ValidationError> {
        let raw = raw.ok_or(ValidationError::MissingSample)?;
        let require = |field: Field| raw.get(field).ok_or(ValidationError::MissingField(field));

        Ok(Sample::new(
            require(Field::LinearAccelerationX)?,
            require(Field::LinearAccelerationY)?,
            require(Field::LinearAccelerationZ)?,
            require(Field::WindSpeed)?,
            require(Field::WindAngle)?,
            require(Field::Time)?,
        ))
    }

    /// Turn wire metadata into `SessionMeta`; time may be omitted and defaults to 0
    pub fn parse_meta(&self, raw: Option<&RawMeta>) -> Result<SessionMeta, ValidationError> {
        let raw = raw.ok_or(ValidationError::MissingSample)?;
        let require = |field: Field| raw.get(field).ok_or(ValidationError::MissingField(field));

        Ok(SessionMeta::new(
            require(Field::LinearAccelerationX)?,
            require(Field::LinearAccelerationY)?,
            require(Field::LinearAccelerationZ)?,
            require(Field::WindSpeed)?,
            require(Field::WindAngle)?,
            raw.time.unwrap_or(0.0),
        ))
    }

    /// Validate a sample: finiteness of every field, then static bounds
    pub fn validate(&self, sample: &Sample) -> Result<(), ValidationError> {
        for field in Field::ALL {
            self.validate_finite(field, sample.value(field))?;
        }

        let fields: &[Field] = if self.time_policy.check_range {
            &Field::ALL
        } else {
            &Field::PHYSICAL
        };
        for &field in fields {
            self.validate_field(&self.bounds, field, sample.value(field))?;
        }

        Ok(())
    }

    /// Validate session metadata against the meta bounds (time is not range checked)
    pub fn validate_meta(&self, meta: &SessionMeta) -> Result<(), ValidationError> {
        for field in Field::ALL {
            self.validate_finite(field, meta.value(field))?;
        }
        for field in Field::PHYSICAL {
            self.validate_field(&self.meta_bounds, field, meta.value(field))?;
        }
        Ok(())
    }

    /// Check that time advanced past the previous accepted sample
    ///
    /// No-op unless `TimePolicy::require_monotonic` is set.
    pub fn validate_time_order(
        &self,
        previous: Option<f64>,
        sample: &Sample,
    ) -> Result<(), ValidationError> {
        if !self.time_policy.require_monotonic {
            return Ok(());
        }
        match previous {
            Some(previous) if sample.time <= previous => {
                debug!("Time went from {} to {}", previous, sample.time);
                Err(ValidationError::TimeNotIncreasing {
                    previous,
                    value: sample.time,
                })
            }
            _ => Ok(()),
        }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: Field,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn validate_finite(&self, field: Field, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NonFinite(field))
        }
    }

    fn validate_field(
        &self,
        bounds: &BoundsConfig,
        field: Field,
        value: f64,
    ) -> Result<(), ValidationError> {
        match field {
            Field::LinearAccelerationX => self.validate_range(field, value, bounds.accel_x_range),
            Field::LinearAccelerationY => self.validate_range(field, value, bounds.accel_y_range),
            Field::LinearAccelerationZ => self.validate_range(field, value, bounds.accel_z_range),
            Field::WindSpeed if value <= bounds.wind_speed_min => {
                Err(ValidationError::TooLow {
                    field,
                    value,
                    min: bounds.wind_speed_min,
                })
            }
            Field::WindSpeed => Ok(()),
            Field::WindAngle => self.validate_range(field, value, bounds.wind_angle_range),
            Field::Time => self.validate_range(field, value, bounds.time_range),
        }
    }
}

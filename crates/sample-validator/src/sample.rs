//! Telemetry Sample Types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Telemetry field identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LinearAccelerationX,
    LinearAccelerationY,
    LinearAccelerationZ,
    WindSpeed,
    WindAngle,
    Time,
}

impl Field {
    /// All fields in record order
    pub const ALL: [Field; 6] = [
        Field::LinearAccelerationX,
        Field::LinearAccelerationY,
        Field::LinearAccelerationZ,
        Field::WindSpeed,
        Field::WindAngle,
        Field::Time,
    ];

    /// The five physical fields (everything except time)
    pub const PHYSICAL: [Field; 5] = [
        Field::LinearAccelerationX,
        Field::LinearAccelerationY,
        Field::LinearAccelerationZ,
        Field::WindSpeed,
        Field::WindAngle,
    ];

    /// Column name used in persisted session files
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::LinearAccelerationX => "LinearAccelerationX",
            Field::LinearAccelerationY => "LinearAccelerationY",
            Field::LinearAccelerationZ => "LinearAccelerationZ",
            Field::WindSpeed => "WindSpeed",
            Field::WindAngle => "WindAngle",
            Field::Time => "Time",
        }
    }

    /// Name used on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            Field::LinearAccelerationX => "linear_acceleration_x",
            Field::LinearAccelerationY => "linear_acceleration_y",
            Field::LinearAccelerationZ => "linear_acceleration_z",
            Field::WindSpeed => "wind_speed",
            Field::WindAngle => "wind_angle",
            Field::Time => "time",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A single, structurally complete telemetry reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// Linear acceleration X
    #[serde(rename = "linear_acceleration_x")]
    pub accel_x: f64,
    /// Linear acceleration Y
    #[serde(rename = "linear_acceleration_y")]
    pub accel_y: f64,
    /// Linear acceleration Z
    #[serde(rename = "linear_acceleration_z")]
    pub accel_z: f64,
    /// Wind speed
    pub wind_speed: f64,
    /// Wind angle (degrees)
    pub wind_angle: f64,
    /// Session clock (seconds)
    pub time: f64,
}

impl Sample {
    pub fn new(
        accel_x: f64,
        accel_y: f64,
        accel_z: f64,
        wind_speed: f64,
        wind_angle: f64,
        time: f64,
    ) -> Self {
        Self {
            accel_x,
            accel_y,
            accel_z,
            wind_speed,
            wind_angle,
            time,
        }
    }

    /// Value of a single field
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::LinearAccelerationX => self.accel_x,
            Field::LinearAccelerationY => self.accel_y,
            Field::LinearAccelerationZ => self.accel_z,
            Field::WindSpeed => self.wind_speed,
            Field::WindAngle => self.wind_angle,
            Field::Time => self.time,
        }
    }

    /// Euclidean norm of the acceleration vector
    pub fn acceleration_norm(&self) -> f64 {
        (self.accel_x * self.accel_x + self.accel_y * self.accel_y + self.accel_z * self.accel_z)
            .sqrt()
    }

    /// Lateral wind effect: |speed * sin(angle)|
    pub fn wind_effect(&self) -> f64 {
        (self.wind_speed * self.wind_angle.to_radians().sin()).abs()
    }
}

/// Session metadata used to seed rolling statistics
///
/// Same shape as [`Sample`]; only the five physical fields are validated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(rename = "linear_acceleration_x")]
    pub accel_x: f64,
    #[serde(rename = "linear_acceleration_y")]
    pub accel_y: f64,
    #[serde(rename = "linear_acceleration_z")]
    pub accel_z: f64,
    pub wind_speed: f64,
    pub wind_angle: f64,
    pub time: f64,
}

impl SessionMeta {
    pub fn new(
        accel_x: f64,
        accel_y: f64,
        accel_z: f64,
        wind_speed: f64,
        wind_angle: f64,
        time: f64,
    ) -> Self {
        Self {
            accel_x,
            accel_y,
            accel_z,
            wind_speed,
            wind_angle,
            time,
        }
    }

    /// View the metadata as a sample (for statistics seeding)
    pub fn as_sample(&self) -> Sample {
        Sample::new(
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.wind_speed,
            self.wind_angle,
            self.time,
        )
    }

    pub fn value(&self, field: Field) -> f64 {
        self.as_sample().value(field)
    }
}

/// Wire shape of a sample: every field may be absent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub linear_acceleration_x: Option<f64>,
    #[serde(default)]
    pub linear_acceleration_y: Option<f64>,
    #[serde(default)]
    pub linear_acceleration_z: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_angle: Option<f64>,
    #[serde(default)]
    pub time: Option<f64>,
}

/// Wire shape of session metadata
pub type RawMeta = RawSample;

impl RawSample {
    /// Value of a single field, if present
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::LinearAccelerationX => self.linear_acceleration_x,
            Field::LinearAccelerationY => self.linear_acceleration_y,
            Field::LinearAccelerationZ => self.linear_acceleration_z,
            Field::WindSpeed => self.wind_speed,
            Field::WindAngle => self.wind_angle,
            Field::Time => self.time,
        }
    }
}

impl From<Sample> for RawSample {
    fn from(sample: Sample) -> Self {
        Self {
            linear_acceleration_x: Some(sample.accel_x),
            linear_acceleration_y: Some(sample.accel_y),
            linear_acceleration_z: Some(sample.accel_z),
            wind_speed: Some(sample.wind_speed),
            wind_angle: Some(sample.wind_angle),
            time: Some(sample.time),
        }
    }
}

impl From<SessionMeta> for RawMeta {
    fn from(meta: SessionMeta) -> Self {
        meta.as_sample().into()
    }
}

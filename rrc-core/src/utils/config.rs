//! Startup configuration for the joystick mapping layer.
//!
//! The configuration is read once when the dispatcher is built and never changes
//! afterwards. It deserializes from the same camelCase object the browser client
//! keeps (`{"deadZone": 10, "maxSpeed": 255, ...}`); missing fields fall back to
//! the defaults below.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Joystick deflection (per axis, out of 100) treated as centered.
pub const DEFAULT_DEAD_ZONE: i32 = 10;
/// Motor speed produced at full deflection.
pub const DEFAULT_MAX_SPEED: i32 = 255;
/// Degrees an incremental servo step moves at full deflection.
pub const DEFAULT_SERVO_STEP: i32 = 5;
/// Minimum spacing between two dispatched samples.
pub const DEFAULT_MIN_SEND_INTERVAL_MS: u64 = 100;
/// Pointer travel (px) that maps to full deflection.
pub const DEFAULT_POINTER_RADIUS: f32 = 70.0;

/// Errors raised while loading a [`JoystickConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    OutOfRange { field: &'static str, value: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid configuration: {e}"),
            ConfigError::OutOfRange { field, value } => {
                write!(f, "configuration field `{field}` out of range: {value}")
            }
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Tuning constants for the mapping layer and dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoystickConfig {
    pub dead_zone: i32,
    pub max_speed: i32,
    pub servo_step: i32,
    pub min_send_interval_ms: u64,
    pub pointer_radius: f32,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            max_speed: DEFAULT_MAX_SPEED,
            servo_step: DEFAULT_SERVO_STEP,
            min_send_interval_ms: DEFAULT_MIN_SEND_INTERVAL_MS,
            pointer_radius: DEFAULT_POINTER_RADIUS,
        }
    }
}

impl JoystickConfig {
    /// Parse a JSON configuration object and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: JoystickConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against the range the mapping layer can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn within(
            field: &'static str,
            value: i64,
            lo: i64,
            hi: i64,
        ) -> Result<(), ConfigError> {
            if value < lo || value > hi {
                Err(ConfigError::OutOfRange { field, value })
            } else {
                Ok(())
            }
        }

        within("deadZone", self.dead_zone as i64, 0, 100)?;
        within("maxSpeed", self.max_speed as i64, 0, 255)?;
        within("servoStep", self.servo_step as i64, 0, 180)?;
        if !(self.pointer_radius > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "pointerRadius",
                value: self.pointer_radius as i64,
            });
        }
        Ok(())
    }

    pub fn min_send_interval(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self.min_send_interval_ms)
    }
}

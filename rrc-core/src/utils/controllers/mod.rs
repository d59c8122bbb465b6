//! Module Exports
//!
//! Command types and the input dispatch loop for the rover.
//!
//! - `motors`: motor identifiers and `MotorCommand`
//! - `servos`: servo poses, partial servo commands and per-servo requests
//! - `joystick`: joystick coordinates, pointer normalization and input events
//! - `dispatch`: the rate-limited, deduplicating dispatch loop

pub mod dispatch;
pub mod joystick;
pub mod motors;
pub mod servos;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use dispatch::{Dispatch, DispatchState, Dispatcher, Outcome, Readout};
pub use joystick::{normalize_pointer, InputEvent, JoystickCoordinate};
pub use motors::{MotorCommand, MotorId};
pub use servos::{ServoAngles, ServoCommand, ServoRequest};

/// Algorithm the dispatcher applies to each accepted sample.
///
/// Changes only through an explicit mode selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// Tank drive on the motors.
    #[default]
    Drive,
    /// Absolute steering on the servos, deduplicated.
    Servo,
    /// Steering servos plus a throttle broadcast to every motor.
    Mixed,
    /// Synchronous drive: every motor follows the throttle.
    Sync,
    /// Turn-in-place drive.
    Spin,
    /// Holonomic drive without rotation.
    Omni,
}

impl DriveMode {
    /// Whether the mode writes servos (and is therefore subject to dedup).
    pub fn uses_servos(self) -> bool {
        matches!(self, DriveMode::Servo | DriveMode::Mixed)
    }
}

impl fmt::Display for DriveMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            DriveMode::Drive => "drive",
            DriveMode::Servo => "servo",
            DriveMode::Mixed => "mixed",
            DriveMode::Sync => "sync",
            DriveMode::Spin => "spin",
            DriveMode::Omni => "omni",
        };
        f.write_str(name)
    }
}

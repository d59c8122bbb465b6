//! Servo pose and command types.
//!
//! The rover carries four servos: 0 and 1 steer horizontally, 2 and 3 tilt
//! vertically. A [`ServoAngles`] is a complete pose; a [`ServoCommand`] names only
//! the servos that should be written and turns into one [`ServoRequest`] per servo.

use serde::{Deserialize, Serialize};

pub const SERVO_COUNT: usize = 4;
pub const ANGLE_MIN: u8 = 0;
pub const ANGLE_MAX: u8 = 180;
pub const ANGLE_CENTER: u8 = 90;

/// Clamp a raw angle into `[ANGLE_MIN, ANGLE_MAX]`.
pub fn clamp_angle(angle: i32) -> u8 {
    angle.clamp(ANGLE_MIN as i32, ANGLE_MAX as i32) as u8
}

/// Complete pose of all four servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]")]
pub struct ServoAngles(pub [u8; SERVO_COUNT]);

impl Default for ServoAngles {
    /// All servos centered.
    fn default() -> Self {
        ServoAngles([ANGLE_CENTER; SERVO_COUNT])
    }
}

impl ServoAngles {
    /// Build a pose, clamping every angle.
    pub fn new(angles: [i32; SERVO_COUNT]) -> Self {
        ServoAngles(angles.map(clamp_angle))
    }

    pub fn angle(
        &self,
        id: u8,
    ) -> Option<u8> {
        self.0.get(id as usize).copied()
    }
}

/// Set of servo writes keyed by servo id; ids that are `None` are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServoSlots")]
pub struct ServoCommand {
    angles: [Option<u8>; SERVO_COUNT],
}

impl ServoCommand {
    /// Write `angle` (clamped) to servo `id`; unknown ids are ignored.
    pub fn with(
        mut self,
        id: u8,
        angle: i32,
    ) -> Self {
        if let Some(slot) = self.angles.get_mut(id as usize) {
            *slot = Some(clamp_angle(angle));
        }
        self
    }

    pub fn angle(
        &self,
        id: u8,
    ) -> Option<u8> {
        self.angles.get(id as usize).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.iter().all(Option::is_none)
    }

    /// One request per servo named by the command, in id order.
    pub fn requests(&self) -> impl Iterator<Item = ServoRequest> + '_ {
        self.angles
            .iter()
            .enumerate()
            .filter_map(|(id, angle)| angle.map(|angle| ServoRequest { id: id as u8, angle }))
    }
}

impl From<[i32; SERVO_COUNT]> for ServoAngles {
    fn from(angles: [i32; SERVO_COUNT]) -> Self {
        ServoAngles::new(angles)
    }
}

/// Wire form of [`ServoCommand`] before clamping.
#[derive(Deserialize)]
struct ServoSlots {
    angles: [Option<i32>; SERVO_COUNT],
}

impl From<ServoSlots> for ServoCommand {
    fn from(wire: ServoSlots) -> Self {
        ServoCommand {
            angles: wire.angles.map(|angle| angle.map(clamp_angle)),
        }
    }
}

impl From<ServoAngles> for ServoCommand {
    fn from(pose: ServoAngles) -> Self {
        ServoCommand {
            angles: pose.0.map(Some),
        }
    }
}

/// A single servo write, shaped as the `/api/servo` body: `{"id":..,"angle":..}`.
///
/// The angle is clamped on the way in and out of JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServoWrite", into = "ServoWrite")]
pub struct ServoRequest {
    pub id: u8,
    pub angle: u8,
}

#[derive(Serialize, Deserialize)]
struct ServoWrite {
    id: u8,
    angle: i32,
}

impl From<ServoWrite> for ServoRequest {
    fn from(wire: ServoWrite) -> Self {
        ServoRequest {
            id: wire.id,
            angle: clamp_angle(wire.angle),
        }
    }
}

impl From<ServoRequest> for ServoWrite {
    fn from(req: ServoRequest) -> Self {
        ServoWrite {
            id: req.id,
            angle: clamp_angle(req.angle as i32) as i32,
        }
    }
}

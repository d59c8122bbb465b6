//! Joystick coordinates and the input events that drive the dispatcher.

use serde::{Deserialize, Serialize};

use super::DriveMode;

/// Full deflection on either axis.
pub const AXIS_LIMIT: i32 = 100;

/// Joystick position, each axis an integer in `[-AXIS_LIMIT, AXIS_LIMIT]`.
///
/// `x` grows to the right, `y` grows forward (away from the operator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoystickCoordinate {
    x: i32,
    y: i32,
}

impl JoystickCoordinate {
    pub const CENTER: JoystickCoordinate = JoystickCoordinate { x: 0, y: 0 };

    /// Build a coordinate, clamping each axis into range.
    pub fn new(
        x: i32,
        y: i32,
    ) -> Self {
        Self {
            x: x.clamp(-AXIS_LIMIT, AXIS_LIMIT),
            y: y.clamp(-AXIS_LIMIT, AXIS_LIMIT),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn is_centered(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Convert a pointer offset from the joystick center (screen pixels, y down) into a
/// joystick coordinate.
///
/// Offsets beyond `radius` are pulled back onto the circle along the same angle
/// before scaling, so diagonals saturate at the rim instead of the square corner.
pub fn normalize_pointer(
    dx: f32,
    dy: f32,
    radius: f32,
) -> JoystickCoordinate {
    if !(radius > 0.0) {
        return JoystickCoordinate::CENTER;
    }
    let (mut dx, mut dy) = (dx, dy);
    let distance = libm::sqrtf(dx * dx + dy * dy);
    if distance > radius {
        let angle = libm::atan2f(dy, dx);
        dx = libm::cosf(angle) * radius;
        dy = libm::sinf(angle) * radius;
    }
    let x = libm::roundf(dx / radius * AXIS_LIMIT as f32) as i32;
    let y = libm::roundf(-dy / radius * AXIS_LIMIT as f32) as i32;
    JoystickCoordinate::new(x, y)
}

/// One input event delivered to the dispatcher.
///
/// Serialized as JSON with tag `"ev"`, which is also the line format the mock rover
/// replays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ev", rename_all = "snake_case")]
pub enum InputEvent {
    /// An already-normalized joystick position.
    Sample { x: i32, y: i32 },
    /// Raw pointer offset from the joystick center, in pixels.
    Pointer { dx: f32, dy: f32 },
    /// Explicit drive mode selection.
    Mode { mode: DriveMode },
    /// Pointer released / drag ended.
    Release,
}

//! Vector kinematics for the joystick and the four-wheel holonomic mixer.
//!
//! [`MovementVector`] decomposes a joystick position into a heading and a bounded
//! speed; [`omni_wheel_speeds`] mixes that vector with a rotation term.
//!
//! # Example
//! ```rust
//! use rrc_core::utils::math::kinematics::MovementVector;
//! let v = MovementVector::from_xy(0.0, 50.0);
//! assert_eq!(v.speed, 50.0);
//! assert!((v.angle - 90.0).abs() < 1e-3);
//! ```

use core::f32::consts::PI;

/// Heading and magnitude of a joystick deflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementVector {
    /// Heading in degrees, `atan2(y, x)` (0° = +X, increasing CCW).
    pub angle: f32,
    /// Magnitude clamped to `[0, 100]`.
    pub speed: f32,
    /// Unit vector along the heading; `(0, 0)` for a centered stick.
    pub unit: (f32, f32),
}

impl MovementVector {
    pub fn from_xy(
        x: f32,
        y: f32,
    ) -> Self {
        let magnitude = libm::sqrtf(x * x + y * y);
        let angle = libm::atan2f(y, x) * (180.0 / PI);
        let unit = if magnitude > 0.0 {
            (x / magnitude, y / magnitude)
        } else {
            (0.0, 0.0)
        };
        Self {
            angle,
            speed: libm::fminf(magnitude, 100.0),
            unit,
        }
    }

    /// Heading in radians.
    pub fn radians(&self) -> f32 {
        self.angle * (PI / 180.0)
    }
}

/// Mix a movement vector and a rotation into raw speeds for motors A..D.
///
/// The translation is scaled so that full deflection reaches `max_speed` along
/// each wheel's axis; the results are not yet rounded or clamped.
pub fn omni_wheel_speeds(
    vector: &MovementVector,
    max_speed: f32,
    rotation: f32,
) -> [f32; 4] {
    let a = vector.radians();
    let (cos, sin) = (libm::cosf(a), libm::sinf(a));
    let s = vector.speed / 100.0 * max_speed;
    [
        s * (cos - sin) + rotation,
        s * (cos + sin) - rotation,
        s * (-cos - sin) - rotation,
        s * (-cos + sin) + rotation,
    ]
}

//! Motor command types for the rover's four corner motors.
//!
//! Wiring: A is front-right, B front-left, C rear-left, D rear-right. The left side
//! (B, C) and the right side (A, D) are driven as pairs by the differential modes.

use serde::{Deserialize, Serialize};

/// Largest magnitude a motor speed may take.
pub const SPEED_LIMIT: i16 = 255;

/// Identifier of one of the four corner motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorId {
    A,
    B,
    C,
    D,
}

impl MotorId {
    pub const ALL: [MotorId; 4] = [MotorId::A, MotorId::B, MotorId::C, MotorId::D];

    /// Whether the motor sits on the rover's left side.
    pub fn is_left(self) -> bool {
        matches!(self, MotorId::B | MotorId::C)
    }
}

/// Signed speed for every motor, each in `[-SPEED_LIMIT, SPEED_LIMIT]`.
///
/// Serializes to the `/api/motor` body: `{"motorA":..,"motorB":..,"motorC":..,"motorD":..}`.
/// Speeds are clamped on the way in and out of JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MotorSpeeds", into = "MotorSpeeds")]
pub struct MotorCommand {
    pub motor_a: i16,
    pub motor_b: i16,
    pub motor_c: i16,
    pub motor_d: i16,
}

impl MotorCommand {
    /// Every motor stopped.
    pub const STOP: MotorCommand = MotorCommand {
        motor_a: 0,
        motor_b: 0,
        motor_c: 0,
        motor_d: 0,
    };

    /// Build a command from per-side speeds; out-of-range speeds are clamped.
    pub fn sides(
        left: i16,
        right: i16,
    ) -> Self {
        let left = clamp_speed(left);
        let right = clamp_speed(right);
        MotorCommand {
            motor_a: right,
            motor_b: left,
            motor_c: left,
            motor_d: right,
        }
    }

    /// Same speed on every motor.
    pub fn uniform(speed: i16) -> Self {
        Self::sides(speed, speed)
    }

    pub fn speed(
        &self,
        id: MotorId,
    ) -> i16 {
        match id {
            MotorId::A => self.motor_a,
            MotorId::B => self.motor_b,
            MotorId::C => self.motor_c,
            MotorId::D => self.motor_d,
        }
    }

    pub fn speeds(&self) -> [i16; 4] {
        [self.motor_a, self.motor_b, self.motor_c, self.motor_d]
    }

    pub fn is_stopped(&self) -> bool {
        *self == Self::STOP
    }
}

fn clamp_speed(speed: i16) -> i16 {
    speed.clamp(-SPEED_LIMIT, SPEED_LIMIT)
}

/// Wire form of [`MotorCommand`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MotorSpeeds {
    motor_a: i16,
    motor_b: i16,
    motor_c: i16,
    motor_d: i16,
}

impl From<MotorSpeeds> for MotorCommand {
    fn from(wire: MotorSpeeds) -> Self {
        MotorCommand {
            motor_a: clamp_speed(wire.motor_a),
            motor_b: clamp_speed(wire.motor_b),
            motor_c: clamp_speed(wire.motor_c),
            motor_d: clamp_speed(wire.motor_d),
        }
    }
}

impl From<MotorCommand> for MotorSpeeds {
    fn from(cmd: MotorCommand) -> Self {
        MotorSpeeds {
            motor_a: clamp_speed(cmd.motor_a),
            motor_b: clamp_speed(cmd.motor_b),
            motor_c: clamp_speed(cmd.motor_c),
            motor_d: clamp_speed(cmd.motor_d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_map_to_corner_motors() {
        let cmd = MotorCommand::sides(-40, 120);
        assert_eq!(cmd.speed(MotorId::B), -40);
        assert_eq!(cmd.speed(MotorId::C), -40);
        assert_eq!(cmd.speed(MotorId::A), 120);
        assert_eq!(cmd.speed(MotorId::D), 120);
        for id in MotorId::ALL {
            assert_eq!(id.is_left(), cmd.speed(id) == -40);
        }
    }

    #[test]
    fn sides_clamp_to_speed_limit() {
        let cmd = MotorCommand::sides(-1000, 1000);
        assert_eq!(cmd.speeds(), [255, -255, -255, 255]);
    }

    #[test]
    fn serializes_as_motor_api_body() {
        let body = serde_json::to_string(&MotorCommand::uniform(-26)).unwrap();
        assert_eq!(
            body,
            r#"{"motorA":-26,"motorB":-26,"motorC":-26,"motorD":-26}"#
        );
    }

    #[test]
    fn json_speeds_stay_within_limit() {
        let cmd: MotorCommand =
            serde_json::from_str(r#"{"motorA":300,"motorB":-1000,"motorC":12,"motorD":255}"#)
                .unwrap();
        assert_eq!(cmd.speeds(), [255, -255, 12, 255]);

        let wild = MotorCommand {
            motor_a: 900,
            ..MotorCommand::STOP
        };
        assert_eq!(
            serde_json::to_string(&wild).unwrap(),
            r#"{"motorA":255,"motorB":0,"motorC":0,"motorD":0}"#
        );
    }
}

//! Drive algorithms mapping joystick deflection to motor speeds and servo angles.
//!
//! Every function here is pure and total: inputs outside the legal domain are
//! clamped, never rejected, and every speed or angle handed back lies inside
//! `[-255, 255]` / `[0, 180]`.
//!
//! Fractional results are rounded half away from zero (`libm::roundf`), so the
//! mapping is symmetric: `(x, y)` and `(-x, -y)` produce exactly negated speeds.
//!
//! # Example
//! ```rust
//! use rrc_core::utils::{config::JoystickConfig, controllers::JoystickCoordinate};
//! use rrc_core::utils::math::drive::DriveMixer;
//!
//! let mixer = DriveMixer::new(JoystickConfig::default());
//! let motors = mixer.tank(JoystickCoordinate::new(0, 100));
//! assert_eq!(motors.speeds(), [255, 255, 255, 255]);
//! ```

use crate::utils::{
    config::JoystickConfig,
    controllers::{
        motors::{MotorCommand, SPEED_LIMIT},
        servos::{clamp_angle, ServoAngles, ServoCommand, ANGLE_CENTER},
        JoystickCoordinate,
    },
    math::kinematics::{omni_wheel_speeds, MovementVector},
};

/// Axis deflection (percent) separating "centered" from "deflected" for the
/// turn-in-place rule.
pub const TURN_THRESHOLD: i32 = 10;

/// Bound `value` to `[min, max]`; a value equal to a bound is returned unchanged.
pub fn constrain<T: PartialOrd>(
    value: T,
    min: T,
    max: T,
) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation from `current` toward `target`.
///
/// `factor` is clamped to `[0, 1]`; `1.0` jumps straight to the target.
pub fn smooth_transition(
    current: f32,
    target: f32,
    factor: f32,
) -> f32 {
    current + (target - current) * constrain(factor, 0.0, 1.0)
}

/// Clamp a fractional speed to the motor range and round it.
pub fn round_speed(speed: f32) -> i16 {
    let limit = SPEED_LIMIT as f32;
    libm::roundf(constrain(speed, -limit, limit)) as i16
}

/// Motors and optional servo positions produced by [`DriveMixer::mixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedCommand {
    pub motors: MotorCommand,
    pub servos: Option<ServoCommand>,
}

/// Drive algorithms parameterized by the startup configuration.
#[derive(Debug, Clone, Copy)]
pub struct DriveMixer {
    config: JoystickConfig,
}

impl DriveMixer {
    pub fn new(config: JoystickConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JoystickConfig {
        &self.config
    }

    fn max_speed(&self) -> f32 {
        self.config.max_speed as f32
    }

    /// Zero out values whose magnitude is below the dead zone.
    pub fn apply_dead_zone(
        &self,
        value: i32,
    ) -> i32 {
        if value.unsigned_abs() < self.config.dead_zone.unsigned_abs() {
            0
        } else {
            value
        }
    }

    /// Apply the dead zone to both axes independently.
    pub fn filter(
        &self,
        joy: JoystickCoordinate,
    ) -> JoystickCoordinate {
        JoystickCoordinate::new(self.apply_dead_zone(joy.x()), self.apply_dead_zone(joy.y()))
    }

    /// Differential (tank) drive: `y` is throttle, `x` steering.
    ///
    /// Left side (B, C) gets `throttle - steering`, right side (A, D)
    /// `throttle + steering`, both scaled by `max_speed`.
    pub fn tank(
        &self,
        joy: JoystickCoordinate,
    ) -> MotorCommand {
        let throttle = joy.y() as f32 / 100.0;
        let steering = joy.x() as f32 / 100.0;
        let left = (throttle - steering) * self.max_speed();
        let right = (throttle + steering) * self.max_speed();
        MotorCommand::sides(round_speed(left), round_speed(right))
    }

    /// Straight-line drive: all motors follow `y`, `x` is ignored.
    pub fn sync(
        &self,
        joy: JoystickCoordinate,
    ) -> MotorCommand {
        let speed = joy.y() as f32 / 100.0 * self.max_speed();
        MotorCommand::uniform(round_speed(speed))
    }

    /// Pure rotation when only `x` is deflected, tank drive otherwise.
    ///
    /// The spin zone is `|y| < 10` and `|x| > 10`; there the left side runs at
    /// `+turn` and the right side at `-turn`.
    pub fn turn_in_place(
        &self,
        joy: JoystickCoordinate,
    ) -> MotorCommand {
        if joy.y().abs() < TURN_THRESHOLD && joy.x().abs() > TURN_THRESHOLD {
            let turn = joy.x() as f32 / 100.0 * self.max_speed();
            return MotorCommand::sides(round_speed(turn), round_speed(-turn));
        }
        self.tank(joy)
    }

    /// Holonomic drive: translate along `(x, y)` while rotating by `rotation`
    /// (motor speed units).
    pub fn omni(
        &self,
        joy: JoystickCoordinate,
        rotation: i32,
    ) -> MotorCommand {
        let vector = MovementVector::from_xy(joy.x() as f32, joy.y() as f32);
        let limit = SPEED_LIMIT as i32;
        let rotation = constrain(rotation, -limit, limit) as f32;
        let [a, b, c, d] = omni_wheel_speeds(&vector, self.max_speed(), rotation);
        MotorCommand {
            motor_a: round_speed(a),
            motor_b: round_speed(b),
            motor_c: round_speed(c),
            motor_d: round_speed(d),
        }
    }

    /// Next servo pose from the current one.
    ///
    /// When `|x|` exceeds the dead zone servos 0 and 1 move by `x/100 * servo_step`
    /// in opposite directions; when `|y|` does, servos 2 and 3 move together by
    /// `y/100 * servo_step`. The step is rounded before it is applied so that equal
    /// and opposite deflections move the same distance.
    pub fn servo_step(
        &self,
        joy: JoystickCoordinate,
        current: ServoAngles,
    ) -> ServoAngles {
        let step = |axis: i32| -> i32 {
            libm::roundf(axis as f32 / 100.0 * self.config.servo_step as f32) as i32
        };
        let [s0, s1, s2, s3] = current.0.map(i32::from);
        let mut next = [s0, s1, s2, s3];

        if joy.x().abs() > self.config.dead_zone {
            let dx = step(joy.x());
            next[0] = s0 + dx;
            next[1] = s1 - dx;
        }
        if joy.y().abs() > self.config.dead_zone {
            let dy = step(joy.y());
            next[2] = s2 + dy;
            next[3] = s3 + dy;
        }
        ServoAngles::new(next)
    }

    /// Tank drive plus, when `use_servo` is set, absolute steering servos at
    /// `90 + x/2` (servo 0) and `90 - x/2` (servo 1).
    pub fn mixed(
        &self,
        joy: JoystickCoordinate,
        use_servo: bool,
    ) -> MixedCommand {
        let servos = use_servo.then(|| {
            let offset = libm::roundf(joy.x() as f32 / 2.0) as i32;
            let center = ANGLE_CENTER as i32;
            ServoCommand::default()
                .with(0, center + offset)
                .with(1, center - offset)
        });
        MixedCommand {
            motors: self.tank(joy),
            servos,
        }
    }
}

/// Absolute steering pose used by the dispatch loop: servos 0/1 at `90 - x`,
/// servos 2/3 at the complement `180 - (90 - x)`.
pub fn steering_pose(joy: JoystickCoordinate) -> ServoAngles {
    let target = ANGLE_CENTER as i32 - joy.x();
    let complement = 180 - target;
    ServoAngles([
        clamp_angle(target),
        clamp_angle(target),
        clamp_angle(complement),
        clamp_angle(complement),
    ])
}

/// Speed broadcast to every motor in mixed mode: `-y * 255 / 100`.
pub fn mixed_mode_speed(joy: JoystickCoordinate) -> MotorCommand {
    let speed = -(joy.y() as f32) * SPEED_LIMIT as f32 / 100.0;
    MotorCommand::uniform(round_speed(speed))
}

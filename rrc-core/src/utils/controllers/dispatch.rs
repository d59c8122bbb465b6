//! Input dispatch loop.
//!
//! The [`Dispatcher`] turns a high-frequency stream of joystick samples into a
//! bounded stream of actuator commands. It owns the whole [`DispatchState`] and is
//! driven synchronously, one event at a time, with the caller supplying the
//! timestamp; nothing here touches a clock, a UI toolkit, or the network.
//!
//! Per accepted sample:
//! 1. samples arriving less than `min_send_interval` after the previous accepted
//!    sample are dropped ([`Outcome::Throttled`]);
//! 2. the dead zone is applied to both axes;
//! 3. the current [`DriveMode`] selects the mapping. Motor commands are always
//!    dispatched; servo commands only when they differ from the last one sent.
//!
//! A release bypasses both the rate limiter and dedup and always yields a full stop.

use embassy_time::{Duration, Instant};

use super::{
    joystick::{normalize_pointer, InputEvent, JoystickCoordinate},
    motors::MotorCommand,
    servos::{ServoAngles, ServoCommand},
    DriveMode,
};
use crate::utils::{
    config::JoystickConfig,
    math::drive::{mixed_mode_speed, steering_pose, DriveMixer},
};

/// Everything the dispatch loop remembers between samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchState {
    pub mode: DriveMode,
    pub last_motor: Option<MotorCommand>,
    pub last_servo: Option<ServoCommand>,
    /// Timestamp of the last sample that passed the rate limiter.
    pub last_send: Option<Instant>,
}

/// Values computed for a sample, for display. Present even when the servo command
/// itself was suppressed by dedup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readout {
    pub joystick: JoystickCoordinate,
    pub motors: Option<MotorCommand>,
    pub servos: Option<ServoAngles>,
}

/// Commands to hand to the transport for one accepted event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub motors: Option<MotorCommand>,
    pub servos: Option<ServoCommand>,
    pub readout: Readout,
}

impl Dispatch {
    pub fn is_empty(&self) -> bool {
        self.motors.is_none() && self.servos.is_none()
    }
}

/// Result of feeding one event to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sample arrived inside the rate-limit window; nothing to send.
    Throttled(JoystickCoordinate),
    /// Sample or release accepted.
    Dispatched(Dispatch),
    /// Drive mode switched.
    ModeChanged(DriveMode),
}

impl Outcome {
    pub fn dispatch(&self) -> Option<&Dispatch> {
        match self {
            Outcome::Dispatched(d) => Some(d),
            _ => None,
        }
    }
}

/// Rate-limited, deduplicating joystick dispatcher.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    mixer: DriveMixer,
    interval: Duration,
    state: DispatchState,
}

impl Dispatcher {
    pub fn new(config: JoystickConfig) -> Self {
        Self::with_mode(config, DriveMode::default())
    }

    pub fn with_mode(
        config: JoystickConfig,
        mode: DriveMode,
    ) -> Self {
        Dispatcher {
            mixer: DriveMixer::new(config),
            interval: config.min_send_interval(),
            state: DispatchState {
                mode,
                ..DispatchState::default()
            },
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn mode(&self) -> DriveMode {
        self.state.mode
    }

    pub fn mixer(&self) -> &DriveMixer {
        &self.mixer
    }

    /// Switch drive mode. The last-sent memory is kept, so returning to servo mode
    /// with the stick where it was does not resend the same pose.
    pub fn set_mode(
        &mut self,
        mode: DriveMode,
    ) {
        if self.state.mode != mode {
            tracing::info!(from = %self.state.mode, to = %mode, "drive mode changed");
            self.state.mode = mode;
        }
    }

    /// Feed one input event observed at `now`.
    pub fn handle(
        &mut self,
        event: InputEvent,
        now: Instant,
    ) -> Outcome {
        match event {
            InputEvent::Sample { x, y } => self.sample(JoystickCoordinate::new(x, y), now),
            InputEvent::Pointer { dx, dy } => {
                let joy = normalize_pointer(dx, dy, self.mixer.config().pointer_radius);
                self.sample(joy, now)
            }
            InputEvent::Mode { mode } => {
                self.set_mode(mode);
                Outcome::ModeChanged(mode)
            }
            InputEvent::Release => Outcome::Dispatched(self.release()),
        }
    }

    /// Process one normalized sample.
    pub fn sample(
        &mut self,
        joy: JoystickCoordinate,
        now: Instant,
    ) -> Outcome {
        if !self.ready(now) {
            tracing::trace!(x = joy.x(), y = joy.y(), "sample throttled");
            return Outcome::Throttled(joy);
        }

        let joy = self.mixer.filter(joy);
        let mut dispatch = Dispatch {
            readout: Readout {
                joystick: joy,
                ..Readout::default()
            },
            ..Dispatch::default()
        };

        let motors = match self.state.mode {
            DriveMode::Drive => Some(self.mixer.tank(joy)),
            DriveMode::Sync => Some(self.mixer.sync(joy)),
            DriveMode::Spin => Some(self.mixer.turn_in_place(joy)),
            DriveMode::Omni => Some(self.mixer.omni(joy, 0)),
            DriveMode::Mixed => Some(mixed_mode_speed(joy)),
            DriveMode::Servo => None,
        };

        if self.state.mode.uses_servos() {
            let pose = steering_pose(joy);
            let command = ServoCommand::from(pose);
            dispatch.readout.servos = Some(pose);
            if self.state.last_servo == Some(command) {
                tracing::debug!(?pose, "servo command unchanged, suppressed");
            } else {
                self.state.last_servo = Some(command);
                dispatch.servos = Some(command);
            }
        }

        if let Some(motors) = motors {
            self.state.last_motor = Some(motors);
            dispatch.motors = Some(motors);
            dispatch.readout.motors = Some(motors);
        }

        self.state.last_send = Some(now);
        Outcome::Dispatched(dispatch)
    }

    /// Pointer released: recenter and stop every motor, regardless of timing.
    pub fn release(&mut self) -> Dispatch {
        tracing::info!(mode = %self.state.mode, "joystick released, stopping motors");
        self.stop()
    }

    /// Stop every motor and forget the last servo pose so the next servo target
    /// is always written.
    pub fn emergency_stop(&mut self) -> Dispatch {
        tracing::warn!("emergency stop");
        self.state.last_servo = None;
        self.stop()
    }

    fn stop(&mut self) -> Dispatch {
        self.state.last_motor = Some(MotorCommand::STOP);
        Dispatch {
            motors: Some(MotorCommand::STOP),
            servos: None,
            readout: Readout {
                joystick: JoystickCoordinate::CENTER,
                motors: Some(MotorCommand::STOP),
                servos: None,
            },
        }
    }

    fn ready(
        &self,
        now: Instant,
    ) -> bool {
        match self.state.last_send {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        }
    }
}

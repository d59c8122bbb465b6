use embassy_futures::block_on;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use rrc_core::utils::{
    config::JoystickConfig,
    connection::transport::{self, post, Notice, Outbound, Transport, TransportError, OUTBOX_DEPTH},
    controllers::{
        DriveMode, Dispatcher, InputEvent, JoystickCoordinate, MotorCommand, Outcome,
        ServoRequest,
    },
    Instant,
};

/// Default spacing between accepted samples.
pub const INTERVAL_MS: u64 = 100;

/// Instant `ms` milliseconds after boot.
pub fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

/// Normalized joystick sample event.
pub fn sample(
    x: i32,
    y: i32,
) -> InputEvent {
    InputEvent::Sample { x, y }
}

/// Count servo writes and motor writes across a series of outcomes.
pub fn count_writes(outcomes: &[Outcome]) -> (usize, usize) {
    outcomes
        .iter()
        .filter_map(Outcome::dispatch)
        .fold((0, 0), |(s, m), d| {
            (s + d.servos.is_some() as usize, m + d.motors.is_some() as usize)
        })
}

/// Transport double that records requests and fails on demand.
#[derive(Default)]
struct RecordingTransport {
    sent: Vec<Outbound>,
    fail_servo: bool,
}

impl Transport for RecordingTransport {
    async fn send_motors(
        &mut self,
        command: &MotorCommand,
    ) -> Result<(), TransportError> {
        self.sent.push(Outbound::Motors(*command));
        Ok(())
    }

    async fn send_servo(
        &mut self,
        request: &ServoRequest,
    ) -> Result<(), TransportError> {
        if self.fail_servo {
            return Err(TransportError::Unreachable("connection refused".into()));
        }
        self.sent.push(Outbound::Servo(*request));
        Ok(())
    }
}

#[test]
fn drive_mode_full_forward() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    let out = d.handle(sample(0, 100), at(0));
    let dispatch = out.dispatch().expect("first sample dispatches");
    assert_eq!(
        dispatch.motors,
        Some(MotorCommand {
            motor_a: 255,
            motor_b: 255,
            motor_c: 255,
            motor_d: 255,
        })
    );
    assert!(dispatch.servos.is_none());
}

#[test]
fn samples_inside_interval_yield_one_dispatch() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    let outcomes = [
        d.handle(sample(10, 60), at(0)),
        d.handle(sample(20, 60), at(30)),
        d.handle(sample(30, 60), at(INTERVAL_MS - 1)),
    ];
    assert_eq!(count_writes(&outcomes), (0, 1));
    assert_eq!(outcomes[2], Outcome::Throttled(JoystickCoordinate::new(30, 60)));
}

#[test]
fn drive_mode_always_dispatches_motors() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    let outcomes: Vec<Outcome> = (0..5)
        .map(|i| d.handle(sample(0, 50), at(i * INTERVAL_MS)))
        .collect();
    assert_eq!(count_writes(&outcomes), (0, 5));
}

#[test]
fn release_bypasses_rate_limiter() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    d.handle(sample(40, 80), at(1_000));
    let out = d.handle(InputEvent::Release, at(1_001));
    let stop = out.dispatch().expect("release always dispatches");
    assert_eq!(stop.motors, Some(MotorCommand::STOP));
    assert!(stop.readout.joystick.is_centered());
    assert_eq!(d.state().last_motor, Some(MotorCommand::STOP));
    // the limiter window still counts from the last accepted sample
    assert_eq!(d.state().last_send, Some(at(1_000)));
}

#[test]
fn release_dispatches_stop_in_every_mode() {
    for mode in [DriveMode::Drive, DriveMode::Servo, DriveMode::Mixed, DriveMode::Omni] {
        let mut d = Dispatcher::with_mode(JoystickConfig::default(), mode);
        d.handle(sample(-60, 60), at(0));
        let out = d.handle(InputEvent::Release, at(0));
        assert_eq!(out.dispatch().unwrap().motors, Some(MotorCommand::STOP));
    }
}

#[test]
fn servo_mode_deduplicates_identical_targets() {
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Servo);
    let outcomes = [
        d.handle(sample(30, 0), at(0)),
        d.handle(sample(30, 0), at(INTERVAL_MS)),
    ];
    assert_eq!(count_writes(&outcomes), (1, 0));

    // the suppressed sample still reports the pose for display
    let readout = outcomes[1].dispatch().unwrap().readout;
    assert_eq!(readout.servos.unwrap().0, [60, 60, 120, 120]);

    let moved = d.handle(sample(-30, 0), at(2 * INTERVAL_MS));
    let servos = moved.dispatch().unwrap().servos.unwrap();
    assert_eq!(servos.angle(0), Some(120));
    assert_eq!(servos.angle(2), Some(60));
}

#[test]
fn servo_mode_dead_zone_collapses_jitter() {
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Servo);
    let outcomes = [
        d.handle(sample(3, 0), at(0)),
        d.handle(sample(-8, 5), at(INTERVAL_MS)),
        d.handle(sample(0, 0), at(2 * INTERVAL_MS)),
    ];
    assert_eq!(count_writes(&outcomes), (1, 0));
}

#[test]
fn mixed_mode_sends_motors_every_time_and_servos_once() {
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Mixed);
    let outcomes = [
        d.handle(sample(20, 40), at(0)),
        d.handle(sample(20, 40), at(INTERVAL_MS)),
    ];
    assert_eq!(count_writes(&outcomes), (1, 2));
    let motors = outcomes[1].dispatch().unwrap().motors.unwrap();
    assert_eq!(motors.speeds(), [-102; 4]);
}

#[test]
fn mode_switch_is_explicit_only() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    d.handle(sample(100, 100), at(0));
    assert_eq!(d.mode(), DriveMode::Drive);
    d.handle(InputEvent::Mode { mode: DriveMode::Servo }, at(1));
    assert_eq!(d.mode(), DriveMode::Servo);
    // switching mode does not reset the limiter
    assert!(matches!(d.handle(sample(10, 10), at(2)), Outcome::Throttled(_)));
}

#[test]
fn pointer_events_are_normalized() {
    let mut d = Dispatcher::new(JoystickConfig::default());
    // 70 px straight up is full forward
    let out = d.handle(InputEvent::Pointer { dx: 0.0, dy: -70.0 }, at(0));
    assert_eq!(out.dispatch().unwrap().motors.unwrap().speeds(), [255; 4]);
}

#[test]
fn spin_mode_rotates_in_place() {
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Spin);
    let motors = d.handle(sample(100, 0), at(0)).dispatch().unwrap().motors.unwrap();
    assert_eq!(motors.speeds(), [-255, 255, 255, -255]);
}

#[test]
fn posted_commands_reach_transport() {
    let outbox: Channel<NoopRawMutex, Outbound, 16> = Channel::new();
    let notices: Channel<NoopRawMutex, Notice, 16> = Channel::new();
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Mixed);
    let out = d.handle(sample(0, -100), at(0));
    assert_eq!(post(out.dispatch().unwrap(), &outbox), 5);

    let mut transport = RecordingTransport::default();
    let last = block_on(async {
        let mut last = None;
        for _ in 0..5 {
            last = Some(transport::forward(&mut transport, &outbox, &notices).await);
        }
        last
    });

    assert_eq!(transport.sent.len(), 5);
    assert_eq!(transport.sent[0], Outbound::Servo(ServoRequest { id: 0, angle: 90 }));
    assert_eq!(transport.sent[4], Outbound::Motors(MotorCommand::uniform(255)));
    assert_eq!(
        last,
        Some(Notice::Delivered(Outbound::Motors(MotorCommand::uniform(255))))
    );
    // successful deliveries are not published
    assert!(notices.try_receive().is_err());
}

#[test]
fn release_stop_survives_full_outbox() {
    let outbox: Channel<NoopRawMutex, Outbound, OUTBOX_DEPTH> = Channel::new();
    let mut d = Dispatcher::new(JoystickConfig::default());
    for i in 0..OUTBOX_DEPTH as u64 {
        let out = d.handle(sample(0, 100), at(i * INTERVAL_MS));
        assert_eq!(post(out.dispatch().unwrap(), &outbox), 1);
    }
    assert_eq!(outbox.len(), OUTBOX_DEPTH);
    // a sample while the rover is unreachable is simply dropped
    let late = d.handle(sample(0, 100), at(OUTBOX_DEPTH as u64 * INTERVAL_MS));
    assert_eq!(post(late.dispatch().unwrap(), &outbox), 0);

    let release = d.handle(InputEvent::Release, at(OUTBOX_DEPTH as u64 * INTERVAL_MS + 1));
    assert_eq!(post(release.dispatch().unwrap(), &outbox), 1);

    // every queued full-speed command was superseded by the stop
    assert_eq!(outbox.try_receive().ok(), Some(Outbound::Motors(MotorCommand::STOP)));
    assert!(outbox.try_receive().is_err());
}

#[test]
fn failure_notice_is_not_crowded_out_by_successes() {
    let outbox: Channel<NoopRawMutex, Outbound, 16> = Channel::new();
    let notices: Channel<NoopRawMutex, Notice, 2> = Channel::new();
    let mut transport = RecordingTransport::default();

    block_on(async {
        for speed in 0..6 {
            outbox.try_send(Outbound::Motors(MotorCommand::uniform(speed))).unwrap();
            transport::forward(&mut transport, &outbox, &notices).await;
        }
        transport.fail_servo = true;
        outbox.try_send(Outbound::Servo(ServoRequest { id: 3, angle: 0 })).unwrap();
        transport::forward(&mut transport, &outbox, &notices).await;
    });

    assert_eq!(transport.sent.len(), 6);
    assert!(matches!(
        notices.try_receive(),
        Ok(Notice::Failed {
            command: Outbound::Servo(ServoRequest { id: 3, angle: 0 }),
            ..
        })
    ));
    assert!(notices.try_receive().is_err());
}

#[test]
fn transport_failure_is_reported_without_touching_state() {
    let outbox: Channel<NoopRawMutex, Outbound, 16> = Channel::new();
    let notices: Channel<NoopRawMutex, Notice, 16> = Channel::new();
    let mut d = Dispatcher::with_mode(JoystickConfig::default(), DriveMode::Servo);
    let out = d.handle(sample(50, 0), at(0));
    post(out.dispatch().unwrap(), &outbox);
    let state_before = *d.state();

    let mut transport = RecordingTransport {
        fail_servo: true,
        ..Default::default()
    };
    block_on(transport::forward(&mut transport, &outbox, &notices));

    match notices.try_receive() {
        Ok(Notice::Failed { command, error }) => {
            assert_eq!(command, Outbound::Servo(ServoRequest { id: 0, angle: 40 }));
            assert_eq!(error, TransportError::Unreachable("connection refused".into()));
        }
        other => panic!("expected failure notice, got {:?}", other),
    }
    assert_eq!(*d.state(), state_before);

    // same target again is still deduplicated: failures are not retried
    let again = d.handle(sample(50, 0), at(INTERVAL_MS));
    assert!(again.dispatch().unwrap().servos.is_none());
}

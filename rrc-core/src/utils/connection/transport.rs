//! Outbound Transport Module
//!
//! Commands accepted by the dispatcher are posted to a bounded outbox channel and
//! delivered by one or more transport workers. Posting never blocks: when the
//! outbox is full a motion command is dropped, because the next joystick sample
//! will carry fresher values anyway. A full stop is never dropped: it purges the
//! queued motor commands it supersedes and takes their place.
//!
//! Workers publish failed deliveries on a notice channel so the UI can flag them;
//! nothing is retried.

extern crate alloc;

use alloc::string::String;
use core::fmt;

use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    channel::{Channel, TrySendError},
};
use serde::Serialize;

use crate::utils::controllers::{Dispatch, MotorCommand, ServoRequest};

pub const OUTBOX_DEPTH: usize = 16;
pub const NOTICE_DEPTH: usize = 8;

/// Queue between the dispatcher and the transport workers.
pub static OUTBOX: Channel<CriticalSectionRawMutex, Outbound, OUTBOX_DEPTH> = Channel::new();

/// Failed deliveries, for the UI collaborator.
pub static NOTICES: Channel<CriticalSectionRawMutex, Notice, NOTICE_DEPTH> = Channel::new();

/// One request for the rover's HTTP API.
///
/// Serialized as JSON with tag `"oc"` (outbound command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "oc", rename_all = "snake_case")]
pub enum Outbound {
    /// Write all four motor speeds.
    Motors(MotorCommand),
    /// Write a single servo angle.
    Servo(ServoRequest),
}

impl Outbound {
    /// API path the request is posted to.
    pub fn path(&self) -> &'static str {
        match self {
            Outbound::Motors(_) => "/api/motor",
            Outbound::Servo(_) => "/api/servo",
        }
    }

    /// JSON request body.
    pub fn body(&self) -> Result<String, serde_json::Error> {
        match self {
            Outbound::Motors(cmd) => serde_json::to_string(cmd),
            Outbound::Servo(req) => serde_json::to_string(req),
        }
    }
}

/// Failure result from the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The rover could not be reached.
    Unreachable(String),
    /// The rover answered with `success: false`.
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            TransportError::Unreachable(e) => write!(f, "connection error: {e}"),
            TransportError::Rejected(e) => write!(f, "rejected by rover: {e}"),
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Delivered(Outbound),
    Failed {
        command: Outbound,
        error: TransportError,
    },
}

/// Client side of the rover's motor and servo endpoints.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send_motors(
        &mut self,
        command: &MotorCommand,
    ) -> Result<(), TransportError>;

    async fn send_servo(
        &mut self,
        request: &ServoRequest,
    ) -> Result<(), TransportError>;
}

/// Queue the commands of a dispatch without waiting. Servo writes go first, one
/// per servo, then the motor command. Returns how many were queued.
///
/// A stop first removes every motor command still waiting in the outbox, so it
/// is delivered ahead of stale motion and always finds a free slot.
pub fn post<M: RawMutex, const N: usize>(
    dispatch: &Dispatch,
    outbox: &Channel<M, Outbound, N>,
) -> usize {
    let stopping = dispatch.motors.is_some_and(|m| m.is_stopped());
    if stopping {
        purge_motion(outbox);
    }

    let servos = dispatch
        .servos
        .iter()
        .flat_map(|cmd| cmd.requests())
        .map(Outbound::Servo);
    let motors = dispatch.motors.map(Outbound::Motors);

    let mut queued = 0;
    for command in servos.chain(motors) {
        if stopping && matches!(command, Outbound::Motors(_)) && outbox.is_full() {
            if let Ok(evicted) = outbox.try_receive() {
                tracing::warn!(?evicted, "outbox full, oldest command evicted for stop");
            }
        }
        match outbox.try_send(command) {
            Ok(()) => queued += 1,
            Err(TrySendError::Full(command)) => {
                tracing::warn!(?command, "outbox full, command dropped")
            }
        }
    }
    queued
}

/// Drop queued motor commands, keeping queued servo writes in order. Returns how
/// many were dropped.
fn purge_motion<M: RawMutex, const N: usize>(outbox: &Channel<M, Outbound, N>) -> usize {
    let mut dropped = 0;
    for _ in 0..outbox.len() {
        match outbox.try_receive() {
            Ok(Outbound::Motors(_)) => dropped += 1,
            Ok(servo) => {
                if outbox.try_send(servo).is_err() {
                    tracing::warn!(?servo, "outbox full, servo write dropped");
                }
            }
            Err(_) => break,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "stale motor commands superseded by stop");
    }
    dropped
}

/// Perform one delivery and describe the result.
pub async fn deliver<T: Transport>(
    transport: &mut T,
    command: Outbound,
) -> Notice {
    let result = match &command {
        Outbound::Motors(cmd) => transport.send_motors(cmd).await,
        Outbound::Servo(req) => transport.send_servo(req).await,
    };
    match result {
        Ok(()) => {
            tracing::debug!(path = command.path(), "command delivered");
            Notice::Delivered(command)
        }
        Err(error) => {
            tracing::warn!(path = command.path(), %error, "command failed");
            Notice::Failed { command, error }
        }
    }
}

/// Take the next queued command and deliver it. Failures are published on
/// `notices`; the notice is returned either way.
pub async fn forward<T, M, const N: usize, const K: usize>(
    transport: &mut T,
    outbox: &Channel<M, Outbound, N>,
    notices: &Channel<M, Notice, K>,
) -> Notice
where
    T: Transport,
    M: RawMutex,
{
    let command = outbox.receive().await;
    let notice = deliver(transport, command).await;
    if let Notice::Failed { command, error } = &notice {
        if notices.try_send(notice.clone()).is_err() {
            tracing::error!(path = command.path(), %error, "notice channel full, failure not reported");
        }
    }
    notice
}

/// Transport worker: drain the outbox forever.
pub async fn run<T, M, const N: usize, const K: usize>(
    mut transport: T,
    outbox: &Channel<M, Outbound, N>,
    notices: &Channel<M, Notice, K>,
) -> !
where
    T: Transport,
    M: RawMutex,
{
    loop {
        forward(&mut transport, outbox, notices).await;
    }
}

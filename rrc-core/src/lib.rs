//! Joystick-to-actuator mapping and command dispatch for a four-motor, four-servo rover.
//!
//! The crate is `no_std` so the same mapping layer can run on the rover's controller
//! or on a host; see `rrc-app/mock-rover` for a host-side replay harness.
#![no_std]

pub mod utils;

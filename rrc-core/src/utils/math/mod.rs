//! Math utilities for the rover remote control.
//!
//! - `drive`: joystick-to-motor and joystick-to-servo mapping algorithms
//! - `kinematics`: movement vector decomposition and holonomic wheel mixing

pub mod drive;
pub mod kinematics;

//! Utility re-exports and helper macros for the rover remote control.
//!
//! - `config`: startup configuration for the joystick mapping
//! - `connection`: outbound command queue and transport forwarding
//! - `controllers`: command types, input events and the dispatch loop
//! - `math`: drive algorithms and vector kinematics
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod connection;
pub mod controllers;
pub mod math;

pub use config::JoystickConfig;
pub use controllers::Dispatcher;
pub use embassy_time::*;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}

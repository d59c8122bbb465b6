//! Module Exports
//!
//! This file exports the modules that move commands off the rover controller.
//!
//! # Modules
//! - `transport`: outbox channel, transport trait and delivery workers.

/// Module for queuing dispatched commands and delivering them to the rover API.
pub mod transport;

pub use transport::{Notice, Outbound, Transport, TransportError, NOTICES, OUTBOX};

//! Shared types for the deadbolt door controller.
//!
//! This crate holds the pieces every other deadbolt crate needs: the common
//! error type, the fixed timing constants of the door state machine, and the
//! telemetry topic names shared between the driver and its observers.

pub mod constants;
pub mod error;

pub use error::{Error, Result};

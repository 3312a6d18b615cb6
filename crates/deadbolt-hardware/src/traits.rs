//! GPIO device trait definitions.
//!
//! These traits establish the contract between the door driver and its
//! peripherals, enabling substitution between mock and real GPIO
//! implementations.
//!
//! Methods are declared in the desugared RPITIT form with a `Send` bound so
//! device futures can cross into spawned tasks; implementations may still
//! use plain `async fn` (Rust 1.90 + Edition 2024).

use std::future::Future;

use crate::error::Result;
use crate::types::{Edge, Level};

/// A single actuator output line (solenoid, buzzer).
///
/// Outputs are momentary: they hold no persistent logical state beyond
/// "currently energized". Pulse-and-release timing is composed by the
/// caller, which keeps the width decisions next to the state machine that
/// owns them.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because its methods return
/// `impl Future` (Edition 2024 RPITIT). Use generic type parameters:
///
/// ```no_run
/// use deadbolt_hardware::{OutputDevice, Result};
///
/// async fn blip<O: OutputDevice>(out: &mut O) -> Result<()> {
///     out.set_active(true).await?;
///     out.set_active(false).await
/// }
/// ```
pub trait OutputDevice: Send {
    /// Energize or de-energize the output.
    ///
    /// Setting the line to its current state is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pin write fails.
    fn set_active(&mut self, active: bool) -> impl Future<Output = Result<()>> + Send;
}

/// A debounced, edge-triggered digital input (door-frame contact, bolt
/// contact, door button).
///
/// # Object Safety and Dynamic Dispatch
///
/// Like [`OutputDevice`], this trait is NOT object-safe; use generic type
/// parameters.
pub trait EdgeInput: Send {
    /// Read the current logical level of the line.
    ///
    /// Used once at driver construction to seed the initial door state, and
    /// available for spot checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pin read fails.
    fn level(&self) -> impl Future<Output = Result<Level>> + Send;

    /// Wait for the next debounced edge on the line.
    ///
    /// Edges that occur while the caller is not waiting are buffered in
    /// order; none are lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected and no further edges
    /// can be delivered.
    fn next_edge(&mut self) -> impl Future<Output = Result<Edge>> + Send;
}

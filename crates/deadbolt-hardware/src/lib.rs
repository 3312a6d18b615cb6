//! GPIO abstraction layer for the deadbolt door controller.
//!
//! This crate provides trait-based abstractions for the door peripherals:
//! momentary outputs (lock/unlock solenoids, buzzer) and edge-triggered
//! inputs (door-frame contact, bolt contact, door button). The traits enable
//! substitution between mock implementations (for development and testing)
//! and real GPIO drivers.
//!
//! # Design Philosophy
//!
//! - **Async-first**: all I/O operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: all traits require `Send` so devices can be moved into
//!   Tokio tasks.
//! - **Error-aware**: all operations return `Result<T>`.
//!
//! # Outputs
//!
//! The [`OutputDevice`] trait represents a single actuator line. Outputs hold
//! no logical state beyond "currently energized"; pulse timing is composed by
//! the caller:
//!
//! ```no_run
//! use std::time::Duration;
//! use deadbolt_hardware::{OutputDevice, Result};
//!
//! async fn pulse<O: OutputDevice>(out: &mut O, width: Duration) -> Result<()> {
//!     out.set_active(true).await?;
//!     tokio::time::sleep(width).await;
//!     out.set_active(false).await
//! }
//! ```
//!
//! # Inputs
//!
//! The [`EdgeInput`] trait represents a debounced digital input with
//! rising/falling-edge subscription plus a live level read:
//!
//! ```no_run
//! use deadbolt_hardware::{Edge, EdgeInput, Result};
//!
//! async fn watch<I: EdgeInput>(input: &mut I) -> Result<()> {
//!     loop {
//!         match input.next_edge().await? {
//!             Edge::Rising => println!("contact closed"),
//!             Edge::Falling => println!("contact opened"),
//!         }
//!     }
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides [`MockOutput`](mock::MockOutput) and
//! [`MockInput`](mock::MockInput) with paired handles for driving levels and
//! observing actuations from tests.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{EdgeInput, OutputDevice};
pub use types::{Edge, InputConfig, Level};

//! Door driver for the deadbolt controller.
//!
//! This crate owns everything between an authenticated request and the
//! physical door: the [`DoorCommand`] vocabulary, the coalescing
//! [`CommandQueue`], the [`TelemetryBus`] contract, and the [`DoorDriver`]
//! itself: a single worker task that serializes every actuator write, plus
//! sensor tasks that react to door-frame, bolt, and button edges and to the
//! space occupancy feed.
//!
//! # Concurrency model
//!
//! Two domains. The worker task is the sole owner of the solenoids and
//! buzzer; all hardware mutation funnels through it, so the lock can never
//! see two simultaneous drive signals. Sensor tasks run concurrently with
//! the worker and each other, but they only touch the command queue and the
//! two shared timers (button-hold and occupancy-zero), both behind
//! atomic/mutex-protected access.
//!
//! Command handlers block the worker on purpose; an unlock occupies it for
//! roughly the buzzer window. That is a deliberate throughput ceiling: the
//! door is a physical device and its operations are inherently serial.

pub mod command;
pub mod driver;
pub mod queue;
pub mod telemetry;

pub use command::{CommandKind, DoorCommand};
pub use driver::{DoorDriver, DoorHardware, DriverConfig};
pub use queue::{CommandQueue, CommandStream, WaitOutcome};
pub use telemetry::{InMemoryBus, TelemetryBus};

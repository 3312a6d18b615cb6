//! Mock GPIO implementations for testing and development.
//!
//! This module provides simulated outputs and inputs that can be controlled
//! and observed programmatically, without physical hardware. Each device is
//! created together with a handle: the handle drives input levels or
//! observes output actuations while the device itself is moved into the
//! driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{HardwareError, Result};
use crate::traits::{EdgeInput, OutputDevice};
use crate::types::{Edge, Level};

/// Mock actuator output.
///
/// Records every `set_active` transition so tests can assert on pulse
/// counts and ordering.
///
/// # Examples
///
/// ```
/// use deadbolt_hardware::mock::MockOutput;
/// use deadbolt_hardware::OutputDevice;
///
/// #[tokio::main]
/// async fn main() -> deadbolt_hardware::Result<()> {
///     let (mut out, handle) = MockOutput::new("lock solenoid");
///
///     out.set_active(true).await?;
///     out.set_active(false).await?;
///
///     assert_eq!(handle.activation_count(), 1);
///     assert!(!handle.is_active());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockOutput {
    shared: Arc<OutputShared>,
}

#[derive(Debug)]
struct OutputShared {
    name: String,
    active: AtomicBool,
    history: Mutex<Vec<bool>>,
}

impl MockOutput {
    /// Create a new mock output and its observing handle.
    pub fn new(name: impl Into<String>) -> (Self, MockOutputHandle) {
        let shared = Arc::new(OutputShared {
            name: name.into(),
            active: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        });
        (
            Self {
                shared: shared.clone(),
            },
            MockOutputHandle { shared },
        )
    }
}

impl OutputDevice for MockOutput {
    async fn set_active(&mut self, active: bool) -> Result<()> {
        self.shared.active.store(active, Ordering::SeqCst);
        self.shared
            .history
            .lock()
            .expect("output history poisoned")
            .push(active);
        Ok(())
    }
}

/// Handle for observing a [`MockOutput`].
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    shared: Arc<OutputShared>,
}

impl MockOutputHandle {
    /// Whether the output is currently energized.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Number of times the output has been energized.
    ///
    /// A full pulse contributes exactly one activation.
    #[must_use]
    pub fn activation_count(&self) -> usize {
        self.shared
            .history
            .lock()
            .expect("output history poisoned")
            .iter()
            .filter(|&&on| on)
            .count()
    }

    /// Complete transition history, in order.
    #[must_use]
    pub fn history(&self) -> Vec<bool> {
        self.shared
            .history
            .lock()
            .expect("output history poisoned")
            .clone()
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

/// Mock edge-triggered input.
///
/// The paired [`MockInputHandle`] drives the line level; a level change
/// emits exactly one edge, and writes of the current level are ignored,
/// mirroring a debounced real input.
///
/// # Examples
///
/// ```
/// use deadbolt_hardware::mock::MockInput;
/// use deadbolt_hardware::{Edge, EdgeInput, Level};
///
/// #[tokio::main]
/// async fn main() -> deadbolt_hardware::Result<()> {
///     let (mut input, handle) = MockInput::new("door button", Level::Low);
///
///     handle.set_level(Level::High);
///     handle.set_level(Level::High); // ignored, no change
///     handle.set_level(Level::Low);
///
///     assert_eq!(input.next_edge().await?, Edge::Rising);
///     assert_eq!(input.next_edge().await?, Edge::Falling);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInput {
    name: String,
    level: Arc<AtomicBool>,
    edge_rx: mpsc::UnboundedReceiver<Edge>,
}

impl MockInput {
    /// Create a new mock input at the given initial level, plus its driving
    /// handle.
    pub fn new(name: impl Into<String>, initial: Level) -> (Self, MockInputHandle) {
        let name = name.into();
        let level = Arc::new(AtomicBool::new(initial.is_high()));
        let (edge_tx, edge_rx) = mpsc::unbounded_channel();

        let input = Self {
            name: name.clone(),
            level: level.clone(),
            edge_rx,
        };
        let handle = MockInputHandle {
            name,
            level,
            edge_tx,
        };
        (input, handle)
    }
}

impl EdgeInput for MockInput {
    async fn level(&self) -> Result<Level> {
        Ok(if self.level.load(Ordering::SeqCst) {
            Level::High
        } else {
            Level::Low
        })
    }

    async fn next_edge(&mut self) -> Result<Edge> {
        self.edge_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }
}

/// Handle for driving a [`MockInput`].
///
/// Can be cloned and shared across tasks. Level writes are synchronous and
/// never block, which keeps test sequencing deterministic.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    name: String,
    level: Arc<AtomicBool>,
    edge_tx: mpsc::UnboundedSender<Edge>,
}

impl MockInputHandle {
    /// Set the line level. A change emits one edge; writing the current
    /// level does nothing.
    pub fn set_level(&self, level: Level) {
        let was_high = self.level.swap(level.is_high(), Ordering::SeqCst);
        if was_high == level.is_high() {
            return;
        }
        let edge = if level.is_high() {
            Edge::Rising
        } else {
            Edge::Falling
        };
        // The input may already be dropped during teardown; that is fine.
        let _ = self.edge_tx.send(edge);
    }

    /// Convenience for `set_level(Level::High)`.
    pub fn set_high(&self) {
        self.set_level(Level::High);
    }

    /// Convenience for `set_level(Level::Low)`.
    pub fn set_low(&self) {
        self.set_level(Level::Low);
    }

    /// Current line level.
    #[must_use]
    pub fn level(&self) -> Level {
        if self.level.load(Ordering::SeqCst) {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Fixed timings and telemetry topics for the door controller.
//!
//! All durations of the door state machine live here so the driver, its
//! tests, and any dashboard tooling agree on the same numbers. None of these
//! are runtime-configurable; they describe the physical installation
//! (solenoid pulse widths, the buzzer courtesy window, the auto-lock grace
//! period) and changing them means re-commissioning the door.

use std::time::Duration;

// ============================================================================
// Worker timings
// ============================================================================

/// How long the worker waits on the command queue before checking the
/// occupancy timeout.
pub const COMMAND_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Continuous zero-occupancy duration after which an unlocked, closed door
/// is locked by the emergency path.
pub const OCCUPANCY_LOCK_AFTER: Duration = Duration::from_secs(15 * 60);

// ============================================================================
// Actuator timings
// ============================================================================

/// Drive pulse width for the unlock solenoid.
pub const UNLOCK_PULSE_WIDTH: Duration = Duration::from_millis(200);

/// Drive pulse width for the lock solenoid.
pub const LOCK_PULSE_WIDTH: Duration = Duration::from_millis(200);

/// The buzzer stays on this long, measured from the start of an unlock.
pub const BUZZER_HOLD: Duration = Duration::from_secs(5);

/// Grace period between a lock-on-shutdown request and the lock pulse.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// A button press while unlocked arms an auto-lock; closing the door within
/// this window triggers it.
pub const BUTTON_HOLD_WINDOW: Duration = Duration::from_secs(60);

// ============================================================================
// Telemetry topics
// ============================================================================

/// Button edge events: `pressed` / `released`.
pub const TOPIC_BUTTON: &str = "sensor/door/button";

/// Door-frame edge events: `open` / `closed`.
pub const TOPIC_FRAME: &str = "sensor/door/frame";

/// Bolt edge events: `locked` / `unlocked`.
pub const TOPIC_BOLT: &str = "sensor/door/lock";

/// Free-text alarm announcements.
pub const TOPIC_ALARM: &str = "psa/alarm";

/// Default inbound topic carrying the space occupancy count.
pub const TOPIC_OCCUPANTS: &str = "sensor/space/occupants";

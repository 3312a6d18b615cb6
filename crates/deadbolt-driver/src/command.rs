//! Door commands.
//!
//! Commands are created by the public driver API or by sensor logic, live
//! only inside the queue, and are consumed exactly once by the worker.

use std::fmt;

use chrono::{DateTime, Utc};

/// What the worker should do with the door.
///
/// Dispatch is an exhaustive match over this enum; there is no "unknown
/// command" runtime path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Pulse the lock solenoid (suppressed while the door stands open).
    Lock,
    /// Pulse the unlock solenoid and sound the buzzer.
    Unlock,
    /// Wait out a grace period, then lock if the door is closed.
    LockShutdown,
    /// End the worker loop after this iteration.
    Stop,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Lock => "lock",
            CommandKind::Unlock => "unlock",
            CommandKind::LockShutdown => "lock-shutdown",
            CommandKind::Stop => "stop",
        };
        write!(f, "{name}")
    }
}

/// A queued door command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorCommand {
    /// What to do.
    pub kind: CommandKind,

    /// Who asked, for the audit log. `None` for sensor-originated commands.
    pub requester: Option<String>,

    /// Forced commands execute even when newer commands are already queued
    /// behind them; unforced ones are coalesced away.
    pub force: bool,

    /// When the command was created.
    pub issued_at: DateTime<Utc>,
}

impl DoorCommand {
    fn new(kind: CommandKind, requester: Option<String>, force: bool) -> Self {
        Self {
            kind,
            requester,
            force,
            issued_at: Utc::now(),
        }
    }

    /// A lock request.
    #[must_use]
    pub fn lock(requester: Option<String>, force: bool) -> Self {
        Self::new(CommandKind::Lock, requester, force)
    }

    /// An unlock request.
    #[must_use]
    pub fn unlock(requester: Option<String>, force: bool) -> Self {
        Self::new(CommandKind::Unlock, requester, force)
    }

    /// A lock-after-grace request. Always forced.
    #[must_use]
    pub fn lock_shutdown() -> Self {
        Self::new(CommandKind::LockShutdown, None, true)
    }

    /// A worker shutdown request. Always forced.
    #[must_use]
    pub fn stop() -> Self {
        Self::new(CommandKind::Stop, None, true)
    }

    /// The requester, or a placeholder for the audit log.
    #[must_use]
    pub fn requester_label(&self) -> &str {
        self.requester.as_deref().unwrap_or("-")
    }
}

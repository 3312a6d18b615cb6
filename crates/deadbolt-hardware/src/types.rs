//! Common types shared across GPIO device implementations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Logical level of a digital line.
///
/// Active-low wiring is a driver concern; everything above the [`EdgeInput`]
/// trait sees the logical level only.
///
/// [`EdgeInput`]: crate::traits::EdgeInput
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// A transition on a digital input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    /// Low to high transition.
    Rising,
    /// High to low transition.
    Falling,
}

impl Edge {
    /// The level the line settled at after this edge.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Edge::Rising => Level::High,
            Edge::Falling => Level::Low,
        }
    }
}

/// Configuration for an edge-triggered input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Minimum quiet interval after an edge before the next edge is accepted.
    pub debounce: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            // Mechanical contacts on the door settle well within this.
            debounce: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_settles_at_expected_level() {
        assert_eq!(Edge::Rising.level(), Level::High);
        assert_eq!(Edge::Falling.level(), Level::Low);
        assert!(Level::High.is_high());
        assert!(!Level::Low.is_high());
    }

    #[test]
    fn default_debounce_is_nonzero() {
        assert!(InputConfig::default().debounce > Duration::ZERO);
    }
}

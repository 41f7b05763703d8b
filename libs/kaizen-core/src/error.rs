//! Error types for kaizen-core.

use thiserror::Error;

/// Result type alias using StatsError.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Violations of the user-stats invariants.
///
/// A stored record that fails validation is surfaced as-is, never repaired.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("level {level} is below the floor of 1")]
    LevelBelowFloor { level: u32 },

    #[error("current exp {current_exp} must stay below max exp {max_exp}")]
    ExpOverflow { current_exp: u32, max_exp: u32 },

    #[error("max exp must be at least 1")]
    ZeroMaxExp,

    #[error("hearts {hearts} exceed max hearts {max_hearts}")]
    HeartsOverflow { hearts: u32, max_hearts: u32 },

    #[error("max hearts must be at least 1")]
    ZeroMaxHearts,

    #[error("highest streak {highest} is below current streak {current}")]
    StreakMismatch { current: u32, highest: u32 },
}

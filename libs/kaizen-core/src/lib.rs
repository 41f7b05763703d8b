//! Core gamification library for the Kaizen task tracker.
//!
//! Provides:
//! - Level and experience progression with heart and coin rewards
//! - Failure and heart-zero penalty arithmetic
//! - Daily outcome evaluation and streak tracking
//! - Shared types (UserStats, TaskStatus, DaySummary, etc.)

pub mod config;
pub mod error;
pub mod progression;
pub mod streak;
pub mod types;

pub use config::GameConfig;
pub use error::{Result, StatsError};
pub use progression::ProgressionEngine;
pub use streak::{evaluate_day, update_streak};
pub use types::{DaySummary, RepeatConfig, TaskStatus, TaskType, UserStats};

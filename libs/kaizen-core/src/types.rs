//! Core types for the gamified task tracker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Todo,
    Habit,
    Challenge,
}

impl Default for TaskType {
    fn default() -> Self {
        Self::Todo
    }
}

impl TaskType {
    /// Get the task type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Habit => "habit",
            Self::Challenge => "challenge",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "habit" => Some(Self::Habit),
            "challenge" => Some(Self::Challenge),
            _ => None,
        }
    }
}

/// Task lifecycle status. A task is in exactly one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    /// Get the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Weekly repetition metadata carried by a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepeatConfig {
    pub enabled: bool,
    /// Days of the week the task repeats on, 0 = Sunday.
    pub days_of_week: Vec<u8>,
}

/// A user's gamification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub level: u32,
    pub current_exp: u32,
    pub max_exp: u32,
    pub hearts: u32,
    pub max_hearts: u32,
    pub coins: u32,
    pub current_streak: u32,
    pub highest_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            current_exp: 0,
            max_exp: 100,
            hearts: 10,
            max_hearts: 10,
            coins: 0,
            current_streak: 0,
            highest_streak: 0,
            last_activity_date: None,
        }
    }
}

impl UserStats {
    /// Check every stats invariant, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.level < 1 {
            return Err(StatsError::LevelBelowFloor { level: self.level });
        }
        if self.max_exp < 1 {
            return Err(StatsError::ZeroMaxExp);
        }
        if self.current_exp >= self.max_exp {
            return Err(StatsError::ExpOverflow {
                current_exp: self.current_exp,
                max_exp: self.max_exp,
            });
        }
        if self.max_hearts < 1 {
            return Err(StatsError::ZeroMaxHearts);
        }
        if self.hearts > self.max_hearts {
            return Err(StatsError::HeartsOverflow {
                hearts: self.hearts,
                max_hearts: self.max_hearts,
            });
        }
        if self.highest_streak < self.current_streak {
            return Err(StatsError::StreakMismatch {
                current: self.current_streak,
                highest: self.highest_streak,
            });
        }
        Ok(())
    }
}

/// Outcome of evaluating one closed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub success: bool,
}

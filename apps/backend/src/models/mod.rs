//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from kaizen-core
pub use kaizen_core::types::{DaySummary, RepeatConfig, TaskStatus, TaskType, UserStats};

use crate::error::{ApiError, Result};

// === Database Entity Types ===

/// User account stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUser {
    /// Convert to the API profile, which never carries the password hash
    pub fn to_api_user(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at,
        }
    }
}

/// Login session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Gamification stats stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUserStats {
    pub user_id: Uuid,
    pub level: i32,
    pub current_exp: i32,
    pub max_exp: i32,
    pub hearts: i32,
    pub max_hearts: i32,
    pub coins: i32,
    pub current_streak: i32,
    pub highest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUserStats {
    /// Convert to the kaizen-core stats record.
    ///
    /// A row that fails conversion or validation is corrupt and is
    /// surfaced as an integrity error rather than silently patched.
    pub fn to_core_stats(&self) -> Result<UserStats> {
        let stats = UserStats {
            level: stat_field("level", self.level)?,
            current_exp: stat_field("current_exp", self.current_exp)?,
            max_exp: stat_field("max_exp", self.max_exp)?,
            hearts: stat_field("hearts", self.hearts)?,
            max_hearts: stat_field("max_hearts", self.max_hearts)?,
            coins: stat_field("coins", self.coins)?,
            current_streak: stat_field("current_streak", self.current_streak)?,
            highest_streak: stat_field("highest_streak", self.highest_streak)?,
            last_activity_date: self.last_activity_date,
        };
        stats.validate()?;
        Ok(stats)
    }
}

/// Task stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub status: String,
    pub assigned_date: NaiveDate,
    pub delay_count: i32,
    pub repeat_enabled: bool,
    pub repeat_days: Vec<i32>,
    pub exp_reward: i32,
    pub coin_reward: i32,
    pub heart_penalty: i32,
    pub coin_penalty: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTask {
    /// Convert to the API task, rejecting rows with unknown enum text
    pub fn to_api_task(&self) -> Result<Task> {
        let task_type = TaskType::from_str(&self.task_type).ok_or_else(|| {
            ApiError::Integrity(format!("unknown task type: {}", self.task_type))
        })?;
        let status = TaskStatus::from_str(&self.status).ok_or_else(|| {
            ApiError::Integrity(format!("unknown task status: {}", self.status))
        })?;
        let days_of_week = self
            .repeat_days
            .iter()
            .map(|d| {
                u8::try_from(*d)
                    .map_err(|_| ApiError::Integrity(format!("repeat day out of range: {}", d)))
            })
            .collect::<Result<Vec<u8>>>()?;

        Ok(Task {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            task_type,
            status,
            assigned_date: self.assigned_date,
            delay_count: stat_field("delay_count", self.delay_count)?,
            repeat: RepeatConfig {
                enabled: self.repeat_enabled,
                days_of_week,
            },
            exp_reward: stat_field("exp_reward", self.exp_reward)?,
            coin_reward: stat_field("coin_reward", self.coin_reward)?,
            heart_penalty: stat_field("heart_penalty", self.heart_penalty)?,
            coin_penalty: stat_field("coin_penalty", self.coin_penalty)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Fields for inserting a new task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub assigned_date: NaiveDate,
    pub repeat: RepeatConfig,
    pub exp_reward: u32,
    pub coin_reward: u32,
    pub heart_penalty: u32,
    pub coin_penalty: u32,
}

/// Activity log row, one per user per calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub completed_tasks: i32,
    pub total_tasks: i32,
    pub success: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a stored stat column to u32, rejecting negative values
fn stat_field(name: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ApiError::Integrity(format!("{} is negative: {}", name, value)))
}

// === API Request/Response Types ===

// Auth types
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Task types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub assigned_date: NaiveDate,
    pub delay_count: u32,
    pub repeat: RepeatConfig,
    pub exp_reward: u32,
    pub coin_reward: u32,
    pub heart_penalty: u32,
    pub coin_penalty: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub task_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub task_type: String,
    pub assigned_date: NaiveDate,
    pub repeat: Option<RepeatConfig>,
    pub exp_reward: Option<i64>,
    pub coin_reward: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub assigned_date: Option<NaiveDate>,
    pub repeat: Option<RepeatConfig>,
    pub exp_reward: Option<i64>,
    pub coin_reward: Option<i64>,
}

/// Response for complete/fail actions: the task plus the stats it moved
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskActionResponse {
    pub task: Task,
    pub stats: UserStats,
    pub levels_gained: u32,
}

// Stats types
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: UserStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub highest_streak: u32,
}

/// Per-type totals row from the counts query
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskTypeCount {
    pub task_type: String,
    pub count: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub todos: i64,
    pub habits: i64,
    pub challenges: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCountsResponse {
    pub counts: TaskCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapEntry {
    pub date: NaiveDate,
    pub intensity: f64,
    pub completed_tasks: u32,
    pub total_tasks: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub heatmap: Vec<HeatmapEntry>,
}

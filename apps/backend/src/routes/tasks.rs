//! Task endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{
    CreateTaskRequest, NewTask, RepeatConfig, Task, TaskActionResponse, TaskListQuery,
    TaskListResponse, TaskStatus, TaskType, UpdateTaskRequest, UserStats,
};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// Retry budget for optimistic stats writes
const MAX_STATS_RETRIES: u32 = 3;

/// GET /api/tasks - list tasks with optional type/date/status filters
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<TaskListResponse>> {
    if let Some(t) = query.task_type.as_deref() {
        if TaskType::from_str(t).is_none() {
            return Err(ApiError::BadRequest(format!("Invalid task type: {}", t)));
        }
    }
    if let Some(s) = query.status.as_deref() {
        if TaskStatus::from_str(s).is_none() {
            return Err(ApiError::BadRequest(format!("Invalid task status: {}", s)));
        }
    }

    let rows = state
        .db
        .get_tasks(
            auth.user_id,
            query.task_type.as_deref(),
            query.date,
            query.status.as_deref(),
        )
        .await?;

    let tasks = rows
        .iter()
        .map(|row| row.to_api_task())
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(TaskListResponse { tasks }))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>> {
    let task = state
        .db
        .get_task(task_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task.to_api_task()?))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    let title = validated_title(&request.title)?;

    let task_type = TaskType::from_str(&request.task_type).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid task type: {}", request.task_type))
    })?;

    let repeat = request.repeat.unwrap_or_default();
    validate_repeat(&repeat)?;

    // Rewards may be overridden per task; penalties are always stamped
    // from the configured defaults
    let game = &state.engine.config;
    let new_task = NewTask {
        user_id: auth.user_id,
        title,
        description: request.description.unwrap_or_default(),
        task_type,
        assigned_date: request.assigned_date,
        repeat,
        exp_reward: match request.exp_reward {
            Some(value) => checked_reward("exp_reward", value)?,
            None => game.task_completion_exp,
        },
        coin_reward: match request.coin_reward {
            Some(value) => checked_reward("coin_reward", value)?,
            None => game.task_completion_coins,
        },
        heart_penalty: game.task_failure_heart_loss,
        coin_penalty: game.task_failure_coin_loss,
    };

    let task = state.db.create_task(&new_task).await?;

    Ok(Json(task.to_api_task()?))
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    let mut current = state
        .db
        .get_task(task_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if let Some(title) = request.title {
        current.title = validated_title(&title)?;
    }
    if let Some(description) = request.description {
        current.description = description;
    }
    if let Some(task_type) = request.task_type {
        TaskType::from_str(&task_type)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid task type: {}", task_type)))?;
        current.task_type = task_type;
    }
    if let Some(assigned_date) = request.assigned_date {
        current.assigned_date = assigned_date;
    }
    if let Some(repeat) = request.repeat {
        validate_repeat(&repeat)?;
        current.repeat_enabled = repeat.enabled;
        current.repeat_days = repeat.days_of_week.iter().map(|d| *d as i32).collect();
    }
    if let Some(value) = request.exp_reward {
        current.exp_reward = checked_reward("exp_reward", value)? as i32;
    }
    if let Some(value) = request.coin_reward {
        current.coin_reward = checked_reward("coin_reward", value)? as i32;
    }

    state.db.update_task(&current).await?;

    Ok(Json(current.to_api_task()?))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_task(task_id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/tasks/{id}/complete
///
/// Completing is idempotent: a task that is already completed comes back
/// unchanged with no further rewards.
pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskActionResponse>> {
    let transitioned = state
        .db
        .transition_task_status(
            task_id,
            auth.user_id,
            &[TaskStatus::Pending, TaskStatus::Failed],
            TaskStatus::Completed,
        )
        .await?;

    let row = match transitioned {
        Some(row) => row,
        // Missing entirely, or already completed
        None => {
            let existing = state
                .db
                .get_task(task_id, auth.user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
            return already_settled(&state, auth.user_id, existing.to_api_task()?).await;
        }
    };

    let task = row.to_api_task()?;
    let exp = task.exp_reward;
    let coins = task.coin_reward;

    let (stats, levels_gained) = mutate_stats(&state, auth.user_id, |stats| {
        let gained = state.engine.grant_experience(stats, exp);
        stats.coins += coins;
        gained
    })
    .await?;

    Ok(Json(TaskActionResponse {
        task,
        stats,
        levels_gained,
    }))
}

/// POST /api/tasks/{id}/fail
///
/// Failing an already-failed task is a no-op; a completed task cannot
/// be failed.
pub async fn fail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskActionResponse>> {
    let transitioned = state
        .db
        .transition_task_status(
            task_id,
            auth.user_id,
            &[TaskStatus::Pending],
            TaskStatus::Failed,
        )
        .await?;

    let row = match transitioned {
        Some(row) => row,
        None => {
            let existing = state
                .db
                .get_task(task_id, auth.user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
            let task = existing.to_api_task()?;
            return match task.status {
                TaskStatus::Failed => already_settled(&state, auth.user_id, task).await,
                _ => Err(ApiError::BadRequest(
                    "Completed tasks cannot be failed".to_string(),
                )),
            };
        }
    };

    let task = row.to_api_task()?;
    let heart_penalty = task.heart_penalty;
    let coin_penalty = task.coin_penalty;

    let (stats, _) = mutate_stats(&state, auth.user_id, |stats| {
        let hearts_before = stats.hearts;
        state
            .engine
            .apply_failure_penalty(stats, heart_penalty, coin_penalty);
        // Only the subtraction that empties the pool triggers the reset
        if hearts_before > 0 && stats.hearts == 0 {
            state.engine.apply_heart_zero_penalty(stats);
        }
    })
    .await?;

    Ok(Json(TaskActionResponse {
        task,
        stats,
        levels_gained: 0,
    }))
}

/// Respond for a task whose status already matches the requested
/// transition: return it as-is with untouched stats
async fn already_settled(
    state: &AppState,
    user_id: Uuid,
    task: Task,
) -> Result<Json<TaskActionResponse>> {
    let stats_row = state
        .db
        .get_or_create_stats(user_id, &state.engine.initial_stats())
        .await?;

    Ok(Json(TaskActionResponse {
        task,
        stats: stats_row.to_core_stats()?,
        levels_gained: 0,
    }))
}

/// Apply a mutation to the user's stats under the optimistic version
/// check, retrying with fresh state on concurrent writes
async fn mutate_stats<T>(
    state: &AppState,
    user_id: Uuid,
    mut apply: impl FnMut(&mut UserStats) -> T,
) -> Result<(UserStats, T)> {
    for _ in 0..MAX_STATS_RETRIES {
        let row = state
            .db
            .get_or_create_stats(user_id, &state.engine.initial_stats())
            .await?;
        let version = row.version;
        let mut stats = row.to_core_stats()?;

        let outcome = apply(&mut stats);

        if state.db.save_stats(user_id, &stats, version).await? {
            return Ok((stats, outcome));
        }
    }

    Err(ApiError::Conflict(
        "Stats changed concurrently, retry the request".to_string(),
    ))
}

/// Validate a reward override, rejecting negatives before they reach
/// the progression engine
fn checked_reward(name: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ApiError::BadRequest(format!("{} must be a non-negative integer", name))
    })
}

fn validated_title(title: &str) -> Result<String> {
    let title = title.trim();
    // The limit counts characters, not bytes
    if title.is_empty() || title.chars().count() > 200 {
        return Err(ApiError::BadRequest(
            "Title must be 1-200 characters".to_string(),
        ));
    }
    Ok(title.to_string())
}

fn validate_repeat(repeat: &RepeatConfig) -> Result<()> {
    if repeat.days_of_week.iter().any(|d| *d > 6) {
        return Err(ApiError::BadRequest(
            "Repeat days must be 0-6 (Sunday through Saturday)".to_string(),
        ));
    }
    Ok(())
}

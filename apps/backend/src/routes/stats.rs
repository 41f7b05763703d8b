//! Stats endpoints: read-only projections of the gamification state

use axum::{extract::State, Extension, Json};
use chrono::{Days, Local};

use crate::error::Result;
use crate::models::{
    HeatmapEntry, HeatmapResponse, StatsResponse, StreakResponse, TaskCounts, TaskCountsResponse,
};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/stats
pub async fn get_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StatsResponse>> {
    let row = state
        .db
        .get_or_create_stats(auth.user_id, &state.engine.initial_stats())
        .await?;

    Ok(Json(StatsResponse {
        stats: row.to_core_stats()?,
    }))
}

/// GET /api/stats/streak
pub async fn streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StreakResponse>> {
    let response = match state.db.get_stats(auth.user_id).await? {
        Some(row) => {
            let stats = row.to_core_stats()?;
            StreakResponse {
                current_streak: stats.current_streak,
                highest_streak: stats.highest_streak,
            }
        }
        None => StreakResponse {
            current_streak: 0,
            highest_streak: 0,
        },
    };

    Ok(Json(response))
}

/// GET /api/stats/counts - task totals grouped by type
pub async fn counts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<TaskCountsResponse>> {
    let rows = state.db.task_counts_by_type(auth.user_id).await?;

    let mut counts = TaskCounts::default();
    for row in rows {
        match row.task_type.as_str() {
            "todo" => counts.todos = row.count,
            "habit" => counts.habits = row.count,
            "challenge" => counts.challenges = row.count,
            _ => {}
        }
    }

    Ok(Json(TaskCountsResponse { counts }))
}

/// GET /api/stats/heatmap - daily completion intensity for the last year
pub async fn heatmap(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<HeatmapResponse>> {
    let today = Local::now().date_naive();
    let since = today - Days::new(365);

    let logs = state.db.get_activity_since(auth.user_id, since).await?;

    let heatmap = logs
        .into_iter()
        .map(|log| HeatmapEntry {
            date: log.date,
            intensity: if log.total_tasks > 0 {
                log.completed_tasks as f64 / log.total_tasks as f64
            } else {
                0.0
            },
            completed_tasks: log.completed_tasks as u32,
            total_tasks: log.total_tasks as u32,
        })
        .collect();

    Ok(Json(HeatmapResponse { heatmap }))
}

//! Daily outcome evaluation and streak tracking.

use crate::types::{DaySummary, TaskStatus, UserStats};

/// Evaluate one day from the statuses of the tasks assigned to it.
///
/// A day succeeds only when every assigned task was completed and at least
/// `min_tasks_for_success` of them were. A day with no assigned tasks is
/// never successful.
pub fn evaluate_day(statuses: &[TaskStatus], min_tasks_for_success: u32) -> DaySummary {
    let total_tasks = statuses.len() as u32;
    let completed_tasks = statuses
        .iter()
        .filter(|s| **s == TaskStatus::Completed)
        .count() as u32;

    let success = total_tasks > 0
        && completed_tasks == total_tasks
        && completed_tasks >= min_tasks_for_success;

    DaySummary {
        completed_tasks,
        total_tasks,
        success,
    }
}

/// Advance or reset the streak counters for a closed day.
pub fn update_streak(stats: &mut UserStats, success: bool) {
    if success {
        stats.current_streak += 1;
        if stats.current_streak > stats.highest_streak {
            stats.highest_streak = stats.current_streak;
        }
    } else {
        stats.current_streak = 0;
    }
}

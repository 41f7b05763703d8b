//! Test fixtures and factory functions for creating test data.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use kaizen_backend::models::{NewTask, RepeatConfig, TaskType};

/// Generate a unique test email to avoid collisions.
pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.test", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Create a register request body.
pub fn register_request(name: &str, email: &str, password: &str) -> serde_json::Value {
    json!({
        "name": name,
        "email": email,
        "password": password
    })
}

/// Create a login request body.
pub fn login_request(email: &str, password: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": password
    })
}

/// Create a task creation request body with default rewards.
pub fn task_request(title: &str, task_type: &str, assigned_date: NaiveDate) -> serde_json::Value {
    json!({
        "title": title,
        "task_type": task_type,
        "assigned_date": assigned_date
    })
}

/// Create a task creation request body with reward overrides.
pub fn task_request_with_rewards(
    title: &str,
    task_type: &str,
    assigned_date: NaiveDate,
    exp_reward: i64,
    coin_reward: i64,
) -> serde_json::Value {
    json!({
        "title": title,
        "task_type": task_type,
        "assigned_date": assigned_date,
        "exp_reward": exp_reward,
        "coin_reward": coin_reward
    })
}

/// Build a NewTask for inserting directly through the database.
///
/// Uses the default reward and penalty amounts.
pub fn new_task(user_id: Uuid, title: &str, assigned_date: NaiveDate) -> NewTask {
    NewTask {
        user_id,
        title: title.to_string(),
        description: String::new(),
        task_type: TaskType::Todo,
        assigned_date,
        repeat: RepeatConfig::default(),
        exp_reward: 10,
        coin_reward: 5,
        heart_penalty: 1,
        coin_penalty: 2,
    }
}

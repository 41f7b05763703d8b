//! PostgreSQL database operations

use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user account
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<DbUser> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, avatar, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, name, email, password_hash, avatar, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, name, email, password_hash, avatar, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get every user ID, the fan-out source for the rollover
    pub async fn list_user_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    // === Session Repository ===

    /// Create a new session with a generated token, keeping at most
    /// the five most recent sessions per user
    pub async fn create_session(&self, user_id: Uuid) -> Result<Session> {
        let token = Uuid::new_v4().to_string();
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE user_id = $1
              AND id NOT IN (
                SELECT id FROM sessions
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT 5
              )
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Get session by token
    pub async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, created_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Delete a session by token
    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Stats Repository ===

    /// Get the stats row for a user
    pub async fn get_stats(&self, user_id: Uuid) -> Result<Option<DbUserStats>> {
        let stats = sqlx::query_as::<_, DbUserStats>(
            r#"
            SELECT user_id, level, current_exp, max_exp, hearts, max_hearts, coins,
                   current_streak, highest_streak, last_activity_date, version,
                   created_at, updated_at
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Get the stats row for a user, creating it from `initial` if missing
    pub async fn get_or_create_stats(
        &self,
        user_id: Uuid,
        initial: &UserStats,
    ) -> Result<DbUserStats> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, level, current_exp, max_exp, hearts,
                                    max_hearts, coins, current_streak, highest_streak,
                                    last_activity_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(initial.level as i32)
        .bind(initial.current_exp as i32)
        .bind(initial.max_exp as i32)
        .bind(initial.hearts as i32)
        .bind(initial.max_hearts as i32)
        .bind(initial.coins as i32)
        .bind(initial.current_streak as i32)
        .bind(initial.highest_streak as i32)
        .bind(initial.last_activity_date)
        .execute(&self.pool)
        .await?;

        self.get_stats(user_id)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("stats row missing for user {}", user_id)))
    }

    /// Save a stats record if its version still matches.
    ///
    /// Returns false when another writer bumped the version first;
    /// callers reload and retry.
    pub async fn save_stats(
        &self,
        user_id: Uuid,
        stats: &UserStats,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_stats
            SET level = $2, current_exp = $3, max_exp = $4, hearts = $5,
                max_hearts = $6, coins = $7, current_streak = $8, highest_streak = $9,
                last_activity_date = $10, version = version + 1, updated_at = NOW()
            WHERE user_id = $1 AND version = $11
            "#,
        )
        .bind(user_id)
        .bind(stats.level as i32)
        .bind(stats.current_exp as i32)
        .bind(stats.max_exp as i32)
        .bind(stats.hearts as i32)
        .bind(stats.max_hearts as i32)
        .bind(stats.coins as i32)
        .bind(stats.current_streak as i32)
        .bind(stats.highest_streak as i32)
        .bind(stats.last_activity_date)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the stats row inside an open transaction
    pub async fn get_stats_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<DbUserStats>> {
        let stats = sqlx::query_as::<_, DbUserStats>(
            r#"
            SELECT user_id, level, current_exp, max_exp, hearts, max_hearts, coins,
                   current_streak, highest_streak, last_activity_date, version,
                   created_at, updated_at
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(stats)
    }

    /// Version-checked stats save inside an open transaction
    pub async fn save_stats_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        stats: &UserStats,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_stats
            SET level = $2, current_exp = $3, max_exp = $4, hearts = $5,
                max_hearts = $6, coins = $7, current_streak = $8, highest_streak = $9,
                last_activity_date = $10, version = version + 1, updated_at = NOW()
            WHERE user_id = $1 AND version = $11
            "#,
        )
        .bind(user_id)
        .bind(stats.level as i32)
        .bind(stats.current_exp as i32)
        .bind(stats.max_exp as i32)
        .bind(stats.hearts as i32)
        .bind(stats.max_hearts as i32)
        .bind(stats.coins as i32)
        .bind(stats.current_streak as i32)
        .bind(stats.highest_streak as i32)
        .bind(stats.last_activity_date)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Task Repository ===

    /// Insert a new task
    pub async fn create_task(&self, task: &NewTask) -> Result<DbTask> {
        let repeat_days: Vec<i32> = task.repeat.days_of_week.iter().map(|d| *d as i32).collect();
        let created = sqlx::query_as::<_, DbTask>(
            r#"
            INSERT INTO tasks (user_id, title, description, task_type, assigned_date,
                               repeat_enabled, repeat_days, exp_reward, coin_reward,
                               heart_penalty, coin_penalty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, title, description, task_type, status, assigned_date,
                      delay_count, repeat_enabled, repeat_days, exp_reward, coin_reward,
                      heart_penalty, coin_penalty, created_at, updated_at
            "#,
        )
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.task_type.as_str())
        .bind(task.assigned_date)
        .bind(task.repeat.enabled)
        .bind(&repeat_days)
        .bind(task.exp_reward as i32)
        .bind(task.coin_reward as i32)
        .bind(task.heart_penalty as i32)
        .bind(task.coin_penalty as i32)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Get a task owned by the given user
    pub async fn get_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<DbTask>> {
        let task = sqlx::query_as::<_, DbTask>(
            r#"
            SELECT id, user_id, title, description, task_type, status, assigned_date,
                   delay_count, repeat_enabled, repeat_days, exp_reward, coin_reward,
                   heart_penalty, coin_penalty, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Get tasks for a user with optional type/date/status filters
    pub async fn get_tasks(
        &self,
        user_id: Uuid,
        task_type: Option<&str>,
        date: Option<NaiveDate>,
        status: Option<&str>,
    ) -> Result<Vec<DbTask>> {
        let tasks = sqlx::query_as::<_, DbTask>(
            r#"
            SELECT id, user_id, title, description, task_type, status, assigned_date,
                   delay_count, repeat_enabled, repeat_days, exp_reward, coin_reward,
                   heart_penalty, coin_penalty, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR task_type = $2)
              AND ($3::DATE IS NULL OR assigned_date = $3)
              AND ($4::TEXT IS NULL OR status = $4)
            ORDER BY assigned_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(task_type)
        .bind(date)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Update the mutable fields of a task
    pub async fn update_task(&self, task: &DbTask) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, task_type = $5, assigned_date = $6,
                repeat_enabled = $7, repeat_days = $8, exp_reward = $9, coin_reward = $10,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.task_type)
        .bind(task.assigned_date)
        .bind(task.repeat_enabled)
        .bind(&task.repeat_days)
        .bind(task.exp_reward)
        .bind(task.coin_reward)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a task owned by the given user
    pub async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically move a task from one of `allowed_from` to `to`.
    ///
    /// Returns the updated row, or None when the task is missing or its
    /// status is not in the allowed set. Concurrent calls cannot both
    /// win the same transition.
    pub async fn transition_task_status(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        allowed_from: &[TaskStatus],
        to: TaskStatus,
    ) -> Result<Option<DbTask>> {
        let from_states: Vec<String> = allowed_from
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let task = sqlx::query_as::<_, DbTask>(
            r#"
            UPDATE tasks
            SET status = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = ANY($3)
            RETURNING id, user_id, title, description, task_type, status, assigned_date,
                      delay_count, repeat_enabled, repeat_days, exp_reward, coin_reward,
                      heart_penalty, coin_penalty, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(&from_states)
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Count tasks per type for a user
    pub async fn task_counts_by_type(&self, user_id: Uuid) -> Result<Vec<TaskTypeCount>> {
        let counts = sqlx::query_as::<_, TaskTypeCount>(
            r#"
            SELECT task_type, COUNT(*) as count
            FROM tasks
            WHERE user_id = $1
            GROUP BY task_type
            ORDER BY task_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Lock and return every task assigned to one user on one day.
    ///
    /// Runs inside the rollover transaction; FOR UPDATE keeps the day's
    /// snapshot stable until commit.
    pub async fn tasks_for_day_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<DbTask>> {
        let tasks = sqlx::query_as::<_, DbTask>(
            r#"
            SELECT id, user_id, title, description, task_type, status, assigned_date,
                   delay_count, repeat_enabled, repeat_days, exp_reward, coin_reward,
                   heart_penalty, coin_penalty, created_at, updated_at
            FROM tasks
            WHERE user_id = $1 AND assigned_date = $2
            ORDER BY created_at
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(&mut *conn)
        .await?;

        Ok(tasks)
    }

    /// Advance still-pending tasks to a new day, bumping their delay count
    pub async fn advance_tasks_tx(
        &self,
        conn: &mut PgConnection,
        task_ids: &[Uuid],
        to_date: NaiveDate,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET assigned_date = $2, delay_count = delay_count + 1, updated_at = NOW()
            WHERE id = ANY($1) AND status = 'pending'
            "#,
        )
        .bind(task_ids)
        .bind(to_date)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    // === Activity Repository ===

    /// Upsert the activity log row for one (user, day)
    pub async fn upsert_activity_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        date: NaiveDate,
        summary: &DaySummary,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, date, completed_tasks, total_tasks, success)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, date) DO UPDATE SET
                completed_tasks = EXCLUDED.completed_tasks,
                total_tasks = EXCLUDED.total_tasks,
                success = EXCLUDED.success,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(summary.completed_tasks as i32)
        .bind(summary.total_tasks as i32)
        .bind(summary.success)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Get activity log rows on or after a date, oldest first
    pub async fn get_activity_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DbActivityLog>> {
        let logs = sqlx::query_as::<_, DbActivityLog>(
            r#"
            SELECT id, user_id, date, completed_tasks, total_tasks, success,
                   created_at, updated_at
            FROM activity_logs
            WHERE user_id = $1 AND date >= $2
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

//! Daily rollover: the batch process that closes out a calendar day.
//!
//! For each user it carries still-pending tasks into the new day, applies
//! their penalties, records the day's outcome, updates the streak, and
//! refills hearts. Each (user, day) closes in its own transaction, so one
//! user failing never blocks the rest of the batch.

use std::future::Future;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use kaizen_core::{evaluate_day, update_streak, ProgressionEngine, TaskStatus};

use crate::db::Database;
use crate::error::{ApiError, Result};

/// Retry budget for a (user, day) close that loses a version race
const MAX_CLOSE_RETRIES: u32 = 3;

/// Outcome totals for one rollover pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    pub users_processed: u64,
    pub users_failed: u64,
    pub days_closed: u64,
}

/// How one (user, day) close attempt ended
enum CloseOutcome {
    Closed,
    AlreadyClosed,
    Conflict,
}

#[derive(Clone)]
pub struct RolloverService {
    db: Arc<Database>,
    engine: Arc<ProgressionEngine>,
    concurrency: usize,
}

impl RolloverService {
    pub fn new(db: Arc<Database>, engine: Arc<ProgressionEngine>, concurrency: usize) -> Self {
        Self {
            db,
            engine,
            concurrency: concurrency.max(1),
        }
    }

    /// Close every user's open days up to, but not including, `today`.
    ///
    /// Users are processed in parallel under the concurrency bound. A
    /// failure for one user is logged and counted, never aborts the rest.
    pub async fn run(&self, today: NaiveDate) -> Result<RolloverReport> {
        let user_ids = self.db.list_user_ids().await?;
        fan_out(user_ids, self.concurrency, |user_id| {
            let service = self.clone();
            async move { service.roll_user(user_id, today).await }
        })
        .await
    }

    /// Close all of one user's open days, oldest first. Returns how many
    /// days were closed by this call.
    async fn roll_user(&self, user_id: Uuid, today: NaiveDate) -> Result<u64> {
        let row = self
            .db
            .get_or_create_stats(user_id, &self.engine.initial_stats())
            .await?;
        let stats = row.to_core_stats()?;

        let mut closed = 0;
        for day in days_to_close(stats.last_activity_date, today) {
            let mut attempts = 0;
            loop {
                match self.close_day(user_id, day).await? {
                    CloseOutcome::Closed => {
                        closed += 1;
                        break;
                    }
                    CloseOutcome::AlreadyClosed => break,
                    CloseOutcome::Conflict => {
                        attempts += 1;
                        if attempts >= MAX_CLOSE_RETRIES {
                            return Err(ApiError::Conflict(format!(
                                "gave up closing {} after {} version conflicts",
                                day, attempts
                            )));
                        }
                    }
                }
            }
        }

        Ok(closed)
    }

    /// Close one (user, day) in a single transaction.
    ///
    /// The task snapshot is taken before carried tasks are advanced, so
    /// pending tasks still count against the day they were assigned to.
    async fn close_day(&self, user_id: Uuid, day: NaiveDate) -> Result<CloseOutcome> {
        let mut tx = self.db.pool().begin().await?;

        let row = self
            .db
            .get_stats_tx(&mut tx, user_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("stats row missing for user {}", user_id))
            })?;
        let version = row.version;
        let mut stats = row.to_core_stats()?;

        // A concurrent pass may have closed this day already
        if let Some(cursor) = stats.last_activity_date {
            if cursor > day {
                tx.rollback().await?;
                return Ok(CloseOutcome::AlreadyClosed);
            }
        }

        let task_rows = self.db.tasks_for_day_tx(&mut tx, user_id, day).await?;
        let mut statuses = Vec::with_capacity(task_rows.len());
        let mut carried = Vec::new();
        for task_row in &task_rows {
            let task = task_row.to_api_task()?;
            if task.status == TaskStatus::Pending {
                carried.push(task.clone());
            }
            statuses.push(task.status);
        }

        if !carried.is_empty() {
            let ids: Vec<Uuid> = carried.iter().map(|t| t.id).collect();
            self.db
                .advance_tasks_tx(&mut tx, &ids, day + Days::new(1))
                .await?;

            let hearts_before = stats.hearts;
            for task in &carried {
                self.engine
                    .apply_failure_penalty(&mut stats, task.heart_penalty, task.coin_penalty);
            }
            // The reset fires once per batch, and only when this batch
            // emptied the pool
            if hearts_before > 0 && stats.hearts == 0 {
                self.engine.apply_heart_zero_penalty(&mut stats);
            }
        }

        let summary = evaluate_day(&statuses, self.engine.config.min_tasks_for_successful_day);
        self.db
            .upsert_activity_tx(&mut tx, user_id, day, &summary)
            .await?;

        update_streak(&mut stats, summary.success);

        // Refill strictly after penalties and streak evaluation
        stats.hearts = (stats.hearts + self.engine.config.daily_heart_refill).min(stats.max_hearts);

        // The stamp doubles as the catch-up cursor: the next day still open
        stats.last_activity_date = Some(day + Days::new(1));

        if !self
            .db
            .save_stats_tx(&mut tx, user_id, &stats, version)
            .await?
        {
            tx.rollback().await?;
            return Ok(CloseOutcome::Conflict);
        }

        tx.commit().await?;
        Ok(CloseOutcome::Closed)
    }
}

/// Run `work` for every user under the concurrency bound and tally the
/// outcomes. A worker error or panic is counted against the report and
/// logged, never propagated, so one user cannot take down the batch.
async fn fan_out<F, Fut>(user_ids: Vec<Uuid>, concurrency: usize, work: F) -> Result<RolloverReport>
where
    F: Fn(Uuid) -> Fut,
    Fut: Future<Output = Result<u64>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set = JoinSet::new();

    for user_id in user_ids {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ApiError::Internal("rollover semaphore closed".to_string()))?;
        let worker = work(user_id);
        join_set.spawn(async move {
            let result = worker.await;
            drop(permit);
            (user_id, result)
        });
    }

    let mut report = RolloverReport::default();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((_, Ok(days))) => {
                report.users_processed += 1;
                report.days_closed += days;
            }
            Ok((user_id, Err(err))) => {
                report.users_failed += 1;
                tracing::error!("Rollover failed for user {}: {}", user_id, err);
            }
            Err(err) => {
                report.users_failed += 1;
                tracing::error!("Rollover worker panicked: {}", err);
            }
        }
    }

    Ok(report)
}

/// Days that still need closing for a user, oldest first: `[cursor, today)`.
///
/// A user with no recorded activity closes only yesterday. A cursor at or
/// past `today` yields nothing, which makes re-running a day boundary
/// harmless.
pub fn days_to_close(last_activity: Option<NaiveDate>, today: NaiveDate) -> Vec<NaiveDate> {
    let first_open = match last_activity {
        Some(cursor) => cursor,
        None => match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) => yesterday,
            None => return Vec::new(),
        },
    };

    let mut days = Vec::new();
    let mut day = first_open;
    while day < today {
        days.push(day);
        day = day + Days::new(1);
    }

    days
}

//! Cron trigger for the daily rollover

use std::sync::Arc;

use chrono::Local;

use crate::error::{ApiError, Result};
use crate::services::rollover::RolloverService;

/// Validate the cron expression and spawn the background trigger task.
///
/// One pass runs immediately at startup, so day boundaries missed while
/// the process was down are closed before the next scheduled firing.
pub fn spawn(service: Arc<RolloverService>, cron_expr: &str) -> Result<()> {
    let cron: croner::Cron = cron_expr.parse().map_err(|e| {
        ApiError::Internal(format!("invalid rollover cron '{}': {}", cron_expr, e))
    })?;

    tracing::info!("Rollover scheduled with cron '{}'", cron_expr);

    tokio::spawn(async move {
        run_once(&service).await;

        loop {
            let next = match cron.find_next_occurrence(&Local::now(), false) {
                Ok(next) => next,
                Err(err) => {
                    tracing::error!("No next rollover occurrence: {}", err);
                    return;
                }
            };

            let wait = (next - Local::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            run_once(&service).await;
        }
    });

    Ok(())
}

/// Run one rollover pass for the current local date
async fn run_once(service: &RolloverService) {
    let today = Local::now().date_naive();
    match service.run(today).await {
        Ok(report) => {
            tracing::info!(
                "Rollover for {}: {} users processed, {} days closed, {} failed",
                today,
                report.users_processed,
                report.days_closed,
                report.users_failed
            );
        }
        Err(err) => {
            tracing::error!("Rollover pass failed: {}", err);
        }
    }
}

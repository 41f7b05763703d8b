//! Environment-driven configuration

use kaizen_core::GameConfig;

/// Application configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: String,
    pub rollover_cron: String,
    pub rollover_concurrency: usize,
    pub game: GameConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Every gameplay tunable can be overridden with an env var of the
    /// same name in SCREAMING_SNAKE_CASE (e.g. `TASK_COMPLETION_EXP`).
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let rollover_cron =
            std::env::var("ROLLOVER_CRON").unwrap_or_else(|_| "0 0 * * *".to_string());
        let rollover_concurrency = env_usize("ROLLOVER_CONCURRENCY", 8);

        let defaults = GameConfig::default();
        let mut game = GameConfig {
            task_completion_exp: env_u32("TASK_COMPLETION_EXP", defaults.task_completion_exp),
            task_completion_coins: env_u32("TASK_COMPLETION_COINS", defaults.task_completion_coins),
            task_failure_heart_loss: env_u32(
                "TASK_FAILURE_HEART_LOSS",
                defaults.task_failure_heart_loss,
            ),
            task_failure_coin_loss: env_u32(
                "TASK_FAILURE_COIN_LOSS",
                defaults.task_failure_coin_loss,
            ),
            initial_level: env_u32("INITIAL_LEVEL", defaults.initial_level),
            initial_max_exp: env_u32("INITIAL_MAX_EXP", defaults.initial_max_exp),
            exp_increase_per_level: env_u32(
                "EXP_INCREASE_PER_LEVEL",
                defaults.exp_increase_per_level,
            ),
            level_up_bonus_coins: env_u32("LEVEL_UP_BONUS_COINS", defaults.level_up_bonus_coins),
            level_up_heart_increase: env_u32(
                "LEVEL_UP_HEART_INCREASE",
                defaults.level_up_heart_increase,
            ),
            initial_max_hearts: env_u32("INITIAL_MAX_HEARTS", defaults.initial_max_hearts),
            initial_hearts: env_u32("INITIAL_HEARTS", defaults.initial_hearts),
            daily_heart_refill: env_u32("DAILY_HEART_REFILL", defaults.daily_heart_refill),
            heart_zero_level_penalty: env_u32(
                "HEART_ZERO_LEVEL_PENALTY",
                defaults.heart_zero_level_penalty,
            ),
            heart_zero_coin_penalty_percent: env_f64(
                "HEART_ZERO_COIN_PENALTY_PERCENT",
                defaults.heart_zero_coin_penalty_percent,
            ),
            heart_zero_heart_reset_percent: env_f64(
                "HEART_ZERO_HEART_RESET_PERCENT",
                defaults.heart_zero_heart_reset_percent,
            ),
            min_tasks_for_successful_day: env_u32(
                "MIN_TASKS_FOR_SUCCESSFUL_DAY",
                defaults.min_tasks_for_successful_day,
            ),
        };

        // Keep overrides inside the ranges the engine relies on
        game.initial_level = game.initial_level.max(1);
        game.initial_max_exp = game.initial_max_exp.max(1);
        game.initial_max_hearts = game.initial_max_hearts.max(1);
        game.initial_hearts = game.initial_hearts.min(game.initial_max_hearts);
        game.heart_zero_coin_penalty_percent =
            game.heart_zero_coin_penalty_percent.clamp(0.0, 1.0);
        game.heart_zero_heart_reset_percent = game.heart_zero_heart_reset_percent.clamp(0.0, 1.0);

        Self {
            database_url,
            host,
            port,
            rollover_cron,
            rollover_concurrency,
            game,
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! Gameplay tuning constants.

/// Tunable constants for progression, penalties, and the daily rollover.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub task_completion_exp: u32,
    pub task_completion_coins: u32,
    pub task_failure_heart_loss: u32,
    pub task_failure_coin_loss: u32,
    pub initial_level: u32,
    pub initial_max_exp: u32,
    pub exp_increase_per_level: u32,
    pub level_up_bonus_coins: u32,
    pub level_up_heart_increase: u32,
    pub initial_max_hearts: u32,
    pub initial_hearts: u32,
    pub daily_heart_refill: u32,
    pub heart_zero_level_penalty: u32,
    /// Fraction of coins lost when hearts hit zero, in [0, 1].
    pub heart_zero_coin_penalty_percent: f64,
    /// Fraction of the heart pool restored after the heart-zero penalty, in [0, 1].
    pub heart_zero_heart_reset_percent: f64,
    pub min_tasks_for_successful_day: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            task_completion_exp: 10,
            task_completion_coins: 5,
            task_failure_heart_loss: 1,
            task_failure_coin_loss: 2,
            initial_level: 1,
            initial_max_exp: 100,
            exp_increase_per_level: 10,
            level_up_bonus_coins: 10,
            level_up_heart_increase: 1,
            initial_max_hearts: 10,
            initial_hearts: 10,
            daily_heart_refill: 5,
            heart_zero_level_penalty: 1,
            heart_zero_coin_penalty_percent: 0.1,
            heart_zero_heart_reset_percent: 0.5,
            min_tasks_for_successful_day: 1,
        }
    }
}

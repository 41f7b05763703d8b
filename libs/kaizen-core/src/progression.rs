//! Level, experience, heart, and coin progression.

use crate::config::GameConfig;
use crate::types::UserStats;

/// Progression rules applied to a user's stats record.
#[derive(Debug, Clone, Default)]
pub struct ProgressionEngine {
    pub config: GameConfig,
}

impl ProgressionEngine {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    /// Stats record for a freshly created account.
    pub fn initial_stats(&self) -> UserStats {
        UserStats {
            level: self.config.initial_level,
            current_exp: 0,
            max_exp: self.config.initial_max_exp,
            hearts: self.config.initial_hearts,
            max_hearts: self.config.initial_max_hearts,
            coins: 0,
            current_streak: 0,
            highest_streak: 0,
            last_activity_date: None,
        }
    }

    /// Add experience, resolving each level-up in sequence.
    ///
    /// Excess experience carries into the next level, whose requirement is
    /// already raised, so a single large grant can produce several level-ups.
    /// Each level-up also grows the heart pool and pays the bonus coins.
    /// Returns the number of levels gained.
    pub fn grant_experience(&self, stats: &mut UserStats, amount: u32) -> u32 {
        stats.current_exp += amount;

        let mut levels_gained = 0;
        while stats.current_exp >= stats.max_exp {
            stats.current_exp -= stats.max_exp;
            stats.level += 1;
            stats.max_exp += self.config.exp_increase_per_level;
            stats.max_hearts += self.config.level_up_heart_increase;
            stats.hearts += self.config.level_up_heart_increase;
            stats.coins += self.config.level_up_bonus_coins;
            levels_gained += 1;
        }
        levels_gained
    }

    /// Subtract one task's heart and coin penalty, flooring both at zero.
    pub fn apply_failure_penalty(&self, stats: &mut UserStats, heart_loss: u32, coin_loss: u32) {
        stats.hearts = stats.hearts.saturating_sub(heart_loss);
        stats.coins = stats.coins.saturating_sub(coin_loss);
    }

    /// Penalty for running out of hearts: drop levels (floored at 1), lose a
    /// share of coins, and reset hearts to a fraction of the pool.
    ///
    /// The experience requirement keeps the value of the lost level. Fired at
    /// most once per penalty batch, after the cumulative subtraction.
    pub fn apply_heart_zero_penalty(&self, stats: &mut UserStats) {
        stats.level = stats
            .level
            .saturating_sub(self.config.heart_zero_level_penalty)
            .max(1);
        stats.coins =
            (stats.coins as f64 * (1.0 - self.config.heart_zero_coin_penalty_percent)).floor() as u32;
        stats.hearts =
            (stats.max_hearts as f64 * self.config.heart_zero_heart_reset_percent).ceil() as u32;
    }
}

//! Per-playthrough game state.
use serde::{Deserialize, Serialize};

use crate::achievements::{AchievementStatus, initial_statuses};
use crate::catalog::{Department, DrawnInitiative};
use crate::metrics::MetricSet;
use crate::result::Ending;
use crate::ruleset::Ruleset;

/// Department picked this turn and the initiatives drawn for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub department: Department,
    pub initiatives: Vec<DrawnInitiative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub metrics: MetricSet,
    pub previous_metrics: Option<MetricSet>,
    /// Current turn, starting at 1.
    pub turn: u32,
    pub balance: f64,
    pub consecutive_low_user_turns: u32,
    /// Net profit after every turn, seeded with the opening value.
    pub history: Vec<f64>,
    pub achievements: Vec<AchievementStatus>,
    pub ending: Option<Ending>,
    pub offer: Option<Offer>,
}

impl GameState {
    #[must_use]
    pub fn new(ruleset: &Ruleset, opening: MetricSet) -> Self {
        Self {
            metrics: opening,
            previous_metrics: None,
            turn: 1,
            balance: ruleset.starting_balance,
            consecutive_low_user_turns: 0,
            history: vec![opening.net_profit()],
            achievements: initial_statuses(),
            ending: None,
            offer: None,
        }
    }

    #[must_use]
    pub const fn game_over(&self) -> bool {
        self.ending.is_some()
    }

    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.ending.is_some_and(Ending::is_victory)
    }

    /// Number of achievements unlocked so far.
    #[must_use]
    pub fn achieved_count(&self) -> usize {
        self.achievements
            .iter()
            .filter(|status| status.achieved)
            .count()
    }
}

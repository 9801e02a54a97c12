//! End-of-game detection and result summaries.
use serde::{Deserialize, Serialize};

use crate::ruleset::Ruleset;
use crate::state::GameState;

/// Possible game ending types, listed in evaluation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ending {
    /// Net profit reached the target on the final turn
    Victory,
    /// Balance dropped below zero
    Insolvency,
    /// Users stayed under the low-user threshold for too many turns
    Churn,
    /// Turn cap passed without meeting the victory condition
    Timeout,
}

impl Ending {
    pub const ALL: [Self; 4] = [Self::Victory, Self::Insolvency, Self::Churn, Self::Timeout];

    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Victory)
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Victory => "victory",
            Self::Insolvency => "insolvency",
            Self::Churn => "churn",
            Self::Timeout => "timeout",
        }
    }

    #[must_use]
    pub fn headline(self, ruleset: &Ruleset) -> String {
        match self {
            Self::Victory => format!(
                "Victory! Net profit reached ${:.0} by turn {}.",
                ruleset.win_threshold, ruleset.final_turn
            ),
            Self::Insolvency => "Defeat! The company balance went negative.".to_string(),
            Self::Churn => format!(
                "Defeat! Fewer than {:.0} users for {} turns in a row.",
                ruleset.low_user_threshold, ruleset.churn_turn_limit
            ),
            Self::Timeout => "Game over. The victory conditions were not met.".to_string(),
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Select the ending for a state that just advanced, by strict priority.
///
/// Victory needs both the profit target and the exact final turn, so a turn
/// that satisfies it can never also report a defeat.
#[must_use]
pub fn select_ending(gs: &GameState, ruleset: &Ruleset) -> Option<Ending> {
    if gs.metrics.net_profit() >= ruleset.win_threshold && gs.turn == ruleset.final_turn {
        return Some(Ending::Victory);
    }
    if gs.balance < 0.0 {
        return Some(Ending::Insolvency);
    }
    if gs.consecutive_low_user_turns >= ruleset.churn_turn_limit {
        return Some(Ending::Churn);
    }
    if gs.turn > ruleset.final_turn {
        return Some(Ending::Timeout);
    }
    None
}

/// Complete summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub ending: Ending,
    pub headline: String,
    pub seed: u64,
    pub turns_played: u32,
    pub final_net_profit: f64,
    pub best_net_profit: f64,
    pub final_balance: f64,
    pub final_users: f64,
    pub achievements: Vec<String>,
}

/// Build the summary for a finished game, or `None` while it is running.
#[must_use]
pub fn result_summary(gs: &GameState, ruleset: &Ruleset, seed: u64) -> Option<ResultSummary> {
    let ending = gs.ending?;
    let best_net_profit = gs
        .history
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    Some(ResultSummary {
        ending,
        headline: ending.headline(ruleset),
        seed,
        turns_played: gs.turn.saturating_sub(1),
        final_net_profit: gs.metrics.net_profit(),
        best_net_profit,
        final_balance: gs.balance,
        final_users: gs.metrics.users(),
        achievements: gs
            .achievements
            .iter()
            .filter(|status| status.achieved)
            .map(|status| status.id.key().to_string())
            .collect(),
    })
}

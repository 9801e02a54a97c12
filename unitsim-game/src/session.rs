//! Turn loop binding a ruleset, catalog, and RNG streams to one game state.
use log::{debug, info};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::achievements::{AchievementContext, UnlockedSet, evaluate_achievements};
use crate::advisor::{Hint, advise};
use crate::catalog::{Department, InitiativeCatalog};
use crate::constants::{
    LOG_ACHIEVEMENT_PREFIX, LOG_ENDING_PREFIX, LOG_LOW_USERS, LOG_OUTCOME_FAILURE,
    LOG_OUTCOME_FULL, LOG_OUTCOME_PARTIAL, LOG_OUTCOME_RISK, LOG_PROFIT_DOWN, LOG_PROFIT_FLAT,
    LOG_PROFIT_UP, PROFIT_DELTA_EPSILON,
};
use crate::metrics::MetricSet;
use crate::resolver::{self, Outcome, Resolution};
use crate::result::{Ending, ResultSummary, result_summary, select_ending};
use crate::rng::RngBundle;
use crate::ruleset::{Ruleset, RulesetError};
use crate::state::{GameState, Offer};

const LOW_USER_WARNING: &str = "The customer base is shrinking!";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("the game is over")]
    GameOver,
    #[error("no department has been selected this turn")]
    NoOffer,
    #[error("initiative {index} is not on offer ({available} available)")]
    UnknownInitiative { index: usize, available: usize },
    #[error("department {0} has no initiatives to offer")]
    EmptyDepartment(Department),
}

/// Direction of the net-profit change reported after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitChange {
    Increased,
    Decreased,
    Unchanged,
}

impl ProfitChange {
    /// Classify a delta; movements within a cent count as unchanged.
    #[must_use]
    pub fn from_delta(delta: f64) -> Self {
        if delta.abs() <= PROFIT_DELTA_EPSILON {
            Self::Unchanged
        } else if delta > 0.0 {
            Self::Increased
        } else {
            Self::Decreased
        }
    }

    #[must_use]
    pub fn message(self, delta: f64) -> String {
        match self {
            Self::Increased => format!("Net profit increased by ${:.2}", delta.abs()),
            Self::Decreased => format!("Net profit decreased by ${:.2}", delta.abs()),
            Self::Unchanged => "Net profit did not change".to_string(),
        }
    }

    const fn log_key(self) -> &'static str {
        match self {
            Self::Increased => LOG_PROFIT_UP,
            Self::Decreased => LOG_PROFIT_DOWN,
            Self::Unchanged => LOG_PROFIT_FLAT,
        }
    }
}

/// Everything the presentation layer needs after one resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    /// Turn that was played (before the counter advanced).
    pub turn: u32,
    pub department: Department,
    pub initiative: String,
    pub chance: f64,
    pub outcome: Outcome,
    pub risk_triggered: bool,
    pub headline: String,
    pub profit_change: ProfitChange,
    pub profit_delta: f64,
    pub profit_message: String,
    pub metrics: MetricSet,
    pub balance: f64,
    pub low_user_warning: bool,
    pub unlocked: UnlockedSet,
    pub ending: Option<Ending>,
    pub game_over: bool,
    pub is_victory: bool,
    pub hint: Hint,
    pub logs: Vec<String>,
}

/// A rolled but not yet committed turn.
#[derive(Debug)]
struct PendingTurn {
    department: Department,
    initiative: String,
    description: String,
    chance: f64,
    resolution: Resolution,
}

/// One playthrough: owns its state and RNG streams, borrows nothing global.
#[derive(Debug, Clone)]
pub struct GameSession {
    ruleset: Ruleset,
    catalog: InitiativeCatalog,
    seed: u64,
    rng: RngBundle,
    state: GameState,
}

impl GameSession {
    /// Start a session after validating the ruleset.
    ///
    /// # Errors
    ///
    /// Returns [`RulesetError`] when the ruleset fails validation.
    pub fn new(
        ruleset: Ruleset,
        catalog: InitiativeCatalog,
        seed: u64,
    ) -> Result<Self, RulesetError> {
        ruleset.validate()?;
        let rng = RngBundle::from_user_seed(seed);
        let state = Self::fresh_state(&ruleset, &rng);
        debug!("session seeded with {seed}");
        Ok(Self {
            ruleset,
            catalog,
            seed,
            rng,
            state,
        })
    }

    fn fresh_state(ruleset: &Ruleset, rng: &RngBundle) -> GameState {
        let opening = ruleset.opening_metrics(&mut *rng.setup());
        GameState::new(ruleset, opening)
    }

    /// Draw this turn's offer from `department`, replacing any earlier offer.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::GameOver`] once the game has ended and
    /// [`TurnError::EmptyDepartment`] when nothing can be drawn.
    pub fn select_department(&mut self, department: Department) -> Result<&Offer, TurnError> {
        if self.state.game_over() {
            return Err(TurnError::GameOver);
        }
        let initiatives = self.catalog.draw_initiatives(
            department,
            self.ruleset.offer_count,
            self.ruleset.effective_window(),
            &mut *self.rng.offer(),
        );
        if initiatives.is_empty() {
            return Err(TurnError::EmptyDepartment(department));
        }
        Ok(self.state.offer.insert(Offer {
            department,
            initiatives,
        }))
    }

    /// Resolve the offered initiative at `index` and advance the turn.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::GameOver`] after the game has ended,
    /// [`TurnError::NoOffer`] before a department is selected, and
    /// [`TurnError::UnknownInitiative`] for an index outside the offer. No
    /// state changes on error.
    pub fn resolve_initiative(&mut self, index: usize) -> Result<TurnReport, TurnError> {
        let pending = self.roll(index, &mut *self.rng.outcome())?;
        Ok(self.commit(pending))
    }

    /// Resolve the offered initiative at `index` against `rng` without
    /// touching the state.
    fn roll<R: RngCore + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<PendingTurn, TurnError> {
        if self.state.game_over() {
            return Err(TurnError::GameOver);
        }
        let offer = self.state.offer.as_ref().ok_or(TurnError::NoOffer)?;
        let drawn = offer
            .initiatives
            .get(index)
            .ok_or(TurnError::UnknownInitiative {
                index,
                available: offer.initiatives.len(),
            })?;
        let chance = drawn.chance();
        Ok(PendingTurn {
            department: offer.department,
            initiative: drawn.initiative.title.clone(),
            description: drawn.initiative.description.clone(),
            chance,
            resolution: resolver::resolve_initiative(
                &drawn.initiative,
                chance,
                &self.state.metrics,
                rng,
            ),
        })
    }

    fn commit(&mut self, pending: PendingTurn) -> TurnReport {
        let PendingTurn {
            department,
            initiative,
            description,
            chance,
            resolution,
        } = pending;
        let played_turn = self.state.turn;
        let old = self.state.metrics;
        let new = resolution.metrics;
        let profit_delta = new.net_profit() - old.net_profit();
        let profit_change = ProfitChange::from_delta(profit_delta);
        let mut logs = vec![
            outcome_log_key(&resolution).to_string(),
            profit_change.log_key().to_string(),
        ];

        let gs = &mut self.state;
        gs.previous_metrics = Some(old);
        gs.metrics = new;
        gs.balance += new.net_profit();
        let low_user_warning = if new.users() < self.ruleset.low_user_threshold {
            gs.consecutive_low_user_turns = gs.consecutive_low_user_turns.saturating_add(1);
            gs.consecutive_low_user_turns == 1
        } else {
            gs.consecutive_low_user_turns = 0;
            false
        };
        if low_user_warning {
            logs.push(LOG_LOW_USERS.to_string());
        }
        gs.history.push(new.net_profit());
        gs.turn = gs.turn.saturating_add(1);
        gs.offer = None;

        let ctx = AchievementContext {
            metrics: &new,
            previous: Some(&old),
            turn: gs.turn,
        };
        let unlocked = evaluate_achievements(&mut gs.achievements, &ctx);
        for id in &unlocked {
            info!("achievement unlocked on turn {played_turn}: {id}");
            logs.push(format!("{LOG_ACHIEVEMENT_PREFIX}{id}"));
        }

        gs.ending = select_ending(gs, &self.ruleset);
        let mut headline = outcome_headline(&resolution, &description);
        if low_user_warning {
            headline = format!("{headline} {LOW_USER_WARNING}");
        }
        if let Some(ending) = gs.ending {
            info!(
                "game ended on turn {played_turn}: {ending} (net profit {:.2}, balance {:.2})",
                new.net_profit(),
                gs.balance
            );
            logs.push(format!("{LOG_ENDING_PREFIX}{ending}"));
            headline = ending.headline(&self.ruleset);
        }

        TurnReport {
            turn: played_turn,
            department,
            initiative,
            chance,
            outcome: resolution.outcome,
            risk_triggered: resolution.risk_triggered(),
            headline,
            profit_change,
            profit_delta,
            profit_message: profit_change.message(profit_delta),
            metrics: new,
            balance: gs.balance,
            low_user_warning,
            unlocked,
            ending: gs.ending,
            game_over: gs.game_over(),
            is_victory: gs.is_victory(),
            hint: advise(&new, gs.balance),
            logs,
        }
    }

    /// Rebuild the state from the ruleset. RNG streams keep advancing, so a
    /// restarted game is a new game rather than a replay.
    pub fn restart(&mut self) -> &GameState {
        self.state = Self::fresh_state(&self.ruleset, &self.rng);
        debug!("session restarted");
        &self.state
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    #[must_use]
    pub const fn catalog(&self) -> &InitiativeCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn offer(&self) -> Option<&Offer> {
        self.state.offer.as_ref()
    }

    /// Advice for the current metrics.
    #[must_use]
    pub fn hint(&self) -> Hint {
        advise(&self.state.metrics, self.state.balance)
    }

    /// Result summary once the game has ended.
    #[must_use]
    pub fn summary(&self) -> Option<ResultSummary> {
        result_summary(&self.state, &self.ruleset, self.seed)
    }
}

const fn outcome_log_key(resolution: &Resolution) -> &'static str {
    match resolution.outcome {
        Outcome::FullSuccess if resolution.risk_triggered() => LOG_OUTCOME_RISK,
        Outcome::FullSuccess => LOG_OUTCOME_FULL,
        Outcome::Partial => LOG_OUTCOME_PARTIAL,
        Outcome::Failure => LOG_OUTCOME_FAILURE,
    }
}

fn outcome_headline(resolution: &Resolution, description: &str) -> String {
    if let Some(message) = &resolution.risk_message {
        return message.clone();
    }
    match resolution.outcome {
        Outcome::FullSuccess => format!("{description} (Success, initiative implemented)"),
        Outcome::Partial => "The initiative was partially implemented.".to_string(),
        Outcome::Failure => "The initiative did not work.".to_string(),
    }
}

//! Rule profiles: every tunable of a playthrough in one validated struct.
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CHANCE_MAX, DEFAULT_CHANCE_MIN, DEFAULT_CHURN_TURN_LIMIT, DEFAULT_FINAL_TURN,
    DEFAULT_LOW_USER_THRESHOLD, DEFAULT_OFFER_COUNT, DEFAULT_STARTING_BALANCE,
    DEFAULT_WIN_THRESHOLD, MAX_FINAL_TURN, MAX_OFFER_COUNT, MAX_START_JITTER,
    SPRINT_FINAL_TURN, SPRINT_WIN_THRESHOLD,
};
use crate::metrics::{BaseField, MetricBase, MetricSet};
use crate::rng::unit_draw;

/// Range effective success chances are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceWindow {
    pub min: f64,
    pub max: f64,
}

impl Default for ChanceWindow {
    fn default() -> Self {
        Self {
            min: DEFAULT_CHANCE_MIN,
            max: DEFAULT_CHANCE_MAX,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RulesetError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("final turn must be between 1 and {max} (got {value})")]
    FinalTurn { max: u32, value: u32 },
    #[error("churn turn limit must be at least 1")]
    ChurnLimit,
    #[error("offer count must be between 1 and {max} (got {value})")]
    OfferCount { max: usize, value: usize },
    #[error("chance window invalid (min {min:.2} > max {max:.2})")]
    ChanceWindowOrder { min: f64, max: f64 },
    #[error("starting metric {field} must be finite")]
    NonFiniteStart { field: BaseField },
    #[error("unknown ruleset profile '{0}'")]
    UnknownProfile(String),
    #[error("ruleset JSON is invalid: {0}")]
    Parse(String),
}

/// Built-in rule profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RulesetProfile {
    /// Fifteen turns to reach a 50 000 monthly net profit.
    #[default]
    Classic,
    /// Ten turns, a pricier product, and a 200 000 target.
    Sprint,
}

impl RulesetProfile {
    pub const ALL: [Self; 2] = [Self::Classic, Self::Sprint];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Sprint => "sprint",
        }
    }

    #[must_use]
    pub fn ruleset(self) -> Ruleset {
        match self {
            Self::Classic => Ruleset::default(),
            Self::Sprint => Ruleset {
                starting_metrics: MetricBase::new(40.0, 30.0, 10.0, 200.0, 25.0, 3_000.0),
                win_threshold: SPRINT_WIN_THRESHOLD,
                final_turn: SPRINT_FINAL_TURN,
                ..Ruleset::default()
            },
        }
    }
}

impl fmt::Display for RulesetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RulesetProfile {
    type Err = RulesetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|profile| profile.key() == needle)
            .ok_or_else(|| RulesetError::UnknownProfile(s.to_string()))
    }
}

/// Complete rule configuration for one playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub starting_metrics: MetricBase,
    /// Relative jitter applied to each starting base field; `0.0` disables it.
    pub start_jitter: f64,
    pub starting_balance: f64,
    pub win_threshold: f64,
    pub final_turn: u32,
    pub low_user_threshold: f64,
    pub churn_turn_limit: u32,
    pub offer_count: usize,
    pub chance_window: ChanceWindow,
    /// Roll a fresh chance for every drawn initiative instead of using the
    /// catalog's base chance.
    pub reroll_chances: bool,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            starting_metrics: MetricBase::new(20.0, 15.0, 10.0, 200.0, 20.0, 3_000.0),
            start_jitter: 0.0,
            starting_balance: DEFAULT_STARTING_BALANCE,
            win_threshold: DEFAULT_WIN_THRESHOLD,
            final_turn: DEFAULT_FINAL_TURN,
            low_user_threshold: DEFAULT_LOW_USER_THRESHOLD,
            churn_turn_limit: DEFAULT_CHURN_TURN_LIMIT,
            offer_count: DEFAULT_OFFER_COUNT,
            chance_window: ChanceWindow::default(),
            reroll_chances: true,
        }
    }
}

impl Ruleset {
    /// Parse and validate a ruleset; missing fields take classic defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RulesetError::Parse`] for malformed JSON, or the first
    /// validation failure.
    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let ruleset: Self =
            serde_json::from_str(json).map_err(|err| RulesetError::Parse(err.to_string()))?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Validate documented bounds.
    ///
    /// # Errors
    ///
    /// Returns `RulesetError` when any field violates its bounds.
    pub fn validate(&self) -> Result<(), RulesetError> {
        for field in BaseField::ALL {
            if !self.starting_metrics.get(field).is_finite() {
                return Err(RulesetError::NonFiniteStart { field });
            }
        }
        range("start_jitter", 0.0, MAX_START_JITTER, self.start_jitter)?;
        if !self.starting_balance.is_finite() {
            return Err(RulesetError::RangeViolation {
                field: "starting_balance",
                min: f64::MIN,
                max: f64::MAX,
                value: self.starting_balance,
            });
        }
        range("win_threshold", 0.0, f64::MAX, self.win_threshold)?;
        range("low_user_threshold", 0.0, f64::MAX, self.low_user_threshold)?;
        if !(1..=MAX_FINAL_TURN).contains(&self.final_turn) {
            return Err(RulesetError::FinalTurn {
                max: MAX_FINAL_TURN,
                value: self.final_turn,
            });
        }
        if self.churn_turn_limit == 0 {
            return Err(RulesetError::ChurnLimit);
        }
        if !(1..=MAX_OFFER_COUNT).contains(&self.offer_count) {
            return Err(RulesetError::OfferCount {
                max: MAX_OFFER_COUNT,
                value: self.offer_count,
            });
        }
        let window = self.chance_window;
        range("chance_window.min", 0.0, 1.0, window.min)?;
        range("chance_window.max", 0.0, 1.0, window.max)?;
        if window.min > window.max {
            return Err(RulesetError::ChanceWindowOrder {
                min: window.min,
                max: window.max,
            });
        }
        Ok(())
    }

    /// Window to roll effective chances from, or `None` to keep base chances.
    #[must_use]
    pub const fn effective_window(&self) -> Option<ChanceWindow> {
        if self.reroll_chances {
            Some(self.chance_window)
        } else {
            None
        }
    }

    /// Starting metrics, jittered per base field when `start_jitter > 0`.
    pub fn opening_metrics<R: RngCore + ?Sized>(&self, rng: &mut R) -> MetricSet {
        if self.start_jitter <= 0.0 {
            return MetricSet::recompute(self.starting_metrics);
        }
        let mut base = self.starting_metrics;
        for field in BaseField::ALL {
            let factor = 1.0 - self.start_jitter + unit_draw(rng) * 2.0 * self.start_jitter;
            base.set(field, base.get(field) * factor);
        }
        MetricSet::recompute(base)
    }
}

fn range(field: &'static str, min: f64, max: f64, value: f64) -> Result<(), RulesetError> {
    if !(min..=max).contains(&value) {
        return Err(RulesetError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

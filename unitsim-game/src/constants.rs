//! Centralized balance and tuning constants for the unit-economics engine.
//!
//! Rule values that a profile may override live on
//! [`Ruleset`](crate::ruleset::Ruleset); the constants here are their
//! defaults plus the fixed thresholds no profile changes.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_OUTCOME_FULL: &str = "log.outcome.full";
pub(crate) const LOG_OUTCOME_PARTIAL: &str = "log.outcome.partial";
pub(crate) const LOG_OUTCOME_FAILURE: &str = "log.outcome.failure";
pub(crate) const LOG_OUTCOME_RISK: &str = "log.outcome.risk";
pub(crate) const LOG_PROFIT_UP: &str = "log.profit.increased";
pub(crate) const LOG_PROFIT_DOWN: &str = "log.profit.decreased";
pub(crate) const LOG_PROFIT_FLAT: &str = "log.profit.unchanged";
pub(crate) const LOG_LOW_USERS: &str = "log.users.low";
pub(crate) const LOG_ACHIEVEMENT_PREFIX: &str = "log.achievement.";
pub(crate) const LOG_ENDING_PREFIX: &str = "log.ending.";

// Economy defaults ---------------------------------------------------------
pub(crate) const DEFAULT_STARTING_BALANCE: f64 = 30_000.0;
pub(crate) const DEFAULT_WIN_THRESHOLD: f64 = 50_000.0;
pub(crate) const DEFAULT_FINAL_TURN: u32 = 15;
pub(crate) const DEFAULT_LOW_USER_THRESHOLD: f64 = 100.0;
pub(crate) const DEFAULT_CHURN_TURN_LIMIT: u32 = 2;
pub(crate) const DEFAULT_OFFER_COUNT: usize = 3;
pub(crate) const DEFAULT_CHANCE_MIN: f64 = 0.2;
pub(crate) const DEFAULT_CHANCE_MAX: f64 = 0.9;

pub(crate) const SPRINT_WIN_THRESHOLD: f64 = 200_000.0;
pub(crate) const SPRINT_FINAL_TURN: u32 = 10;

/// Net-profit movement below this magnitude is reported as unchanged.
pub const PROFIT_DELTA_EPSILON: f64 = 0.01;

// Ruleset bounds -----------------------------------------------------------
pub(crate) const MAX_FINAL_TURN: u32 = 100;
pub(crate) const MAX_START_JITTER: f64 = 0.5;
pub(crate) const MAX_OFFER_COUNT: usize = 10;

// Leaderboard --------------------------------------------------------------
/// Longest nickname accepted for a leaderboard submission, in characters.
pub const NICKNAME_MAX_LEN: usize = 24;
/// Default number of rows shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

// Advisor thresholds -------------------------------------------------------
pub(crate) const ADVISOR_CPU_CEILING: f64 = 4.0;
pub(crate) const ADVISOR_FIXED_COST_FLOOR: f64 = 2_900.0;
pub(crate) const ADVISOR_RUNWAY_TURNS: f64 = 3.0;
pub(crate) const ADVISOR_CONVERSION_TARGET: f64 = 40.0;
pub(crate) const ADVISOR_COGS_FLOOR: f64 = 5.0;
pub(crate) const ADVISOR_COGS_SHARE: f64 = 0.3;
pub(crate) const ADVISOR_UNIT_PROFIT_TARGET: f64 = 50.0;

//! Unitsim Game Engine
//!
//! Platform-agnostic core of Unitsim, a turn-based strategy game about startup
//! unit economics. Each turn the player picks a department, then one of the
//! initiatives drawn for it; the engine resolves the initiative, updates the
//! metric chain and balance, and checks achievements and endings. No UI,
//! persistence, or network code lives here.

pub mod achievements;
pub mod advisor;
pub mod catalog;
pub mod constants;
pub mod leaderboard;
pub mod metrics;
pub mod numbers;
pub mod resolver;
pub mod result;
pub mod rng;
pub mod ruleset;
pub mod session;
pub mod state;

use log::{debug, warn};

// Re-export commonly used types
pub use achievements::{
    Achievement, AchievementContext, AchievementId, AchievementStatus, REGISTRY, UnlockedSet,
    evaluate_achievements,
};
pub use advisor::{Hint, advise};
pub use catalog::{
    AdjustOp, Adjustment, CatalogError, Comparison, Condition, Department, DrawnInitiative,
    Effect, Initiative, InitiativeCatalog, Risk, RiskCheck,
};
pub use leaderboard::{
    LeaderboardEntry, LeaderboardError, LeaderboardGateway, MemoryLeaderboard,
    normalize_nickname, qualifies_for_board,
};
pub use metrics::{BaseField, MetricBase, MetricSet};
pub use resolver::{Outcome, Resolution, ResolutionTrace, interpolate_partial, resolve_initiative};
pub use result::{Ending, ResultSummary, result_summary, select_ending};
pub use rng::{CountingRng, RngBundle};
pub use ruleset::{ChanceWindow, Ruleset, RulesetError, RulesetProfile};
pub use session::{GameSession, ProfitChange, TurnError, TurnReport};
pub use state::{GameState, Offer};

/// Trait for abstracting catalog and ruleset loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the initiative catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<InitiativeCatalog, Self::Error>;

    /// Load the rules for a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset cannot be loaded or parsed.
    fn load_ruleset(&self, profile: RulesetProfile) -> Result<Ruleset, Self::Error>;
}

/// Loader backed by the embedded catalog and built-in profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl CatalogLoader for StaticLoader {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<InitiativeCatalog, Self::Error> {
        InitiativeCatalog::try_load_from_static()
    }

    fn load_ruleset(&self, profile: RulesetProfile) -> Result<Ruleset, Self::Error> {
        Ok(profile.ruleset())
    }
}

/// Main game engine binding a catalog source to a leaderboard
pub struct GameEngine<L, G>
where
    L: CatalogLoader,
    G: LeaderboardGateway,
{
    loader: L,
    gateway: G,
}

impl<L, G> GameEngine<L, G>
where
    L: CatalogLoader,
    G: LeaderboardGateway,
{
    /// Create a new game engine with the provided loader and leaderboard
    pub const fn new(loader: L, gateway: G) -> Self {
        Self { loader, gateway }
    }

    /// Start a new session for a profile and seed
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or ruleset cannot be loaded, or the
    /// ruleset is invalid.
    pub fn new_session(&self, profile: RulesetProfile, seed: u64) -> anyhow::Result<GameSession> {
        let catalog = self.loader.load_catalog()?;
        let ruleset = self.loader.load_ruleset(profile)?;
        debug!("starting {profile} session with seed {seed}");
        Ok(GameSession::new(ruleset, catalog, seed)?)
    }

    /// Best `limit` entries, or an empty list when the board is unreachable.
    pub fn top_scores(&self, limit: usize) -> Vec<LeaderboardEntry> {
        match self.gateway.fetch_top(limit) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("leaderboard fetch failed: {err}");
                Vec::new()
            }
        }
    }

    /// Whether a finished game should be offered a leaderboard submission.
    pub fn should_offer_submission(&self, state: &GameState, limit: usize) -> bool {
        state.game_over()
            && qualifies_for_board(state.metrics.net_profit(), &self.top_scores(limit), limit)
    }

    /// Submit a finished game's net profit.
    ///
    /// Returns `None` for unfinished games, unusable nicknames, or gateway
    /// failures; the game state is never touched.
    pub fn submit_result(&self, state: &GameState, nickname: &str) -> Option<LeaderboardEntry> {
        if !state.game_over() {
            return None;
        }
        let nickname = normalize_nickname(nickname)?;
        match self.gateway.submit(&nickname, state.metrics.net_profit()) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("leaderboard submit failed: {err}");
                None
            }
        }
    }

    /// Borrow the leaderboard gateway
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }
}

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use unitsim_game::numbers::usize_to_u64;
use unitsim_game::{Department, Ending, GameSession, InitiativeCatalog, Outcome, RulesetProfile};

use super::policy::GameplayStrategy;

/// One resolved turn, as seen by the tester.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub turn: u32,
    pub department: Department,
    pub initiative: String,
    pub chance: f64,
    pub outcome: Outcome,
    pub risk_triggered: bool,
    pub net_profit: f64,
    pub balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Outcome of one automated playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub ending: Ending,
    pub turns_played: u32,
    pub final_net_profit: f64,
    pub best_net_profit: f64,
    pub final_balance: f64,
    pub achievements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<DecisionRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub profile: RulesetProfile,
    pub strategy: GameplayStrategy,
    pub seed: u64,
    /// Keep the per-turn decision log on the record.
    pub record_decisions: bool,
}

/// Play one game to its ending with the configured strategy.
///
/// # Errors
///
/// Returns an error if the session cannot start or a turn is rejected.
pub fn run_game(config: SimulationConfig, catalog: &InitiativeCatalog) -> Result<GameRecord> {
    let mut session = GameSession::new(config.profile.ruleset(), catalog.clone(), config.seed)
        .context("starting session")?;
    let mut policy = config.strategy.create_policy(config.seed);
    let mut decisions = Vec::new();

    while !session.state().game_over() {
        let department = policy.pick_department(&session);
        let offer = session
            .select_department(department)
            .with_context(|| format!("drawing {department} offer"))?
            .clone();
        let decision = policy.pick_initiative(&session, &offer);
        let report = session
            .resolve_initiative(decision.choice_index)
            .with_context(|| format!("resolving choice {}", decision.choice_index))?;
        debug!(
            "[{} seed {}] turn {} {} -> {}",
            policy.name(),
            config.seed,
            report.turn,
            report.initiative,
            report.outcome
        );
        if config.record_decisions {
            decisions.push(DecisionRecord {
                turn: report.turn,
                department: report.department,
                initiative: report.initiative,
                chance: report.chance,
                outcome: report.outcome,
                risk_triggered: report.risk_triggered,
                net_profit: report.metrics.net_profit(),
                balance: report.balance,
                rationale: decision.rationale,
            });
        }
    }

    let summary = session
        .summary()
        .context("finished session produced no summary")?;
    info!(
        "{} seed {}: {} after {} turns",
        config.strategy, config.seed, summary.ending, summary.turns_played
    );
    Ok(GameRecord {
        strategy: config.strategy,
        seed: config.seed,
        ending: summary.ending,
        turns_played: summary.turns_played,
        final_net_profit: summary.final_net_profit,
        best_net_profit: summary.best_net_profit,
        final_balance: summary.final_balance,
        achievements: summary.achievements,
        decisions,
    })
}

/// Run every strategy over every seed, `iterations` times each.
///
/// Iteration `i` of base seed `s` plays seed `s + i`.
///
/// # Errors
///
/// Returns the first game that fails to run.
pub fn run_batch(
    profile: RulesetProfile,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
    iterations: usize,
    record_decisions: bool,
) -> Result<Vec<GameRecord>> {
    let catalog =
        InitiativeCatalog::try_load_from_static().context("embedded catalog is invalid")?;

    let mut records = Vec::with_capacity(strategies.len() * seeds.len() * iterations);
    for &strategy in strategies {
        for &base in seeds {
            for offset in 0..iterations {
                let seed = base.wrapping_add(usize_to_u64(offset));
                records.push(run_game(
                    SimulationConfig {
                        profile,
                        strategy,
                        seed,
                        record_decisions,
                    },
                    &catalog,
                )?);
            }
        }
    }
    Ok(records)
}

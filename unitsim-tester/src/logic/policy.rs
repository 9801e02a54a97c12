use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use unitsim_game::numbers::{u32_to_usize, usize_to_f64};
use unitsim_game::{
    Department, DrawnInitiative, GameSession, Initiative, MetricSet, Offer, Outcome,
    interpolate_partial,
};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the department to draw this turn's offer from.
    fn pick_department(&mut self, session: &GameSession) -> Department;

    /// Pick one of the offered initiatives.
    fn pick_initiative(&mut self, session: &GameSession, offer: &Offer) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameplayStrategy {
    Random,
    Greedy,
    Cautious,
    Advisor,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Random, Self::Greedy, Self::Cautious, Self::Advisor];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Greedy => "greedy",
            Self::Cautious => "cautious",
            Self::Advisor => "advisor",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Greedy => "Greedy",
            Self::Cautious => "Cautious",
            Self::Advisor => "Advisor",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Random => "uniform department and initiative picks",
            Self::Greedy => "highest expected net-profit gain",
            Self::Cautious => "rotate departments, take the safest initiative",
            Self::Advisor => "follow the advisor's department, then pick greedily",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Advisor => Box::new(AdvisorPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == needle)
            .ok_or_else(|| anyhow::anyhow!("unknown strategy: {s}"))
    }
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct GreedyPolicy;
struct CautiousPolicy;
struct AdvisorPolicy;

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_department(&mut self, _session: &GameSession) -> Department {
        Department::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
    }

    fn pick_initiative(&mut self, _session: &GameSession, offer: &Offer) -> PolicyDecision {
        let idx = self.rng.gen_range(0..offer.initiatives.len().max(1));
        PolicyDecision::new(idx, None)
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_department(&mut self, session: &GameSession) -> Department {
        let metrics = &session.state().metrics;
        Department::ALL
            .into_iter()
            .map(|department| {
                let entries = session.catalog().initiatives(department);
                let total: f64 = entries
                    .iter()
                    .map(|entry| expected_gain(entry, entry.base_success_chance, metrics))
                    .sum();
                (department, total / usize_to_f64(entries.len().max(1)))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(Department::Acquisition, |(department, _)| department)
    }

    fn pick_initiative(&mut self, session: &GameSession, offer: &Offer) -> PolicyDecision {
        best_expected(&session.state().metrics, &offer.initiatives)
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_department(&mut self, session: &GameSession) -> Department {
        let slot = u32_to_usize(session.state().turn.saturating_sub(1)) % Department::ALL.len();
        Department::ALL[slot]
    }

    fn pick_initiative(&mut self, _session: &GameSession, offer: &Offer) -> PolicyDecision {
        let (idx, chance) = offer
            .initiatives
            .iter()
            .enumerate()
            .map(|(idx, drawn)| (idx, drawn.chance()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("chance {chance:.2}")))
    }
}

impl PlayerPolicy for AdvisorPolicy {
    fn name(&self) -> &'static str {
        "Advisor"
    }

    fn pick_department(&mut self, session: &GameSession) -> Department {
        session
            .hint()
            .department()
            .unwrap_or_else(|| GreedyPolicy.pick_department(session))
    }

    fn pick_initiative(&mut self, session: &GameSession, offer: &Offer) -> PolicyDecision {
        let mut decision = best_expected(&session.state().metrics, &offer.initiatives);
        decision.rationale = Some(format!(
            "{:?}; {}",
            session.hint(),
            decision.rationale.unwrap_or_default()
        ));
        decision
    }
}

fn best_expected(metrics: &MetricSet, offered: &[DrawnInitiative]) -> PolicyDecision {
    let (idx, gain) = offered
        .iter()
        .enumerate()
        .map(|(idx, drawn)| (idx, expected_gain(&drawn.initiative, drawn.chance(), metrics)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, 0.0));
    PolicyDecision::new(idx, Some(format!("expected gain {gain:.0}")))
}

/// Expected change in net profit from resolving `initiative` at `chance`.
///
/// Weighs the full, partial, and failure outcomes by their resolver
/// probabilities and folds an armed risk into the full-success branch.
#[must_use]
pub fn expected_gain(initiative: &Initiative, chance: f64, metrics: &MetricSet) -> f64 {
    let base = metrics.net_profit();
    let full = initiative.effect.apply(metrics);
    let mut full_gain = full.net_profit() - base;
    if let Some(risk) = &initiative.risk
        && risk.armed(metrics, &full)
    {
        let risky = risk.effect.apply(&full).net_profit() - base;
        full_gain = (1.0 - risk.chance) * full_gain + risk.chance * risky;
    }
    let partial = initiative.partial_effect.as_ref().map_or_else(
        || interpolate_partial(metrics, &full, chance),
        |effect| effect.apply(metrics),
    );
    let partial_gain = partial.net_profit() - base;
    Outcome::FullSuccess.probability(chance) * full_gain
        + Outcome::Partial.probability(chance) * partial_gain
}

//! One-shot achievements evaluated after every resolved turn.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::metrics::MetricSet;

/// Achievements unlocked by a single turn; rarely more than a few.
pub type UnlockedSet = SmallVec<[AchievementId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AchievementId {
    #[serde(rename = "first_profit")]
    FirstProfit,
    #[serde(rename = "users_1000")]
    Users1000,
    #[serde(rename = "users_5000")]
    Users5000,
    #[serde(rename = "margin_50")]
    Margin50,
    #[serde(rename = "profit_10k")]
    Profit10k,
    #[serde(rename = "profit_25k")]
    Profit25k,
    #[serde(rename = "c1_40")]
    Conversion40,
    #[serde(rename = "low_costs")]
    LowCosts,
    #[serde(rename = "quick_growth")]
    QuickGrowth,
    #[serde(rename = "perfect_balance")]
    PerfectBalance,
}

impl AchievementId {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstProfit => "first_profit",
            Self::Users1000 => "users_1000",
            Self::Users5000 => "users_5000",
            Self::Margin50 => "margin_50",
            Self::Profit10k => "profit_10k",
            Self::Profit25k => "profit_25k",
            Self::Conversion40 => "c1_40",
            Self::LowCosts => "low_costs",
            Self::QuickGrowth => "quick_growth",
            Self::PerfectBalance => "perfect_balance",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inputs an achievement predicate may read.
#[derive(Debug, Clone, Copy)]
pub struct AchievementContext<'a> {
    pub metrics: &'a MetricSet,
    pub previous: Option<&'a MetricSet>,
    /// Turn counter after the resolving turn advanced it.
    pub turn: u32,
}

/// Registry row: identity, copy, and unlock predicate.
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub predicate: fn(&AchievementContext<'_>) -> bool,
}

/// Fixed registry in display order.
pub const REGISTRY: [Achievement; 10] = [
    Achievement {
        id: AchievementId::FirstProfit,
        title: "First Profit",
        description: "Reach a positive net profit",
        predicate: |ctx| ctx.metrics.net_profit() > 0.0,
    },
    Achievement {
        id: AchievementId::Users1000,
        title: "Growing Audience",
        description: "Reach 1,000 users",
        predicate: |ctx| ctx.metrics.users() >= 1_000.0,
    },
    Achievement {
        id: AchievementId::Users5000,
        title: "Big League",
        description: "Reach 5,000 users",
        predicate: |ctx| ctx.metrics.users() >= 5_000.0,
    },
    Achievement {
        id: AchievementId::Margin50,
        title: "High Margin",
        description: "Reach a 50% margin",
        predicate: |ctx| ctx.metrics.margin() >= 0.5,
    },
    Achievement {
        id: AchievementId::Profit10k,
        title: "Ten Grand",
        description: "Reach $10,000 net profit",
        predicate: |ctx| ctx.metrics.net_profit() >= 10_000.0,
    },
    Achievement {
        id: AchievementId::Profit25k,
        title: "Serious Business",
        description: "Reach $25,000 net profit",
        predicate: |ctx| ctx.metrics.net_profit() >= 25_000.0,
    },
    Achievement {
        id: AchievementId::Conversion40,
        title: "Conversion Master",
        description: "Reach 40% first-session conversion",
        predicate: |ctx| ctx.metrics.first_conversion() >= 40.0,
    },
    Achievement {
        id: AchievementId::LowCosts,
        title: "Lean Operation",
        description: "Bring cost of goods down to $10.50 or less",
        predicate: |ctx| ctx.metrics.cost_of_goods() <= 10.5,
    },
    Achievement {
        id: AchievementId::QuickGrowth,
        title: "Rocket Start",
        description: "Reach 2,000 users within five turns",
        predicate: |ctx| ctx.metrics.users() >= 2_000.0 && ctx.turn <= 5,
    },
    Achievement {
        id: AchievementId::PerfectBalance,
        title: "Perfect Balance",
        description: "Positive net profit, per-user profit, and margin with conversion above 20%",
        predicate: |ctx| {
            ctx.metrics.net_profit() > 0.0
                && ctx.metrics.net_profit_per_user() > 0.0
                && ctx.metrics.margin() > 0.0
                && ctx.metrics.first_conversion() > 20.0
        },
    },
];

#[must_use]
pub fn achievement(id: AchievementId) -> Option<&'static Achievement> {
    REGISTRY.iter().find(|entry| entry.id == id)
}

/// Per-game unlock flag for one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: AchievementId,
    pub achieved: bool,
}

/// Fresh, all-locked status list in registry order.
#[must_use]
pub fn initial_statuses() -> Vec<AchievementStatus> {
    REGISTRY
        .iter()
        .map(|entry| AchievementStatus {
            id: entry.id,
            achieved: false,
        })
        .collect()
}

/// Flip every locked achievement whose predicate now holds and return the
/// newly unlocked ids in registry order. Already achieved entries are never
/// re-reported.
pub fn evaluate_achievements(
    statuses: &mut [AchievementStatus],
    ctx: &AchievementContext<'_>,
) -> UnlockedSet {
    let mut unlocked = UnlockedSet::new();
    for status in statuses.iter_mut().filter(|status| !status.achieved) {
        let Some(entry) = achievement(status.id) else {
            continue;
        };
        if (entry.predicate)(ctx) {
            status.achieved = true;
            unlocked.push(status.id);
        }
    }
    unlocked
}

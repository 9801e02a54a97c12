//! Post-turn advice derived from the unit-economics chain.
use serde::{Deserialize, Serialize};

use crate::catalog::Department;
use crate::constants::{
    ADVISOR_COGS_FLOOR, ADVISOR_COGS_SHARE, ADVISOR_CONVERSION_TARGET, ADVISOR_CPU_CEILING,
    ADVISOR_FIXED_COST_FLOOR, ADVISOR_RUNWAY_TURNS, ADVISOR_UNIT_PROFIT_TARGET,
};
use crate::metrics::MetricSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    CutAcquisitionCost,
    FixUserEconomics,
    TrimFixedCosts,
    ImproveOnboarding,
    LowerCostOfGoods,
    ScaleUsers,
    RaisePrice,
    General,
}

impl Hint {
    /// Department the hint points the player toward, if any.
    #[must_use]
    pub const fn department(self) -> Option<Department> {
        match self {
            Self::CutAcquisitionCost | Self::FixUserEconomics | Self::ScaleUsers => {
                Some(Department::Acquisition)
            }
            Self::LowerCostOfGoods | Self::RaisePrice => Some(Department::Product),
            Self::TrimFixedCosts => Some(Department::Admin),
            Self::ImproveOnboarding => Some(Department::Onboarding),
            Self::General => None,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CutAcquisitionCost => {
                "Unit 2 is negative: every user is a loss. Lower the cost per user with SEO \
                 content and ad campaign optimization."
            }
            Self::FixUserEconomics => {
                "Bring unit 2 out of the red. Lower the cost per user with SEO and ad \
                 optimization."
            }
            Self::TrimFixedCosts => "Optimize fixed costs: the budget is at risk of running dry.",
            Self::ImproveOnboarding => "Bring first-session conversion (C1) up to 40%.",
            Self::LowerCostOfGoods => "Cut the product's cost of goods to $5.",
            Self::ScaleUsers => "Scale the user base aggressively.",
            Self::RaisePrice => "Raise the average price by adding product value.",
            Self::General => {
                "Every decision moves the key business metrics. Review the results and adjust \
                 your strategy."
            }
        }
    }
}

/// Pick the first matching hint for the current metrics and balance.
#[must_use]
pub fn advise(metrics: &MetricSet, balance: f64) -> Hint {
    let unit1 = metrics.gross_profit_per_user();
    let unit2 = metrics.net_profit_per_user() - metrics.cost_per_user();
    let unit3 = metrics.net_profit();
    let conversion = metrics.first_conversion();
    let cogs = metrics.cost_of_goods();
    let runway_burn = -ADVISOR_RUNWAY_TURNS * unit3;
    let healthy_units = unit1 > 0.0 && unit2 > 0.0;
    let cogs_share = if unit1 > 0.0 { cogs / unit1 } else { f64::INFINITY };

    if unit2 < 0.0 && metrics.cost_per_user() > ADVISOR_CPU_CEILING {
        return Hint::CutAcquisitionCost;
    }
    if unit2 < 0.0 {
        return Hint::FixUserEconomics;
    }
    if healthy_units
        && unit3 < 0.0
        && runway_burn > balance
        && metrics.fixed_costs() > ADVISOR_FIXED_COST_FLOOR
    {
        return Hint::TrimFixedCosts;
    }
    if healthy_units && conversion < ADVISOR_CONVERSION_TARGET && runway_burn < balance {
        return Hint::ImproveOnboarding;
    }
    if healthy_units && unit3 > 0.0 && conversion > ADVISOR_CONVERSION_TARGET {
        if cogs > ADVISOR_COGS_FLOOR && cogs_share > ADVISOR_COGS_SHARE {
            return Hint::LowerCostOfGoods;
        }
        if cogs <= ADVISOR_COGS_FLOOR && unit1 >= ADVISOR_UNIT_PROFIT_TARGET {
            return Hint::ScaleUsers;
        }
        if cogs_share < ADVISOR_COGS_SHARE && unit1 < ADVISOR_UNIT_PROFIT_TARGET {
            return Hint::RaisePrice;
        }
    }
    Hint::General
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricBase;

    fn set(price: f64, cogs: f64, conversion: f64, users: f64, cpu: f64, fixed: f64) -> MetricSet {
        MetricSet::recompute(MetricBase::new(price, cogs, conversion, users, cpu, fixed))
    }

    #[test]
    fn starter_metrics_point_at_acquisition_cost() {
        let hint = advise(&set(20.0, 15.0, 10.0, 200.0, 20.0, 3_000.0), 30_000.0);
        assert_eq!(hint, Hint::CutAcquisitionCost);
        assert_eq!(hint.department(), Some(Department::Acquisition));
    }

    #[test]
    fn cheap_users_with_bad_units_still_point_at_acquisition() {
        let hint = advise(&set(20.0, 15.0, 10.0, 200.0, 3.0, 3_000.0), 30_000.0);
        assert_eq!(hint, Hint::FixUserEconomics);
        assert_eq!(hint.department(), Some(Department::Acquisition));
        assert!(hint.message().contains("cost per user"));
    }

    #[test]
    fn burn_beyond_runway_trims_fixed_costs() {
        // Positive per-user profit, but fixed costs dominate.
        let metrics = set(20.0, 10.0, 20.0, 500.0, 1.0, 20_000.0);
        assert!(metrics.net_profit() < 0.0);
        assert_eq!(advise(&metrics, 10_000.0), Hint::TrimFixedCosts);
        assert_eq!(advise(&metrics, 100_000.0), Hint::ImproveOnboarding);
    }

    #[test]
    fn healthy_models_split_by_cost_structure() {
        assert_eq!(
            advise(&set(30.0, 12.0, 50.0, 5_000.0, 1.0, 3_000.0), 30_000.0),
            Hint::LowerCostOfGoods
        );
        assert_eq!(
            advise(&set(80.0, 4.0, 50.0, 5_000.0, 1.0, 3_000.0), 30_000.0),
            Hint::ScaleUsers
        );
        assert_eq!(
            advise(&set(20.0, 4.0, 50.0, 5_000.0, 1.0, 3_000.0), 30_000.0),
            Hint::RaisePrice
        );
    }

    #[test]
    fn exact_conversion_target_falls_through() {
        let metrics = set(30.0, 12.0, 40.0, 5_000.0, 1.0, 3_000.0);
        let hint = advise(&metrics, 30_000.0);
        assert_eq!(hint, Hint::General);
        assert_eq!(hint.department(), None);
    }
}

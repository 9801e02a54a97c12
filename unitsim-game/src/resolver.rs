//! Three-tier initiative resolution with an optional post-success risk.
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Initiative;
use crate::metrics::{BaseField, MetricSet};
use crate::rng::unit_draw;

/// How an initiative played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    FullSuccess,
    Partial,
    Failure,
}

impl Outcome {
    pub const ALL: [Self; 3] = [Self::FullSuccess, Self::Partial, Self::Failure];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FullSuccess => "full_success",
            Self::Partial => "partial",
            Self::Failure => "failure",
        }
    }

    /// Probability of this outcome at success chance `chance`.
    #[must_use]
    pub fn probability(self, chance: f64) -> f64 {
        match self {
            Self::FullSuccess => chance,
            Self::Partial => (1.0 - chance) * chance,
            Self::Failure => (1.0 - chance) * (1.0 - chance),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rolls consumed by one resolution, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolutionTrace {
    pub success_roll: f64,
    pub risk_roll: Option<f64>,
    pub partial_roll: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub metrics: MetricSet,
    /// Set when the risk fired after a full success.
    pub risk_message: Option<String>,
    pub trace: ResolutionTrace,
}

impl Resolution {
    #[must_use]
    pub const fn risk_triggered(&self) -> bool {
        self.risk_message.is_some()
    }
}

/// Resolve `initiative` against `metrics` at success chance `chance`.
///
/// `r1 < chance` is a full success, after which an armed risk rolls `r2`
/// against its own chance. Otherwise `r3 < 1 - chance` is a failure that
/// leaves the metrics untouched, and anything else is a partial success.
/// Partial successes use the explicit partial effect when present, otherwise
/// every base field moves `chance` of the way toward the full result.
pub fn resolve_initiative<R: RngCore + ?Sized>(
    initiative: &Initiative,
    chance: f64,
    metrics: &MetricSet,
    rng: &mut R,
) -> Resolution {
    let success_roll = unit_draw(rng);
    let mut trace = ResolutionTrace {
        success_roll,
        ..ResolutionTrace::default()
    };

    if success_roll < chance {
        let mut next = initiative.effect.apply(metrics);
        let mut risk_message = None;
        if let Some(risk) = &initiative.risk
            && risk.armed(metrics, &next)
        {
            let risk_roll = unit_draw(rng);
            trace.risk_roll = Some(risk_roll);
            if risk_roll < risk.chance {
                next = risk.effect.apply(&next);
                risk_message = Some(risk.message.clone());
            }
        }
        debug!(
            "'{}' succeeded (roll {success_roll:.3} < {chance:.3}), risk fired: {}",
            initiative.title,
            risk_message.is_some()
        );
        return Resolution {
            outcome: Outcome::FullSuccess,
            metrics: next,
            risk_message,
            trace,
        };
    }

    let partial_roll = unit_draw(rng);
    trace.partial_roll = Some(partial_roll);
    if partial_roll < 1.0 - chance {
        debug!("'{}' failed", initiative.title);
        return Resolution {
            outcome: Outcome::Failure,
            metrics: *metrics,
            risk_message: None,
            trace,
        };
    }

    let next = initiative.partial_effect.as_ref().map_or_else(
        || interpolate_partial(metrics, &initiative.effect.apply(metrics), chance),
        |partial| partial.apply(metrics),
    );
    debug!("'{}' partially succeeded", initiative.title);
    Resolution {
        outcome: Outcome::Partial,
        metrics: next,
        risk_message: None,
        trace,
    }
}

/// Move every base field `weight` of the way from `current` to `full`.
#[must_use]
pub fn interpolate_partial(current: &MetricSet, full: &MetricSet, weight: f64) -> MetricSet {
    current.adjusted(|base| {
        for field in BaseField::ALL {
            let from = current.get(field);
            let to = full.get(field);
            base.set(field, from + (to - from) * weight);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AdjustOp, Adjustment, Comparison, Condition, Effect, Risk, RiskCheck};
    use crate::metrics::MetricBase;
    use crate::rng::stub::StubRng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn starter() -> MetricSet {
        MetricSet::recompute(MetricBase::new(20.0, 15.0, 10.0, 200.0, 20.0, 3_000.0))
    }

    fn seo_generator(risk: Option<Risk>) -> Initiative {
        Initiative {
            title: "SEO copy".to_string(),
            description: String::new(),
            base_success_chance: 0.7,
            effect: Effect(vec![
                Adjustment::new(
                    BaseField::Users,
                    AdjustOp::Add {
                        delta: 100.0,
                        min: None,
                        max: None,
                    },
                ),
                Adjustment::new(
                    BaseField::CostPerUser,
                    AdjustOp::Add {
                        delta: -10.0,
                        min: Some(0.0),
                        max: None,
                    },
                ),
            ]),
            partial_effect: None,
            risk,
        }
    }

    fn conversion_drop(chance: f64) -> Risk {
        Risk {
            chance,
            effect: Effect(vec![Adjustment::new(
                BaseField::FirstConversion,
                AdjustOp::Add {
                    delta: -5.0,
                    min: None,
                    max: None,
                },
            )]),
            message: "Over-optimization: C1 -5%".to_string(),
            condition: None,
            check: RiskCheck::After,
        }
    }

    #[test]
    fn full_success_applies_effect() {
        let mut rng = StubRng::rolls(&[0.1]);
        let result = resolve_initiative(&seo_generator(None), 0.5, &starter(), &mut rng);
        assert_eq!(result.outcome, Outcome::FullSuccess);
        assert_eq!(rng.calls, 1, "full success without risk draws once");
        assert!((result.metrics.users() - 300.0).abs() < f64::EPSILON);
        assert!((result.metrics.gross_profit() - -2_850.0).abs() < 1e-9);
        assert!((result.metrics.net_profit() - -5_850.0).abs() < 1e-9);
        assert!(result.trace.risk_roll.is_none());
        assert!(result.trace.partial_roll.is_none());
    }

    #[test]
    fn risk_fires_after_success() {
        let mut rng = StubRng::rolls(&[0.1, 0.2]);
        let result = resolve_initiative(
            &seo_generator(Some(conversion_drop(0.25))),
            0.5,
            &starter(),
            &mut rng,
        );
        assert_eq!(result.outcome, Outcome::FullSuccess);
        assert_eq!(result.risk_message.as_deref(), Some("Over-optimization: C1 -5%"));
        assert!((result.metrics.first_conversion() - 5.0).abs() < f64::EPSILON);
        assert!(result.metrics.is_consistent());
        assert_eq!(rng.calls, 2);
    }

    #[test]
    fn risk_roll_above_chance_keeps_success() {
        let mut rng = StubRng::rolls(&[0.1, 0.6]);
        let result = resolve_initiative(
            &seo_generator(Some(conversion_drop(0.25))),
            0.5,
            &starter(),
            &mut rng,
        );
        assert!(!result.risk_triggered());
        assert!((result.metrics.first_conversion() - 10.0).abs() < f64::EPSILON);
        assert!(result.trace.risk_roll.is_some());
    }

    #[test]
    fn unarmed_risk_skips_its_roll() {
        let mut risk = conversion_drop(1.0);
        risk.condition = Some(Condition {
            field: BaseField::Users,
            cmp: Comparison::AtMost,
            value: 250.0,
        });
        let mut rng = StubRng::rolls(&[0.1, 0.0]);
        let result = resolve_initiative(
            &seo_generator(Some(risk.clone())),
            0.5,
            &starter(),
            &mut rng,
        );
        assert!(!result.risk_triggered(), "users are 300 after the effect");
        assert_eq!(rng.calls, 1);

        risk.check = RiskCheck::Before;
        let mut rng = StubRng::rolls(&[0.1, 0.0]);
        let result = resolve_initiative(&seo_generator(Some(risk)), 0.5, &starter(), &mut rng);
        assert!(result.risk_triggered(), "users were 200 before the effect");
    }

    #[test]
    fn failure_leaves_metrics_untouched() {
        let mut rng = StubRng::rolls(&[0.9, 0.1]);
        let start = starter();
        let result = resolve_initiative(&seo_generator(None), 0.5, &start, &mut rng);
        assert_eq!(result.outcome, Outcome::Failure);
        assert_eq!(result.metrics, start);
        assert_eq!(rng.calls, 2);
    }

    #[test]
    fn partial_interpolates_toward_full_result() {
        let mut rng = StubRng::rolls(&[0.9, 0.8]);
        let start = starter();
        let initiative = seo_generator(None);
        let result = resolve_initiative(&initiative, 0.4, &start, &mut rng);
        assert_eq!(result.outcome, Outcome::Partial);
        let full = initiative.effect.apply(&start);
        for field in BaseField::ALL {
            let expected = start.get(field) + (full.get(field) - start.get(field)) * 0.4;
            assert!((result.metrics.get(field) - expected).abs() < 1e-9, "{field}");
            let (low, high) = if start.get(field) <= full.get(field) {
                (start.get(field), full.get(field))
            } else {
                (full.get(field), start.get(field))
            };
            assert!((low..=high).contains(&result.metrics.get(field)));
        }
        assert!((result.metrics.users() - 240.0).abs() < 1e-9);
        assert!(result.metrics.is_consistent());
    }

    #[test]
    fn explicit_partial_effect_wins() {
        let mut initiative = seo_generator(None);
        initiative.partial_effect = Some(Effect(vec![Adjustment::new(
            BaseField::Users,
            AdjustOp::Set { value: 222.0 },
        )]));
        let mut rng = StubRng::rolls(&[0.9, 0.8]);
        let result = resolve_initiative(&initiative, 0.4, &starter(), &mut rng);
        assert_eq!(result.outcome, Outcome::Partial);
        assert!((result.metrics.users() - 222.0).abs() < f64::EPSILON);
        assert!((result.metrics.cost_per_user() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn derived_fields_stay_consistent_for_random_rolls() {
        let catalog = crate::catalog::InitiativeCatalog::load_from_static();
        let mut rng = SmallRng::seed_from_u64(17);
        let mut metrics = starter();
        for department in crate::catalog::Department::ALL {
            for initiative in catalog.initiatives(department) {
                let result = resolve_initiative(initiative, 0.55, &metrics, &mut rng);
                assert!(result.metrics.is_consistent());
                metrics = result.metrics;
            }
        }
    }

    #[test]
    fn outcome_probabilities_partition_unity() {
        for chance in [0.2, 0.35, 0.5, 0.9] {
            let total: f64 = Outcome::ALL.iter().map(|o| o.probability(chance)).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }
}

//! Initiative catalog: departments, data-driven effects, and offer draws.
use log::debug;
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::metrics::{BaseField, MetricSet};
use crate::numbers::round_half_up;
use crate::rng::unit_draw;
use crate::ruleset::ChanceWindow;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/data/initiatives.json");

/// Business area an initiative belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    #[default]
    Acquisition,
    Product,
    Onboarding,
    Admin,
}

impl Department {
    pub const ALL: [Self; 4] = [
        Self::Acquisition,
        Self::Product,
        Self::Onboarding,
        Self::Admin,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acquisition => "acquisition",
            Self::Product => "product",
            Self::Onboarding => "onboarding",
            Self::Admin => "admin",
        }
    }

    /// Human-readable department name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Acquisition => "User Acquisition",
            Self::Product => "Product",
            Self::Onboarding => "Onboarding",
            Self::Admin => "Administration",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|dep| dep.as_str() == needle)
            .ok_or_else(|| CatalogError::UnknownDepartment(s.to_string()))
    }
}

/// Arithmetic applied to a single base field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AdjustOp {
    /// Add `delta`, then clamp into `[min, max]` where given.
    Add {
        delta: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Multiply by `factor`, optionally rounding half-up, then cap at `max`.
    Scale {
        factor: f64,
        #[serde(default)]
        round: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Overwrite with `value`.
    Set { value: f64 },
}

impl AdjustOp {
    #[must_use]
    pub fn apply(self, current: f64) -> f64 {
        match self {
            Self::Add { delta, min, max } => clamp_optional(current + delta, min, max),
            Self::Scale { factor, round, max } => {
                let scaled = current * factor;
                let scaled = if round { round_half_up(scaled) } else { scaled };
                clamp_optional(scaled, None, max)
            }
            Self::Set { value } => value,
        }
    }
}

fn clamp_optional(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |floor| value.max(floor));
    max.map_or(value, |ceiling| value.min(ceiling))
}

/// One field edit inside an [`Effect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub field: BaseField,
    #[serde(flatten)]
    pub op: AdjustOp,
}

impl Adjustment {
    #[must_use]
    pub const fn new(field: BaseField, op: AdjustOp) -> Self {
        Self { field, op }
    }
}

/// Ordered list of adjustments forming a `MetricSet -> MetricSet` transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Effect(pub Vec<Adjustment>);

impl Effect {
    /// Apply every adjustment in order to a copy of the base fields and
    /// recompute the derived fields.
    #[must_use]
    pub fn apply(&self, metrics: &MetricSet) -> MetricSet {
        metrics.adjusted(|base| {
            for adjustment in &self.0 {
                let current = base.get(adjustment.field);
                base.set(adjustment.field, adjustment.op.apply(current));
            }
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Adjustment>> for Effect {
    fn from(adjustments: Vec<Adjustment>) -> Self {
        Self(adjustments)
    }
}

/// Comparison used by a risk precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Below,
    AtMost,
    Above,
    AtLeast,
}

/// Precondition gating whether a risk may roll at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: BaseField,
    pub cmp: Comparison,
    pub value: f64,
}

impl Condition {
    #[must_use]
    pub fn holds(&self, metrics: &MetricSet) -> bool {
        let current = metrics.get(self.field);
        match self.cmp {
            Comparison::Below => current < self.value,
            Comparison::AtMost => current <= self.value,
            Comparison::Above => current > self.value,
            Comparison::AtLeast => current >= self.value,
        }
    }
}

/// Which metrics a risk condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskCheck {
    /// Metrics as they were before the initiative's effect.
    Before,
    /// Metrics after the initiative's effect has been applied.
    #[default]
    After,
}

/// Secondary negative effect that can fire after a full success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub chance: f64,
    pub effect: Effect,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub check: RiskCheck,
}

impl Risk {
    /// Whether the precondition allows the risk roll.
    #[must_use]
    pub fn armed(&self, before: &MetricSet, after: &MetricSet) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        match self.check {
            RiskCheck::Before => condition.holds(before),
            RiskCheck::After => condition.holds(after),
        }
    }
}

/// Immutable catalog entry a player can pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "success_chance")]
    pub base_success_chance: f64,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_effect: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<Risk>,
}

/// An initiative as offered this turn, with its rolled success chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnInitiative {
    pub initiative: Initiative,
    /// Chance rolled for this offer; `None` when re-rolling is disabled.
    #[serde(default)]
    pub effective_chance: Option<f64>,
}

impl DrawnInitiative {
    /// Success chance the resolver should use.
    #[must_use]
    pub fn chance(&self) -> f64 {
        self.effective_chance
            .unwrap_or(self.initiative.base_success_chance)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("department {0} has no initiatives")]
    EmptyDepartment(Department),
    #[error("unknown department '{0}'")]
    UnknownDepartment(String),
    #[error("initiative '{title}' has success chance {value} outside (0, 1]")]
    SuccessChance { title: String, value: f64 },
    #[error("initiative '{title}' has risk chance {value} outside [0, 1]")]
    RiskChance { title: String, value: f64 },
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Department-keyed initiative lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InitiativeCatalog {
    #[serde(default)]
    pub departments: BTreeMap<Department, Vec<Initiative>>,
}

impl InitiativeCatalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the JSON is malformed or fails
    /// [`InitiativeCatalog::validate`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse the embedded default catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the embedded JSON is malformed and
    /// the validation error if its contents are out of range.
    pub fn try_load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Load the embedded default catalog, empty if it fails to parse.
    ///
    /// Callers that need to surface a broken build should use
    /// [`InitiativeCatalog::try_load_from_static`].
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::try_load_from_static().unwrap_or_default()
    }

    /// Check department coverage and probability ranges.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for department in Department::ALL {
            let entries = self.initiatives(department);
            if entries.is_empty() {
                return Err(CatalogError::EmptyDepartment(department));
            }
            for initiative in entries {
                let chance = initiative.base_success_chance;
                if !(chance > 0.0 && chance <= 1.0) {
                    return Err(CatalogError::SuccessChance {
                        title: initiative.title.clone(),
                        value: chance,
                    });
                }
                if let Some(risk) = &initiative.risk
                    && !(0.0..=1.0).contains(&risk.chance)
                {
                    return Err(CatalogError::RiskChance {
                        title: initiative.title.clone(),
                        value: risk.chance,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn initiatives(&self, department: Department) -> &[Initiative] {
        self.departments
            .get(&department)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total initiatives across all departments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.departments.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample up to `count` distinct initiatives from a department.
    ///
    /// Entries are shuffled and truncated, so no entry repeats within a draw
    /// and position in the catalog carries no bias. With a `window`, each
    /// drawn entry gets an independent effective chance uniform in
    /// `[window.min, window.max)`; without one, the base chance applies.
    pub fn draw_initiatives<R: RngCore + ?Sized>(
        &self,
        department: Department,
        count: usize,
        window: Option<ChanceWindow>,
        rng: &mut R,
    ) -> Vec<DrawnInitiative> {
        let entries = self.initiatives(department);
        let mut indices: Vec<usize> = (0..entries.len()).collect();
        indices.shuffle(rng);
        indices.truncate(count);
        let drawn: Vec<DrawnInitiative> = indices
            .into_iter()
            .map(|idx| DrawnInitiative {
                initiative: entries[idx].clone(),
                effective_chance: window
                    .map(|window| window.min + unit_draw(rng) * (window.max - window.min)),
            })
            .collect();
        debug!(
            "drew {} of {} initiatives from {department}",
            drawn.len(),
            entries.len()
        );
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricBase;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn starter() -> MetricSet {
        MetricSet::recompute(MetricBase::new(20.0, 15.0, 10.0, 200.0, 20.0, 3_000.0))
    }

    #[test]
    fn embedded_catalog_has_documented_sizes() {
        let catalog = InitiativeCatalog::from_json(DEFAULT_CATALOG_DATA).unwrap();
        assert_eq!(catalog.initiatives(Department::Acquisition).len(), 11);
        assert_eq!(catalog.initiatives(Department::Product).len(), 11);
        assert_eq!(catalog.initiatives(Department::Onboarding).len(), 10);
        assert_eq!(catalog.initiatives(Department::Admin).len(), 8);
        assert_eq!(catalog.len(), 40);
    }

    #[test]
    fn add_clamps_and_scale_rounds() {
        let clamp = AdjustOp::Add {
            delta: -17.0,
            min: Some(0.0),
            max: None,
        };
        assert!(clamp.apply(10.0).abs() < f64::EPSILON);

        let boost = AdjustOp::Scale {
            factor: 1.18,
            round: true,
            max: Some(100.0),
        };
        assert!((boost.apply(10.0) - 12.0).abs() < f64::EPSILON);
        assert!((boost.apply(95.0) - 100.0).abs() < f64::EPSILON);

        let set = AdjustOp::Set { value: 7.0 };
        assert!((set.apply(1_000.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn effect_parses_from_catalog_notation() {
        let json = r#"[
            { "field": "users", "op": "add", "delta": 100 },
            { "field": "cost_per_user", "op": "add", "delta": -10, "min": 0 }
        ]"#;
        let effect: Effect = serde_json::from_str(json).unwrap();
        let after = effect.apply(&starter());
        assert!((after.users() - 300.0).abs() < f64::EPSILON);
        assert!((after.cost_per_user() - 10.0).abs() < f64::EPSILON);
        assert!((after.net_profit() - -5_850.0).abs() < 1e-9);
        assert!(after.is_consistent());
    }

    #[test]
    fn risk_condition_reads_requested_side() {
        let before = starter();
        let after = before.adjusted(|base| base.first_conversion = 50.0);
        let mut risk = Risk {
            chance: 1.0,
            effect: Effect::default(),
            message: String::new(),
            condition: Some(Condition {
                field: BaseField::FirstConversion,
                cmp: Comparison::Below,
                value: 20.0,
            }),
            check: RiskCheck::After,
        };
        assert!(!risk.armed(&before, &after));
        risk.check = RiskCheck::Before;
        assert!(risk.armed(&before, &after));
        risk.condition = None;
        assert!(risk.armed(&before, &after));
    }

    #[test]
    fn draw_never_repeats_within_offer() {
        let catalog = InitiativeCatalog::load_from_static();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..500 {
            for department in Department::ALL {
                let drawn = catalog.draw_initiatives(department, 3, None, &mut rng);
                assert_eq!(drawn.len(), 3);
                let titles: HashSet<&str> = drawn
                    .iter()
                    .map(|entry| entry.initiative.title.as_str())
                    .collect();
                assert_eq!(titles.len(), 3);
            }
        }
    }

    #[test]
    fn small_department_returns_everything() {
        let mut catalog = InitiativeCatalog::load_from_static();
        let admin = catalog.departments.get_mut(&Department::Admin).unwrap();
        admin.truncate(2);
        let mut rng = SmallRng::seed_from_u64(5);
        let drawn = catalog.draw_initiatives(Department::Admin, 3, None, &mut rng);
        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn effective_chance_stays_inside_window() {
        let catalog = InitiativeCatalog::load_from_static();
        let window = ChanceWindow { min: 0.2, max: 0.9 };
        let mut rng = SmallRng::seed_from_u64(99);
        let mut lowest = f64::MAX;
        let mut highest = f64::MIN;
        for _ in 0..2_000 {
            for entry in catalog.draw_initiatives(Department::Product, 3, Some(window), &mut rng) {
                let chance = entry.chance();
                assert!((0.2..0.9).contains(&chance));
                lowest = lowest.min(chance);
                highest = highest.max(chance);
            }
        }
        assert!(lowest < 0.25, "window floor should be reachable");
        assert!(highest > 0.85, "window ceiling should be reachable");
    }

    #[test]
    fn draw_has_no_positional_bias() {
        const SAMPLE_SIZE: usize = 20_000;
        const TOLERANCE: f64 = 0.02;
        let catalog = InitiativeCatalog::load_from_static();
        let entries = catalog.initiatives(Department::Onboarding);
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut rng = SmallRng::seed_from_u64(2024);
        for _ in 0..SAMPLE_SIZE {
            for entry in catalog.draw_initiatives(Department::Onboarding, 3, None, &mut rng) {
                *counts.entry(entry.initiative.title).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), entries.len());
        let expected = 3.0 / crate::numbers::usize_to_f64(entries.len());
        for (title, count) in counts {
            let share = crate::numbers::ratio(count, SAMPLE_SIZE);
            assert!(
                (share - expected).abs() < TOLERANCE,
                "{title} drawn at {share:.3}, expected {expected:.3}"
            );
        }
    }

    #[test]
    fn validation_rejects_bad_chances() {
        let mut catalog = InitiativeCatalog::load_from_static();
        catalog
            .departments
            .get_mut(&Department::Product)
            .unwrap()[0]
            .base_success_chance = 0.0;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::SuccessChance { .. })
        ));

        let mut catalog = InitiativeCatalog::load_from_static();
        catalog.departments.remove(&Department::Admin);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyDepartment(Department::Admin))
        ));

        assert!(matches!(
            InitiativeCatalog::from_json("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn embedded_catalog_parses_without_fallback() {
        let catalog = InitiativeCatalog::try_load_from_static().unwrap();
        assert_eq!(catalog, InitiativeCatalog::load_from_static());
        assert_eq!(catalog.len(), 40);

        let truncated = &DEFAULT_CATALOG_DATA[..DEFAULT_CATALOG_DATA.len() / 2];
        assert!(matches!(
            InitiativeCatalog::from_json(truncated),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn department_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Department>().unwrap(), Department::Admin);
        assert!("marketing".parse::<Department>().is_err());
        for department in Department::ALL {
            assert_eq!(department.to_string().parse::<Department>().unwrap(), department);
        }
    }
}

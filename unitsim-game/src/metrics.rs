//! Unit-economics metric model.
//!
//! A [`MetricSet`] carries the six base fields a player can move plus five
//! derived fields. The derived fields are private and only ever produced by
//! [`MetricSet::recompute`], so a set can never drift out of sync with its
//! base values. Deserialization goes through [`MetricBase`] for the same
//! reason.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six player-controlled business inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricBase {
    /// Average subscription price.
    #[serde(default)]
    pub avg_price: f64,
    /// Variable cost per paying user.
    #[serde(default)]
    pub cost_of_goods: f64,
    /// First-session conversion, in percent.
    #[serde(default)]
    pub first_conversion: f64,
    /// Active users.
    #[serde(default)]
    pub users: f64,
    /// Blended acquisition cost per user.
    #[serde(default)]
    pub cost_per_user: f64,
    /// Monthly fixed operating cost.
    #[serde(default)]
    pub fixed_costs: f64,
}

impl MetricBase {
    #[must_use]
    pub const fn new(
        avg_price: f64,
        cost_of_goods: f64,
        first_conversion: f64,
        users: f64,
        cost_per_user: f64,
        fixed_costs: f64,
    ) -> Self {
        Self {
            avg_price,
            cost_of_goods,
            first_conversion,
            users,
            cost_per_user,
            fixed_costs,
        }
    }

    #[must_use]
    pub const fn get(&self, field: BaseField) -> f64 {
        match field {
            BaseField::AvgPrice => self.avg_price,
            BaseField::CostOfGoods => self.cost_of_goods,
            BaseField::FirstConversion => self.first_conversion,
            BaseField::Users => self.users,
            BaseField::CostPerUser => self.cost_per_user,
            BaseField::FixedCosts => self.fixed_costs,
        }
    }

    pub const fn set(&mut self, field: BaseField, value: f64) {
        match field {
            BaseField::AvgPrice => self.avg_price = value,
            BaseField::CostOfGoods => self.cost_of_goods = value,
            BaseField::FirstConversion => self.first_conversion = value,
            BaseField::Users => self.users = value,
            BaseField::CostPerUser => self.cost_per_user = value,
            BaseField::FixedCosts => self.fixed_costs = value,
        }
    }
}

/// Identifier for one of the base fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseField {
    AvgPrice,
    CostOfGoods,
    FirstConversion,
    Users,
    CostPerUser,
    FixedCosts,
}

impl BaseField {
    pub const ALL: [Self; 6] = [
        Self::AvgPrice,
        Self::CostOfGoods,
        Self::FirstConversion,
        Self::Users,
        Self::CostPerUser,
        Self::FixedCosts,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AvgPrice => "avg_price",
            Self::CostOfGoods => "cost_of_goods",
            Self::FirstConversion => "first_conversion",
            Self::Users => "users",
            Self::CostPerUser => "cost_per_user",
            Self::FixedCosts => "fixed_costs",
        }
    }
}

impl fmt::Display for BaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BaseField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or(())
    }
}

/// Base fields plus the derived profit chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricBase")]
pub struct MetricSet {
    #[serde(flatten)]
    base: MetricBase,
    margin: f64,
    gross_profit_per_user: f64,
    net_profit_per_user: f64,
    gross_profit: f64,
    net_profit: f64,
}

impl MetricSet {
    /// Build a metric set from base fields, computing every derived field.
    ///
    /// A zero average price yields a margin of `0.0` instead of a division
    /// by zero; the other derived fields follow their formulas unchanged.
    #[must_use]
    pub fn recompute(base: MetricBase) -> Self {
        let gross_profit_per_user = base.avg_price - base.cost_of_goods;
        let margin = if base.avg_price.abs() < f64::EPSILON {
            0.0
        } else {
            gross_profit_per_user / base.avg_price
        };
        let net_profit_per_user = gross_profit_per_user * (base.first_conversion / 100.0);
        let gross_profit = (net_profit_per_user - base.cost_per_user) * base.users;
        let net_profit = gross_profit - base.fixed_costs;
        Self {
            base,
            margin,
            gross_profit_per_user,
            net_profit_per_user,
            gross_profit,
            net_profit,
        }
    }

    /// Copy the base fields, let `edit` change them, and recompute.
    #[must_use]
    pub fn adjusted(&self, edit: impl FnOnce(&mut MetricBase)) -> Self {
        let mut base = self.base;
        edit(&mut base);
        Self::recompute(base)
    }

    /// True when every derived field matches a fresh recomputation.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let fresh = Self::recompute(self.base);
        same_value(fresh.margin, self.margin)
            && same_value(fresh.gross_profit_per_user, self.gross_profit_per_user)
            && same_value(fresh.net_profit_per_user, self.net_profit_per_user)
            && same_value(fresh.gross_profit, self.gross_profit)
            && same_value(fresh.net_profit, self.net_profit)
    }

    #[must_use]
    pub const fn base(&self) -> &MetricBase {
        &self.base
    }

    #[must_use]
    pub const fn get(&self, field: BaseField) -> f64 {
        self.base.get(field)
    }

    #[must_use]
    pub const fn avg_price(&self) -> f64 {
        self.base.avg_price
    }

    #[must_use]
    pub const fn cost_of_goods(&self) -> f64 {
        self.base.cost_of_goods
    }

    #[must_use]
    pub const fn first_conversion(&self) -> f64 {
        self.base.first_conversion
    }

    #[must_use]
    pub const fn users(&self) -> f64 {
        self.base.users
    }

    #[must_use]
    pub const fn cost_per_user(&self) -> f64 {
        self.base.cost_per_user
    }

    #[must_use]
    pub const fn fixed_costs(&self) -> f64 {
        self.base.fixed_costs
    }

    /// `(avg_price - cost_of_goods) / avg_price`, or `0.0` at zero price.
    #[must_use]
    pub const fn margin(&self) -> f64 {
        self.margin
    }

    /// Price minus variable cost (ARPPU-equivalent).
    #[must_use]
    pub const fn gross_profit_per_user(&self) -> f64 {
        self.gross_profit_per_user
    }

    /// Gross profit per user weighted by conversion (AMPU-equivalent).
    #[must_use]
    pub const fn net_profit_per_user(&self) -> f64 {
        self.net_profit_per_user
    }

    #[must_use]
    pub const fn gross_profit(&self) -> f64 {
        self.gross_profit
    }

    #[must_use]
    pub const fn net_profit(&self) -> f64 {
        self.net_profit
    }
}

impl From<MetricBase> for MetricSet {
    fn from(base: MetricBase) -> Self {
        Self::recompute(base)
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::recompute(MetricBase::default())
    }
}

// NaN-aware equality so non-finite inputs still count as consistent.
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starter() -> MetricBase {
        MetricBase::new(20.0, 15.0, 10.0, 200.0, 20.0, 3_000.0)
    }

    #[test]
    fn starter_metrics_reproduce_known_profit_chain() {
        let metrics = MetricSet::recompute(starter());
        assert!((metrics.margin() - 0.25).abs() < 1e-12);
        assert!((metrics.gross_profit_per_user() - 5.0).abs() < 1e-12);
        assert!((metrics.net_profit_per_user() - 0.5).abs() < 1e-12);
        assert!((metrics.gross_profit() - -3_900.0).abs() < 1e-9);
        assert!((metrics.net_profit() - -6_900.0).abs() < 1e-9);
    }

    #[test]
    fn recompute_is_idempotent() {
        for price in [0.0, 1.0, 20.0, 47.5] {
            for conversion in [0.0, 10.0, 55.0, 130.0] {
                for users in [0.0, 99.0, 5_000.0] {
                    let base = MetricBase::new(price, 12.0, conversion, users, 7.0, 2_500.0);
                    let once = MetricSet::recompute(base);
                    let twice = MetricSet::recompute(*once.base());
                    assert_eq!(once, twice);
                    assert!(twice.is_consistent());
                }
            }
        }
    }

    #[test]
    fn zero_price_margin_falls_back_to_zero() {
        let mut base = starter();
        base.avg_price = 0.0;
        let metrics = MetricSet::recompute(base);
        assert!(metrics.margin().abs() < f64::EPSILON);
        assert!((metrics.gross_profit_per_user() - -15.0).abs() < 1e-12);
        assert!(metrics.net_profit().is_finite());
        assert!(metrics.is_consistent());
    }

    #[test]
    fn adjusted_recomputes_derived_fields() {
        let metrics = MetricSet::recompute(starter()).adjusted(|base| {
            base.users += 100.0;
            base.cost_per_user = (base.cost_per_user - 10.0).max(0.0);
        });
        assert!((metrics.users() - 300.0).abs() < f64::EPSILON);
        assert!((metrics.cost_per_user() - 10.0).abs() < f64::EPSILON);
        assert!((metrics.gross_profit() - -2_850.0).abs() < 1e-9);
        assert!((metrics.net_profit() - -5_850.0).abs() < 1e-9);
    }

    #[test]
    fn deserializing_ignores_stale_derived_values() {
        let json = r#"{
            "avg_price": 20.0,
            "cost_of_goods": 15.0,
            "first_conversion": 10.0,
            "users": 200.0,
            "cost_per_user": 20.0,
            "fixed_costs": 3000.0,
            "margin": 0.99,
            "net_profit": 123456.0
        }"#;
        let metrics: MetricSet = serde_json::from_str(json).unwrap();
        assert!((metrics.net_profit() - -6_900.0).abs() < 1e-9);
        assert!((metrics.margin() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn base_field_keys_parse_back() {
        for field in BaseField::ALL {
            assert_eq!(field.key().parse::<BaseField>(), Ok(field));
        }
        assert!("nps".parse::<BaseField>().is_err());
    }
}

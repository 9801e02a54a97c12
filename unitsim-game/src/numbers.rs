//! Numeric helpers centralizing rounding and lossy casts.

use num_traits::cast::cast;

/// Round to the nearest integer with ties going toward positive infinity.
///
/// Relative conversion boosts in the catalog are authored against this rule
/// (`2.5 -> 3`, `-2.5 -> -2`), which differs from [`f64::round`] on negative
/// ties.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value + 0.5).floor()
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Widen a count to u64, saturating on exotic targets.
#[must_use]
pub fn usize_to_u64(value: usize) -> u64 {
    cast::<usize, u64>(value).unwrap_or(u64::MAX)
}

/// Turn counters and similar u32 values as indices.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    cast::<u32, usize>(value).unwrap_or(usize::MAX)
}

/// Share of `part` in `total`, returning 0.0 for an empty total.
#[must_use]
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    usize_to_f64(part) / usize_to_f64(total)
}

/// Convert a non-negative f64 to usize, flooring and saturating.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX)
}

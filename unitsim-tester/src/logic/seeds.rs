use anyhow::{Context, Result, bail};
use std::collections::HashSet;

/// Seed used when no tokens are given.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Supports literal integers (negative values use their magnitude) and
/// half-open ranges such as `10..20`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            let start: u64 = start
                .trim()
                .parse()
                .with_context(|| format!("invalid range start in {token}"))?;
            let end: u64 = end
                .trim()
                .parse()
                .with_context(|| format!("invalid range end in {token}"))?;
            if end <= start {
                bail!("Empty seed range: {token}");
            }
            pending.extend(start..end);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}

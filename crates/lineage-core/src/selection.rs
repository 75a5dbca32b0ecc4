//! Random selection helpers shared by topologies and processes

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::error::{GraphError, GraphResult};

/// Fitness-proportional (roulette-wheel) selection
///
/// Draws `r` uniformly in `[0, 1)` and returns the first index whose
/// cumulative share of the total weight exceeds `r`. Floating point
/// rounding can leave the final cumulative share just below `r`; the last
/// positively weighted index is returned in that case.
pub fn roulette(weights: &[f64], rng: &mut dyn RngCore) -> GraphResult<usize> {
    if weights.is_empty() {
        return Err(GraphError::EmptySelection("no candidates".to_string()));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(GraphError::InvalidArgument(format!(
            "selection weight {} must be finite and non-negative",
            bad
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(GraphError::EmptySelection(
            "all candidates have zero weight".to_string(),
        ));
    }

    let draw: f64 = rng.random();
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, weight) in weights.iter().enumerate() {
        if *weight > 0.0 {
            last_positive = i;
        }
        cumulative += weight / total;
        if cumulative > draw {
            return Ok(i);
        }
    }
    Ok(last_positive)
}

/// Uniform choice from a slice
pub fn choose<'a, T>(items: &'a [T], rng: &mut dyn RngCore, what: &str) -> GraphResult<&'a T> {
    items
        .choose(rng)
        .ok_or_else(|| GraphError::EmptySelection(what.to_string()))
}

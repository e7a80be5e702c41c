use log::{debug, trace};
use nalgebra::Matrix2;
use num_bigint::BigInt;

use crate::config::SearchLimits;
use crate::symbolic::format_matrix;
use crate::{MoireError, Result};

/// Sum of squared entries.
pub fn ugliness(cell: &Matrix2<BigInt>) -> BigInt {
    cell.iter().map(|entry| entry * entry).sum()
}

/// Greedy search for an equivalent basis with small entries.
///
/// Each step moves to the least ugly cell reachable by adding `m` times one
/// row to the other (`|m| <= 2`, the cell itself included) and stops as soon
/// as no neighbor is strictly better. The lattice spanned is unchanged.
pub fn find_nicer_cell(cell: &Matrix2<BigInt>) -> Result<Matrix2<BigInt>> {
    find_nicer_cell_with_limits(cell, &SearchLimits::default())
}

pub fn find_nicer_cell_with_limits(
    cell: &Matrix2<BigInt>,
    limits: &SearchLimits,
) -> Result<Matrix2<BigInt>> {
    let mut current = cell.clone();
    for step in 0..limits.max_nicer_cell_steps {
        let best = best_neighbor(&current, limits.nicer_cell_max_mult);
        let (now, next) = (ugliness(&current), ugliness(&best));
        if now <= next {
            debug!(
                "nicer cell {} after {} steps (ugliness {})",
                format_matrix(&current),
                step,
                now
            );
            return Ok(current);
        }
        trace!("step {}: ugliness {} -> {}", step, now, next);
        current = best;
    }
    Err(MoireError::InternalError(format!(
        "nicening of {} did not settle within {} steps",
        format_matrix(cell),
        limits.max_nicer_cell_steps
    )))
}

fn neighbors(cell: &Matrix2<BigInt>, max_mult: i64) -> Vec<Matrix2<BigInt>> {
    let mut out = Vec::new();
    for (target, source) in [(0, 1), (1, 0)] {
        for mult in -max_mult..=max_mult {
            let mult = BigInt::from(mult);
            let mut next = cell.clone();
            for col in 0..2 {
                next[(target, col)] = &cell[(target, col)] + &mult * &cell[(source, col)];
            }
            out.push(next);
        }
    }
    out
}

// First minimum in neighbor order wins ties.
fn best_neighbor(cell: &Matrix2<BigInt>, max_mult: i64) -> Matrix2<BigInt> {
    neighbors(cell, max_mult)
        .into_iter()
        .min_by_key(ugliness)
        .unwrap_or_else(|| cell.clone())
}

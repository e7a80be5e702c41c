use log::debug;
use num_rational::BigRational;
use num_traits::Signed;

use super::expr::Expr;
use super::symbol::Symbol;
use crate::config::SearchLimits;
use crate::{MoireError, Result};

/// Parametrizes the solutions of `c₀·x² + c₁·y² + c₂·z² = 0`.
///
/// The variables are first reordered by coefficient (numeric before symbolic,
/// then by magnitude), a small base point is located by exhaustive search in
/// growing boxes, and the remaining solutions are swept out by lines through
/// that point. The result is expressed in two fresh dummy symbols `p`, `q`
/// and listed in the solver's internal variable order, which need not be the
/// order of `coeffs`.
pub fn parametrize_ternary_quadratic(coeffs: &[Expr; 3], limits: &SearchLimits) -> Result<[Expr; 3]> {
    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&index| ordering_key(&coeffs[index]));
    let sorted = order.map(|index| coeffs[index].clone());

    let base = find_base_point(&sorted, limits.base_point_radius)?;
    let pivot = base
        .iter()
        .position(|&value| value != 0)
        .ok_or_else(|| MoireError::InternalError("base point is the origin".to_string()))?;
    let (j, k) = ((pivot + 1) % 3, (pivot + 2) % 3);
    debug!(
        "ternary form ({}, {}, {}) has base point {:?}",
        sorted[0], sorted[1], sorted[2], base
    );

    // Substituting (r·x₀, r·y₀ + p, r·z₀ + q) leaves r·(r·0 + b) + a = 0.
    let p = Expr::from(Symbol::dummy("p"));
    let q = Expr::from(Symbol::dummy("q"));
    let a = &sorted[j] * p.pow(2) + &sorted[k] * q.pow(2);
    let b = Expr::integer(2)
        * (&sorted[j] * Expr::integer(base[j]) * &p + &sorted[k] * Expr::integer(base[k]) * &q);

    let mut solution = [Expr::zero(), Expr::zero(), Expr::zero()];
    solution[pivot] = &a * Expr::integer(base[pivot]);
    solution[j] = &a * Expr::integer(base[j]) - &b * &p;
    solution[k] = &a * Expr::integer(base[k]) - &b * &q;
    Ok(solution)
}

type OrderingKey = (bool, Option<(BigRational, BigRational)>, String);

fn ordering_key(coeff: &Expr) -> OrderingKey {
    (
        coeff.has_free_symbols(),
        coeff.to_rational().map(|value| (value.abs(), value)),
        coeff.to_string(),
    )
}

// 0, 1, -1, 2, -2, ..., radius, -radius
fn signed_range(radius: i64) -> Vec<i64> {
    std::iter::once(0)
        .chain((1..=radius).flat_map(|n| [n, -n]))
        .collect()
}

fn find_base_point(coeffs: &[Expr; 3], radius: i64) -> Result<[i64; 3]> {
    for shell in 1..=radius {
        let values = signed_range(shell);
        for &u in &values {
            for &v in &values {
                for &w in &values {
                    if u.abs().max(v.abs()).max(w.abs()) != shell {
                        continue;
                    }
                    let form = &coeffs[0] * Expr::integer(u * u)
                        + &coeffs[1] * Expr::integer(v * v)
                        + &coeffs[2] * Expr::integer(w * w);
                    if form.is_zero() {
                        return Ok([u, v, w]);
                    }
                }
            }
        }
    }
    Err(MoireError::InternalError(format!(
        "no nontrivial zero of {}·x² + {}·y² + {}·z² with entries up to {}",
        coeffs[0], coeffs[1], coeffs[2], radius
    )))
}

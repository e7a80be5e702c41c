use std::collections::BTreeMap;

use log::{debug, warn};
use nalgebra::Matrix2;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::pattern::{MoirePattern, Opers};
use super::util::{all_concrete, integer_parameter, is_squarefree, undummy};
use crate::config::SearchLimits;
use crate::symbolic::{
    expr_matrix, gcd_all, parametrize_ternary_quadratic, ExactMatrix, Expr, ExprMatrix, Symbol,
};
use crate::{MoireError, Result};

// ======================== CARTESIAN OPERATORS ========================

/// `[[c, -s], [s, c]]`; concrete arguments must satisfy `s² + c² = 1`.
pub fn rotation_cart(sine: impl Into<Expr>, cosine: impl Into<Expr>) -> Result<ExprMatrix> {
    let (sine, cosine) = (sine.into(), cosine.into());
    check_unit_circle("rotation", &sine, &cosine)?;
    Ok(rotation_like(&sine, &cosine))
}

/// `[[c, s], [s, -c]]`; concrete arguments must satisfy `s² + c² = 1`.
pub fn reflection_cart(sine: impl Into<Expr>, cosine: impl Into<Expr>) -> Result<ExprMatrix> {
    let (sine, cosine) = (sine.into(), cosine.into());
    check_unit_circle("reflection", &sine, &cosine)?;
    Ok(Matrix2::new(cosine.clone(), sine.clone(), sine, -cosine))
}

fn rotation_like(sine: &Expr, cosine: &Expr) -> ExprMatrix {
    Matrix2::new(cosine.clone(), -sine, sine.clone(), cosine.clone())
}

fn check_unit_circle(kind: &str, sine: &Expr, cosine: &Expr) -> Result<()> {
    if !all_concrete(&[sine, cosine]) {
        debug!("{} with symbolic sine {} and cosine {}", kind, sine, cosine);
        return Ok(());
    }
    if sine * sine + cosine * cosine != Expr::one() {
        return Err(MoireError::ValidationError(format!(
            "{} needs sine² + cosine² = 1, got sine = {} and cosine = {}",
            kind, sine, cosine
        )));
    }
    Ok(())
}

// ======================== PRIMITIVE CELLS ========================

/// `[[1, 0], [0, √β]]`; a concrete `β` must be a squarefree integer.
pub fn prim_rotation_cell(beta: impl Into<Expr>) -> Result<ExprMatrix> {
    let beta = beta.into();
    if !beta.has_free_symbols() && !is_squarefree(&beta)? {
        return Err(MoireError::ValidationError(format!(
            "β = {} is not squarefree",
            beta
        )));
    }
    Ok(expr_matrix([
        [Expr::one(), Expr::zero()],
        [Expr::zero(), beta.sqrt()],
    ]))
}

/// `[[1, 0], [cosine, √(1 - cosine²)]]`
pub fn prim_special_reflection_cell(cosine: impl Into<Expr>) -> ExprMatrix {
    let cosine = cosine.into();
    let sine = (Expr::one() - &cosine * &cosine).sqrt();
    expr_matrix([[Expr::one(), Expr::zero()], [cosine, sine]])
}

// ======================== MOIRE FAMILIES ========================

/// Rotation of the `β` cell by the angle with `cos = a/c`, `sin = b√β/c`.
///
/// Concrete parameters must satisfy `gcd(a, b·β) = gcd(a, c) = 1` and
/// `a² + β·b² = c²`.
pub fn prim_rotation_moire_abc(
    beta: impl Into<Expr>,
    a: impl Into<Expr>,
    b: impl Into<Expr>,
    c: impl Into<Expr>,
) -> Result<MoirePattern> {
    prim_scaled_rotation_moire_abck(beta, a, b, c, 1)
}

/// Rotation combined with a scaling of determinant `k`.
///
/// `M = [[a/c, -b√β/c], [b√β/c, a/c]]`. Concrete parameters must satisfy
/// `gcd(a, b·β) = gcd(a, k·c) = 1`, `a² + β·b² = k·c²` and `det(M) = k`.
pub fn prim_scaled_rotation_moire_abck(
    beta: impl Into<Expr>,
    a: impl Into<Expr>,
    b: impl Into<Expr>,
    c: impl Into<Expr>,
    k: impl Into<Expr>,
) -> Result<MoirePattern> {
    let (beta, a, b, c, k) = (beta.into(), a.into(), b.into(), c.into(), k.into());

    if all_concrete(&[&beta, &a, &b, &c, &k]) {
        let beta_i = integer_parameter("β", &beta)?;
        let a_i = integer_parameter("a", &a)?;
        let b_i = integer_parameter("b", &b)?;
        let c_i = integer_parameter("c", &c)?;
        let k_i = integer_parameter("k", &k)?;
        if !a_i.gcd(&(&b_i * &beta_i)).is_one() || !a_i.gcd(&(&k_i * &c_i)).is_one() {
            return Err(MoireError::ValidationError(format!(
                "need gcd(a, b·β) = gcd(a, k·c) = 1, got a = {}, b = {}, c = {}, k = {}, β = {}",
                a_i, b_i, c_i, k_i, beta_i
            )));
        }
        if &a_i * &a_i + &beta_i * &b_i * &b_i != &k_i * &c_i * &c_i {
            return Err(MoireError::ValidationError(format!(
                "{}² + {}·{}² != {}·{}²",
                a_i, beta_i, b_i, k_i, c_i
            )));
        }
    } else {
        warn!(
            "rotation family with symbolic parameters (β = {}, a = {}, b = {}, c = {}, k = {}); preconditions not checked",
            beta, a, b, c, k
        );
    }

    let cell = prim_rotation_cell(beta.clone())?;
    let zero_c = || MoireError::ValidationError("c must be nonzero".to_string());
    let sine = (&b * beta.sqrt()).checked_div(&c).ok_or_else(zero_c)?;
    let cosine = a.checked_div(&c).ok_or_else(zero_c)?;
    let cart = if k == Expr::one() {
        rotation_cart(sine, cosine)?
    } else {
        rotation_like(&sine, &cosine)
    };

    let det = cart.det_exact();
    if all_concrete(&[&det, &k]) && det != k {
        return Err(MoireError::ValidationError(format!(
            "det(M) = {} but k = {}",
            det, k
        )));
    }

    Opers::new(cell).with_cart(cart).build()
}

/// Rotation family indexed by coprime `(p, q)` through
/// [`rotation_diophantine_triple`].
pub fn prim_rotation_moire_pq(
    beta: impl Into<Expr>,
    p: impl Into<Expr>,
    q: impl Into<Expr>,
) -> Result<MoirePattern> {
    let (beta, p, q) = (beta.into(), p.into(), q.into());
    if all_concrete(&[&p, &q]) {
        let p_i = integer_parameter("p", &p)?;
        let q_i = integer_parameter("q", &q)?;
        if !p_i.gcd(&q_i).is_one() {
            return Err(MoireError::ValidationError(format!(
                "p = {} and q = {} are not coprime",
                p_i, q_i
            )));
        }
    }
    let (a, b, c) = rotation_diophantine_triple(beta.clone(), p, q)?;
    prim_rotation_moire_abc(beta, a, b, c)
}

/// Reflection of the cell `[[1, 0], [t, √(1 - t²)]]` across its bisector.
pub fn prim_special_reflection_moire(t: impl Into<Expr>) -> Result<MoirePattern> {
    let t = t.into();
    if let Some(value) = t.to_rational() {
        if value.abs() > BigRational::one() {
            return Err(MoireError::ValidationError(format!(
                "cosine t = {} lies outside [-1, 1]",
                t
            )));
        }
    }
    let cell = prim_special_reflection_cell(t.clone());
    let cart = reflection_cart((Expr::one() - &t * &t).sqrt(), t)?;
    Opers::new(cell).with_cart(cart).build()
}

// ======================== DIOPHANTINE TRIPLES ========================

const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// `(a, b, c)` with `a² + β·b² = c²`, parametrized by `(p, q)`.
///
/// The parametrizer lists its variables in its own order, so every
/// permutation is tried against the equation before substituting. Concrete
/// triples are reduced by their gcd and signed so that `c > 0`.
pub fn rotation_diophantine_triple(
    beta: impl Into<Expr>,
    p: impl Into<Expr>,
    q: impl Into<Expr>,
) -> Result<(Expr, Expr, Expr)> {
    let (beta, p, q) = (beta.into(), p.into(), q.into());
    let coeffs = [Expr::one(), beta.clone(), -Expr::one()];
    let solution = parametrize_ternary_quadratic(&coeffs, &SearchLimits::default())?;
    let solution = [
        undummy(&solution[0])?,
        undummy(&solution[1])?,
        undummy(&solution[2])?,
    ];

    let [i, j, k] = PERMUTATIONS
        .iter()
        .copied()
        .find(|&[i, j, k]| {
            let (a, b, c) = (&solution[i], &solution[j], &solution[k]);
            (a * a + &beta * b * b - c * c).is_zero()
        })
        .ok_or_else(|| {
            MoireError::InternalError(format!(
                "no ordering of ({}, {}, {}) solves x² + {}·y² = z²",
                solution[0], solution[1], solution[2], beta
            ))
        })?;

    let substitutions = BTreeMap::from([(Symbol::new("p"), p), (Symbol::new("q"), q)]);
    let triple = [
        solution[i].subs(&substitutions)?,
        solution[j].subs(&substitutions)?,
        solution[k].subs(&substitutions)?,
    ];
    let [a, b, c] = reduce_triple(triple);
    Ok((a, b, c))
}

fn reduce_triple(triple: [Expr; 3]) -> [Expr; 3] {
    let ints: Option<Vec<BigInt>> = triple.iter().map(Expr::to_integer).collect();
    let Some(ints) = ints else {
        return triple;
    };
    let g = gcd_all(&ints);
    if g.is_zero() {
        return triple;
    }
    let divisor = if ints[2].is_negative() { -g } else { g };
    [
        Expr::from(&ints[0] / &divisor),
        Expr::from(&ints[1] / &divisor),
        Expr::from(&ints[2] / &divisor),
    ]
}

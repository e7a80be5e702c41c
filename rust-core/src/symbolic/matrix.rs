use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use nalgebra::Matrix2;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use super::expr::Expr;
use super::symbol::Symbol;
use crate::{MoireError, Result};

/// 2x2 matrix of exact scalars. Rows are lattice vectors.
pub type ExprMatrix = Matrix2<Expr>;

/// Builds a matrix from rows.
pub fn expr_matrix<T: Into<Expr>>(rows: [[T; 2]; 2]) -> ExprMatrix {
    let [[m11, m12], [m21, m22]] = rows;
    Matrix2::new(m11.into(), m12.into(), m21.into(), m22.into())
}

pub fn from_integer_matrix(mat: &Matrix2<BigInt>) -> ExprMatrix {
    mat.map(Expr::from)
}

pub fn from_rational_matrix(mat: &Matrix2<BigRational>) -> ExprMatrix {
    mat.map(Expr::from)
}

/// `[[a, b], [c, d]]`
pub fn format_matrix<T: Display>(mat: &Matrix2<T>) -> String {
    format!(
        "[[{}, {}], [{}, {}]]",
        mat[(0, 0)],
        mat[(0, 1)],
        mat[(1, 0)],
        mat[(1, 1)]
    )
}

pub fn integer_det(mat: &Matrix2<BigInt>) -> BigInt {
    &mat[(0, 0)] * &mat[(1, 1)] - &mat[(0, 1)] * &mat[(1, 0)]
}

/// Inverse over the rationals, `None` when singular.
pub fn rational_inverse(mat: &Matrix2<BigRational>) -> Option<Matrix2<BigRational>> {
    let det = &mat[(0, 0)] * &mat[(1, 1)] - &mat[(0, 1)] * &mat[(1, 0)];
    if det.is_zero() {
        return None;
    }
    Some(Matrix2::new(
        &mat[(1, 1)] / &det,
        -&mat[(0, 1)] / &det,
        -&mat[(1, 0)] / &det,
        &mat[(0, 0)] / &det,
    ))
}

/// Exact linear algebra on [`ExprMatrix`].
///
/// nalgebra's `determinant`/`try_inverse` need a `ComplexField`, so the 2x2
/// formulas are spelled out here.
pub trait ExactMatrix: Sized {
    fn det_exact(&self) -> Expr;
    fn inverse_exact(&self) -> Result<Self>;
    fn subs(&self, substitutions: &BTreeMap<Symbol, Expr>) -> Result<Self>;
    fn free_symbols(&self) -> BTreeSet<Symbol>;
    fn is_zero_matrix(&self) -> bool;
    fn scaled(&self, factor: &Expr) -> Self;
    fn to_rational_matrix(&self) -> Option<Matrix2<BigRational>>;
    fn to_integer_matrix(&self) -> Option<Matrix2<BigInt>>;
    fn approx(&self) -> Option<Matrix2<f64>>;

    fn is_rational(&self) -> bool {
        self.to_rational_matrix().is_some()
    }

    fn is_integer(&self) -> bool {
        self.to_integer_matrix().is_some()
    }
}

impl ExactMatrix for ExprMatrix {
    fn det_exact(&self) -> Expr {
        &self[(0, 0)] * &self[(1, 1)] - &self[(0, 1)] * &self[(1, 0)]
    }

    fn inverse_exact(&self) -> Result<Self> {
        let det = self.det_exact();
        if det.is_zero() {
            return Err(MoireError::InvalidTransform(format!(
                "matrix {} is singular",
                format_matrix(self)
            )));
        }
        let divide = |entry: Expr| {
            entry.checked_div(&det).ok_or_else(|| {
                MoireError::InternalError("nonzero determinant failed to divide".to_string())
            })
        };
        Ok(Matrix2::new(
            divide(self[(1, 1)].clone())?,
            divide(-&self[(0, 1)])?,
            divide(-&self[(1, 0)])?,
            divide(self[(0, 0)].clone())?,
        ))
    }

    fn subs(&self, substitutions: &BTreeMap<Symbol, Expr>) -> Result<Self> {
        Ok(Matrix2::new(
            self[(0, 0)].subs(substitutions)?,
            self[(0, 1)].subs(substitutions)?,
            self[(1, 0)].subs(substitutions)?,
            self[(1, 1)].subs(substitutions)?,
        ))
    }

    fn free_symbols(&self) -> BTreeSet<Symbol> {
        self.iter().flat_map(Expr::free_symbols).collect()
    }

    fn is_zero_matrix(&self) -> bool {
        self.iter().all(Expr::is_zero)
    }

    fn scaled(&self, factor: &Expr) -> Self {
        self.map(|entry| entry * factor)
    }

    fn to_rational_matrix(&self) -> Option<Matrix2<BigRational>> {
        Some(Matrix2::new(
            self[(0, 0)].to_rational()?,
            self[(0, 1)].to_rational()?,
            self[(1, 0)].to_rational()?,
            self[(1, 1)].to_rational()?,
        ))
    }

    fn to_integer_matrix(&self) -> Option<Matrix2<BigInt>> {
        Some(Matrix2::new(
            self[(0, 0)].to_integer()?,
            self[(0, 1)].to_integer()?,
            self[(1, 0)].to_integer()?,
            self[(1, 1)].to_integer()?,
        ))
    }

    fn approx(&self) -> Option<Matrix2<f64>> {
        Some(Matrix2::new(
            self[(0, 0)].to_f64()?,
            self[(0, 1)].to_f64()?,
            self[(1, 0)].to_f64()?,
            self[(1, 1)].to_f64()?,
        ))
    }
}

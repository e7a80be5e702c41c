use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, trace};
use nalgebra::Matrix2;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::config::SearchLimits;
use crate::symbolic::{
    format_matrix, from_integer_matrix, integer_det, rational_inverse, ExactMatrix, Expr,
    ExprMatrix, Symbol,
};
use crate::{MoireError, Result};

/// Two overlapping lattices `A` and `B = E·A` (rows are lattice vectors).
///
/// When `E` has no free symbols the smallest common supercell `C` is derived
/// at construction: the rows of `C·A` lie on both lattices, `C` is integral,
/// lower triangular and in Hermite normal form, and `C·E⁻¹` is integral.
/// Patterns are immutable; every transform returns a new pattern.
#[derive(Debug, Clone)]
pub struct MoirePattern {
    a: ExprMatrix,
    b: ExprMatrix,
    e: ExprMatrix,
    c: Option<Matrix2<BigInt>>,
    limits: SearchLimits,
}

impl MoirePattern {
    // ==================== Construction ====================

    /// Builds a pattern from both cells and the transform between them.
    ///
    /// `E·A == B` must hold identically. A supplied `c` is kept as is (after an
    /// integrality check when `E` is concrete); otherwise `C` is derived as
    /// soon as `E` is free of symbols.
    pub fn from_abe(
        a: ExprMatrix,
        b: ExprMatrix,
        e: ExprMatrix,
        c: Option<Matrix2<BigInt>>,
    ) -> Result<Self> {
        Self::from_abe_with_limits(a, b, e, c, SearchLimits::default())
    }

    pub fn from_abe_with_limits(
        a: ExprMatrix,
        b: ExprMatrix,
        e: ExprMatrix,
        c: Option<Matrix2<BigInt>>,
        limits: SearchLimits,
    ) -> Result<Self> {
        let ea = &e * &a;
        if !(&ea - &b).is_zero_matrix() {
            return Err(MoireError::InvariantViolation(format!(
                "E·A = {} differs from B = {}",
                format_matrix(&ea),
                format_matrix(&b)
            )));
        }

        let c = match c {
            Some(c) => {
                check_supplied_c(&e, &c)?;
                Some(c)
            }
            None if e.free_symbols().is_empty() => {
                let e_rational = e.to_rational_matrix().ok_or_else(|| {
                    MoireError::InvalidTransform(format!(
                        "E = {} has irrational entries, the lattices share no supercell",
                        format_matrix(&e)
                    ))
                })?;
                let c = bruteforce_c(&e_rational, &limits)?;
                debug!(
                    "derived supercell C = {} (volume {})",
                    format_matrix(&c),
                    integer_det(&c)
                );
                Some(c)
            }
            None => None,
        };

        Ok(Self { a, b, e, c, limits })
    }

    /// `E = B·A⁻¹`; a singular `A` is an `InvalidTransform`.
    pub fn from_cells(a: ExprMatrix, b: ExprMatrix) -> Result<Self> {
        Self::from_cells_with_limits(a, b, SearchLimits::default())
    }

    pub fn from_cells_with_limits(a: ExprMatrix, b: ExprMatrix, limits: SearchLimits) -> Result<Self> {
        let e = &b * &a.inverse_exact()?;
        Self::from_abe_with_limits(a, b, e, None, limits)
    }

    pub fn from_opers(opers: Opers) -> Result<Self> {
        opers.build()
    }

    /// Same cells, re-derived under different search caps.
    pub fn with_limits(&self, limits: SearchLimits) -> Result<Self> {
        Self::from_abe_with_limits(self.a.clone(), self.b.clone(), self.e.clone(), None, limits)
    }

    // ==================== Accessors ====================

    pub fn a_matrix(&self) -> &ExprMatrix {
        &self.a
    }

    pub fn b_matrix(&self) -> &ExprMatrix {
        &self.b
    }

    pub fn e_matrix(&self) -> &ExprMatrix {
        &self.e
    }

    pub fn cells(&self) -> (&ExprMatrix, &ExprMatrix) {
        (&self.a, &self.b)
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = self.a.free_symbols();
        symbols.extend(self.b.free_symbols());
        symbols.extend(self.e.free_symbols());
        symbols
    }

    /// True once `C` is known.
    pub fn is_fully_determined(&self) -> bool {
        self.c.is_some()
    }

    fn checked_c(&self) -> Result<&Matrix2<BigInt>> {
        self.c.as_ref().ok_or_else(|| {
            let names: Vec<String> = self.e.free_symbols().iter().map(Symbol::to_string).collect();
            MoireError::NotYetDetermined(format!(
                "E = {} still depends on {{{}}}",
                format_matrix(&self.e),
                names.join(", ")
            ))
        })
    }

    // ==================== Derived matrices ====================

    /// Supercell in Hermite normal form: `C·A` lies on both lattices.
    pub fn c_matrix(&self) -> Result<Matrix2<BigInt>> {
        self.checked_c().cloned()
    }

    pub fn c_matrix_hnf(&self) -> Result<Matrix2<BigInt>> {
        self.c_matrix()
    }

    /// Cartesian transform `M` with `B = A·Mᵀ`.
    pub fn m_matrix(&self) -> Result<ExprMatrix> {
        Ok((&self.a.inverse_exact()? * &self.b).transpose())
    }

    /// `E⁻¹·C`.
    pub fn d_matrix(&self) -> Result<ExprMatrix> {
        let c = from_integer_matrix(self.checked_c()?);
        Ok(&self.e.inverse_exact()? * &c)
    }

    /// The Hermite normal form supercell seen from `B`, i.e. the `C` of
    /// [`swap_cells`](Self::swap_cells). It agrees with
    /// [`d_matrix`](Self::d_matrix) only up to a unimodular transform.
    pub fn d_matrix_hnf(&self) -> Result<Matrix2<BigInt>> {
        self.swap_cells()?.c_matrix()
    }

    /// `C·A`
    pub fn commensurate_cell(&self) -> Result<ExprMatrix> {
        Ok(&from_integer_matrix(self.checked_c()?) * &self.a)
    }

    /// `det(C)`, the supercell area in units of the `A` cell.
    pub fn relative_supercell_volume(&self) -> Result<BigInt> {
        Ok(integer_det(self.checked_c()?))
    }

    /// Whether `mat·A` spans the same lattice as `C·A`.
    ///
    /// `mat` must be integral; a singular `mat` is simply not a supercell.
    pub fn is_valid_primitive_supercell(&self, mat: &ExprMatrix) -> Result<bool> {
        let c = self.checked_c()?;
        let mat = mat.to_integer_matrix().ok_or_else(|| {
            MoireError::InvalidTransform(format!(
                "supercell candidate {} is not integral",
                format_matrix(mat)
            ))
        })?;
        let Some(mat_inv) = rational_inverse(&mat.map(BigRational::from_integer)) else {
            return Ok(false);
        };
        let prod = &c.map(BigRational::from_integer) * &mat_inv;
        if !prod.iter().all(|entry| entry.is_integer()) {
            return Ok(false);
        }
        let det = &prod[(0, 0)] * &prod[(1, 1)] - &prod[(0, 1)] * &prod[(1, 0)];
        Ok(det.abs().is_one())
    }

    // ==================== Transforms ====================

    /// Exchanges the roles of the two lattices; `E` becomes `E⁻¹`.
    pub fn swap_cells(&self) -> Result<Self> {
        Self::from_abe_with_limits(
            self.b.clone(),
            self.a.clone(),
            self.e.inverse_exact()?,
            None,
            self.limits,
        )
    }

    /// Re-expresses both cells in other bases: `A' = qa·A`, `B' = qb·B`,
    /// `E' = qb·E·qa⁻¹`. `None` stands for the identity.
    pub fn visit_family(&self, qa: Option<&ExprMatrix>, qb: Option<&ExprMatrix>) -> Result<Self> {
        let identity = ExprMatrix::identity();
        let qa = qa.unwrap_or(&identity);
        let qb = qb.unwrap_or(&identity);
        let e = &(qb * &self.e) * &qa.inverse_exact()?;
        Self::from_abe_with_limits(qa * &self.a, qb * &self.b, e, None, self.limits)
    }

    /// [`visit_family`](Self::visit_family) with the same basis change on both sides.
    pub fn visit_family_same(&self, q: &ExprMatrix) -> Result<Self> {
        self.visit_family(Some(q), Some(q))
    }

    /// Substitutes symbols in `A`, `B` and `E` and rebuilds the pattern.
    pub fn subs<I, S, V>(&self, substitutions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<Symbol>,
        V: Into<Expr>,
    {
        let substitutions: BTreeMap<Symbol, Expr> = substitutions
            .into_iter()
            .map(|(symbol, value)| (symbol.into(), value.into()))
            .collect();
        Self::from_abe_with_limits(
            self.a.subs(&substitutions)?,
            self.b.subs(&substitutions)?,
            self.e.subs(&substitutions)?,
            self.c.clone(),
            self.limits,
        )
    }

    // ==================== Floating views ====================

    pub fn approx_cells(&self) -> Result<(Matrix2<f64>, Matrix2<f64>)> {
        self.a
            .approx()
            .zip(self.b.approx())
            .ok_or_else(|| MoireError::NotYetDetermined("cells still contain free symbols".to_string()))
    }

    pub fn approx_commensurate_cell(&self) -> Result<Matrix2<f64>> {
        self.commensurate_cell()?.approx().ok_or_else(|| {
            MoireError::NotYetDetermined("commensurate cell contains free symbols".to_string())
        })
    }
}

impl fmt::Display for MoirePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MoirePattern::from_abe(")?;
        writeln!(f, "    a = {},", format_matrix(&self.a))?;
        writeln!(f, "    b = {},", format_matrix(&self.b))?;
        writeln!(f, "    e = {},", format_matrix(&self.e))?;
        write!(f, ")")
    }
}

fn check_supplied_c(e: &ExprMatrix, c: &Matrix2<BigInt>) -> Result<()> {
    let Some(e_rational) = e.to_rational_matrix() else {
        return Ok(());
    };
    let e_inv = rational_inverse(&e_rational).ok_or_else(|| {
        MoireError::InvalidTransform(format!("E = {} is singular", format_matrix(e)))
    })?;
    let prod = &c.map(BigRational::from_integer) * &e_inv;
    if prod.iter().all(|entry| entry.is_integer()) {
        Ok(())
    } else {
        Err(MoireError::InvariantViolation(format!(
            "C·E⁻¹ = {} is not integral",
            format_matrix(&prod)
        )))
    }
}

/// Smallest common supercell in lower-triangular Hermite normal form.
///
/// A row `[c₀, c₁]` is admissible when `[c₀, c₁]·E⁻¹` is integral. The first
/// row is `[c₀₀, 0]` with `c₀₀` the lcm of the first-row denominators of
/// `E⁻¹`; the second row is the first admissible `[c₁₀, c₁₁]` with `c₁₁`
/// ascending and `0 <= c₁₀ < c₀₀`. `c₁₁` never exceeds the lcm of all
/// denominators of `E⁻¹`.
pub(crate) fn bruteforce_c(e: &Matrix2<BigRational>, limits: &SearchLimits) -> Result<Matrix2<BigInt>> {
    let e_inv = rational_inverse(e)
        .ok_or_else(|| MoireError::InvalidTransform(format!("E = {} is singular", format_matrix(e))))?;
    let row_is_integral = |c0: &BigInt, c1: &BigInt| {
        (0..2).all(|col| {
            let entry = BigRational::from_integer(c0.clone()) * &e_inv[(0, col)]
                + BigRational::from_integer(c1.clone()) * &e_inv[(1, col)];
            entry.is_integer()
        })
    };

    let c00 = e_inv[(0, 0)].denom().lcm(e_inv[(0, 1)].denom());
    if !row_is_integral(&c00, &BigInt::zero()) {
        return Err(MoireError::InternalError(format!(
            "first HNF row [{}, 0] is not admissible for E⁻¹ = {}",
            c00,
            format_matrix(&e_inv)
        )));
    }

    let bound = e_inv
        .iter()
        .fold(BigInt::one(), |acc, entry| acc.lcm(entry.denom()));
    let last = bound.min(BigInt::from(limits.max_hnf_c11));

    let mut c11 = BigInt::one();
    while c11 <= last {
        let mut c10 = BigInt::zero();
        while c10 < c00 {
            if row_is_integral(&c10, &c11) {
                return Ok(Matrix2::new(c00, BigInt::zero(), c10, c11));
            }
            c10 += 1u32;
        }
        trace!("no admissible HNF row with c11 = {}", c11);
        c11 += 1u32;
    }

    Err(MoireError::InternalError(format!(
        "HNF search for E = {} exhausted c11 <= {}",
        format_matrix(e),
        last
    )))
}

/// Builder for [`MoirePattern::from_opers`]: `B = scale·rows·A₂·cartᵀ`.
///
/// The second cell defaults to the first, `scale` to 1 and `rows`/`cart` to the identity.
#[derive(Debug, Clone)]
pub struct Opers {
    first: ExprMatrix,
    second: Option<ExprMatrix>,
    scale: Expr,
    rows: ExprMatrix,
    cart: ExprMatrix,
    limits: SearchLimits,
}

impl Opers {
    pub fn new(cell: ExprMatrix) -> Self {
        Self {
            first: cell,
            second: None,
            scale: Expr::one(),
            rows: ExprMatrix::identity(),
            cart: ExprMatrix::identity(),
            limits: SearchLimits::default(),
        }
    }

    pub fn with_second_cell(mut self, cell: ExprMatrix) -> Self {
        self.second = Some(cell);
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Expr>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Integer-like row operation applied in lattice coordinates.
    pub fn with_rows(mut self, rows: ExprMatrix) -> Self {
        self.rows = rows;
        self
    }

    /// Cartesian transform acting on every lattice vector.
    pub fn with_cart(mut self, cart: ExprMatrix) -> Self {
        self.cart = cart;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Result<MoirePattern> {
        let second = self.second.unwrap_or_else(|| self.first.clone());
        let b = (&(&self.rows * &second) * &self.cart.transpose()).scaled(&self.scale);
        MoirePattern::from_cells_with_limits(self.first, b, self.limits)
    }
}

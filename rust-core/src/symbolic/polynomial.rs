use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::expr::Expr;
use super::number::{rational_to_f64, smallest_prime_factor};
use super::symbol::Symbol;

pub(crate) type Powers = BTreeMap<Symbol, u32>;

/// Product `√surd · Π symbolᵉ · Π √radicand`.
///
/// `surd` is a squarefree positive integer, exponents are positive and each
/// radicand is a primitive polynomial with free symbols that appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Monomial {
    surd: BigInt,
    powers: Powers,
    radicals: BTreeSet<Poly>,
}

impl Monomial {
    fn unit() -> Self {
        Self {
            surd: BigInt::one(),
            powers: Powers::new(),
            radicals: BTreeSet::new(),
        }
    }

    fn from_powers(powers: Powers) -> Self {
        Self {
            powers,
            ..Self::unit()
        }
    }

    fn is_unit(&self) -> bool {
        self.surd.is_one() && self.powers.is_empty() && self.radicals.is_empty()
    }

    fn is_symbolic_only(&self) -> bool {
        self.surd.is_one() && self.radicals.is_empty()
    }
}

/// Sparse polynomial with rational coefficients. Never stores a zero coefficient.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub(crate) fn zero() -> Self {
        Self::default()
    }

    pub(crate) fn one() -> Self {
        Self::constant(BigRational::one())
    }

    pub(crate) fn constant(value: BigRational) -> Self {
        Self::term(Monomial::unit(), value)
    }

    pub(crate) fn symbol(symbol: Symbol) -> Self {
        let mut powers = Powers::new();
        powers.insert(symbol, 1);
        Self::term(Monomial::from_powers(powers), BigRational::one())
    }

    /// `coeff·√core` for a squarefree positive `core`.
    pub(crate) fn surd(core: BigInt, coeff: BigRational) -> Self {
        let monomial = Monomial {
            surd: core,
            ..Monomial::unit()
        };
        Self::term(monomial, coeff)
    }

    /// `√radicand` as an opaque atom; the radicand must be primitive and non-constant.
    pub(crate) fn radical(radicand: Poly) -> Self {
        let mut radicals = BTreeSet::new();
        radicals.insert(radicand);
        let monomial = Monomial {
            radicals,
            ..Monomial::unit()
        };
        Self::term(monomial, BigRational::one())
    }

    fn term(monomial: Monomial, coeff: BigRational) -> Self {
        let mut poly = Self::zero();
        poly.add_term(monomial, coeff);
        poly
    }

    fn add_term(&mut self, monomial: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(monomial) {
            Entry::Vacant(slot) => {
                slot.insert(coeff);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coeff;
                if slot.get().is_zero() {
                    slot.remove();
                }
            }
        }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// The value of a constant polynomial.
    pub(crate) fn constant_value(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(monomial, _)| monomial.is_unit())
                .map(|(_, coeff)| coeff.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_radical_free(&self) -> bool {
        self.terms.keys().all(Monomial::is_symbolic_only)
    }

    pub(crate) fn collect_free_symbols(&self, out: &mut BTreeSet<Symbol>) {
        for monomial in self.terms.keys() {
            out.extend(monomial.powers.keys().cloned());
            for radicand in &monomial.radicals {
                radicand.collect_free_symbols(out);
            }
        }
    }

    // ==================== Ring operations ====================

    pub(crate) fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (monomial, coeff) in &other.terms {
            out.add_term(monomial.clone(), coeff.clone());
        }
        out
    }

    pub(crate) fn neg(&self) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(monomial, coeff)| (monomial.clone(), -coeff))
                .collect(),
        }
    }

    pub(crate) fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.neg())
    }

    pub(crate) fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(monomial, coeff)| (monomial.clone(), coeff * factor))
                .collect(),
        }
    }

    pub(crate) fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (left, left_coeff) in &self.terms {
            for (right, right_coeff) in &other.terms {
                let coeff = left_coeff * right_coeff;
                for (monomial, c) in Self::mul_monomials(left, right).terms {
                    out.add_term(monomial, c * &coeff);
                }
            }
        }
        out
    }

    // √d₁·√d₂ = g·√(d₁d₂/g²) and (√P)² = P
    fn mul_monomials(left: &Monomial, right: &Monomial) -> Poly {
        let g = left.surd.gcd(&right.surd);
        let surd = (&left.surd * &right.surd) / (&g * &g);

        let mut powers = left.powers.clone();
        for (symbol, exp) in &right.powers {
            *powers.entry(symbol.clone()).or_insert(0) += exp;
        }

        let radicals: BTreeSet<Poly> = left
            .radicals
            .symmetric_difference(&right.radicals)
            .cloned()
            .collect();

        let mut out = Poly::term(
            Monomial {
                surd,
                powers,
                radicals,
            },
            BigRational::from_integer(g),
        );
        for squared in left.radicals.intersection(&right.radicals) {
            out = out.mul(squared);
        }
        out
    }

    // ==================== Substitution and evaluation ====================

    pub(crate) fn subs(&self, substitutions: &BTreeMap<Symbol, Expr>) -> Expr {
        let mut total = Expr::zero();
        for (monomial, coeff) in &self.terms {
            let mut value = Expr::from(coeff.clone());
            if !monomial.surd.is_one() {
                value = value * Expr::from_poly(Poly::surd(monomial.surd.clone(), BigRational::one()));
            }
            for (symbol, exp) in &monomial.powers {
                let base = substitutions
                    .get(symbol)
                    .cloned()
                    .unwrap_or_else(|| Expr::from(symbol.clone()));
                value = value * base.pow(*exp);
            }
            for radicand in &monomial.radicals {
                value = value * radicand.subs(substitutions).sqrt();
            }
            total = total + value;
        }
        total
    }

    pub(crate) fn to_f64(&self) -> Option<f64> {
        let mut total = 0.0;
        for (monomial, coeff) in &self.terms {
            if !monomial.powers.is_empty() {
                return None;
            }
            let mut value = rational_to_f64(coeff)? * monomial.surd.to_f64()?.sqrt();
            for radicand in &monomial.radicals {
                let inner = radicand.to_f64()?;
                if inner < 0.0 {
                    return None;
                }
                value *= inner.sqrt();
            }
            total += value;
        }
        Some(total)
    }

    // ==================== Rationalization helpers ====================

    pub(crate) fn find_radical(&self) -> Option<Poly> {
        self.terms
            .keys()
            .find_map(|monomial| monomial.radicals.iter().next().cloned())
    }

    /// Image under `√r → -√r`.
    pub(crate) fn conjugate_radical(&self, radicand: &Poly) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(monomial, coeff)| {
                    let coeff = if monomial.radicals.contains(radicand) {
                        -coeff
                    } else {
                        coeff.clone()
                    };
                    (monomial.clone(), coeff)
                })
                .collect(),
        }
    }

    pub(crate) fn find_surd_prime(&self) -> Option<BigInt> {
        self.terms
            .keys()
            .find(|monomial| !monomial.surd.is_one())
            .and_then(|monomial| smallest_prime_factor(&monomial.surd))
    }

    /// Image under `√p → -√p`.
    pub(crate) fn conjugate_surd_prime(&self, prime: &BigInt) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(monomial, coeff)| {
                    let coeff = if (&monomial.surd % prime).is_zero() {
                        -coeff
                    } else {
                        coeff.clone()
                    };
                    (monomial.clone(), coeff)
                })
                .collect(),
        }
    }

    // ==================== Cancellation helpers ====================

    /// Largest power product dividing every term.
    pub(crate) fn common_powers(&self) -> Powers {
        let mut monomials = self.terms.keys();
        let Some(first) = monomials.next() else {
            return Powers::new();
        };
        let mut common = first.powers.clone();
        for monomial in monomials {
            common = common
                .into_iter()
                .filter_map(|(symbol, exp)| {
                    monomial
                        .powers
                        .get(&symbol)
                        .map(|&other| (symbol, exp.min(other)))
                })
                .collect();
        }
        common
    }

    pub(crate) fn divide_powers(&self, divisor: &Powers) -> Poly {
        let mut out = Poly::zero();
        for (monomial, coeff) in &self.terms {
            let powers = divide_power_maps(&monomial.powers, divisor).unwrap_or_else(|| monomial.powers.clone());
            out.add_term(
                Monomial {
                    surd: monomial.surd.clone(),
                    powers,
                    radicals: monomial.radicals.clone(),
                },
                coeff.clone(),
            );
        }
        out
    }

    /// Positive rational `c` such that `self / c` has coprime integer coefficients.
    pub(crate) fn content(&self) -> BigRational {
        let mut numer = BigInt::zero();
        let mut denom = BigInt::one();
        for coeff in self.terms.values() {
            numer = numer.gcd(coeff.numer());
            denom = denom.lcm(coeff.denom());
        }
        if numer.is_zero() {
            return BigRational::one();
        }
        BigRational::new(numer, denom)
    }

    /// Leading term under lexicographic order on exponents.
    pub(crate) fn leading_term(&self) -> Option<(Powers, BigRational)> {
        self.terms
            .iter()
            .max_by(|(left, _), (right, _)| lex_cmp(&left.powers, &right.powers))
            .map(|(monomial, coeff)| (monomial.powers.clone(), coeff.clone()))
    }

    /// Exact quotient by a radical-free divisor, `None` when it does not divide.
    ///
    /// Terms are grouped by their radical part, each group is a polynomial in the
    /// free symbols only and is divided on its own.
    pub(crate) fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        if divisor.is_zero() || !divisor.is_radical_free() {
            return None;
        }
        let mut groups: BTreeMap<(BigInt, BTreeSet<Poly>), Poly> = BTreeMap::new();
        for (monomial, coeff) in &self.terms {
            groups
                .entry((monomial.surd.clone(), monomial.radicals.clone()))
                .or_default()
                .add_term(Monomial::from_powers(monomial.powers.clone()), coeff.clone());
        }

        let mut quotient = Poly::zero();
        for ((surd, radicals), group) in groups {
            for (monomial, coeff) in group.div_symbolic(divisor)?.terms {
                quotient.add_term(
                    Monomial {
                        surd: surd.clone(),
                        powers: monomial.powers,
                        radicals: radicals.clone(),
                    },
                    coeff,
                );
            }
        }
        Some(quotient)
    }

    fn div_symbolic(&self, divisor: &Poly) -> Option<Poly> {
        let (lead_powers, lead_coeff) = divisor.leading_term()?;
        let mut rest = self.clone();
        let mut quotient = Poly::zero();
        while let Some((powers, coeff)) = rest.leading_term() {
            let powers = divide_power_maps(&powers, &lead_powers)?;
            let step = Poly::term(Monomial::from_powers(powers), coeff / &lead_coeff);
            rest = rest.sub(&step.mul(divisor));
            quotient = quotient.add(&step);
        }
        Some(quotient)
    }
}

fn divide_power_maps(powers: &Powers, divisor: &Powers) -> Option<Powers> {
    let mut out = powers.clone();
    for (symbol, exp) in divisor {
        let current = out.get(symbol).copied().unwrap_or(0);
        if current < *exp {
            return None;
        }
        if current == *exp {
            out.remove(symbol);
        } else {
            out.insert(symbol.clone(), current - exp);
        }
    }
    Some(out)
}

/// Elementwise minimum of two power products.
pub(crate) fn meet_powers(left: &Powers, right: &Powers) -> Powers {
    left.iter()
        .filter_map(|(symbol, exp)| right.get(symbol).map(|other| (symbol.clone(), (*exp).min(*other))))
        .collect()
}

// Lexicographic monomial order, the smallest symbol being the most significant.
fn lex_cmp(left: &Powers, right: &Powers) -> Ordering {
    let symbols: BTreeSet<&Symbol> = left.keys().chain(right.keys()).collect();
    for symbol in symbols {
        let l = left.get(symbol).copied().unwrap_or(0);
        let r = right.get(symbol).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factors = Vec::new();
        if !self.surd.is_one() {
            factors.push(format!("sqrt({})", self.surd));
        }
        for (symbol, exp) in &self.powers {
            if *exp == 1 {
                factors.push(symbol.to_string());
            } else {
                factors.push(format!("{}^{}", symbol, exp));
            }
        }
        for radicand in &self.radicals {
            factors.push(format!("sqrt({})", radicand));
        }
        if factors.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", factors.join("*"))
        }
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (index, (monomial, coeff)) in self.terms.iter().enumerate() {
            let negative = coeff.is_negative();
            if index == 0 {
                if negative {
                    write!(f, "-")?;
                }
            } else {
                write!(f, "{}", if negative { " - " } else { " + " })?;
            }
            let magnitude = coeff.abs();
            if monomial.is_unit() {
                write!(f, "{}", magnitude)?;
            } else if magnitude.is_one() {
                write!(f, "{}", monomial)?;
            } else if magnitude.is_integer() {
                write!(f, "{}*{}", magnitude, monomial)?;
            } else {
                write!(f, "({})*{}", magnitude, monomial)?;
            }
        }
        Ok(())
    }
}

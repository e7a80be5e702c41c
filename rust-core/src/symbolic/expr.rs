use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::number::square_decomposition;
use super::polynomial::{meet_powers, Poly};
use super::symbol::Symbol;
use crate::{MoireError, Result};

/// Exact scalar: a quotient of polynomials in free symbols, numeric square
/// roots and symbolic square roots.
///
/// Values are kept in a normal form: the denominator is free of radicals and
/// monic, constant denominators are folded into the numerator, and products of
/// radicals are reduced (`√2·√6 = 2√3`, `√P·√P = P`). Zero testing therefore
/// amounts to checking the numerator, and `==` is mathematical equality.
#[derive(Clone)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    // ==================== Constructors ====================

    pub fn zero() -> Self {
        Self {
            num: Poly::zero(),
            den: Poly::one(),
        }
    }

    pub fn one() -> Self {
        Self::from_poly(Poly::one())
    }

    pub fn integer(value: i64) -> Self {
        Self::from_rational(BigRational::from_integer(BigInt::from(value)))
    }

    /// `numer / denom`.
    ///
    /// # Panics
    /// When `denom` is zero, like [`BigRational::new`].
    pub fn rational(numer: i64, denom: i64) -> Self {
        Self::from_rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn from_rational(value: BigRational) -> Self {
        Self::from_poly(Poly::constant(value))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::from(Symbol::new(name))
    }

    pub(crate) fn from_poly(num: Poly) -> Self {
        Self {
            num,
            den: Poly::one(),
        }
    }

    /// Brings `num / den` into normal form. `den` must be nonzero.
    fn from_parts(mut num: Poly, mut den: Poly) -> Self {
        if num.is_zero() {
            return Self::zero();
        }

        // Multiply by conjugates until no radical is left below the line.
        loop {
            let conjugate = if let Some(radicand) = den.find_radical() {
                den.conjugate_radical(&radicand)
            } else if let Some(prime) = den.find_surd_prime() {
                den.conjugate_surd_prime(&prime)
            } else {
                break;
            };
            num = num.mul(&conjugate);
            den = den.mul(&conjugate);
        }

        let common = meet_powers(&num.common_powers(), &den.common_powers());
        if !common.is_empty() {
            num = num.divide_powers(&common);
            den = den.divide_powers(&common);
        }

        if let Some(value) = den.constant_value() {
            return Self::from_poly(num.scale(&value.recip()));
        }
        if let Some(quotient) = num.div_exact(&den) {
            return Self::from_poly(quotient);
        }
        if num.is_radical_free() {
            if let Some(quotient) = den.div_exact(&num) {
                num = Poly::one();
                den = quotient;
                if let Some(value) = den.constant_value() {
                    return Self::from_poly(num.scale(&value.recip()));
                }
            }
        }

        match den.leading_term() {
            Some((_, lead)) if !lead.is_one() => {
                let factor = lead.recip();
                Self {
                    num: num.scale(&factor),
                    den: den.scale(&factor),
                }
            }
            _ => Self { num, den },
        }
    }

    // ==================== Arithmetic ====================

    fn add_ref(&self, other: &Expr) -> Expr {
        if self.den == other.den {
            Self::from_parts(self.num.add(&other.num), self.den.clone())
        } else {
            Self::from_parts(
                self.num.mul(&other.den).add(&other.num.mul(&self.den)),
                self.den.mul(&other.den),
            )
        }
    }

    fn sub_ref(&self, other: &Expr) -> Expr {
        self.add_ref(&other.neg_ref())
    }

    fn mul_ref(&self, other: &Expr) -> Expr {
        Self::from_parts(self.num.mul(&other.num), self.den.mul(&other.den))
    }

    fn neg_ref(&self) -> Expr {
        Self {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    /// Quotient, `None` when `other` is zero.
    pub fn checked_div(&self, other: &Expr) -> Option<Expr> {
        if other.is_zero() {
            return None;
        }
        Some(Self::from_parts(
            self.num.mul(&other.den),
            self.den.mul(&other.num),
        ))
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn recip(&self) -> Option<Expr> {
        Expr::one().checked_div(self)
    }

    pub fn pow(&self, exp: u32) -> Expr {
        let mut out = Expr::one();
        for _ in 0..exp {
            out = out.mul_ref(self);
        }
        out
    }

    /// Principal square root.
    ///
    /// Rational arguments reduce to `s·√d` with `d` squarefree, negative ones
    /// pick up the atom `√-1`. Anything else becomes `√content · √P` with `P`
    /// primitive.
    pub fn sqrt(&self) -> Expr {
        if let Some(value) = self.to_rational() {
            return Self::sqrt_rational(&value);
        }
        // √(n/d) = √(n·d)/d
        let radicand = self.num.mul(&self.den);
        Self::from_parts(Self::sqrt_poly(&radicand), self.den.clone())
    }

    fn sqrt_rational(value: &BigRational) -> Expr {
        if value.is_zero() {
            return Expr::zero();
        }
        let (square, core) = square_decomposition(&(value.numer() * value.denom()));
        let coeff = BigRational::new(square, value.denom().clone());
        let mut root = Poly::surd(core, coeff);
        if value.is_negative() {
            root = root.mul(&Poly::radical(Poly::constant(-BigRational::one())));
        }
        Self::from_poly(root)
    }

    fn sqrt_poly(radicand: &Poly) -> Poly {
        if let Some(value) = radicand.constant_value() {
            return Self::sqrt_rational(&value).num;
        }
        let content = radicand.content();
        let primitive = radicand.scale(&content.recip());
        Self::sqrt_rational(&content).num.mul(&Poly::radical(primitive))
    }

    // ==================== Symbols ====================

    /// Replaces symbols simultaneously.
    ///
    /// Fails with `InvalidTransform` when the substitution sends the
    /// denominator to zero.
    pub fn subs(&self, substitutions: &BTreeMap<Symbol, Expr>) -> Result<Expr> {
        let num = self.num.subs(substitutions);
        let den = self.den.subs(substitutions);
        num.checked_div(&den).ok_or_else(|| {
            MoireError::InvalidTransform(format!(
                "substitution makes the denominator of {} vanish",
                self
            ))
        })
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.num.collect_free_symbols(&mut out);
        self.den.collect_free_symbols(&mut out);
        out
    }

    pub fn has_free_symbols(&self) -> bool {
        !self.free_symbols().is_empty()
    }

    // ==================== Conversions ====================

    pub fn to_rational(&self) -> Option<BigRational> {
        let den = self.den.constant_value()?;
        Some(self.num.constant_value()? / den)
    }

    pub fn is_rational(&self) -> bool {
        self.to_rational().is_some()
    }

    pub fn to_integer(&self) -> Option<BigInt> {
        self.to_rational()
            .filter(|value| value.is_integer())
            .map(|value| value.to_integer())
    }

    pub fn is_integer(&self) -> bool {
        self.to_integer().is_some()
    }

    /// Floating approximation, `None` with free symbols or an imaginary part.
    pub fn to_f64(&self) -> Option<f64> {
        Some(self.num.to_f64()? / self.den.to_f64()?)
    }
}

// ==================== Operator traits ====================

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $inner:ident) => {
        impl $imp<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                self.$inner(&rhs)
            }
        }

        impl<'a> $imp<&'a Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &'a Expr) -> Expr {
                self.$inner(rhs)
            }
        }

        impl<'a> $imp<Expr> for &'a Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                self.$inner(&rhs)
            }
        }

        impl<'a, 'b> $imp<&'b Expr> for &'a Expr {
            type Output = Expr;
            fn $method(self, rhs: &'b Expr) -> Expr {
                self.$inner(rhs)
            }
        }
    };
}

macro_rules! forward_assign {
    ($imp:ident, $method:ident, $inner:ident) => {
        impl $imp<Expr> for Expr {
            fn $method(&mut self, rhs: Expr) {
                *self = self.$inner(&rhs);
            }
        }

        impl<'a> $imp<&'a Expr> for Expr {
            fn $method(&mut self, rhs: &'a Expr) {
                *self = self.$inner(rhs);
            }
        }
    };
}

impl Expr {
    // Panics on zero divisors, matching the primitive number types.
    fn div_ref(&self, other: &Expr) -> Expr {
        match self.checked_div(other) {
            Some(quotient) => quotient,
            None => panic!("division of {} by zero", self),
        }
    }
}

forward_binop!(Add, add, add_ref);
forward_binop!(Sub, sub, sub_ref);
forward_binop!(Mul, mul, mul_ref);
forward_binop!(Div, div, div_ref);
forward_assign!(AddAssign, add_assign, add_ref);
forward_assign!(SubAssign, sub_assign, sub_ref);
forward_assign!(MulAssign, mul_assign, mul_ref);
forward_assign!(DivAssign, div_assign, div_ref);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.neg_ref()
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.neg_ref()
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::zero()
    }

    fn is_zero(&self) -> bool {
        Expr::is_zero(self)
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::one()
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.sub_ref(other).is_zero()
    }
}

// ==================== Conversions from numbers and symbols ====================

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::integer(i64::from(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

impl From<BigInt> for Expr {
    fn from(value: BigInt) -> Self {
        Expr::from_rational(BigRational::from_integer(value))
    }
}

impl From<&BigInt> for Expr {
    fn from(value: &BigInt) -> Self {
        Expr::from(value.clone())
    }
}

impl From<BigRational> for Expr {
    fn from(value: BigRational) -> Self {
        Expr::from_rational(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::from_poly(Poly::symbol(symbol))
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

// ==================== Formatting and parsing ====================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.constant_value().is_some_and(|value| value.is_one()) {
            return write!(f, "{}", self.num);
        }
        let wrap = |poly: &Poly| {
            if poly.term_count() > 1 {
                format!("({})", poly)
            } else {
                poly.to_string()
            }
        };
        write!(f, "{}/{}", wrap(&self.num), wrap(&self.den))
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self)
    }
}

impl FromStr for Expr {
    type Err = MoireError;

    /// Accepts integers, `p/q`, decimals and identifiers, with an optional
    /// leading minus sign.
    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('-') {
            return Ok(-rest.parse::<Expr>()?);
        }
        if text.is_empty() {
            return Err(MoireError::Parse("empty scalar".to_string()));
        }

        if let Some((numer, denom)) = text.split_once('/') {
            let numer = parse_integer(numer)?;
            let denom = parse_integer(denom)?;
            if denom.is_zero() {
                return Err(MoireError::Parse(format!("zero denominator in {:?}", text)));
            }
            return Ok(Expr::from_rational(BigRational::new(numer, denom)));
        }

        if let Some((whole, frac)) = text.split_once('.') {
            if !frac.chars().all(|c| c.is_ascii_digit()) || frac.is_empty() {
                return Err(MoireError::Parse(format!("malformed decimal {:?}", text)));
            }
            let whole = if whole.is_empty() { "0" } else { whole };
            let digits = parse_integer(&format!("{}{}", whole, frac))?;
            let scale = BigInt::from(10u32).pow(frac.len() as u32);
            return Ok(Expr::from_rational(BigRational::new(digits, scale)));
        }

        if text.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Expr::from(parse_integer(text)?));
        }

        let mut chars = text.chars();
        let starts_well = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');
        if starts_well && chars.all(|c| c.is_alphanumeric() || c == '_') {
            return Ok(Expr::symbol(text));
        }

        Err(MoireError::Parse(format!("cannot read {:?} as a scalar", text)))
    }
}

fn parse_integer(text: &str) -> Result<BigInt> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(MoireError::Parse(format!("expected digits, got {:?}", text)));
    }
    text.parse::<BigInt>()
        .map_err(|err| MoireError::Parse(format!("{:?}: {}", text, err)))
}

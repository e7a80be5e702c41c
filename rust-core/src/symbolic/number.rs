use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Splits `|n|` into `(s, d)` with `|n| = s²·d` and `d` squarefree.
///
/// Zero maps to `(0, 1)`. Trial division only; the integers met here are small.
pub fn square_decomposition(n: &BigInt) -> (BigInt, BigInt) {
    let mut rest = n.abs();
    if rest.is_zero() {
        return (BigInt::zero(), BigInt::one());
    }
    let mut square = BigInt::one();
    let mut core = BigInt::one();
    let mut p = BigInt::from(2u32);
    while &p * &p <= rest {
        let mut count = 0u32;
        while (&rest % &p).is_zero() {
            rest /= &p;
            count += 1;
        }
        if count > 0 {
            square *= p.pow(count / 2);
            if count % 2 == 1 {
                core *= &p;
            }
        }
        p += 1u32;
    }
    core *= rest;
    (square, core)
}

/// Squarefree part of `|n|`.
pub fn squarefree_core(n: &BigInt) -> BigInt {
    square_decomposition(n).1
}

/// True when no square other than 1 divides `n`. Zero is not squarefree.
pub fn is_squarefree(n: &BigInt) -> bool {
    !n.is_zero() && square_decomposition(n).0.is_one()
}

/// Smallest prime factor of `|n|`, `None` for `|n| <= 1`.
pub fn smallest_prime_factor(n: &BigInt) -> Option<BigInt> {
    let n = n.abs();
    if n <= BigInt::one() {
        return None;
    }
    let mut p = BigInt::from(2u32);
    while &p * &p <= n {
        if (&n % &p).is_zero() {
            return Some(p);
        }
        p += 1u32;
    }
    Some(n)
}

/// gcd of all entries, zero for an empty or all-zero slice.
pub fn gcd_all(values: &[BigInt]) -> BigInt {
    values.iter().fold(BigInt::zero(), |acc, v| acc.gcd(v))
}

pub fn rational_to_f64(q: &BigRational) -> Option<f64> {
    Some(q.numer().to_f64()? / q.denom().to_f64()?)
}

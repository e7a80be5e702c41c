#[cfg(test)]
mod tests_expr {
    use super::super::expr::Expr;
    use super::super::symbol::Symbol;
    use crate::MoireError;
    use approx::assert_relative_eq;
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use std::collections::{BTreeMap, BTreeSet};

    fn int(n: i64) -> Expr {
        Expr::integer(n)
    }

    fn sym(name: &str) -> Expr {
        Expr::symbol(name)
    }

    fn sqrt(n: i64) -> Expr {
        Expr::integer(n).sqrt()
    }

    fn substitutions(pairs: &[(&str, Expr)]) -> BTreeMap<Symbol, Expr> {
        pairs
            .iter()
            .map(|(name, value)| (Symbol::new(*name), value.clone()))
            .collect()
    }

    // ==================== Rational Arithmetic ====================

    #[test]
    fn test_rational_arithmetic() {
        assert_eq!(int(2) + int(3), int(5));
        assert_eq!(Expr::rational(1, 2) + Expr::rational(1, 3), Expr::rational(5, 6));
        assert_eq!(Expr::rational(3, 4) * int(4), int(3));
        assert_eq!(int(1) / int(3) - Expr::rational(1, 3), Expr::zero());
        assert_eq!(
            (Expr::rational(5, 6)).to_rational(),
            Some(BigRational::new(BigInt::from(5), BigInt::from(6)))
        );
    }

    #[test]
    fn test_integer_queries() {
        assert!(Expr::rational(4, 2).is_integer());
        assert_eq!(Expr::rational(4, 2).to_integer(), Some(BigInt::from(2)));
        assert!(!Expr::rational(1, 2).is_integer());
        assert!(Expr::rational(1, 2).is_rational());
        assert!(!sqrt(2).is_rational());
        assert!(!sym("a").is_rational());
    }

    #[test]
    fn test_checked_div_by_zero() {
        assert!(int(1).checked_div(&Expr::zero()).is_none());
        assert!(Expr::zero().recip().is_none());
        assert_eq!(int(4).recip(), Some(Expr::rational(1, 4)));
    }

    // ==================== Square Roots ====================

    #[test]
    fn test_sqrt_pulls_out_squares() {
        assert_eq!(sqrt(12), int(2) * sqrt(3));
        assert_eq!(sqrt(12).to_string(), "2*sqrt(3)");
        assert_eq!(sqrt(49), int(7));
        assert!(sqrt(49).is_integer());
    }

    #[test]
    fn test_sqrt_of_fractions() {
        assert_eq!(Expr::rational(1, 4).sqrt(), Expr::rational(1, 2));
        assert_eq!(Expr::rational(8, 9).sqrt(), Expr::rational(2, 3) * sqrt(2));
    }

    #[test]
    fn test_surd_products() {
        assert_eq!(sqrt(2) * sqrt(3), sqrt(6));
        assert_eq!(sqrt(2) * sqrt(2), int(2));
        assert!((sqrt(2) * sqrt(2)).is_rational());
        assert_eq!(sqrt(6) * sqrt(10), int(2) * sqrt(15));
        assert_eq!(sqrt(2).pow(4), int(4));
    }

    #[test]
    fn test_rationalized_denominators() {
        let one_over = (int(1) + sqrt(2)).recip().unwrap();
        assert_eq!(one_over, sqrt(2) - int(1));

        let mixed = (sqrt(2) + sqrt(3)).recip().unwrap();
        assert_eq!(mixed, sqrt(3) - sqrt(2));

        assert_eq!(int(1) / sqrt(3), sqrt(3) / int(3));
    }

    #[test]
    fn test_negative_radicand() {
        let i = int(-1).sqrt();
        assert_eq!(&i * &i, int(-1));
        assert_eq!(int(-4).sqrt().pow(2), int(-4));
        assert!(i.to_f64().is_none());
    }

    #[test]
    fn test_to_f64() {
        assert_relative_eq!(sqrt(2).to_f64().unwrap(), 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            (int(3).sqrt() / int(2)).to_f64().unwrap(),
            3f64.sqrt() / 2.0,
            epsilon = 1e-12
        );
        assert!(sym("a").to_f64().is_none());
    }

    // ==================== Symbolic Expressions ====================

    #[test]
    fn test_symbolic_radical_squares() {
        let beta = sym("β");
        let root = beta.sqrt();
        assert_eq!(&root * &root, beta);
        assert_eq!(root.to_string(), "sqrt(β)");

        let t = sym("t");
        let s = (int(1) - &t * &t).sqrt();
        assert_eq!(&s * &s, int(1) - &t * &t);
        assert_eq!(s.to_string(), "sqrt(1 - t^2)");
    }

    #[test]
    fn test_radical_content_is_extracted() {
        let beta = sym("β");
        assert_eq!((int(4) * &beta).sqrt(), int(2) * beta.sqrt());
        assert_eq!((int(2) * &beta).sqrt(), sqrt(2) * beta.sqrt());
    }

    #[test]
    fn test_polynomial_cancellation() {
        let t = sym("t");
        let ratio = (int(1) - &t * &t) / (&t * &t - int(1));
        assert_eq!(ratio, int(-1));
        assert!(ratio.is_rational());

        let a = sym("a");
        let b = sym("b");
        let quotient = (&a * &a - &b * &b) / (&a + &b);
        assert_eq!(quotient, &a - &b);
        assert!(quotient.to_string().find('/').is_none());
    }

    #[test]
    fn test_radical_denominator_round_trip() {
        let t = sym("t");
        let s = (int(1) - &t * &t).sqrt();
        let back = (&t / &s) * &s;
        assert_eq!(back, t);
        assert_eq!(&s / &s, int(1));
        assert!((&s / &s).is_rational());
    }

    #[test]
    fn test_monomial_cancellation() {
        let a = sym("a");
        let b = sym("b");
        let c = sym("c");
        let ratio = (&a * &b) / (&b * &c);
        assert_eq!(ratio.to_string(), "a/c");
        let expected: BTreeSet<Symbol> = [Symbol::new("a"), Symbol::new("c")].into_iter().collect();
        assert_eq!(ratio.free_symbols(), expected);
    }

    #[test]
    fn test_free_symbols() {
        let expr = sym("a") * sym("b") + sym("β").sqrt();
        let expected: BTreeSet<Symbol> = ["a", "b", "β"].into_iter().map(Symbol::new).collect();
        assert_eq!(expr.free_symbols(), expected);
        assert!(int(3).free_symbols().is_empty());
    }

    #[test]
    fn test_dummies_are_distinct() {
        let p1 = Expr::from(Symbol::dummy("p"));
        let p2 = Expr::from(Symbol::dummy("p"));
        assert_ne!(p1, p2);
        assert_ne!(p1, sym("p"));
        assert_eq!(p1.to_string(), "_p");
    }

    // ==================== Substitution ====================

    #[test]
    fn test_subs_to_numbers() {
        let expr = sym("a") / sym("c") + sym("b");
        let value = expr
            .subs(&substitutions(&[("a", int(1)), ("c", int(2)), ("b", Expr::rational(1, 2))]))
            .unwrap();
        assert_eq!(value, int(1));
    }

    #[test]
    fn test_subs_into_radicals() {
        let expr = sym("b") * sym("β").sqrt() / sym("c");
        let value = expr
            .subs(&substitutions(&[("b", int(3)), ("β", int(3)), ("c", int(14))]))
            .unwrap();
        assert_eq!(value, int(3) * sqrt(3) / int(14));

        let t = sym("t");
        let s = (int(1) - &t * &t).sqrt();
        let value = s.subs(&substitutions(&[("t", Expr::rational(1, 3))])).unwrap();
        assert_eq!(value, Expr::rational(2, 3) * sqrt(2));
    }

    #[test]
    fn test_subs_is_simultaneous() {
        let expr = sym("p") - int(2) * sym("q");
        let swapped = expr
            .subs(&substitutions(&[("p", sym("q")), ("q", sym("p"))]))
            .unwrap();
        assert_eq!(swapped, sym("q") - int(2) * sym("p"));
    }

    #[test]
    fn test_subs_vanishing_denominator() {
        let expr = int(1) / sym("c");
        let result = expr.subs(&substitutions(&[("c", int(0))]));
        assert!(matches!(result, Err(MoireError::InvalidTransform(_))));
    }

    // ==================== Parsing and Display ====================

    #[test]
    fn test_parse_scalars() {
        assert_eq!("3".parse::<Expr>().unwrap(), int(3));
        assert_eq!("-1/2".parse::<Expr>().unwrap(), Expr::rational(-1, 2));
        assert_eq!("0.25".parse::<Expr>().unwrap(), Expr::rational(1, 4));
        assert_eq!(" beta ".parse::<Expr>().unwrap(), sym("beta"));
        assert_eq!("β".parse::<Expr>().unwrap(), sym("β"));
        assert_eq!("-t".parse::<Expr>().unwrap(), -sym("t"));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "1/0", "x y", "1.", "2a", "1/b"] {
            let result = bad.parse::<Expr>();
            assert!(
                matches!(result, Err(MoireError::Parse(_))),
                "{:?} should not parse, got {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Expr::rational(1, 2).to_string(), "1/2");
        assert_eq!(int(-7).to_string(), "-7");
        assert_eq!((sym("a") + sym("b")).to_string(), "a + b");
        assert_eq!(((sym("a") + sym("b")) / sym("c")).to_string(), "(a + b)/c");
        assert_eq!((sym("a") - int(1)).to_string(), "-1 + a");
        assert_eq!(Expr::zero().to_string(), "0");
    }
}

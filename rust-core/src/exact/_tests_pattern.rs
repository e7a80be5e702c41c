#[cfg(test)]
mod tests_pattern {
    use super::super::build::{
        prim_rotation_moire_abc, prim_rotation_moire_pq, prim_special_reflection_moire,
    };
    use super::super::constants::hex_index;
    use super::super::pattern::{MoirePattern, Opers};
    use super::super::report::PatternReport;
    use crate::config::SearchLimits;
    use crate::symbolic::{expr_matrix, from_integer_matrix, integer_det, ExactMatrix, Expr, ExprMatrix};
    use crate::MoireError;
    use approx::assert_relative_eq;
    use nalgebra::Matrix2;
    use num_bigint::BigInt;

    fn ints(rows: [[i64; 2]; 2]) -> Matrix2<BigInt> {
        Matrix2::new(
            BigInt::from(rows[0][0]),
            BigInt::from(rows[0][1]),
            BigInt::from(rows[1][0]),
            BigInt::from(rows[1][1]),
        )
    }

    fn hex_sigma7() -> MoirePattern {
        prim_rotation_moire_abc(3, 13, 3, 14)
            .unwrap()
            .visit_family_same(&hex_index())
            .unwrap()
    }

    // ==================== Construction ====================

    #[test]
    fn test_from_abe_accepts_consistent_matrices() {
        let a = expr_matrix([[2, 1], [0, 3]]);
        let e = expr_matrix([
            [Expr::rational(1, 2), Expr::zero()],
            [Expr::zero(), Expr::rational(1, 3)],
        ]);
        let b = &e * &a;
        let pattern = MoirePattern::from_abe(a, b.clone(), e, None).unwrap();
        assert_eq!(pattern.b_matrix(), &b);
        assert!(pattern.is_fully_determined());
        assert_eq!(pattern.c_matrix().unwrap(), ints([[1, 0], [0, 1]]));
    }

    #[test]
    fn test_from_abe_rejects_inconsistent_matrices() {
        let identity = ExprMatrix::identity();
        let result = MoirePattern::from_abe(
            identity.clone(),
            identity.scaled(&Expr::integer(2)),
            identity.scaled(&Expr::integer(3)),
            None,
        );
        assert!(
            matches!(result, Err(MoireError::InvariantViolation(_))),
            "E·A != B should be an invariant violation, got {:?}",
            result
        );
    }

    #[test]
    fn test_irrational_transform_is_rejected() {
        let identity = ExprMatrix::identity();
        let root_two = identity.scaled(&Expr::integer(2).sqrt());
        let result = MoirePattern::from_abe(identity, root_two.clone(), root_two, None);
        assert!(matches!(result, Err(MoireError::InvalidTransform(_))));
    }

    #[test]
    fn test_from_cells_with_singular_first_cell() {
        let result = MoirePattern::from_cells(expr_matrix([[1, 2], [2, 4]]), ExprMatrix::identity());
        assert!(matches!(result, Err(MoireError::InvalidTransform(_))));
    }

    #[test]
    fn test_supplied_c_is_checked() {
        let identity = ExprMatrix::identity();
        let double = identity.scaled(&Expr::integer(2));
        let bad = MoirePattern::from_abe(identity.clone(), double.clone(), double.clone(), Some(ints([[1, 0], [0, 1]])));
        assert!(matches!(bad, Err(MoireError::InvariantViolation(_))));

        let good = MoirePattern::from_abe(identity, double.clone(), double, Some(ints([[2, 0], [0, 2]]))).unwrap();
        assert_eq!(good.relative_supercell_volume().unwrap(), BigInt::from(4));
    }

    #[test]
    fn test_opers_defaults_and_scale() {
        let pattern = Opers::new(ExprMatrix::identity()).with_scale(2).build().unwrap();
        assert_eq!(pattern.b_matrix(), &expr_matrix([[2, 0], [0, 2]]));
        assert_eq!(pattern.c_matrix().unwrap(), ints([[2, 0], [0, 2]]));
    }

    #[test]
    fn test_opers_second_cell_and_rows() {
        let pattern = MoirePattern::from_opers(
            Opers::new(ExprMatrix::identity())
                .with_second_cell(expr_matrix([[1, 0], [0, 2]]))
                .with_rows(expr_matrix([[1, 1], [0, 1]])),
        )
        .unwrap();
        assert_eq!(pattern.b_matrix(), &expr_matrix([[1, 2], [0, 2]]));
        assert_eq!(pattern.c_matrix().unwrap(), ints([[1, 0], [0, 2]]));
    }

    // ==================== Supercell Search ====================

    #[test]
    fn test_diagonal_transform() {
        let e = expr_matrix([[2, 0], [0, 3]]);
        let pattern = MoirePattern::from_cells(ExprMatrix::identity(), e).unwrap();
        assert_eq!(pattern.c_matrix().unwrap(), ints([[2, 0], [0, 3]]));
        assert_eq!(pattern.relative_supercell_volume().unwrap(), BigInt::from(6));
    }

    #[test]
    fn test_sixty_degree_rotation_of_rectangular_cell() {
        let pattern = prim_rotation_moire_pq(3, 1, 1).unwrap();
        assert_eq!(pattern.c_matrix().unwrap(), ints([[2, 0], [1, 1]]));
        assert_eq!(pattern.relative_supercell_volume().unwrap(), BigInt::from(2));
    }

    #[test]
    fn test_sixty_degree_rotation_of_hexagonal_cell() {
        let pattern = prim_rotation_moire_pq(3, 1, 1)
            .unwrap()
            .visit_family_same(&hex_index())
            .unwrap();
        let hex = expr_matrix([
            [Expr::one(), Expr::zero()],
            [Expr::rational(1, 2), Expr::integer(3).sqrt() / Expr::integer(2)],
        ]);
        assert_eq!(pattern.a_matrix(), &hex);
        assert_eq!(pattern.relative_supercell_volume().unwrap(), BigInt::from(1));
    }

    #[test]
    fn test_hexagonal_sigma7() {
        let pattern = hex_sigma7();
        let c = pattern.c_matrix().unwrap();
        assert_eq!(c, ints([[7, 0], [4, 1]]));
        assert_eq!(pattern.c_matrix_hnf().unwrap(), c);
        assert_eq!(pattern.relative_supercell_volume().unwrap(), BigInt::from(7));
    }

    #[test]
    fn test_commensurate_cell_lies_on_both_lattices() {
        let pattern = hex_sigma7();
        let c = pattern.c_matrix().unwrap();
        let cell = pattern.commensurate_cell().unwrap();
        assert_eq!(cell, &from_integer_matrix(&c) * pattern.a_matrix());
        assert_eq!(pattern.relative_supercell_volume().unwrap(), integer_det(&c));

        let in_b = &cell * &pattern.b_matrix().inverse_exact().unwrap();
        assert!(in_b.is_integer(), "C·A should be an integer combination of B");
    }

    #[test]
    fn test_search_cap_is_an_internal_error() {
        let e = expr_matrix([[1, 0], [0, 7]]);
        let limits = SearchLimits {
            max_hnf_c11: 3,
            ..SearchLimits::default()
        };
        let result = MoirePattern::from_cells_with_limits(ExprMatrix::identity(), e.clone(), limits);
        assert!(matches!(result, Err(MoireError::InternalError(_))));

        let relaxed = MoirePattern::from_cells(ExprMatrix::identity(), e).unwrap();
        assert_eq!(relaxed.c_matrix().unwrap(), ints([[1, 0], [0, 7]]));
    }

    // ==================== Derived Matrices ====================

    #[test]
    fn test_primitive_supercell_validity() {
        let pattern = hex_sigma7();
        let c = from_integer_matrix(&pattern.c_matrix().unwrap());
        assert!(pattern.is_valid_primitive_supercell(&c).unwrap());
        assert!(!pattern.is_valid_primitive_supercell(&c.scaled(&Expr::integer(2))).unwrap());

        let sheared = &expr_matrix([[1, 1], [0, 1]]) * &c;
        assert!(pattern.is_valid_primitive_supercell(&sheared).unwrap());
        assert!(!pattern.is_valid_primitive_supercell(&expr_matrix([[7, 0], [0, 1]])).unwrap());
        assert!(!pattern.is_valid_primitive_supercell(&expr_matrix([[1, 1], [1, 1]])).unwrap());

        let fractional = expr_matrix([
            [Expr::rational(7, 2), Expr::zero()],
            [Expr::zero(), Expr::one()],
        ]);
        assert!(matches!(
            pattern.is_valid_primitive_supercell(&fractional),
            Err(MoireError::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_d_matrices() {
        let pattern = hex_sigma7();
        assert_eq!(pattern.d_matrix_hnf().unwrap(), ints([[7, 0], [2, 1]]));
        let d = pattern.d_matrix().unwrap();
        assert_eq!(d.det_exact(), Expr::integer(7));
    }

    #[test]
    fn test_m_matrix_recovers_rotation() {
        let pattern = prim_rotation_moire_pq(3, 1, 1).unwrap();
        let m = pattern.m_matrix().unwrap();
        assert_eq!(m.det_exact(), Expr::one());
        assert_eq!(m[(0, 0)], Expr::rational(1, 2));
        assert_eq!(&m[(1, 0)] * &m[(1, 0)], Expr::rational(3, 4));
        assert_eq!(pattern.b_matrix(), &(pattern.a_matrix() * &m.transpose()));
    }

    #[test]
    fn test_half_turn_is_a_proper_rotation() {
        let pattern = prim_rotation_moire_pq(3, 1, 0).unwrap();
        let m = pattern.m_matrix().unwrap();
        assert_eq!(m.det_exact(), Expr::one());
        assert_eq!(&m[(0, 0)] * &m[(0, 0)] + &m[(1, 0)] * &m[(1, 0)], Expr::one());
        assert_eq!(pattern.relative_supercell_volume().unwrap(), BigInt::from(1));
    }

    // ==================== Transforms ====================

    #[test]
    fn test_swap_cells_is_an_involution() {
        let pattern = hex_sigma7();
        let back = pattern.swap_cells().unwrap().swap_cells().unwrap();
        assert_eq!(back.a_matrix(), pattern.a_matrix());
        assert_eq!(back.b_matrix(), pattern.b_matrix());
        assert_eq!(back.e_matrix(), pattern.e_matrix());
        assert_eq!(back.c_matrix().unwrap(), pattern.c_matrix().unwrap());
    }

    #[test]
    fn test_visit_family_with_identity() {
        let pattern = hex_sigma7();
        let same = pattern.visit_family(None, None).unwrap();
        assert_eq!(same.e_matrix(), pattern.e_matrix());
        assert_eq!(same.c_matrix().unwrap(), pattern.c_matrix().unwrap());
    }

    #[test]
    fn test_visit_family_one_sided() {
        let pattern = hex_sigma7();
        let q = expr_matrix([[1, 1], [0, 1]]);
        let visited = pattern.visit_family(Some(&q), None).unwrap();
        assert_eq!(visited.a_matrix(), &(&q * pattern.a_matrix()));
        assert_eq!(visited.b_matrix(), pattern.b_matrix());

        let c = from_integer_matrix(&visited.c_matrix().unwrap());
        let e_inv = visited.e_matrix().inverse_exact().unwrap();
        assert!((&c * &e_inv).is_integer());
    }

    #[test]
    fn test_symbolic_pattern_resolves_after_subs() {
        let beta = Expr::symbol("β");
        let pattern = prim_rotation_moire_abc(
            beta,
            Expr::symbol("a"),
            Expr::symbol("b"),
            Expr::symbol("c"),
        )
        .unwrap();
        assert!(!pattern.is_fully_determined());
        assert!(matches!(pattern.c_matrix(), Err(MoireError::NotYetDetermined(_))));
        assert!(matches!(
            pattern.commensurate_cell(),
            Err(MoireError::NotYetDetermined(_))
        ));
        assert_eq!(pattern.free_symbols().len(), 4);

        let concrete = pattern
            .subs([("β", 3), ("a", 13), ("b", 3), ("c", 14)])
            .unwrap();
        assert!(concrete.free_symbols().is_empty());
        assert_eq!(concrete.c_matrix().unwrap(), ints([[14, 0], [9, 1]]));
    }

    #[test]
    fn test_symbolic_reflection_is_determined() {
        let pattern = prim_special_reflection_moire(Expr::symbol("t")).unwrap();
        assert_eq!(pattern.e_matrix(), &expr_matrix([[0, 1], [1, 0]]));
        assert!(pattern.is_fully_determined());
        assert_eq!(pattern.c_matrix().unwrap(), ints([[1, 0], [0, 1]]));
    }

    #[test]
    fn test_with_limits_rederives() {
        let pattern = hex_sigma7();
        let tight = SearchLimits {
            max_hnf_c11: 1,
            ..SearchLimits::default()
        };
        let rebuilt = pattern.with_limits(tight).unwrap();
        assert_eq!(rebuilt.limits(), &tight);
        assert_eq!(rebuilt.c_matrix().unwrap(), pattern.c_matrix().unwrap());
    }

    // ==================== Floating Views and Display ====================

    #[test]
    fn test_approx_cells() {
        let pattern = hex_sigma7();
        let (a, _) = pattern.approx_cells().unwrap();
        assert_relative_eq!(a[(1, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(a[(1, 1)], 3f64.sqrt() / 2.0, epsilon = 1e-12);

        let cell = pattern.approx_commensurate_cell().unwrap();
        assert_relative_eq!(cell[(1, 0)], 4.5, epsilon = 1e-12);
        let area = cell[(0, 0)] * cell[(1, 1)] - cell[(0, 1)] * cell[(1, 0)];
        assert_relative_eq!(area, 7.0 * 3f64.sqrt() / 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_display() {
        let text = hex_sigma7().to_string();
        assert!(text.starts_with("MoirePattern::from_abe("));
        assert!(text.contains("a = [[1, 0], [1/2, (1/2)*sqrt(3)]]"), "got {}", text);
    }

    // ==================== Reports ====================

    #[test]
    fn test_report_for_determined_pattern() {
        let report = PatternReport::from_pattern(&hex_sigma7()).unwrap();
        let supercell = report.supercell.as_ref().unwrap();
        assert_eq!(supercell.relative_volume, "7");
        assert_eq!(supercell.c, [["7", "0"], ["4", "1"]].map(|row| row.map(String::from)));
        assert!(report.free_symbols.is_empty());
        assert!(report.approx_a.is_some());

        let text = report.to_string();
        assert!(text.contains("C = [[7, 0], [4, 1]]"), "got {}", text);
        assert!(text.contains("relative supercell volume = 7"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"relative_volume\":\"7\""), "got {}", json);
    }

    #[test]
    fn test_report_for_symbolic_pattern() {
        let pattern = prim_rotation_moire_abc(
            Expr::symbol("β"),
            Expr::symbol("a"),
            Expr::symbol("b"),
            Expr::symbol("c"),
        )
        .unwrap();
        let report = PatternReport::from_pattern(&pattern).unwrap();
        assert!(report.supercell.is_none());
        assert_eq!(report.free_symbols, vec!["a", "b", "c", "β"]);
        assert!(report.approx_a.is_none());
        assert!(report.to_string().contains("C not determined yet"));
    }
}

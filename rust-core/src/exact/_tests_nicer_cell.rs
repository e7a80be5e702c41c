#[cfg(test)]
mod tests_nicer_cell {
    use super::super::build::prim_rotation_moire_abc;
    use super::super::constants::hex_index;
    use super::super::nicer_cell::*;
    use crate::config::SearchLimits;
    use crate::symbolic::{from_integer_matrix, integer_det, rational_inverse};
    use crate::MoireError;
    use nalgebra::Matrix2;
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use num_traits::{Signed, One};

    fn ints(rows: [[i64; 2]; 2]) -> Matrix2<BigInt> {
        Matrix2::new(
            BigInt::from(rows[0][0]),
            BigInt::from(rows[0][1]),
            BigInt::from(rows[1][0]),
            BigInt::from(rows[1][1]),
        )
    }

    /// Both bases span the same lattice when `lhs·rhs⁻¹` is unimodular.
    fn same_lattice(lhs: &Matrix2<BigInt>, rhs: &Matrix2<BigInt>) -> bool {
        let Some(rhs_inv) = rational_inverse(&rhs.map(BigRational::from_integer)) else {
            return false;
        };
        let prod = &lhs.map(BigRational::from_integer) * &rhs_inv;
        if !prod.iter().all(|entry| entry.is_integer()) {
            return false;
        }
        let det = &prod[(0, 0)] * &prod[(1, 1)] - &prod[(0, 1)] * &prod[(1, 0)];
        det.abs().is_one()
    }

    // ==================== Ugliness ====================

    #[test]
    fn test_ugliness() {
        assert_eq!(ugliness(&ints([[7, 0], [4, 1]])), BigInt::from(66));
        assert_eq!(ugliness(&ints([[-1, -2], [3, -1]])), BigInt::from(15));
        assert_eq!(ugliness(&ints([[0, 0], [0, 0]])), BigInt::from(0));
    }

    // ==================== Greedy Search ====================

    #[test]
    fn test_identity_is_already_nice() {
        let identity = ints([[1, 0], [0, 1]]);
        assert_eq!(find_nicer_cell(&identity).unwrap(), identity);
    }

    #[test]
    fn test_hexagonal_sigma7_cell() {
        let cell = ints([[7, 0], [4, 1]]);
        let nicer = find_nicer_cell(&cell).unwrap();
        assert_eq!(nicer, ints([[-1, -2], [3, -1]]));
        assert_eq!(integer_det(&nicer), BigInt::from(7));
        assert!(same_lattice(&cell, &nicer));
    }

    #[test]
    fn test_ugly_basis_gets_smaller() {
        let cell = ints([[29, 2], [40, 3]]);
        let limits = SearchLimits {
            max_nicer_cell_steps: 20,
            ..SearchLimits::default()
        };
        let nicer = find_nicer_cell_with_limits(&cell, &limits).unwrap();
        assert!(ugliness(&nicer) < ugliness(&cell));
        assert_eq!(integer_det(&nicer).abs(), BigInt::from(7));
        assert!(same_lattice(&cell, &nicer));
    }

    #[test]
    fn test_step_cap() {
        let cell = ints([[29, 2], [40, 3]]);
        let limits = SearchLimits {
            max_nicer_cell_steps: 1,
            ..SearchLimits::default()
        };
        let result = find_nicer_cell_with_limits(&cell, &limits);
        assert!(matches!(result, Err(MoireError::InternalError(_))));
    }

    #[test]
    fn test_nicer_cell_is_a_primitive_supercell() {
        let pattern = prim_rotation_moire_abc(3, 13, 3, 14)
            .unwrap()
            .visit_family_same(&hex_index())
            .unwrap();
        let nicer = find_nicer_cell(&pattern.c_matrix().unwrap()).unwrap();
        assert!(pattern
            .is_valid_primitive_supercell(&from_integer_matrix(&nicer))
            .unwrap());
    }
}

use crate::symbolic::{expr_matrix, Expr, ExprMatrix};

/// Radicand of the hexagonal family: the rectangle `[[1, 0], [0, √3]]` holds two hexagonal cells.
pub const HEX_BETA: i64 = 3;

/// Row operation taking the `β = 3` rotation cell to the hexagonal cell
/// `[[1, 0], [1/2, √3/2]]`; use it with
/// [`MoirePattern::visit_family_same`](super::MoirePattern::visit_family_same).
pub fn hex_index() -> ExprMatrix {
    expr_matrix([
        [Expr::one(), Expr::zero()],
        [Expr::rational(1, 2), Expr::rational(1, 2)],
    ])
}

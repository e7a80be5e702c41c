// Symbolic module: exact scalars and 2x2 matrices over them
// Rationals, square roots and free symbols with a canonical form, so that
// lattice relations such as E·A == B can be checked exactly.

// ======================== MODULE DECLARATIONS ========================
pub mod diophantine;
pub mod expr;
pub mod matrix;
pub mod number;
mod polynomial;
pub mod symbol;

mod _tests_expr;

// ======================== SCALARS ========================
pub use expr::Expr; // struct - exact quotient of polynomials with radicals
pub use symbol::Symbol; // struct - named (or dummy) placeholder

// Expr impl methods:
//   zero() / one() / integer(i64) / rational(i64, i64) / symbol(name) - constructors
//   checked_div(&self, &Expr) -> Option<Expr>     - quotient, None for a zero divisor
//   pow(&self, u32) -> Expr                       - repeated product
//   sqrt(&self) -> Expr                           - principal root with radicals pulled apart
//   subs(&self, &BTreeMap<Symbol, Expr>) -> Result<Expr> - simultaneous substitution
//   free_symbols(&self) -> BTreeSet<Symbol>       - symbols still present
//   to_rational / to_integer / to_f64             - conversions when the value is concrete

// ======================== MATRICES ========================
pub use matrix::{
    ExactMatrix,          // trait - det, inverse, subs and conversions on ExprMatrix
    ExprMatrix,           // type - nalgebra Matrix2<Expr>
    expr_matrix,          // fn(rows: [[T; 2]; 2]) -> ExprMatrix
    format_matrix,        // fn(&Matrix2<T>) -> String
    from_integer_matrix,  // fn(&Matrix2<BigInt>) -> ExprMatrix
    from_rational_matrix, // fn(&Matrix2<BigRational>) -> ExprMatrix
    integer_det,          // fn(&Matrix2<BigInt>) -> BigInt
    rational_inverse,     // fn(&Matrix2<BigRational>) -> Option<Matrix2<BigRational>>
};

// ======================== NUMBER THEORY ========================
pub use diophantine::parametrize_ternary_quadratic; // fn(&[Expr; 3], &SearchLimits) -> Result<[Expr; 3]>
pub use number::{gcd_all, is_squarefree, square_decomposition, squarefree_core};

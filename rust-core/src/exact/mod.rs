// Exact module: moire patterns with exactly known cells
// Supercell derivation, construction families and basis nicening.

// ======================== MODULE DECLARATIONS ========================
pub mod build;
pub mod constants;
pub mod nicer_cell;
pub mod pattern;
pub mod report;
pub mod util;

mod _tests_nicer_cell;
mod _tests_pattern;

// ======================== MOIRE PATTERN ========================
pub use pattern::{
    MoirePattern, // struct - lattices A, B = E·A and their supercell C
    Opers,        // struct - builder for B = scale·rows·A2·cartᵀ
};

// MoirePattern impl methods:
//   from_abe(a, b, e, c: Option<Matrix2<BigInt>>) -> Result<Self>     - checks E·A == B, derives C when E is concrete
//   from_abe_with_limits(a, b, e, c, limits) -> Result<Self>          - same with explicit search caps
//   from_cells(a, b) -> Result<Self>                                  - E = B·A⁻¹
//   from_opers(opers: Opers) -> Result<Self>                          - B = scale·rows·A2·cartᵀ
//   a_matrix / b_matrix / e_matrix / cells                            - stored matrices
//   c_matrix / c_matrix_hnf -> Result<Matrix2<BigInt>>                - supercell, NotYetDetermined while symbolic
//   m_matrix -> Result<ExprMatrix>                                    - cartesian M with B = A·Mᵀ
//   d_matrix -> Result<ExprMatrix>                                    - E⁻¹·C
//   d_matrix_hnf -> Result<Matrix2<BigInt>>                           - C of swap_cells()
//   commensurate_cell -> Result<ExprMatrix>                           - C·A
//   relative_supercell_volume -> Result<BigInt>                       - det(C)
//   is_valid_primitive_supercell(&ExprMatrix) -> Result<bool>         - same lattice as C·A
//   swap_cells / visit_family / visit_family_same / subs / with_limits - new patterns
//   free_symbols / is_fully_determined / approx_cells / approx_commensurate_cell

// Opers impl methods:
//   new(cell) -> Self                    - A1 = A2 = cell, scale 1, rows = cart = I
//   with_second_cell / with_scale / with_rows / with_cart / with_limits
//   build(self) -> Result<MoirePattern>

// ======================== CONSTRUCTION FAMILIES ========================
pub use build::{
    prim_rotation_cell,              // fn(beta) -> Result<ExprMatrix>
    prim_rotation_moire_abc,         // fn(beta, a, b, c) -> Result<MoirePattern>
    prim_rotation_moire_pq,          // fn(beta, p, q) -> Result<MoirePattern>
    prim_scaled_rotation_moire_abck, // fn(beta, a, b, c, k) -> Result<MoirePattern>
    prim_special_reflection_cell,    // fn(cosine) -> ExprMatrix
    prim_special_reflection_moire,   // fn(t) -> Result<MoirePattern>
    reflection_cart,                 // fn(sine, cosine) -> Result<ExprMatrix>
    rotation_cart,                   // fn(sine, cosine) -> Result<ExprMatrix>
    rotation_diophantine_triple,     // fn(beta, p, q) -> Result<(Expr, Expr, Expr)>
};

// ======================== UTILITIES ========================
pub use constants::{hex_index, HEX_BETA};
pub use nicer_cell::{find_nicer_cell, find_nicer_cell_with_limits, ugliness};
pub use report::{PatternReport, SupercellReport};
pub use util::{is_squarefree, undummy};

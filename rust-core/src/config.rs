// Constants

use serde::{Deserialize, Serialize};

// Search caps
pub const MAX_HNF_C11: u64 = 1_000_000; // Upper bound on the last HNF entry of C
pub const MAX_NICER_CELL_STEPS: usize = 10_000; // Greedy steps before giving up
pub const TERNARY_BASE_POINT_RADIUS: i64 = 16; // Box radius when looking for a rational point

// Nicening
pub const NICER_CELL_MAX_MULT: i64 = 2; // Row operations use multipliers in [-MAX, MAX]

/// Caps for every bounded search in the crate.
///
/// Missing fields fall back to the constants above, so a JSON file only needs
/// to name the limits it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub max_hnf_c11: u64,
    pub max_nicer_cell_steps: usize,
    pub nicer_cell_max_mult: i64,
    pub base_point_radius: i64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_hnf_c11: MAX_HNF_C11,
            max_nicer_cell_steps: MAX_NICER_CELL_STEPS,
            nicer_cell_max_mult: NICER_CELL_MAX_MULT,
            base_point_radius: TERNARY_BASE_POINT_RADIUS,
        }
    }
}

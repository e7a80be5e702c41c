//! Exact moire pattern algebra
//!
//! Two 2D lattices `A` and `B = E·A` overlap into a moire pattern. This library
//! keeps every matrix exact (rationals, square roots and free symbols), derives
//! the smallest common supercell `C` in Hermite normal form, and provides
//! builders for the rotation, scaled-rotation and reflection families.

pub mod config;
pub mod error;
pub mod exact;
pub mod symbolic;

pub use error::MoireError;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, MoireError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

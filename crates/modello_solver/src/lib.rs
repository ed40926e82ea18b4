//! Solver for the constraint systems produced by model instances.
//!
//! Equations are eliminated one unknown at a time and solved values are
//! substituted back into everything else. Unknowns that never get a pivot
//! stay free, so the result is a particular solution parameterised by them.

pub mod error;
pub mod pivot;
pub mod solution;
pub mod system;

pub use error::SolveError;
pub use solution::Solution;
pub use system::{solve_system, SolveOptions};

//! Error types for modello_solver crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The constraints are inconsistent or violate an assumption.
    #[error("no solution: {reason}")]
    NoSolution { reason: String },

    /// An equation could not be isolated for any unknown.
    #[error("cannot solve {equation}: not linear in any unknown")]
    Unsupported { equation: String },
}

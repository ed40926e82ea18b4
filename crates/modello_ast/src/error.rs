//! Error types for modello_ast crate.

use thiserror::Error;

/// Errors that can occur in AST operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// Assumption name not recognised.
    #[error("unknown assumption '{0}'")]
    UnknownAssumption(String),

    /// Symbol id does not belong to this context.
    #[error("unknown symbol id {0}")]
    UnknownSymbol(usize),
}

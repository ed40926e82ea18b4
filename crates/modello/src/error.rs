//! Error types for the modello crate.

use modello_ast::AstError;
use modello_parser::ParseError;
use modello_solver::SolveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{model} has no attribute '{attr}'")]
    UnknownAttribute { model: String, attr: String },

    /// A nested model was assigned to an expression attribute.
    #[error("cannot assign {model}.{attr} to a non-expression")]
    NotAnExpression { model: String, attr: String },

    /// An expression was assigned to a nested model attribute.
    #[error("{model}.{attr} is a nested model, not an expression")]
    NestedConflict { model: String, attr: String },

    #[error("{model}.{attr} is not a nested model")]
    NotNested { model: String, attr: String },

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model {model} (line {line}): {message}")]
    Definition {
        model: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Assumption(#[from] AstError),

    #[error("cannot solve {model} '{instance}': {source}")]
    Solve {
        model: String,
        instance: String,
        #[source]
        source: SolveError,
    },
}

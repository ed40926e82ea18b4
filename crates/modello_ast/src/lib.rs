//! Expression arena shared by every modello crate.
//!
//! Expressions live in a [`Context`] and are referred to by [`ExprId`].
//! The context hash-conses nodes, so two structurally identical expressions
//! always share an id. Symbols (free variables and model dummies) are kept in
//! the context's [`SymbolTable`].

pub mod assumptions;
pub mod display;
pub mod eq;
pub mod error;
pub mod expression;
pub mod ordering;
pub mod symbol;
pub mod visitor;

pub use assumptions::Assumptions;
pub use display::DisplayExpr;
pub use eq::Equation;
pub use error::AstError;
pub use expression::{Constant, Context, ContextStats, Expr, ExprId};
pub use symbol::{SymbolId, SymbolInfo, SymbolKind, SymbolTable};
pub use visitor::{free_symbols, substitute, SubstMap, Transformer, Visitor};

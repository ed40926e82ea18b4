//! Parsers for modello.
//!
//! - [`parse`] / [`parse_with`]: infix expressions into a [`Context`]
//! - [`parse_document`]: model definition documents
//!
//! [`Context`]: modello_ast::Context

pub mod document;
pub mod error;
pub mod parser;

pub use document::{parse_document, Document, MemberDecl, MemberKind, ModelDecl};
pub use error::ParseError;
pub use parser::{parse, parse_with, FreeSymbols, Resolver};

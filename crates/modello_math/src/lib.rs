//! Algebra used by the model layer.
//!
//! - [`simplify`]: canonical normal form; equal inputs share an `ExprId`
//! - [`poly`]: sparse polynomials over atoms with exact coefficients
//! - [`linear`]: splitting a polynomial that is linear in one symbol
//! - [`numeric`]: exact rational helpers and floating point evaluation

pub mod linear;
pub mod numeric;
pub mod poly;
pub mod simplify;

pub use linear::{mentions, split_linear, LinearSplit};
pub use numeric::{as_rational, contains_undefined, evaluate};
pub use poly::{Monomial, Poly};
pub use simplify::{poly_from_expr, poly_to_expr, simplify, simplify_with, SimplifyOptions};

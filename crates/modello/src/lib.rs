//! Symbolic models.
//!
//! A [`ModelClass`] is a named collection of attributes. Each attribute is a
//! free unknown (an instance dummy), an expression over other attributes, or
//! a nested model. Classes are assembled with a [`ModelBuilder`] or loaded
//! from a model document through a [`Registry`].
//!
//! Instantiating a class under a name binds every dummy to a fresh bound
//! dummy `<name>_<dummy>`, adds the given [`Values`] as constraints and
//! solves the resulting system. Attributes nobody pinned down stay symbolic.
//!
//! ```ignore
//! let mut ctx = Context::new();
//! let mut child = ModelBuilder::new("Child");
//! let a = child.dummy(&mut ctx, "a")?;
//! let b = child.dummy(&mut ctx, "b")?;
//! let sum = ctx.add(Expr::Add(a, b));
//! child.define(&mut ctx, "c", sum)?;
//! let child = child.build(&mut ctx);
//!
//! let three = ctx.num(3);
//! let model = child.instantiate(&mut ctx, "C", &Values::new().set("a", three))?;
//! ```

pub mod builder;
pub mod class;
pub mod error;
pub mod instance;
pub mod registry;
pub mod values;

pub use builder::ModelBuilder;
pub use class::{Attribute, ModelClass, NestedModel};
pub use error::ModelError;
pub use instance::Model;
pub use registry::Registry;
pub use values::{Value, Values};

pub use modello_solver::SolveOptions;

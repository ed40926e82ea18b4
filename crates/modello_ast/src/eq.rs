//! Equations `lhs = rhs` between expressions of one context.

use std::fmt;

use crate::display::DisplayExpr;
use crate::{Context, ExprId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Equation {
    pub lhs: ExprId,
    pub rhs: ExprId,
}

impl Equation {
    pub fn new(lhs: ExprId, rhs: ExprId) -> Self {
        Self { lhs, rhs }
    }

    pub fn display<'a>(&self, context: &'a Context) -> DisplayEquation<'a> {
        DisplayEquation {
            context,
            equation: *self,
        }
    }
}

pub struct DisplayEquation<'a> {
    context: &'a Context,
    equation: Equation,
}

impl fmt::Display for DisplayEquation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            DisplayExpr {
                context: self.context,
                id: self.equation.lhs
            },
            DisplayExpr {
                context: self.context,
                id: self.equation.rhs
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Expr;

    #[test]
    fn test_display_equation() {
        let mut ctx = Context::new();
        let c = ctx.var("c");
        let a = ctx.var("a");
        let b = ctx.var("b");
        let sum = ctx.add(Expr::Add(a, b));
        let eq = Equation::new(c, sum);
        assert_eq!(eq.display(&ctx).to_string(), "c = a + b");
    }
}

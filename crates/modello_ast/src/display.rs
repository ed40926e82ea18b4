//! Display formatting for expressions.
//!
//! Expressions recurse through ids, so they are displayed through
//! [`DisplayExpr`], which pairs an id with its context.

use std::fmt;

use num_traits::Signed;

use crate::{Constant, Context, Expr, ExprId};

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

fn precedence(context: &Context, id: ExprId) -> u8 {
    match context.get(id) {
        Expr::Number(n) if n.is_negative() => PREC_NEG,
        Expr::Number(n) if !n.is_integer() => PREC_MUL,
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) | Expr::Function(_, _) => {
            PREC_ATOM
        }
        Expr::Add(_, _) | Expr::Sub(_, _) => PREC_ADD,
        Expr::Mul(_, _) | Expr::Div(_, _) => PREC_MUL,
        Expr::Neg(_) => PREC_NEG,
        Expr::Pow(_, _) => PREC_POW,
    }
}

pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl<'a> DisplayExpr<'a> {
    fn child(&self, id: ExprId) -> DisplayExpr<'a> {
        DisplayExpr {
            context: self.context,
            id,
        }
    }

    /// Write `id`, parenthesised when it binds looser than `min_prec`.
    fn operand(&self, f: &mut fmt::Formatter<'_>, id: ExprId, min_prec: u8) -> fmt::Result {
        if precedence(self.context, id) < min_prec {
            write!(f, "({})", self.child(id))
        } else {
            write!(f, "{}", self.child(id))
        }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context.get(self.id) {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Constant(c) => match c {
                Constant::Pi => write!(f, "pi"),
                Constant::E => write!(f, "e"),
                Constant::Undefined => write!(f, "undefined"),
            },
            Expr::Variable(sym) => write!(f, "{}", self.context.sym_name(*sym)),
            Expr::Add(l, r) => {
                self.operand(f, *l, PREC_ADD)?;
                match self.context.get(*r) {
                    // a + (-b) reads as a - b
                    Expr::Neg(inner) => {
                        write!(f, " - ")?;
                        self.operand(f, *inner, PREC_MUL)
                    }
                    Expr::Number(n) if n.is_negative() => write!(f, " - {}", -n),
                    _ => {
                        write!(f, " + ")?;
                        self.operand(f, *r, PREC_ADD)
                    }
                }
            }
            Expr::Sub(l, r) => {
                self.operand(f, *l, PREC_ADD)?;
                write!(f, " - ")?;
                self.operand(f, *r, PREC_MUL)
            }
            Expr::Mul(l, r) => {
                self.operand(f, *l, PREC_MUL)?;
                write!(f, " * ")?;
                self.operand(f, *r, PREC_MUL)
            }
            Expr::Div(l, r) => {
                self.operand(f, *l, PREC_MUL)?;
                write!(f, " / ")?;
                self.operand(f, *r, PREC_POW)
            }
            Expr::Pow(b, e) => {
                self.operand(f, *b, PREC_ATOM)?;
                write!(f, "^")?;
                self.operand(f, *e, PREC_ATOM)
            }
            Expr::Neg(e) => {
                write!(f, "-")?;
                if precedence(self.context, *e) == PREC_NEG {
                    write!(f, "({})", self.child(*e))
                } else {
                    self.operand(f, *e, PREC_MUL)
                }
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(*arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

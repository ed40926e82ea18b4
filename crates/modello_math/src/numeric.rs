//! Exact rational helpers and floating point evaluation.

use modello_ast::{Constant, Context, Expr, ExprId, Visitor};
use num_bigint::BigInt;
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// `c^k` for an integer `k`; `None` for `0^k` with `k < 0`.
pub fn rational_pow(c: &BigRational, k: i32) -> Option<BigRational> {
    if k < 0 && c.is_zero() {
        return None;
    }
    let n = k.unsigned_abs() as usize;
    let numer = num_traits::pow(c.numer().clone(), n);
    let denom = num_traits::pow(c.denom().clone(), n);
    Some(if k < 0 {
        BigRational::new(denom, numer)
    } else {
        BigRational::new(numer, denom)
    })
}

/// Exact `q`-th root of a non-negative rational, if it is rational.
pub fn rational_root(c: &BigRational, q: u32) -> Option<BigRational> {
    if c.is_negative() || q == 0 {
        return None;
    }
    let exact = |n: &BigInt| {
        let root = n.nth_root(q);
        (num_traits::pow(root.clone(), q as usize) == *n).then_some(root)
    };
    Some(BigRational::new(exact(c.numer())?, exact(c.denom())?))
}

/// Value of a `Number` node.
pub fn as_rational(ctx: &Context, expr: ExprId) -> Option<BigRational> {
    ctx.as_number(expr).cloned()
}

#[derive(Default)]
struct UndefinedFinder {
    found: bool,
}

impl Visitor for UndefinedFinder {
    fn visit_constant(&mut self, c: &Constant) {
        self.found |= *c == Constant::Undefined;
    }
}

/// Whether `expr` mentions [`Constant::Undefined`] anywhere.
pub fn contains_undefined(ctx: &Context, expr: ExprId) -> bool {
    let mut finder = UndefinedFinder::default();
    finder.visit_expr(ctx, expr);
    finder.found
}

/// Evaluate to a finite `f64`.
///
/// Returns `None` for expressions with symbols, unknown functions or
/// non-finite intermediate results.
pub fn evaluate(ctx: &Context, expr: ExprId) -> Option<f64> {
    let value = match ctx.get(expr) {
        Expr::Number(n) => n.to_f64()?,
        Expr::Constant(Constant::Pi) => std::f64::consts::PI,
        Expr::Constant(Constant::E) => std::f64::consts::E,
        Expr::Constant(Constant::Undefined) | Expr::Variable(_) => return None,
        Expr::Add(l, r) => evaluate(ctx, *l)? + evaluate(ctx, *r)?,
        Expr::Sub(l, r) => evaluate(ctx, *l)? - evaluate(ctx, *r)?,
        Expr::Mul(l, r) => evaluate(ctx, *l)? * evaluate(ctx, *r)?,
        Expr::Div(l, r) => evaluate(ctx, *l)? / evaluate(ctx, *r)?,
        Expr::Pow(b, e) => evaluate(ctx, *b)?.powf(evaluate(ctx, *e)?),
        Expr::Neg(e) => -evaluate(ctx, *e)?,
        Expr::Function(name, args) => {
            let values = args
                .iter()
                .map(|a| evaluate(ctx, *a))
                .collect::<Option<Vec<f64>>>()?;
            evaluate_function(name, &values)?
        }
    };
    value.is_finite().then_some(value)
}

fn evaluate_function(name: &str, args: &[f64]) -> Option<f64> {
    Some(match (name, args) {
        ("sin", [x]) => x.sin(),
        ("cos", [x]) => x.cos(),
        ("tan", [x]) => x.tan(),
        ("asin", [x]) => x.asin(),
        ("acos", [x]) => x.acos(),
        ("atan", [x]) => x.atan(),
        ("sinh", [x]) => x.sinh(),
        ("cosh", [x]) => x.cosh(),
        ("tanh", [x]) => x.tanh(),
        ("ln", [x]) | ("log", [x]) => x.ln(),
        ("log", [x, base]) => x.ln() / base.ln(),
        ("abs", [x]) => x.abs(),
        ("floor", [x]) => x.floor(),
        ("ceil", [x]) => x.ceil(),
        ("heaviside", [x]) => step(*x > 0.0),
        ("min", [first, rest @ ..]) => rest.iter().fold(*first, |acc, v| acc.min(*v)),
        ("max", [first, rest @ ..]) => rest.iter().fold(*first, |acc, v| acc.max(*v)),
        _ => return None,
    })
}

fn step(positive: bool) -> f64 {
    if positive {
        1.0
    } else {
        0.0
    }
}

/// Fold calls whose arguments are all exact numbers.
///
/// `heaviside(x)` is 1 for `x > 0` and 0 otherwise, so a bracket written
/// `heaviside(x - limit) * (x - limit)` contributes nothing at its limit.
pub(crate) fn fold_function(name: &str, args: &[BigRational]) -> Option<BigRational> {
    match (name, args) {
        ("abs", [x]) => Some(x.abs()),
        ("floor", [x]) => Some(x.floor()),
        ("ceil", [x]) => Some(x.ceil()),
        ("heaviside", [x]) => Some(if x.is_positive() {
            BigRational::one()
        } else {
            BigRational::zero()
        }),
        ("min", [first, rest @ ..]) => Some(rest.iter().fold(first.clone(), |acc, v| {
            if *v < acc {
                v.clone()
            } else {
                acc
            }
        })),
        ("max", [first, rest @ ..]) => Some(rest.iter().fold(first.clone(), |acc, v| {
            if *v > acc {
                v.clone()
            } else {
                acc
            }
        })),
        _ => None,
    }
}

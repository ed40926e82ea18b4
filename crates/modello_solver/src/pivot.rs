//! Choosing the unknown an equation is solved for.
//!
//! Preference order for `residual = 0`:
//! 1. the equation's subject (the symbol on its left-hand side),
//! 2. the first unknown with a rational coefficient,
//! 3. the first unknown whose coefficient is free of it,
//! 4. a nonnegative unknown that only occurs as `x^k`.

use modello_ast::{free_symbols, Assumptions, Context, Expr, ExprId, SymbolId};
use modello_math::linear::mentions;
use modello_math::poly::{mono_degree, mono_without};
use modello_math::{
    poly_from_expr, poly_to_expr, simplify_with, split_linear, LinearSplit, Poly, SimplifyOptions,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};

/// Rounds of denominator clearing tried on a single equation.
const MAX_CLEARING_ROUNDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    Subject,
    Rational,
    Symbolic,
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub sym: SymbolId,
    pub value: ExprId,
    pub kind: PivotKind,
}

/// Unknowns that occur in `poly`, in the given order.
pub fn mentioned_unknowns(ctx: &Context, poly: &Poly, unknowns: &[SymbolId]) -> Vec<SymbolId> {
    unknowns
        .iter()
        .copied()
        .filter(|u| mentions(ctx, poly, *u))
        .collect()
}

/// Isolate an unknown in `residual = 0`, if one of the strategies applies.
pub fn find_pivot(
    ctx: &mut Context,
    residual: ExprId,
    subject: Option<SymbolId>,
    unknowns: &[SymbolId],
    opts: &SimplifyOptions,
) -> Option<Pivot> {
    let poly = poly_from_expr(ctx, residual, opts);
    let mentioned = mentioned_unknowns(ctx, &poly, unknowns);

    if let Some(sym) = subject.filter(|s| mentioned.contains(s)) {
        let node = ctx.symbol(sym);
        if let Some(split) = split_linear(ctx, &poly, node) {
            let value = isolate(ctx, &split, opts);
            return Some(Pivot {
                sym,
                value,
                kind: PivotKind::Subject,
            });
        }
    }

    let mut symbolic: Option<(SymbolId, LinearSplit)> = None;
    for &sym in &mentioned {
        let node = ctx.symbol(sym);
        let Some(split) = split_linear(ctx, &poly, node) else {
            continue;
        };
        if split.coefficient.as_constant().is_some() {
            let value = isolate(ctx, &split, opts);
            return Some(Pivot {
                sym,
                value,
                kind: PivotKind::Rational,
            });
        }
        if symbolic.is_none() {
            symbolic = Some((sym, split));
        }
    }
    if let Some((sym, split)) = symbolic {
        let value = isolate(ctx, &split, opts);
        return Some(Pivot {
            sym,
            value,
            kind: PivotKind::Symbolic,
        });
    }

    mentioned
        .iter()
        .find_map(|&sym| root_pivot(ctx, &poly, sym, opts))
}

/// `coefficient * x + rest = 0` → `x = -rest / coefficient`.
fn isolate(ctx: &mut Context, split: &LinearSplit, opts: &SimplifyOptions) -> ExprId {
    if let Some(c) = split.coefficient.as_constant() {
        let value = split.rest.scale(&-c.recip());
        return poly_to_expr(ctx, &value);
    }
    let numer = poly_to_expr(ctx, &split.rest.neg());
    let denom = poly_to_expr(ctx, &split.coefficient);
    let quotient = ctx.add(Expr::Div(numer, denom));
    simplify_with(ctx, quotient, opts)
}

/// `coefficient * x^k + rest = 0` with `x >= 0` → `x = (-rest / coefficient)^(1/k)`.
fn root_pivot(ctx: &mut Context, poly: &Poly, sym: SymbolId, opts: &SimplifyOptions) -> Option<Pivot> {
    if !ctx.assumptions(sym).contains(Assumptions::NONNEGATIVE) {
        return None;
    }
    let node = ctx.symbol(sym);
    let mut degree = None;
    let mut coefficient = Poly::zero();
    let mut rest = Poly::zero();
    for (m, c) in poly.terms() {
        let k = mono_degree(m, node);
        let others = mono_without(m, node);
        let view: &Context = ctx;
        if others
            .iter()
            .any(|(atom, _)| free_symbols(view, *atom).contains(&sym))
        {
            return None;
        }
        match k {
            0 => rest.add_term(m.clone(), c.clone()),
            k if k >= 2 && degree.map_or(true, |d| d == k) => {
                degree = Some(k);
                coefficient.add_term(others, c.clone());
            }
            _ => return None,
        }
    }
    let k = degree?;
    let radicand = isolate(ctx, &LinearSplit { coefficient, rest }, opts);
    if ctx.as_number(radicand).is_some_and(|r| r.is_negative()) {
        return None;
    }
    let index = ctx.rational(BigRational::new(BigInt::one(), BigInt::from(k)));
    let root = ctx.add(Expr::Pow(radicand, index));
    Some(Pivot {
        sym,
        value: simplify_with(ctx, root, opts),
        kind: PivotKind::Root,
    })
}

/// Multiply `residual` by the denominators that mention an unknown.
///
/// Returns `None` when there is nothing to clear.
pub fn clear_denominators(
    ctx: &mut Context,
    residual: ExprId,
    unknowns: &[SymbolId],
    opts: &SimplifyOptions,
) -> Option<ExprId> {
    let mut current = residual;
    for _ in 0..MAX_CLEARING_ROUNDS {
        let poly = poly_from_expr(ctx, current, opts);
        let view: &Context = ctx;
        let denominator = poly.atoms().into_iter().find_map(|atom| {
            let lowest = poly
                .terms()
                .map(|(m, _)| mono_degree(m, atom))
                .min()
                .unwrap_or(0);
            let relevant = lowest < 0
                && unknowns
                    .iter()
                    .any(|u| free_symbols(view, atom).contains(u));
            relevant.then_some((atom, -lowest))
        });
        let Some((atom, k)) = denominator else {
            break;
        };
        let factor = if k == 1 {
            atom
        } else {
            let k = ctx.num(i64::from(k));
            ctx.add(Expr::Pow(atom, k))
        };
        let product = ctx.add(Expr::Mul(current, factor));
        current = simplify_with(ctx, product, opts);
    }
    (current != residual).then_some(current)
}

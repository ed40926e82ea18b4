use modello_ast::{
    free_symbols, substitute, Context, DisplayExpr, Equation, Expr, ExprId, SubstMap, SymbolId,
};
use modello_math::{contains_undefined, simplify_with, SimplifyOptions};
use num_traits::Zero;

use crate::error::SolveError;
use crate::pivot::{clear_denominators, find_pivot, mentioned_unknowns, Pivot};
use crate::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOptions {
    /// Sweeps over the pending equations before giving up.
    pub max_passes: usize,
    pub simplify: SimplifyOptions,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_passes: 32,
            simplify: SimplifyOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    residual: ExprId,
    subject: Option<SymbolId>,
    /// Position in the input, for messages.
    index: usize,
}

fn render(ctx: &Context, residual: ExprId) -> String {
    format!("{} = 0", DisplayExpr { context: ctx, id: residual })
}

/// Re-simplify `expr` with `sym` replaced, if it mentions `sym`.
fn eliminate_in(
    ctx: &mut Context,
    expr: ExprId,
    sym: SymbolId,
    map: &SubstMap,
    opts: &SimplifyOptions,
) -> ExprId {
    if !free_symbols(ctx, expr).contains(&sym) {
        return expr;
    }
    let replaced = substitute(ctx, expr, map);
    simplify_with(ctx, replaced, opts)
}

fn apply_pivot(
    ctx: &mut Context,
    pivot: Pivot,
    pending: &mut [Pending],
    solution: &mut Solution,
    opts: &SimplifyOptions,
) {
    let mut map = SubstMap::default();
    map.insert(pivot.sym, pivot.value);
    for eq in pending.iter_mut() {
        eq.residual = eliminate_in(ctx, eq.residual, pivot.sym, &map, opts);
    }
    solution.update(|value| eliminate_in(ctx, value, pivot.sym, &map, opts));
    solution.insert(pivot.sym, pivot.value);
}

fn check_solution(ctx: &Context, solution: &Solution) -> Result<(), SolveError> {
    for (sym, value) in solution.iter() {
        if contains_undefined(ctx, value) {
            return Err(SolveError::NoSolution {
                reason: format!("{} is undefined", ctx.sym_name(sym)),
            });
        }
        if let Some(n) = ctx.as_number(value) {
            let assumptions = ctx.assumptions(sym);
            if !assumptions.admits(n) {
                return Err(SolveError::NoSolution {
                    reason: format!(
                        "{} = {} violates assumptions [{}]",
                        ctx.sym_name(sym),
                        n,
                        assumptions
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Solve `equations` for `unknowns`.
///
/// Each equation is simplified as `lhs - rhs`. Solved values are substituted
/// into the remaining equations and into earlier values, so every value in
/// the result is expressed in free unknowns and parameters only.
pub fn solve_system(
    ctx: &mut Context,
    equations: &[Equation],
    unknowns: &[SymbolId],
    opts: &SolveOptions,
) -> Result<Solution, SolveError> {
    tracing::debug!(
        equations = equations.len(),
        unknowns = unknowns.len(),
        "solve_start"
    );

    let mut pending: Vec<Pending> = Vec::with_capacity(equations.len());
    for (index, eq) in equations.iter().enumerate() {
        let diff = ctx.add(Expr::Sub(eq.lhs, eq.rhs));
        let residual = simplify_with(ctx, diff, &opts.simplify);
        let subject = ctx.as_symbol(eq.lhs).filter(|s| unknowns.contains(s));
        pending.push(Pending {
            residual,
            subject,
            index,
        });
    }

    let mut solution = Solution::default();
    let mut passes = 0;
    while !pending.is_empty() {
        passes += 1;
        let mut progress = false;
        let mut i = 0;
        while i < pending.len() {
            let eq = pending[i];
            if let Some(c) = ctx.as_number(eq.residual) {
                if !c.is_zero() {
                    return Err(SolveError::NoSolution {
                        reason: format!("equation {} reduces to {} = 0", eq.index + 1, c),
                    });
                }
                tracing::trace!(equation = eq.index + 1, "redundant");
                pending.remove(i);
                progress = true;
                continue;
            }
            if contains_undefined(ctx, eq.residual) {
                return Err(SolveError::NoSolution {
                    reason: format!("equation {} is undefined", eq.index + 1),
                });
            }

            let mut pivot = find_pivot(ctx, eq.residual, eq.subject, unknowns, &opts.simplify);
            if pivot.is_none() {
                if let Some(cleared) =
                    clear_denominators(ctx, eq.residual, unknowns, &opts.simplify)
                {
                    pending[i].residual = cleared;
                    pivot = find_pivot(ctx, cleared, eq.subject, unknowns, &opts.simplify);
                }
            }
            let Some(pivot) = pivot else {
                i += 1;
                continue;
            };

            tracing::trace!(
                equation = eq.index + 1,
                unknown = ctx.sym_name(pivot.sym),
                kind = ?pivot.kind,
                "pivot"
            );
            pending.remove(i);
            apply_pivot(ctx, pivot, &mut pending, &mut solution, &opts.simplify);
            progress = true;
        }

        if pending.is_empty() {
            break;
        }
        if !progress || passes >= opts.max_passes {
            let eq = pending[0];
            let poly = modello_math::poly_from_expr(ctx, eq.residual, &opts.simplify);
            if mentioned_unknowns(ctx, &poly, unknowns).is_empty() {
                return Err(SolveError::NoSolution {
                    reason: format!("{} constrains no unknown", render(ctx, eq.residual)),
                });
            }
            return Err(SolveError::Unsupported {
                equation: render(ctx, eq.residual),
            });
        }
    }

    check_solution(ctx, &solution)?;
    tracing::debug!(passes, solved = solution.len(), "solve_done");
    Ok(solution)
}

use num_rational::BigRational;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::expression::{Constant, Context, Expr, ExprId};
use crate::symbol::SymbolId;

pub trait Visitor {
    fn visit_expr(&mut self, context: &Context, id: ExprId) {
        match context.get(id) {
            Expr::Number(n) => self.visit_number(n),
            Expr::Constant(c) => self.visit_constant(c),
            Expr::Variable(sym) => self.visit_variable(*sym),
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
                self.visit_binary(context, *l, *r)
            }
            Expr::Pow(b, e) => self.visit_pow(context, *b, *e),
            Expr::Neg(e) => self.visit_expr(context, *e),
            Expr::Function(name, args) => self.visit_function(context, name, args),
        }
    }

    fn visit_number(&mut self, _n: &BigRational) {}
    fn visit_constant(&mut self, _c: &Constant) {}
    fn visit_variable(&mut self, _sym: SymbolId) {}

    fn visit_binary(&mut self, context: &Context, left: ExprId, right: ExprId) {
        self.visit_expr(context, left);
        self.visit_expr(context, right);
    }

    fn visit_pow(&mut self, context: &Context, base: ExprId, exp: ExprId) {
        self.visit_expr(context, base);
        self.visit_expr(context, exp);
    }

    fn visit_function(&mut self, context: &Context, _name: &str, args: &[ExprId]) {
        for arg in args {
            self.visit_expr(context, *arg);
        }
    }
}

pub trait Transformer {
    fn transform_expr(&mut self, context: &mut Context, id: ExprId) -> ExprId {
        let expr = context.get(id).clone();
        match expr {
            Expr::Number(_) | Expr::Constant(_) => id,
            Expr::Variable(sym) => self.transform_variable(context, id, sym),
            Expr::Add(l, r) => self.rebuild_binary(context, id, l, r, Expr::Add),
            Expr::Sub(l, r) => self.rebuild_binary(context, id, l, r, Expr::Sub),
            Expr::Mul(l, r) => self.rebuild_binary(context, id, l, r, Expr::Mul),
            Expr::Div(l, r) => self.rebuild_binary(context, id, l, r, Expr::Div),
            Expr::Pow(b, e) => self.rebuild_binary(context, id, b, e, Expr::Pow),
            Expr::Neg(e) => {
                let new_e = self.transform_expr(context, e);
                if new_e != e {
                    context.add(Expr::Neg(new_e))
                } else {
                    id
                }
            }
            Expr::Function(name, args) => self.transform_function(context, id, &name, &args),
        }
    }

    fn transform_variable(&mut self, _context: &mut Context, id: ExprId, _sym: SymbolId) -> ExprId {
        id
    }

    fn rebuild_binary(
        &mut self,
        context: &mut Context,
        original: ExprId,
        l: ExprId,
        r: ExprId,
        build: fn(ExprId, ExprId) -> Expr,
    ) -> ExprId {
        let new_l = self.transform_expr(context, l);
        let new_r = self.transform_expr(context, r);
        if new_l != l || new_r != r {
            context.add(build(new_l, new_r))
        } else {
            original
        }
    }

    fn transform_function(
        &mut self,
        context: &mut Context,
        original: ExprId,
        name: &str,
        args: &[ExprId],
    ) -> ExprId {
        let new_args: Vec<ExprId> = args
            .iter()
            .map(|arg| self.transform_expr(context, *arg))
            .collect();
        if new_args.as_slice() != args {
            context.add(Expr::Function(name.to_string(), new_args))
        } else {
            original
        }
    }
}

/// Symbol → replacement map used by [`substitute`].
pub type SubstMap = FxHashMap<SymbolId, ExprId>;

struct SymbolSubstituter<'a> {
    map: &'a SubstMap,
}

impl Transformer for SymbolSubstituter<'_> {
    fn transform_variable(&mut self, _context: &mut Context, id: ExprId, sym: SymbolId) -> ExprId {
        self.map.get(&sym).copied().unwrap_or(id)
    }
}

/// Replace symbols simultaneously; replacements are not rescanned.
///
/// The result is not simplified.
pub fn substitute(context: &mut Context, expr: ExprId, map: &SubstMap) -> ExprId {
    if map.is_empty() {
        return expr;
    }
    SymbolSubstituter { map }.transform_expr(context, expr)
}

#[derive(Default)]
struct SymbolCollector {
    seen: FxHashSet<SymbolId>,
    order: Vec<SymbolId>,
}

impl Visitor for SymbolCollector {
    fn visit_variable(&mut self, sym: SymbolId) {
        if self.seen.insert(sym) {
            self.order.push(sym);
        }
    }
}

/// Symbols occurring in `expr`, in order of first appearance.
pub fn free_symbols(context: &Context, expr: ExprId) -> Vec<SymbolId> {
    let mut collector = SymbolCollector::default();
    collector.visit_expr(context, expr);
    collector.order
}

use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

use crate::assumptions::Assumptions;
use crate::symbol::{SymbolId, SymbolKind, SymbolTable};

/// Handle to an expression node stored in a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    /// Result of an undefined operation such as `1/0`.
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Variable(SymbolId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    Function(String, Vec<ExprId>),
}

/// Counters exposed for budgeting and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Nodes actually allocated (deduplicated hits are not counted).
    pub nodes_created: usize,
}

/// Arena owning every expression node and symbol.
///
/// `add` deduplicates: a node equal to an existing one returns the existing
/// id. Canonical forms produced by the simplifier therefore compare equal by
/// id.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    interner: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
    stats: ContextStats,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interner.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.interner.insert(expr, id);
        self.stats.nodes_created += 1;
        id
    }

    /// # Panics
    /// Panics if `id` was not produced by this context.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn rational(&mut self, n: BigRational) -> ExprId {
        self.add(Expr::Number(n))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    /// Free variable, interned by name.
    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    pub fn symbol(&mut self, sym: SymbolId) -> ExprId {
        self.add(Expr::Variable(sym))
    }

    /// Create a fresh dummy symbol and return it together with its node.
    pub fn dummy(
        &mut self,
        name: &str,
        kind: SymbolKind,
        assumptions: Assumptions,
    ) -> (SymbolId, ExprId) {
        let sym = self.symbols.fresh(name, kind, assumptions);
        (sym, self.add(Expr::Variable(sym)))
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.add(Expr::Function(name.to_string(), args))
    }

    #[inline]
    pub fn sym_name(&self, sym: SymbolId) -> &str {
        self.symbols.resolve(sym)
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Assumptions of a symbol; unknown ids carry none.
    pub fn assumptions(&self, sym: SymbolId) -> Assumptions {
        self.symbols
            .info(sym)
            .map(|info| info.assumptions)
            .unwrap_or_default()
    }

    /// Symbol behind a `Variable` node.
    pub fn as_symbol(&self, id: ExprId) -> Option<SymbolId> {
        match self.get(id) {
            Expr::Variable(sym) => Some(*sym),
            _ => None,
        }
    }

    pub fn as_number(&self, id: ExprId) -> Option<&BigRational> {
        match self.get(id) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates_structurally_equal_nodes() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let a = ctx.add(Expr::Add(x, one));
        let b = ctx.add(Expr::Add(x, one));
        assert_eq!(a, b);
        assert_eq!(ctx.stats().nodes_created, 3);
    }

    #[test]
    fn dummies_with_same_name_have_distinct_nodes() {
        let mut ctx = Context::new();
        let (s1, e1) = ctx.dummy("a", SymbolKind::InstanceDummy, Assumptions::NONE);
        let (s2, e2) = ctx.dummy("a", SymbolKind::InstanceDummy, Assumptions::NONE);
        assert_ne!(s1, s2);
        assert_ne!(e1, e2);
        assert_eq!(ctx.sym_name(s1), ctx.sym_name(s2));
        assert_eq!(ctx.as_symbol(e1), Some(s1));
    }
}

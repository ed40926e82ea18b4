use modello_ast::{ExprId, SymbolId};
use rustc_hash::FxHashMap;

/// Solved unknowns in the order they were eliminated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    order: Vec<SymbolId>,
    values: FxHashMap<SymbolId, ExprId>,
}

impl Solution {
    pub fn get(&self, sym: SymbolId) -> Option<ExprId> {
        self.values.get(&sym).copied()
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.values.contains_key(&sym)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, ExprId)> + '_ {
        self.order
            .iter()
            .filter_map(|sym| self.values.get(sym).map(|value| (*sym, *value)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn insert(&mut self, sym: SymbolId, value: ExprId) {
        if self.values.insert(sym, value).is_none() {
            self.order.push(sym);
        }
    }

    /// Rewrite every stored value.
    pub(crate) fn update(&mut self, mut f: impl FnMut(ExprId) -> ExprId) {
        for sym in &self.order {
            if let Some(value) = self.values.get_mut(sym) {
                *value = f(*value);
            }
        }
    }
}

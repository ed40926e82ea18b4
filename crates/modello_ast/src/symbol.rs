//! Symbol table for variable names and model dummies.
//!
//! Free symbols are interned: `x` always maps to the same [`SymbolId`].
//! Dummies are never interned. Every call to [`SymbolTable::fresh`] creates a
//! distinct symbol even when the name repeats, which is what lets two model
//! instances named alike keep separate unknowns.

use rustc_hash::FxHashMap;

use crate::assumptions::Assumptions;

/// Unique identifier for a symbol.
///
/// Using usize for direct Vec indexing without casts.
pub type SymbolId = usize;

/// Role a symbol plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Ordinary variable, interned by name.
    Free,
    /// Class-level unknown of a model.
    InstanceDummy,
    /// Instance-level copy of an [`SymbolKind::InstanceDummy`].
    Bound,
}

/// Everything the table knows about a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub assumptions: Assumptions,
}

/// Symbol storage.
///
/// # Design
/// - `entries`: canonical storage, indexed by SymbolId
/// - `lookup`: reverse map for free symbols only
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolInfo>,
    lookup: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a free symbol, returning its SymbolId.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        // Fast path: already interned
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }

        let id = self.push(SymbolInfo {
            name: name.to_string(),
            kind: SymbolKind::Free,
            assumptions: Assumptions::NONE,
        });
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// Create a new symbol that is never shared with another one.
    pub fn fresh(&mut self, name: &str, kind: SymbolKind, assumptions: Assumptions) -> SymbolId {
        self.push(SymbolInfo {
            name: name.to_string(),
            kind,
            assumptions: assumptions.with(Assumptions::NONE),
        })
    }

    fn push(&mut self, info: SymbolInfo) -> SymbolId {
        let id = self.entries.len();
        self.entries.push(info);
        id
    }

    /// Resolve a SymbolId back to its name.
    ///
    /// # Panics
    /// Panics if id is invalid (out of bounds).
    #[inline]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.entries[id].name
    }

    #[inline]
    pub fn info(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.entries.get(id)
    }

    /// Id of an interned free symbol, without interning.
    #[inline]
    pub fn get_id(&self, name: &str) -> Option<SymbolId> {
        self.lookup.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplication() {
        let mut table = SymbolTable::new();
        let id1 = table.intern("x");
        let id2 = table.intern("x");
        assert_eq!(id1, id2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve(id1), "x");
    }

    #[test]
    fn test_fresh_symbols_are_distinct() {
        let mut table = SymbolTable::new();
        let a = table.fresh("P_a", SymbolKind::Bound, Assumptions::NONE);
        let b = table.fresh("P_a", SymbolKind::Bound, Assumptions::NONE);
        assert_ne!(a, b);
        assert_eq!(table.resolve(a), table.resolve(b));
        // dummies never shadow the free symbol of the same name
        assert_eq!(table.get_id("P_a"), None);
    }

    #[test]
    fn test_info_carries_assumptions() {
        let mut table = SymbolTable::new();
        let id = table.fresh("height", SymbolKind::InstanceDummy, Assumptions::POSITIVE);
        let info = table.info(id).unwrap();
        assert_eq!(info.kind, SymbolKind::InstanceDummy);
        assert!(info.assumptions.contains(Assumptions::POSITIVE));
        assert!(table.info(id + 1).is_none());
    }

    #[test]
    fn test_unicode_symbols() {
        let mut table = SymbolTable::new();
        let alpha = table.intern("α");
        let beta = table.intern("β");
        assert_ne!(alpha, beta);
        assert_eq!(table.resolve(alpha), "α");
    }
}

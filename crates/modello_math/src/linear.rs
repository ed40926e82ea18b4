//! Linear splitting of a polynomial in one symbol.

use modello_ast::{free_symbols, Context, ExprId, SymbolId};

use crate::poly::{mono_degree, mono_without, Poly};

/// `poly = coefficient * symbol + rest`, neither part mentioning the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearSplit {
    pub coefficient: Poly,
    pub rest: Poly,
}

/// Whether any atom of `poly` mentions `sym`, directly or inside a
/// function call, root or inverse.
pub fn mentions(ctx: &Context, poly: &Poly, sym: SymbolId) -> bool {
    poly.atoms()
        .into_iter()
        .any(|atom| atom_mentions(ctx, atom, sym))
}

fn atom_mentions(ctx: &Context, atom: ExprId, sym: SymbolId) -> bool {
    ctx.as_symbol(atom) == Some(sym) || free_symbols(ctx, atom).contains(&sym)
}

/// Split `poly` when it is linear in the symbol node `symbol`.
///
/// Returns `None` if `symbol` is not a symbol, does not occur, occurs with
/// another exponent or is buried inside some other atom.
pub fn split_linear(ctx: &Context, poly: &Poly, symbol: ExprId) -> Option<LinearSplit> {
    let sym = ctx.as_symbol(symbol)?;
    let mut coefficient = Poly::zero();
    let mut rest = Poly::zero();
    for (m, c) in poly.terms() {
        if m
            .iter()
            .any(|&(atom, _)| atom != symbol && atom_mentions(ctx, atom, sym))
        {
            return None;
        }
        match mono_degree(m, symbol) {
            0 => rest.add_term(m.clone(), c.clone()),
            1 => coefficient.add_term(mono_without(m, symbol), c.clone()),
            _ => return None,
        }
    }
    if coefficient.is_zero() {
        return None;
    }
    Some(LinearSplit { coefficient, rest })
}

//! Context::stats().nodes_created counts allocations, not lookups.

use modello_ast::{Assumptions, Context, Expr, SymbolKind};

#[test]
fn nodes_created_increments_on_new_var() {
    let mut ctx = Context::new();
    let before = ctx.stats().nodes_created;

    let _x = ctx.var("x");

    assert_eq!(ctx.stats().nodes_created, before + 1);
}

#[test]
fn interned_variable_is_not_counted_twice() {
    let mut ctx = Context::new();
    let first = ctx.var("rate");
    let created = ctx.stats().nodes_created;

    assert_eq!(ctx.var("rate"), first);
    assert_eq!(ctx.stats().nodes_created, created);
}

#[test]
fn nodes_created_increments_for_every_dummy() {
    let mut ctx = Context::new();
    let before = ctx.stats().nodes_created;

    ctx.dummy("a", SymbolKind::InstanceDummy, Assumptions::NONE);
    ctx.dummy("a", SymbolKind::InstanceDummy, Assumptions::NONE);

    assert_eq!(ctx.stats().nodes_created, before + 2);
}

#[test]
fn nodes_created_increments_on_new_expression() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let after_var = ctx.stats().nodes_created;

    let _add = ctx.add(Expr::Add(x, x));

    assert!(ctx.stats().nodes_created > after_var);
}

//! Systems shaped like the constraints of a scalable flow.

use modello_ast::{Context, DisplayExpr, Equation, SymbolId};
use modello_parser::parse;
use modello_solver::{solve_system, SolveError, SolveOptions};

fn build(ctx: &mut Context, lines: &[&str]) -> Vec<Equation> {
    lines
        .iter()
        .map(|line| {
            let (l, r) = line.split_once('=').unwrap();
            Equation::new(parse(l, ctx).unwrap(), parse(r, ctx).unwrap())
        })
        .collect()
}

fn syms(ctx: &mut Context, names: &[&str]) -> Vec<SymbolId> {
    names
        .iter()
        .map(|n| {
            let v = ctx.var(n);
            ctx.as_symbol(v).unwrap()
        })
        .collect()
}

const FLOW: [&str; 4] = [
    "cost = unit_cost * scale",
    "output = unit_output * scale",
    "fulfilment = output / input",
    "unit_output = 2080 / 8760 / entry_time",
];

const NAMES: [&str; 8] = [
    "input",
    "unit_output",
    "unit_cost",
    "scale",
    "cost",
    "output",
    "fulfilment",
    "entry_time",
];

#[test]
fn output_from_scale_and_entry_time() {
    let mut ctx = Context::new();
    let mut lines = FLOW.to_vec();
    lines.extend(["scale = 10", "entry_time = 7"]);
    let eqs = build(&mut ctx, &lines);
    let u = syms(&mut ctx, &NAMES);
    let s = solve_system(&mut ctx, &eqs, &u, &SolveOptions::default()).unwrap();
    let output = s.get(u[5]).unwrap();
    assert_eq!(
        DisplayExpr { context: &ctx, id: output }.to_string(),
        "520/1533"
    );
    // input was never given
    assert!(!s.contains(u[0]));
}

#[test]
fn entry_time_from_required_unit_output() {
    let mut ctx = Context::new();
    let mut lines = FLOW.to_vec();
    lines.extend(["input = 250", "unit_cost = 7", "unit_output = 1", "fulfilment = 1"]);
    let eqs = build(&mut ctx, &lines);
    let u = syms(&mut ctx, &NAMES);
    let s = solve_system(&mut ctx, &eqs, &u, &SolveOptions::default()).unwrap();
    let show = |id| DisplayExpr { context: &ctx, id }.to_string();
    assert_eq!(show(s.get(u[7]).unwrap()), "52/219");
    assert_eq!(show(s.get(u[3]).unwrap()), "250");
    assert_eq!(show(s.get(u[4]).unwrap()), "1750");
}

#[test]
fn pass_limit_is_reported_as_unsupported() {
    let mut ctx = Context::new();
    let eqs = build(&mut ctx, &["x * y = 1", "x + y = 3"]);
    let u = syms(&mut ctx, &["x", "y"]);
    let opts = SolveOptions {
        max_passes: 1,
        ..SolveOptions::default()
    };
    let err = solve_system(&mut ctx, &eqs, &u, &opts).unwrap_err();
    assert!(matches!(err, SolveError::Unsupported { .. }));
}

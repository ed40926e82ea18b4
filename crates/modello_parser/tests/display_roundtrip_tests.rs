//! Rendering an expression and parsing it back gives the same node.

use modello_ast::{Context, DisplayExpr, Expr, ExprId};
use modello_parser::parse;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Shape {
    Num(i64),
    Var(String),
    Add(Box<Shape>, Box<Shape>),
    Sub(Box<Shape>, Box<Shape>),
    Mul(Box<Shape>, Box<Shape>),
    Div(Box<Shape>, Box<Shape>),
    Pow(Box<Shape>, Box<Shape>),
    Neg(Box<Shape>),
    Call(Box<Shape>),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0i64..20).prop_map(Shape::Num),
        "[a-d]".prop_map(Shape::Var),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Add(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Sub(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Mul(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Div(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Pow(Box::new(l), Box::new(r))),
            inner.clone().prop_map(|e| Shape::Neg(Box::new(e))),
            inner.prop_map(|e| Shape::Call(Box::new(e))),
        ]
    })
}

fn build(ctx: &mut Context, shape: &Shape) -> ExprId {
    match shape {
        Shape::Num(n) => ctx.num(*n),
        Shape::Var(v) => ctx.var(v),
        Shape::Add(l, r) => {
            let (l, r) = (build(ctx, l), build(ctx, r));
            ctx.add(Expr::Add(l, r))
        }
        Shape::Sub(l, r) => {
            let (l, r) = (build(ctx, l), build(ctx, r));
            ctx.add(Expr::Sub(l, r))
        }
        Shape::Mul(l, r) => {
            let (l, r) = (build(ctx, l), build(ctx, r));
            ctx.add(Expr::Mul(l, r))
        }
        Shape::Div(l, r) => {
            let (l, r) = (build(ctx, l), build(ctx, r));
            ctx.add(Expr::Div(l, r))
        }
        Shape::Pow(l, r) => {
            let (l, r) = (build(ctx, l), build(ctx, r));
            ctx.add(Expr::Pow(l, r))
        }
        Shape::Neg(e) => {
            let e = build(ctx, e);
            ctx.add(Expr::Neg(e))
        }
        Shape::Call(e) => {
            let e = build(ctx, e);
            ctx.call("f", vec![e])
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rendered_expressions_parse_back(shape in arb_shape()) {
        let mut ctx = Context::new();
        let id = build(&mut ctx, &shape);
        let text = DisplayExpr { context: &ctx, id }.to_string();
        let reparsed = parse(&text, &mut ctx);
        prop_assert!(reparsed.is_ok(), "failed to parse {}", text);
        let reparsed = reparsed.unwrap();
        let again = DisplayExpr { context: &ctx, id: reparsed }.to_string();
        prop_assert_eq!(text, again);
    }
}

//! Building and instantiating models through the builder API.

use std::rc::Rc;

use modello::{ModelBuilder, ModelClass, ModelError, Values};
use modello_ast::{Context, DisplayExpr, Expr, ExprId, SymbolKind};
use modello_math::simplify;
use modello_solver::SolveError;

fn show(ctx: &Context, id: ExprId) -> String {
    DisplayExpr { context: ctx, id }.to_string()
}

fn child(ctx: &mut Context) -> Rc<ModelClass> {
    let mut b = ModelBuilder::new("Child");
    b.dummy(ctx, "a").unwrap();
    b.dummy(ctx, "b").unwrap();
    b.define_str(ctx, "c", "a + b").unwrap();
    b.build(ctx)
}

fn parent(ctx: &mut Context, child: &Rc<ModelClass>) -> Rc<ModelClass> {
    let mut b = ModelBuilder::new("Parent");
    b.nested(ctx, "child", child).unwrap();
    b.dummy(ctx, "d").unwrap();
    b.define_str(ctx, "e", "child.c + d").unwrap();
    b.build(ctx)
}

#[test]
fn unconstrained_attributes_are_bound_dummies() {
    let mut ctx = Context::new();
    let mut b = ModelBuilder::new("Example");
    b.dummy(&mut ctx, "thing").unwrap();
    let class = b.build(&mut ctx);

    let instance = class.instantiate(&mut ctx, "Example", &Values::new()).unwrap();
    let thing = instance.get("thing").unwrap();
    let sym = ctx.as_symbol(thing).unwrap();
    assert_eq!(ctx.symbols().info(sym).map(|i| i.kind), Some(SymbolKind::Bound));
    assert_eq!(show(&ctx, thing), "Example_thing");
    assert_eq!(instance.bound("thing"), Some(sym));

    let one = ctx.num(1);
    let instance = class
        .instantiate(&mut ctx, "Example", &Values::new().set("thing", one))
        .unwrap();
    assert_eq!(instance.get("thing"), Some(one));
}

#[test]
fn instances_do_not_share_bound_dummies() {
    let mut ctx = Context::new();
    let class = child(&mut ctx);
    let first = class.instantiate(&mut ctx, "X", &Values::new()).unwrap();
    let second = class.instantiate(&mut ctx, "X", &Values::new()).unwrap();
    assert_ne!(first.get("a"), second.get("a"));
    assert_eq!(show(&ctx, first.get("c").unwrap()), show(&ctx, second.get("c").unwrap()));
}

#[test]
fn values_are_simplified() {
    let mut ctx = Context::new();
    let class = child(&mut ctx);
    let (two, three) = (ctx.num(2), ctx.num(3));
    let sum = ctx.add(Expr::Add(two, three));
    let instance = class
        .instantiate(&mut ctx, "I", &Values::new().set("a", sum))
        .unwrap();
    assert_eq!(show(&ctx, instance.get("a").unwrap()), "5");
    assert_eq!(show(&ctx, instance.get("c").unwrap()), "I_b + 5");
}

#[test]
fn multiple_inheritance_takes_the_later_base() {
    let mut ctx = Context::new();
    let mut a = ModelBuilder::new("ExampleA");
    a.dummy(&mut ctx, "conflicted").unwrap();
    a.define_str(&mut ctx, "a", "conflicted").unwrap();
    let a = a.build(&mut ctx);

    let mut b = ModelBuilder::new("ExampleB");
    b.dummy(&mut ctx, "conflicted").unwrap();
    b.define_str(&mut ctx, "b", "conflicted").unwrap();
    let b = b.build(&mut ctx);

    let mut c = ModelBuilder::new("ExampleC");
    c.extends(&mut ctx, &a).unwrap();
    c.extends(&mut ctx, &b).unwrap();
    let c = c.build(&mut ctx);

    let instance = c.instantiate(&mut ctx, "Example", &Values::new()).unwrap();
    assert_eq!(instance.get("a"), instance.get("b"));
    assert_eq!(instance.get("a"), instance.get("conflicted"));
    assert_eq!(c.dummy("conflicted"), b.dummy("conflicted"));
    assert_ne!(c.dummy("conflicted"), a.dummy("conflicted"));
}

#[test]
fn bases_sharing_a_nested_model_resolve_to_one_proxy_set() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);

    let mut a = ModelBuilder::new("A");
    a.nested(&mut ctx, "child", &child).unwrap();
    a.define_str(&mut ctx, "x", "child.c").unwrap();
    let a = a.build(&mut ctx);

    let mut b = ModelBuilder::new("B");
    b.nested(&mut ctx, "child", &child).unwrap();
    b.define_str(&mut ctx, "y", "child.a").unwrap();
    let b = b.build(&mut ctx);

    let mut c = ModelBuilder::new("C");
    c.extends(&mut ctx, &a).unwrap();
    c.extends(&mut ctx, &b).unwrap();
    let c = c.build(&mut ctx);

    let (three, four) = (ctx.num(3), ctx.num(4));
    let values = Values::new().nested("child", Values::new().set("a", three).set("b", four));
    let instance = c.instantiate(&mut ctx, "C", &values).unwrap();
    assert_eq!(show(&ctx, instance.get("x").unwrap()), "7");
    assert_eq!(show(&ctx, instance.get("y").unwrap()), "3");
    assert_eq!(show(&ctx, instance.path("child.c").unwrap()), "7");
}

#[test]
fn nested_models_accept_value_maps() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let parent = parent(&mut ctx, &child);
    let (three, four, five) = (ctx.num(3), ctx.num(4), ctx.num(5));
    let values = Values::new()
        .nested("child", Values::new().set("a", three).set("b", four))
        .set("d", five);
    let instance = parent.instantiate(&mut ctx, "P", &values).unwrap();
    assert_eq!(show(&ctx, instance.path("child.c").unwrap()), "7");
    assert_eq!(show(&ctx, instance.get("e").unwrap()), "12");
    assert_eq!(instance.nested("child").unwrap().name(), "P_child");
}

#[test]
fn nested_models_accept_instances() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let (two, three, four) = (ctx.num(2), ctx.num(3), ctx.num(4));
    let c = child
        .instantiate(&mut ctx, "C", &Values::new().set("a", two).set("b", three))
        .unwrap();
    assert_eq!(show(&ctx, c.get("c").unwrap()), "5");

    let parent = parent(&mut ctx, &child);
    let values = Values::new().instance("child", &c).set("d", four);
    let instance = parent.instantiate(&mut ctx, "P", &values).unwrap();
    assert_eq!(show(&ctx, instance.path("child.c").unwrap()), "5");
    assert_eq!(show(&ctx, instance.get("e").unwrap()), "9");
}

#[test]
fn partial_nested_values_stay_consistent() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let mut p = ModelBuilder::new("Parent");
    p.nested(&mut ctx, "child", &child).unwrap();
    p.define_str(&mut ctx, "c_total", "child.c + 1").unwrap();
    let p = p.build(&mut ctx);

    let two = ctx.num(2);
    let mut values = Values::new();
    values.insert_path("child.a", two);
    let instance = p.instantiate(&mut ctx, "P", &values).unwrap();

    let a = instance.path("child.a").unwrap();
    let b = instance.path("child.b").unwrap();
    let c = instance.path("child.c").unwrap();
    assert_eq!(a, two);
    assert_eq!(show(&ctx, b), "P_child_b");

    let sum = ctx.add(Expr::Add(a, b));
    assert_eq!(simplify(&mut ctx, sum), c);
    let one = ctx.num(1);
    let total = ctx.add(Expr::Add(c, one));
    assert_eq!(simplify(&mut ctx, total), instance.get("c_total").unwrap());
}

#[test]
fn flatten_lists_nested_paths() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let parent = parent(&mut ctx, &child);
    let instance = parent.instantiate(&mut ctx, "P", &Values::new()).unwrap();
    let paths: Vec<String> = instance.flatten().into_iter().map(|(p, _)| p).collect();
    assert_eq!(paths, ["d", "e", "child.a", "child.b", "child.c"]);
}

#[test]
fn input_errors() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let parent = parent(&mut ctx, &child);
    let one = ctx.num(1);

    let err = parent
        .instantiate(&mut ctx, "P", &Values::new().set("zzz", one))
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownAttribute {
            model: "Parent".into(),
            attr: "zzz".into()
        }
    );

    let err = parent
        .instantiate(&mut ctx, "P", &Values::new().nested("d", Values::new()))
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::NotNested {
            model: "Parent".into(),
            attr: "d".into()
        }
    );

    let nested_unknown = Values::new().nested("child", Values::new().set("q", one));
    let err = parent.instantiate(&mut ctx, "P", &nested_unknown).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownAttribute {
            model: "Child".into(),
            attr: "q".into()
        }
    );

    // an expression for a nested model is ignored
    let instance = parent
        .instantiate(&mut ctx, "P", &Values::new().set("child", one))
        .unwrap();
    assert_eq!(show(&ctx, instance.path("child.a").unwrap()), "P_child_a");
}

#[test]
fn inconsistent_values_have_no_solution() {
    let mut ctx = Context::new();
    let child = child(&mut ctx);
    let (one, two, five) = (ctx.num(1), ctx.num(2), ctx.num(5));
    let values = Values::new().set("a", one).set("b", two).set("c", five);
    let err = child.instantiate(&mut ctx, "I", &values).unwrap_err();
    match err {
        ModelError::Solve {
            model,
            instance,
            source: SolveError::NoSolution { .. },
        } => {
            assert_eq!(model, "Child");
            assert_eq!(instance, "I");
        }
        other => panic!("expected no solution, got {other:?}"),
    }
}

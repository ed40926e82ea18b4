use criterion::{criterion_group, criterion_main, Criterion};
use modello::{Registry, Values};
use modello_ast::Context;
use std::hint::black_box;

const STREAMING: &str = include_str!("../../../demos/streaming.mdl");
const GEOMETRY: &str = include_str!("../../../demos/geometry.mdl");

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    group.bench_function("streaming_document", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            let mut registry = Registry::new();
            registry.load(&mut ctx, STREAMING).unwrap();
            black_box(registry.len());
        })
    });

    group.finish();
}

fn benchmark_instantiate(c: &mut Criterion) {
    let mut group = c.benchmark_group("instantiate");

    group.bench_function("single_data_entry", |b| {
        let mut ctx = Context::new();
        let mut registry = Registry::new();
        registry.load(&mut ctx, STREAMING).unwrap();
        let class = registry.class("SingleDataEntryFlow").unwrap().clone();
        let (scale, entry_time) = (ctx.num(10), ctx.num(7));
        let values = Values::new()
            .set("scale", scale)
            .set("entry_time", entry_time);
        b.iter(|| black_box(class.instantiate(&mut ctx, "SDE", &values).unwrap()))
    });

    group.bench_function("box_diagonal", |b| {
        let mut ctx = Context::new();
        let mut registry = Registry::new();
        registry.load(&mut ctx, GEOMETRY).unwrap();
        let class = registry.class("Box").unwrap().clone();
        let (three, four, twelve) = (ctx.num(3), ctx.num(4), ctx.num(12));
        let mut values = Values::new().set("height", twelve);
        values.insert_path("base.a", three);
        values.insert_path("base.b", four);
        b.iter(|| black_box(class.instantiate(&mut ctx, "B", &values).unwrap()))
    });

    group.bench_function("unsolved_symbolic", |b| {
        let mut ctx = Context::new();
        let mut registry = Registry::new();
        registry.load(&mut ctx, STREAMING).unwrap();
        let class = registry.class("DoubleDataEntryFlow").unwrap().clone();
        b.iter(|| black_box(class.instantiate(&mut ctx, "DDE", &Values::new()).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_load, benchmark_instantiate);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use errtag_context::Context;
use errtag_wrap::{TaggedError, find_metadata};
use std::io;

fn chain_of(depth: usize) -> Context {
    let mut ctx = Context::background();
    for i in 0..depth {
        ctx = ctx.with_meta([format!("key{i}"), format!("value{i}")]);
    }
    ctx
}

fn bench_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_chain");
    for depth in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &d| {
            b.iter(|| chain_of(black_box(d)))
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let shallow = chain_of(1);
    let deep = chain_of(64);
    let buried = chain_of(8).with_value(0u8).with_value(1u16).with_value(2u32);

    let mut group = c.benchmark_group("extract");
    group.bench_function("shallow", |b| b.iter(|| black_box(&shallow).meta()));
    group.bench_function("deep", |b| b.iter(|| black_box(&deep).meta()));
    group.bench_function("buried_under_typed_bindings", |b| {
        b.iter(|| black_box(&buried).meta())
    });
    group.finish();
}

fn bench_wrap_and_read(c: &mut Criterion) {
    let ctx = chain_of(8);

    let mut group = c.benchmark_group("wrap_read");
    group.bench_function("wrap", |b| {
        b.iter(|| TaggedError::wrap(io::Error::other("boom"), black_box(&ctx)))
    });
    group.bench_function("wrap_with_extras", |b| {
        b.iter(|| {
            TaggedError::wrap_with(
                io::Error::other("boom"),
                black_box(&ctx),
                ["extra", "value"],
            )
        })
    });

    let wrapped = TaggedError::wrap(io::Error::other("boom"), &ctx);
    group.bench_function("find_metadata", |b| {
        b.iter(|| find_metadata(black_box(&wrapped)))
    });
    group.finish();
}

criterion_group!(benches, bench_attach, bench_extract, bench_wrap_and_read);
criterion_main!(benches);

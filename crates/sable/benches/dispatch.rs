// Dispatch benchmarks
//
// Measures the cost of a send through the method cache, the price of a
// cache miss at growing inheritance depth, and selector interning.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sable::{Arity, ClassId, Value, Vm};

fn noop(_: &mut Vm, this: Value, _: &[Value]) -> sable::Result<Value> {
    Ok(this)
}

/// Builds a chain of `depth` subclasses under a root that defines `ping`.
fn class_chain(vm: &mut Vm, depth: usize) -> ClassId {
    let object = vm.core().object;
    let root = vm.define_class("Root", object).unwrap();
    vm.define_method(root, "ping", Arity::Fixed(0), noop);

    (0..depth).fold(root, |parent, i| {
        vm.define_class(&format!("Level{i}"), parent).unwrap()
    })
}

fn bench_cached_send(c: &mut Criterion) {
    let mut vm = Vm::new();
    let leaf = class_chain(&mut vm, 0);
    let obj = vm.instantiate(leaf);
    let ping = vm.intern("ping");
    vm.send_id(obj, ping, &[]).unwrap();

    c.bench_function("cached_send_id", |b| {
        b.iter(|| black_box(vm.send_id(black_box(obj), ping, &[]).unwrap()));
    });

    c.bench_function("cached_send_by_name", |b| {
        b.iter(|| black_box(vm.send(black_box(obj), "ping", &[]).unwrap()));
    });
}

fn bench_send_immediate(c: &mut Criterion) {
    let mut vm = Vm::new();
    let int = vm.core().int;
    vm.define_method(int, "ping", Arity::Fixed(0), noop);

    c.bench_function("send_to_int", |b| {
        b.iter(|| black_box(vm.send(black_box(Value::Int(7)), "ping", &[]).unwrap()));
    });
}

fn bench_uncached_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncached_lookup");

    for depth in [1, 4, 16, 64] {
        let mut vm = Vm::new();
        let leaf = class_chain(&mut vm, depth);
        let obj = vm.instantiate(leaf);
        let ping = vm.intern("ping");

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                vm.class_table().invalidate_cache();
                black_box(vm.send_id(obj, ping, &[]).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_mixin_lookup(c: &mut Criterion) {
    let mut vm = Vm::new();
    let object = vm.core().object;
    let host = vm.define_class("Host", object).unwrap();
    for i in 0..8 {
        let module = vm.define_class(&format!("Mixin{i}"), object).unwrap();
        vm.define_method(module, &format!("from_{i}"), Arity::Fixed(0), noop);
        vm.include_module(host, module).unwrap();
    }
    let obj = vm.instantiate(host);
    let last = vm.intern("from_0");

    c.bench_function("mixin_lookup_uncached", |b| {
        b.iter(|| {
            vm.class_table().invalidate_cache();
            black_box(vm.send_id(obj, last, &[]).unwrap())
        });
    });
}

fn bench_responds_to(c: &mut Criterion) {
    let mut vm = Vm::new();
    let leaf = class_chain(&mut vm, 8);
    let obj = vm.instantiate(leaf);

    c.bench_function("responds_to_hit", |b| {
        b.iter(|| black_box(vm.responds_to(obj, "ping")));
    });
    c.bench_function("responds_to_miss", |b| {
        b.iter(|| black_box(vm.responds_to(obj, "pong")));
    });
}

criterion_group!(
    benches,
    bench_cached_send,
    bench_send_immediate,
    bench_uncached_depth,
    bench_mixin_lookup,
    bench_responds_to
);
criterion_main!(benches);

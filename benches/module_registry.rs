//! Module Registry Benchmarks
//!
//! Run with: cargo bench --bench module_registry

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use botforge::logging::ModuleLoggers;
use botforge::modules::naming::resolve;
use botforge::modules::{discover, register, ModuleLayout, ModuleManifest};
use botforge::routing::{Dispatcher, HandlerDef, RouterDef};

/// `roots` root modules with `children` children each.
fn manifest(roots: usize, children: usize) -> ModuleManifest {
    let mut manifest = ModuleManifest::new();
    for r in 0..roots {
        let root = format!("root{}", r);
        manifest.register(
            &format!("pkg.{}", root),
            json!({ "SERVICE_NAME": root }),
            RouterDef {
                name: root.clone(),
                handlers: vec![],
            },
        );
        for c in 0..children {
            let name = format!("{}.childes.child{}", root, c);
            manifest.register(
                &format!("pkg.{}", name),
                json!({ "SERVICE_NAME": name }),
                RouterDef {
                    name: name.clone(),
                    handlers: vec![HandlerDef {
                        command: None,
                        text: Some(name.clone()),
                        reply: "ok".to_string(),
                    }],
                },
            );
        }
    }
    manifest
}

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("naming");
    group.throughput(Throughput::Elements(1));

    group.bench_function("resolve_root", |b| {
        b.iter(|| resolve(black_box("pkg.video.settings"), "pkg", "childes"));
    });

    group.bench_function("resolve_grandchild", |b| {
        b.iter(|| {
            resolve(
                black_box("pkg.video.childes.create.childes.data.settings"),
                "pkg",
                "childes",
            )
        });
    });

    group.finish();
}

fn benchmark_discover_and_register(c: &mut Criterion) {
    let layout = ModuleLayout::new(".", "pkg");
    let logs = ModuleLoggers::console("bench");

    let mut group = c.benchmark_group("discover_register");
    for roots in [10usize, 50, 200] {
        let manifest = manifest(roots, 4);
        group.throughput(Throughput::Elements((roots * 5) as u64));

        group.bench_with_input(BenchmarkId::new("discover", roots), &manifest, |b, m| {
            b.iter(|| discover(black_box(m), &layout).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("register", roots), &manifest, |b, m| {
            b.iter(|| {
                // Routers attach once, so every iteration needs fresh units
                let modules = discover(m, &layout).unwrap();
                let dispatcher = Dispatcher::new("main");
                register(&dispatcher, &modules, &logs)
            });
        });
    }
    group.finish();
}

fn benchmark_dispatch(c: &mut Criterion) {
    let layout = ModuleLayout::new(".", "pkg");
    let logs = ModuleLoggers::console("bench");
    let modules = discover(&manifest(50, 4), &layout).unwrap();
    let dispatcher = Dispatcher::new("main");
    register(&dispatcher, &modules, &logs);

    c.bench_function("dispatch_last_child", |b| {
        b.iter(|| dispatcher.dispatch(black_box("root49.childes.child3")));
    });
}

criterion_group!(
    benches,
    benchmark_resolve,
    benchmark_discover_and_register,
    benchmark_dispatch
);
criterion_main!(benches);

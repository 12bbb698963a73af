//! Benchmarks for the hot paths of the object space.
//!
//! - Sends: cached dispatch tables versus chain walking
//! - Super: chained `super` calls through deep hierarchies
//! - Constants: cached lexical and qualified lookups
//! - Topology: late includes that re-splice many targets
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use std::hint::black_box;

use corundum::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print total time per top-level profiled scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: HashMap<String, i64> = HashMap::new();
    for frame in view.recent_frames() {
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                        *timings.entry(details.name().to_string()).or_insert(0) +=
                            scope.record.duration_ns;
                    }
                }
            }
        }
    }

    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    println!("\n=== Profiling Summary ===");
    for (name, ns) in entries {
        println!(
            "  {:30} {:>10.2?}",
            name,
            std::time::Duration::from_nanos(ns as u64)
        );
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

/// A class hierarchy `depth` levels deep, every level including one module,
/// with `method` defined only on the root class.
fn deep_hierarchy(config: SpaceConfig, depth: usize) -> (ObjectSpace, TypeId) {
    let mut space = ObjectSpace::with_config(config);
    let object = space.builtins().object;
    let mut parent = None;
    let mut leaf = object;
    for level in 0..depth {
        let class = space
            .define_class(object, &format!("Level{level}"), parent)
            .unwrap();
        let module = space
            .define_module(object, &format!("Mixin{level}"))
            .unwrap();
        space.include(module, class).unwrap();
        if level == 0 {
            space.define_method(class, "method", NativeMethod::constant(Value::Int(1)));
        }
        parent = Some(class);
        leaf = class;
    }
    (space, leaf)
}

fn send_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("dispatch/send");

    for depth in [4, 16, 64] {
        for (label, tables) in [("table", true), ("walk", false)] {
            let config = SpaceConfig::new().with_dispatch_tables(tables);
            let (mut space, leaf) = deep_hierarchy(config, depth);
            let instance = space.instantiate(leaf, vec![]).unwrap();

            group.throughput(Throughput::Elements(1));
            group.bench_with_input(BenchmarkId::new(label, depth), &depth, |b, _| {
                b.iter(|| {
                    let result = space.send(black_box(&instance), "method", vec![]).unwrap();
                    end_profiling_frame();
                    black_box(result)
                });
            });
        }
    }

    group.finish();
    print_profiling_stats();
}

fn super_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/super");

    for depth in [4, 16, 64] {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let mut parent = None;
        let mut leaf = object;
        for level in 0..depth {
            let class = space
                .define_class(object, &format!("Level{level}"), parent)
                .unwrap();
            let body = if level == 0 {
                NativeMethod::constant(Value::Int(0))
            } else {
                NativeMethod::new(|space, inv| {
                    let below = space.call_super(inv, vec![])?;
                    Ok(Value::Int(below.as_int().unwrap_or_default() + 1))
                })
            };
            space.define_method(class, "depth", body);
            parent = Some(class);
            leaf = class;
        }
        let instance = space.instantiate(leaf, vec![]).unwrap();

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("chain", depth), &depth, |b, _| {
            b.iter(|| {
                let result = space.send(&instance, "depth", vec![]).unwrap();
                black_box(result)
            });
        });
    }

    group.finish();
}

fn constant_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("constants");

    let mut space = ObjectSpace::new();
    let object = space.builtins().object;
    let outer = space.define_module(object, "Outer").unwrap();
    let middle = space.define_module(outer, "Middle").unwrap();
    let inner = space.define_class(middle, "Inner", None).unwrap();
    space.const_set(object, "TOP", Value::Int(1)).unwrap();
    let nesting = Nesting::new([inner, middle, outer]);

    group.bench_function("relative_cached", |b| {
        b.iter(|| {
            let found = space.resolve_relative(black_box(&nesting), "TOP");
            black_box(found)
        });
    });
    group.bench_function("qualified_cached", |b| {
        b.iter(|| black_box(space.resolve_qualified(inner, "TOP")));
    });
    group.bench_function("relative_after_mutation", |b| {
        b.iter(|| {
            space.const_set(outer, "SCRATCH", Value::Nil).unwrap();
            black_box(space.resolve_relative(&nesting, "TOP"))
        });
    });

    group.finish();
}

fn topology_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");

    for targets in [8, 64] {
        group.bench_with_input(
            BenchmarkId::new("late_include", targets),
            &targets,
            |b, &targets| {
                b.iter(|| {
                    let mut space = ObjectSpace::new();
                    let object = space.builtins().object;
                    let shared = space.define_module(object, "Shared").unwrap();
                    for i in 0..targets {
                        let class = space.define_class(object, &format!("T{i}"), None).unwrap();
                        space.include(shared, class).unwrap();
                    }
                    let late = space.define_module(object, "Late").unwrap();
                    space.include(late, shared).unwrap();
                    black_box(space.stats())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    send_benchmarks,
    super_benchmarks,
    constant_benchmarks,
    topology_benchmarks
);

criterion_main!(benches);

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use refuge_core::position::Position;
use refuge_core::replenish::StepOutcome;
use refuge_core::world::{Actor, Collider, ColliderCategory, FlatWorld};
use refuge_core::{SpawnConfig, SpawnSelector};

/// A flat world with a grid of colliders and actors so the dynamic stage has
/// real proximity work to do.
fn populated_world(half_extent: f64, spacing: f64) -> FlatWorld {
    let mut world = FlatWorld::new(half_extent);
    let steps = (half_extent * 2.0 / spacing) as i32;
    for ix in 0..steps {
        for iz in 0..steps {
            let x = -half_extent + f64::from(ix) * spacing;
            let z = -half_extent + f64::from(iz) * spacing;
            if (ix + iz) % 2 == 0 {
                world.colliders.push(Collider {
                    position: Position::new(x, 4.0, z),
                    category: ColliderCategory::MediumVehicle,
                });
            } else {
                world.actors.push(Actor {
                    position: Position::new(x, 4.0, z),
                    sleeping: (ix % 3) == 0,
                });
            }
        }
    }
    world
}

fn selector(attempts_per_pass: u32, batch_size: u32) -> SpawnSelector<FlatWorld> {
    let mut config = SpawnConfig::default();
    config.replenish.attempts_per_pass = attempts_per_pass;
    config.replenish.batch_size = batch_size;
    config.replenish.low_water_mark = 0;
    SpawnSelector::seeded(populated_world(500.0, 50.0), config, 0)
        .expect("default config is valid")
}

// ── Replenishment ───────────────────────────────────────────────────────────

fn bench_replenish_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("replenish_pass");
    group.throughput(criterion::Throughput::Elements(2000));
    for batch_size in [20, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("batch_{batch_size}")),
            &batch_size,
            |b, &batch| {
                b.iter(|| {
                    let mut selector = selector(2000, batch);
                    selector.trigger_replenishment();
                    while matches!(selector.tick(), StepOutcome::Yielded { .. }) {}
                    black_box(selector.cache().len())
                });
            },
        );
    }
    group.finish();
}

// ── Requests ────────────────────────────────────────────────────────────────

fn bench_request_position(c: &mut Criterion) {
    c.bench_function("request_position", |b| {
        let mut selector = selector(20_000, 20_000);
        selector.start();
        selector.tick();

        b.iter(|| {
            if selector.cache().len() < 1000 {
                selector.trigger_replenishment();
                selector.tick();
            }
            black_box(selector.request_position())
        });
    });
}

criterion_group!(benches, bench_replenish_pass, bench_request_position);
criterion_main!(benches);

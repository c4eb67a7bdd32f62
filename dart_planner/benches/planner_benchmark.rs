//! Planner hot-path micro-benchmark: a single `plan()` solve from a cold
//! warm-start and from a consecutive (already warm-started) call.

use criterion::{criterion_group, criterion_main, Criterion};

use dart_common::config::PlannerConfig;
use dart_common::state::DroneState;
use dart_planner::Planner;
use dart_units::{Enu, Vec3};

fn bench_cold_solve(c: &mut Criterion) {
    let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let goal = Vec3::<Enu>::new(5.0, 2.0, 6.0);

    c.bench_function("planner_plan_cold", |b| {
        b.iter(|| {
            let mut planner = Planner::<Enu>::new(PlannerConfig::default(), 1.5);
            planner.plan(&state, goal, &[])
        });
    });
}

fn bench_warm_solve(c: &mut Criterion) {
    let mut planner = Planner::<Enu>::new(PlannerConfig::default(), 1.5);
    let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let goal = Vec3::<Enu>::new(5.0, 2.0, 6.0);
    let _ = planner.plan(&state, goal, &[]);

    c.bench_function("planner_plan_warm", |b| {
        b.iter(|| planner.plan(&state, goal, &[]));
    });
}

criterion_group!(benches, bench_cold_solve, bench_warm_solve);
criterion_main!(benches);

//! Performance benchmarks for dispatch_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::demand::DemandModel;
use dispatch_core::matching::{choose_best_agent, AgentCandidate, AssignmentPolicy};
use dispatch_core::test_helpers::GridNetwork;
use dispatch_core::{
    AvailabilityChange, CruisingPolicy, EngineConfig, FleetEngine, RegionIndex, ResourceNotice,
};

fn engine_with_idle_agents(grid: GridNetwork, agents: u64) -> FleetEngine {
    let config = EngineConfig::default().with_rng_seed(42);
    let regions = RegionIndex::from_intersections(config.resolution, grid.intersections());
    let mut engine = FleetEngine::new(Box::new(grid), regions, DemandModel::default(), config);
    for agent in 0..agents {
        let col = agent % 19;
        let location = grid.location(
            grid.intersection(agent % 20, col),
            grid.intersection(agent % 20, col + 1),
        );
        engine.on_agent_introduced(agent, location, 0);
    }
    engine
}

fn bench_assignment_scan(c: &mut Criterion) {
    let grid = GridNetwork::new(20, 20, 60);
    let pickup = grid.location(grid.intersection(10, 10), grid.intersection(10, 11));

    let mut group = c.benchmark_group("assignment_scan");
    for agents in [50u64, 200, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(agents), &agents, |b, &agents| {
            b.iter_batched(
                || engine_with_idle_agents(grid, agents),
                |mut engine| {
                    black_box(engine.on_resource_availability_change(
                        ResourceNotice {
                            id: 1,
                            pickup,
                            dropoff: pickup,
                            available_at: 0,
                            expires_at: 100_000,
                        },
                        AvailabilityChange::Available,
                        0,
                    ));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_cruise_planning(c: &mut Criterion) {
    let grid = GridNetwork::new(20, 20, 60);

    let mut group = c.benchmark_group("cruise_planning");
    for policy in [
        CruisingPolicy::Random,
        CruisingPolicy::StaticFrequency,
        CruisingPolicy::TemporalFrequency,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{policy:?}")),
            &policy,
            |b, &policy| {
                let config = EngineConfig::default()
                    .with_cruising_policy(policy)
                    .with_rng_seed(42);
                let regions =
                    RegionIndex::from_intersections(config.resolution, grid.intersections());
                let mut engine =
                    FleetEngine::new(Box::new(grid), regions, DemandModel::default(), config);
                engine.on_agent_introduced(
                    1,
                    grid.location(grid.intersection(10, 10), grid.intersection(10, 11)),
                    0,
                );
                let mut time = 0u64;
                b.iter(|| {
                    time += 60;
                    let location = engine
                        .agent_location(1, time)
                        .expect("agent was introduced");
                    black_box(engine.on_reach_intersection(1, time, location));
                });
            },
        );
    }
    group.finish();
}

fn bench_candidate_selection(c: &mut Criterion) {
    let candidates: Vec<AgentCandidate> = (0..1_000u64)
        .map(|agent_id| AgentCandidate {
            agent_id,
            arrival: 100 + (agent_id * 37) % 5_000,
            completed_trips: agent_id % 11,
        })
        .collect();

    let mut group = c.benchmark_group("candidate_selection");
    for policy in [AssignmentPolicy::Nearest, AssignmentPolicy::Fair] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{policy:?}")),
            &policy,
            |b, &policy| {
                b.iter(|| black_box(choose_best_agent(&candidates, policy, 100_000)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_assignment_scan,
    bench_cruise_planning,
    bench_candidate_selection
);
criterion_main!(benches);

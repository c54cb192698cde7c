//! Parallel parameter sweeps over policies and seeds.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use dispatch_core::{AssignmentPolicy, CruisingPolicy};

use crate::harness::{ScenarioConfig, SimulationHarness};
use crate::metrics::{extract_metrics, RunMetrics};

/// One point of the sweep grid: a complete scenario.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SweepPoint {
    pub scenario: ScenarioConfig,
}

/// Cartesian product of assignment policies, cruising policies, and seeds
/// over a base scenario.
pub fn policy_seed_grid(
    base: ScenarioConfig,
    assignment_policies: &[AssignmentPolicy],
    cruising_policies: &[CruisingPolicy],
    seeds: &[u64],
) -> Vec<SweepPoint> {
    let mut points = Vec::with_capacity(
        assignment_policies.len() * cruising_policies.len() * seeds.len(),
    );
    for &assignment in assignment_policies {
        for &cruising in cruising_policies {
            for &seed in seeds {
                let mut scenario = base;
                scenario.engine = scenario
                    .engine
                    .with_assignment_policy(assignment)
                    .with_cruising_policy(cruising)
                    .with_rng_seed(seed);
                points.push(SweepPoint { scenario });
            }
        }
    }
    points
}

/// Run one sweep point to completion and extract its metrics.
pub fn run_point(point: &SweepPoint, until: u64) -> RunMetrics {
    let mut harness = SimulationHarness::from_scenario(point.scenario);
    harness.run(until);
    extract_metrics(harness.engine().telemetry())
}

/// Run every point in parallel. Results come back in input order.
pub fn run_sweep(points: &[SweepPoint], until: u64) -> Vec<RunMetrics> {
    run_sweep_with_progress(points, until, false)
}

/// Run every point in parallel, optionally with a progress bar.
pub fn run_sweep_with_progress(
    points: &[SweepPoint],
    until: u64,
    show_progress: bool,
) -> Vec<RunMetrics> {
    let bar = if show_progress && !points.is_empty() {
        let bar = ProgressBar::new(points.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    } else {
        None
    };

    let results = points
        .par_iter()
        .map(|point| {
            let result = run_point(point, until);
            if let Some(ref bar) = bar {
                bar.inc(1);
            }
            result
        })
        .collect();

    if let Some(ref bar) = bar {
        bar.finish_with_message("done");
    }
    results
}

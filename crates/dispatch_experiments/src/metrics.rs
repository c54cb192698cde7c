//! Metrics extraction from completed harness runs.

use dispatch_core::telemetry::DispatchTelemetry;

/// Aggregated metrics from a single run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunMetrics {
    pub total_assignments: u64,
    pub completed_trips: usize,
    pub expired_resources: u64,
    /// Completions / (completions + expirations).
    pub service_rate: f64,
    pub avg_wait_secs: f64,
    pub median_wait_secs: f64,
    pub p90_wait_secs: f64,
    pub avg_trip_secs: f64,
}

impl RunMetrics {
    /// (average, median, p90) of a sample; zeros for an empty sample.
    fn calculate_stats(values: &[u64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) as f64 / 2.0
        } else {
            sorted[sorted.len() / 2] as f64
        };
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)] as f64;

        (avg, median, p90)
    }
}

/// Reduce accumulated telemetry to run-level metrics.
pub fn extract_metrics(telemetry: &DispatchTelemetry) -> RunMetrics {
    let waits: Vec<u64> = telemetry
        .completed_trips
        .iter()
        .map(|trip| trip.wait_time)
        .collect();
    let trips: Vec<u64> = telemetry
        .completed_trips
        .iter()
        .map(|trip| trip.trip_time)
        .collect();

    let (avg_wait, median_wait, p90_wait) = RunMetrics::calculate_stats(&waits);
    let (avg_trip, _, _) = RunMetrics::calculate_stats(&trips);

    let resolved = telemetry.completed_trips.len() as u64 + telemetry.expired_resources;
    let service_rate = if resolved > 0 {
        telemetry.completed_trips.len() as f64 / resolved as f64
    } else {
        0.0
    };

    RunMetrics {
        total_assignments: telemetry.total_assignments,
        completed_trips: telemetry.completed_trips.len(),
        expired_resources: telemetry.expired_resources,
        service_rate,
        avg_wait_secs: avg_wait,
        median_wait_secs: median_wait,
        p90_wait_secs: p90_wait,
        avg_trip_secs: avg_trip,
    }
}

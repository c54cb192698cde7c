//! Result export to CSV and JSON.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use crate::metrics::RunMetrics;
use crate::sweep::SweepPoint;

/// Write one row per sweep point with its metrics.
pub fn export_to_csv(
    path: &Path,
    points: &[SweepPoint],
    results: &[RunMetrics],
) -> Result<(), Box<dyn Error>> {
    if points.len() != results.len() {
        return Err(format!(
            "points length ({}) doesn't match results length ({})",
            points.len(),
            results.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    wtr.write_record([
        "seed",
        "assignment_policy",
        "cruising_policy",
        "agents",
        "requests",
        "total_assignments",
        "completed_trips",
        "expired_resources",
        "service_rate",
        "avg_wait_secs",
        "median_wait_secs",
        "p90_wait_secs",
        "avg_trip_secs",
    ])?;

    for (point, result) in points.iter().zip(results.iter()) {
        wtr.write_record([
            &point.scenario.engine.rng_seed.to_string(),
            &format!("{:?}", point.scenario.engine.assignment_policy),
            &format!("{:?}", point.scenario.engine.cruising_policy),
            &point.scenario.agents.to_string(),
            &point.scenario.requests.to_string(),
            &result.total_assignments.to_string(),
            &result.completed_trips.to_string(),
            &result.expired_resources.to_string(),
            &result.service_rate.to_string(),
            &result.avg_wait_secs.to_string(),
            &result.median_wait_secs.to_string(),
            &result.p90_wait_secs.to_string(),
            &result.avg_trip_secs.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write points and metrics as one JSON document.
pub fn export_to_json(
    path: &Path,
    points: &[SweepPoint],
    results: &[RunMetrics],
) -> Result<(), Box<dyn Error>> {
    if points.len() != results.len() {
        return Err(format!(
            "points length ({}) doesn't match results length ({})",
            points.len(),
            results.len()
        )
        .into());
    }

    let rows: Vec<serde_json::Value> = points
        .iter()
        .zip(results.iter())
        .map(|(point, result)| {
            serde_json::json!({
                "point": point,
                "metrics": result,
            })
        })
        .collect();

    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::SweepPoint;
    use dispatch_core::EngineConfig;

    fn sample() -> (Vec<SweepPoint>, Vec<RunMetrics>) {
        let point = SweepPoint {
            scenario: crate::harness::ScenarioConfig {
                engine: EngineConfig::default().with_rng_seed(5),
                ..Default::default()
            },
        };
        let metrics = RunMetrics {
            total_assignments: 10,
            completed_trips: 8,
            expired_resources: 2,
            service_rate: 0.8,
            avg_wait_secs: 120.0,
            median_wait_secs: 100.0,
            p90_wait_secs: 300.0,
            avg_trip_secs: 400.0,
        };
        (vec![point], vec![metrics])
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("results.csv");
        let (points, results) = sample();
        export_to_csv(&path, &points, &results).expect("csv export");

        let content = std::fs::read_to_string(&path).expect("read csv");
        let mut lines = content.lines();
        assert!(lines.next().expect("header").starts_with("seed,"));
        let row = lines.next().expect("one data row");
        assert!(row.contains("Nearest"));
        assert!(row.contains("0.8"));
    }

    #[test]
    fn json_export_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("results.json");
        let (points, results) = sample();
        export_to_json(&path, &points, &results).expect("json export");

        let content = std::fs::read_to_string(&path).expect("read json");
        let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid json");
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
        assert_eq!(parsed[0]["metrics"]["completed_trips"], 8);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("results.csv");
        let (points, _) = sample();
        assert!(export_to_csv(&path, &points, &[]).is_err());
    }
}

//! Per-region demand weights used to bias cruising destinations.
//!
//! Two weight sources are supported, mirroring the data the platform is fed:
//!
//! - **Static frequency**: one scalar per region, loaded once. Absent regions
//!   resolve to weight 1 and are recorded for diagnostics, never failed.
//! - **Temporal prediction**: per region, predicted pickups and drop-offs
//!   sampled on a fixed time grid. The weight at time `t` is an exponentially
//!   decayed look-ahead of net demand, floored at 1.
//!
//! Input parsing is tolerant: malformed lines are skipped and counted, excess
//! matrix columns are truncated.

use std::collections::{BTreeSet, HashMap};

use h3o::CellIndex;

/// Decay base applied per look-ahead bucket.
const DECAY: f64 = 0.8;
/// Weight applied to predicted drop-offs when netting against pickups.
const DROPOFF_LAMBDA: f64 = 0.8;

/// Maps wall-clock simulation time to a prediction bucket index.
#[derive(Debug, Clone, Copy)]
pub struct TimeGrid {
    /// Simulation time corresponding to bucket 0.
    pub epoch: u64,
    /// Bucket width in simulation seconds.
    pub bucket_secs: u64,
}

impl TimeGrid {
    pub fn index_of(&self, time: u64) -> usize {
        if self.bucket_secs == 0 {
            return 0;
        }
        (time.saturating_sub(self.epoch) / self.bucket_secs) as usize
    }
}

/// Static region→weight table.
#[derive(Debug, Default)]
pub struct StaticDemand {
    weights: HashMap<CellIndex, f64>,
    /// Regions that were looked up but never loaded. Diagnostics only.
    unresolved: BTreeSet<CellIndex>,
    skipped_lines: usize,
}

impl StaticDemand {
    pub fn new(weights: HashMap<CellIndex, f64>) -> Self {
        Self {
            weights,
            unresolved: BTreeSet::new(),
            skipped_lines: 0,
        }
    }

    /// Parse `"<regionId>:<weight>"` lines. Malformed lines are skipped and
    /// counted, never fatal.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut weights = HashMap::new();
        let mut skipped_lines = 0;
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parsed = line.split_once(':').and_then(|(region, weight)| {
                let cell = region.trim().parse::<CellIndex>().ok()?;
                let weight = weight.trim().parse::<f64>().ok()?;
                Some((cell, weight))
            });
            match parsed {
                Some((cell, weight)) => {
                    weights.insert(cell, weight.max(0.0));
                }
                None => skipped_lines += 1,
            }
        }
        Self {
            weights,
            unresolved: BTreeSet::new(),
            skipped_lines,
        }
    }

    /// Weight for one region. Absent regions yield 1 and are recorded.
    pub fn weight(&mut self, cell: CellIndex) -> f64 {
        match self.weights.get(&cell) {
            Some(&weight) => weight,
            None => {
                self.unresolved.insert(cell);
                1.0
            }
        }
    }

    pub fn unresolved_regions(&self) -> &BTreeSet<CellIndex> {
        &self.unresolved
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Time-indexed prediction series per region.
#[derive(Debug)]
pub struct TemporalDemand {
    pickups: HashMap<CellIndex, Vec<i64>>,
    dropoffs: HashMap<CellIndex, Vec<i64>>,
    grid: TimeGrid,
    /// Number of look-ahead buckets (horizon / interval).
    horizon_buckets: usize,
    unresolved: BTreeSet<CellIndex>,
    truncated_columns: usize,
}

impl TemporalDemand {
    /// Build from two region×bucket matrices: one row per time bucket, one
    /// column per region in `regions` order. Rows wider than the region list
    /// are truncated (the excess is counted); short rows simply contribute
    /// fewer samples.
    pub fn from_matrices(
        regions: &[CellIndex],
        pickup_rows: &[Vec<i64>],
        dropoff_rows: &[Vec<i64>],
        grid: TimeGrid,
        horizon_buckets: usize,
    ) -> Self {
        let mut truncated_columns = 0;
        let pickups = Self::series_from_rows(regions, pickup_rows, &mut truncated_columns);
        let dropoffs = Self::series_from_rows(regions, dropoff_rows, &mut truncated_columns);
        Self {
            pickups,
            dropoffs,
            grid,
            horizon_buckets: horizon_buckets.max(1),
            unresolved: BTreeSet::new(),
            truncated_columns,
        }
    }

    fn series_from_rows(
        regions: &[CellIndex],
        rows: &[Vec<i64>],
        truncated_columns: &mut usize,
    ) -> HashMap<CellIndex, Vec<i64>> {
        let mut series: HashMap<CellIndex, Vec<i64>> =
            regions.iter().map(|cell| (*cell, Vec::new())).collect();
        for row in rows {
            if row.len() > regions.len() {
                *truncated_columns += row.len() - regions.len();
            }
            for (column, value) in row.iter().enumerate().take(regions.len()) {
                if let Some(samples) = series.get_mut(&regions[column]) {
                    samples.push(*value);
                }
            }
        }
        series
    }

    /// Decayed look-ahead net demand:
    /// `1 + Σ_{i=idx(t)}^{idx(t)+K-1} 0.8^(i-idx(t)) · (pickups[i] − λ·dropoffs[i])`,
    /// floored at 1 when negative or when either series is missing.
    pub fn weight(&mut self, cell: CellIndex, time: u64) -> f64 {
        let (pickups, dropoffs) = match (self.pickups.get(&cell), self.dropoffs.get(&cell)) {
            (Some(pickups), Some(dropoffs)) => (pickups, dropoffs),
            _ => {
                self.unresolved.insert(cell);
                return 1.0;
            }
        };
        let start = self.grid.index_of(time);
        let mut weight = 1.0;
        for i in start..start + self.horizon_buckets {
            if i >= pickups.len() {
                break;
            }
            let pickup = pickups[i] as f64;
            let dropoff = dropoffs.get(i).copied().unwrap_or(0) as f64;
            weight += DECAY.powi((i - start) as i32) * (pickup - DROPOFF_LAMBDA * dropoff);
        }
        if weight < 0.0 {
            1.0
        } else {
            weight
        }
    }

    pub fn unresolved_regions(&self) -> &BTreeSet<CellIndex> {
        &self.unresolved
    }

    pub fn truncated_columns(&self) -> usize {
        self.truncated_columns
    }
}

/// Parse one region id per line; malformed lines are skipped and counted.
pub fn parse_region_list<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> (Vec<CellIndex>, usize) {
    let mut regions = Vec::new();
    let mut skipped = 0;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<CellIndex>() {
            Ok(cell) => regions.push(cell),
            Err(_) => skipped += 1,
        }
    }
    (regions, skipped)
}

/// Demand weights available to the cruising router. Both sources can be
/// loaded side by side; which one a lookup consults is the router's choice.
#[derive(Debug, Default)]
pub struct DemandModel {
    statics: StaticDemand,
    temporal: Option<TemporalDemand>,
}

impl DemandModel {
    pub fn with_static(mut self, statics: StaticDemand) -> Self {
        self.statics = statics;
        self
    }

    pub fn with_temporal(mut self, temporal: TemporalDemand) -> Self {
        self.temporal = Some(temporal);
        self
    }

    /// Static frequency weight; 1 for unknown regions.
    pub fn static_weight(&mut self, cell: CellIndex) -> f64 {
        self.statics.weight(cell)
    }

    /// Temporal prediction weight; 1 when no temporal data was loaded.
    pub fn temporal_weight(&mut self, cell: CellIndex, time: u64) -> f64 {
        match self.temporal.as_mut() {
            Some(temporal) => temporal.weight(cell, time),
            None => 1.0,
        }
    }

    pub fn static_unresolved(&self) -> &BTreeSet<CellIndex> {
        self.statics.unresolved_regions()
    }
}

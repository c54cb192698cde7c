//! Hexagonal region index over road-network intersections.
//!
//! The map is partitioned into H3 cells at a fixed resolution. Every
//! intersection is inserted once at startup; the index is immutable afterwards.
//! Lookups never fail hard: an unindexed cell resolves through an escalating
//! ring search, and undefined inter-cell distances fall back to 1.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use h3o::{CellIndex, LatLng, Resolution};
use lru::LruCache;

use crate::network::{IntersectionId, LocationOnRoad};

/// Capacity of the inter-cell topological distance cache.
const DISTANCE_CACHE_CAPACITY: usize = 50_000;

#[derive(Debug)]
pub struct RegionIndex {
    resolution: Resolution,
    intersections_by_cell: HashMap<CellIndex, Vec<IntersectionId>>,
    all_intersections: Vec<IntersectionId>,
    /// Intersections whose coordinates could not be resolved to a cell.
    skipped_intersections: usize,
    distance_cache: Mutex<LruCache<(CellIndex, CellIndex), i32>>,
}

impl RegionIndex {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            intersections_by_cell: HashMap::new(),
            all_intersections: Vec::new(),
            skipped_intersections: 0,
            distance_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(DISTANCE_CACHE_CAPACITY).expect("cache size must be non-zero"),
            )),
        }
    }

    /// Build the index from `(intersection, lat, lng)` triples.
    pub fn from_intersections(
        resolution: Resolution,
        intersections: impl IntoIterator<Item = (IntersectionId, f64, f64)>,
    ) -> Self {
        let mut index = Self::new(resolution);
        for (id, lat, lng) in intersections {
            index.insert(id, lat, lng);
        }
        index
    }

    /// Insert one intersection. Regions are discovered lazily; the index never
    /// removes a region once created.
    pub fn insert(&mut self, id: IntersectionId, lat: f64, lng: f64) {
        match self.cell_of(lat, lng) {
            Some(cell) => {
                self.intersections_by_cell.entry(cell).or_default().push(id);
                self.all_intersections.push(id);
            }
            None => self.skipped_intersections += 1,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn cell_of(&self, lat: f64, lng: f64) -> Option<CellIndex> {
        LatLng::new(lat, lng)
            .ok()
            .map(|ll| ll.to_cell(self.resolution))
    }

    pub fn cell_of_location(&self, location: LocationOnRoad) -> Option<CellIndex> {
        location.cell(self.resolution)
    }

    /// Whether any intersection was indexed into this cell.
    pub fn contains(&self, cell: CellIndex) -> bool {
        self.intersections_by_cell.contains_key(&cell)
    }

    /// Intersections indexed into `cell`; empty slice for unknown cells.
    pub fn intersections(&self, cell: CellIndex) -> &[IntersectionId] {
        self.intersections_by_cell
            .get(&cell)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every indexed intersection, in insertion order.
    pub fn all_intersections(&self) -> &[IntersectionId] {
        &self.all_intersections
    }

    pub fn region_count(&self) -> usize {
        self.intersections_by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections_by_cell.is_empty()
    }

    pub fn skipped_intersections(&self) -> usize {
        self.skipped_intersections
    }

    /// Cells at exact topological distance `k` from `cell`.
    pub fn ring(&self, cell: CellIndex, k: u32) -> Vec<CellIndex> {
        cell.grid_disk_distances::<Vec<_>>(k)
            .into_iter()
            .filter_map(|(candidate, distance)| (distance == k).then_some(candidate))
            .collect()
    }

    /// Topological (grid) distance between two cells, LRU-cached. `None` when
    /// the distance is undefined (e.g. across pentagon distortions).
    pub fn topological_distance(&self, a: CellIndex, b: CellIndex) -> Option<i32> {
        let key = if a < b { (a, b) } else { (b, a) };
        let mut cache = match self.distance_cache.lock() {
            Ok(guard) => guard,
            Err(_) => return key.0.grid_distance(key.1).ok(),
        };
        if let Some(&distance) = cache.get(&key) {
            return Some(distance);
        }
        let distance = key.0.grid_distance(key.1).ok()?;
        cache.put(key, distance);
        Some(distance)
    }

    /// Indexed candidate regions around `cell`, excluding `cell` itself.
    ///
    /// The 1-ring is tried first. When it holds no indexed region the search
    /// radius escalates through 2, 6, 18, … (`radius += 2 * radius`) until a
    /// candidate is found, which is guaranteed to terminate as long as at
    /// least one intersection was indexed anywhere. The result is sorted for
    /// deterministic iteration.
    pub fn indexed_candidates_near(&self, cell: CellIndex) -> Vec<CellIndex> {
        let mut found: Vec<CellIndex> = cell
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .filter(|candidate| *candidate != cell && self.contains(*candidate))
            .collect();

        if found.is_empty() {
            if self.is_empty() {
                return Vec::new();
            }
            // When the agent's own region is the only one indexed anywhere,
            // escalation can never find another cell: the own region is the
            // candidate then.
            if self.region_count() == 1 && self.contains(cell) {
                return vec![cell];
            }
            let mut radius = 2u32;
            loop {
                found = cell
                    .grid_disk::<Vec<_>>(radius)
                    .into_iter()
                    .filter(|candidate| *candidate != cell && self.contains(*candidate))
                    .collect();
                if !found.is_empty() {
                    break;
                }
                radius += 2 * radius;
            }
        }

        found.sort_unstable();
        found.dedup();
        found
    }
}

//! Deterministic grid road network for tests and benchmarks.
//!
//! A rows×cols rectangle of intersections, every 4-neighbor pair connected by
//! a road in both directions with a uniform travel time. Shortest paths come
//! from Dijkstra, so the oracle contract matches what a real map backend
//! provides.

use pathfinding::prelude::dijkstra;

use crate::network::{IntersectionId, LocationOnRoad, RoadSegment, RouteOracle};

const BASE_LAT: f64 = 52.52;
const BASE_LNG: f64 = 13.40;
/// Degrees between adjacent grid intersections.
const SPACING: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct GridNetwork {
    rows: u64,
    cols: u64,
    /// Travel time of every edge, in simulation seconds.
    edge_time: u64,
}

impl GridNetwork {
    pub fn new(rows: u64, cols: u64, edge_time: u64) -> Self {
        assert!(rows >= 1 && cols >= 1, "grid must be non-empty");
        assert!(edge_time > 0, "edges must take time to traverse");
        Self {
            rows,
            cols,
            edge_time,
        }
    }

    pub fn intersection(&self, row: u64, col: u64) -> IntersectionId {
        assert!(row < self.rows && col < self.cols, "off-grid intersection");
        IntersectionId(row * self.cols + col)
    }

    fn row_col(&self, id: IntersectionId) -> (u64, u64) {
        (id.0 / self.cols, id.0 % self.cols)
    }

    pub fn coords(&self, id: IntersectionId) -> (f64, f64) {
        let (row, col) = self.row_col(id);
        (BASE_LAT + row as f64 * SPACING, BASE_LNG + col as f64 * SPACING)
    }

    /// All intersections with their coordinates, for region index construction.
    pub fn intersections(&self) -> Vec<(IntersectionId, f64, f64)> {
        (0..self.rows * self.cols)
            .map(|raw| {
                let id = IntersectionId(raw);
                let (lat, lng) = self.coords(id);
                (id, lat, lng)
            })
            .collect()
    }

    fn neighbors(&self, id: IntersectionId) -> Vec<IntersectionId> {
        let (row, col) = self.row_col(id);
        let mut out = Vec::with_capacity(4);
        if row > 0 {
            out.push(self.intersection(row - 1, col));
        }
        if row + 1 < self.rows {
            out.push(self.intersection(row + 1, col));
        }
        if col > 0 {
            out.push(self.intersection(row, col - 1));
        }
        if col + 1 < self.cols {
            out.push(self.intersection(row, col + 1));
        }
        out
    }

    fn adjacent(&self, a: IntersectionId, b: IntersectionId) -> bool {
        let (ar, ac) = self.row_col(a);
        let (br, bc) = self.row_col(b);
        ar.abs_diff(br) + ac.abs_diff(bc) == 1
    }

    /// The road from one intersection to an adjacent one. Panics off-grid so
    /// test setup mistakes surface immediately.
    pub fn road(&self, from: IntersectionId, to: IntersectionId) -> RoadSegment {
        self.road_between(from, to).expect("intersections must be adjacent")
    }

    /// A position at the start of the road `from → to`.
    pub fn location(&self, from: IntersectionId, to: IntersectionId) -> LocationOnRoad {
        LocationOnRoad::road_start(self.road(from, to))
    }

    fn path_cost(&self, from: IntersectionId, to: IntersectionId) -> Option<u64> {
        if from == to {
            return Some(0);
        }
        dijkstra(
            &from,
            |node| {
                self.neighbors(*node)
                    .into_iter()
                    .map(|next| (next, self.edge_time))
                    .collect::<Vec<_>>()
            },
            |node| *node == to,
        )
        .map(|(_, cost)| cost)
    }
}

impl RouteOracle for GridNetwork {
    fn travel_time_between(&self, from: LocationOnRoad, to: LocationOnRoad) -> u64 {
        // Same road, destination ahead of us: no detour needed.
        if from.road.from == to.road.from
            && from.road.to == to.road.to
            && to.offset >= from.offset
        {
            return to.offset - from.offset;
        }
        let through = match self.path_cost(from.road.to, to.road.from) {
            Some(cost) => cost,
            None => return u64::MAX,
        };
        from.remaining_time() + through + to.offset
    }

    fn shortest_travel_time_path(
        &self,
        from: IntersectionId,
        to: IntersectionId,
    ) -> Vec<IntersectionId> {
        if from == to {
            return vec![from];
        }
        dijkstra(
            &from,
            |node| {
                self.neighbors(*node)
                    .into_iter()
                    .map(|next| (next, self.edge_time))
                    .collect::<Vec<_>>()
            },
            |node| *node == to,
        )
        .map(|(path, _)| path)
        .unwrap_or_default()
    }

    fn road_between(&self, from: IntersectionId, to: IntersectionId) -> Option<RoadSegment> {
        if !self.adjacent(from, to) {
            return None;
        }
        let (from_lat, from_lng) = self.coords(from);
        let (to_lat, to_lng) = self.coords(to);
        Some(RoadSegment {
            from,
            to,
            travel_time: self.edge_time,
            from_lat,
            from_lng,
            to_lat,
            to_lng,
        })
    }
}

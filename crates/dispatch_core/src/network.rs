//! Road-network primitives and the contract of the external map oracle.
//!
//! The road network itself lives outside this crate: the scheduler hands the
//! engine positions on roads, and shortest paths / travel times come from a
//! [`RouteOracle`] implementation. This module defines the shared vocabulary:
//!
//! - **`IntersectionId`**: opaque id of a road-network intersection
//! - **`RoadSegment`**: a directed road between two intersections
//! - **`LocationOnRoad`**: a position along a segment, as elapsed travel time
//! - **`advance_along_road`**: pure position interpolation between observations

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IntersectionId(pub u64);

/// A directed road segment. Coordinates of both endpoints are carried along so
/// positions can be projected to lat/lng without a map lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub from: IntersectionId,
    pub to: IntersectionId,
    /// Free-flow travel time from `from` to `to`, in simulation seconds.
    pub travel_time: u64,
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

/// A position along a directed road segment, expressed as the travel time
/// already spent on the segment. `offset` is clamped to `[0, travel_time]`
/// whenever it is consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationOnRoad {
    pub road: RoadSegment,
    pub offset: u64,
}

impl LocationOnRoad {
    pub fn road_start(road: RoadSegment) -> Self {
        Self { road, offset: 0 }
    }

    pub fn road_end(road: RoadSegment) -> Self {
        Self {
            road,
            offset: road.travel_time,
        }
    }

    /// Remaining travel time until the end intersection of this segment.
    pub fn remaining_time(&self) -> u64 {
        self.road.travel_time.saturating_sub(self.offset)
    }

    /// Lat/lng by linear interpolation along the segment. The proportion is
    /// clamped to `[0, 1]` so positions slightly outside the segment (stale
    /// observations, rounding) still resolve to a point on it.
    pub fn lat_lng(&self) -> (f64, f64) {
        let proportion = if self.road.travel_time == 0 {
            0.0
        } else {
            (self.offset as f64 / self.road.travel_time as f64).clamp(0.0, 1.0)
        };
        let lat = self.road.from_lat + (self.road.to_lat - self.road.from_lat) * proportion;
        let lng = self.road.from_lng + (self.road.to_lng - self.road.from_lng) * proportion;
        (lat, lng)
    }

    /// Hex cell containing this position, or `None` for degenerate coordinates.
    pub fn cell(&self, resolution: Resolution) -> Option<CellIndex> {
        let (lat, lng) = self.lat_lng();
        LatLng::new(lat, lng).ok().map(|ll| ll.to_cell(resolution))
    }
}

/// Interpolate where an agent observed at `last` / `last_time` is at `now`,
/// assuming it kept driving along the same road. The position saturates at the
/// segment's end intersection; further progress is only known once the
/// scheduler reports the next intersection.
pub fn advance_along_road(last: LocationOnRoad, last_time: u64, now: u64) -> LocationOnRoad {
    let elapsed = now.saturating_sub(last_time);
    let offset = last
        .offset
        .saturating_add(elapsed)
        .min(last.road.travel_time);
    LocationOnRoad {
        road: last.road,
        offset,
    }
}

/// The external map oracle. Travel times are static (speed-limit based), not
/// live traffic. Implementations must be `Send + Sync` so the engine can hold
/// one as a boxed trait object.
pub trait RouteOracle: Send + Sync {
    /// Shortest travel time from one on-road position to another.
    fn travel_time_between(&self, from: LocationOnRoad, to: LocationOnRoad) -> u64;

    /// Ordered intersections of the shortest travel-time path, including both
    /// endpoints. Empty when no path exists.
    fn shortest_travel_time_path(
        &self,
        from: IntersectionId,
        to: IntersectionId,
    ) -> Vec<IntersectionId>;

    /// The directed road segment connecting two adjacent intersections, if any.
    fn road_between(&self, from: IntersectionId, to: IntersectionId) -> Option<RoadSegment>;
}

//! Demand-aware cruising: where an idle agent drives while waiting for work.
//!
//! When an idle agent reaches an intersection with nothing assigned, a
//! destination region is sampled around its current cell, one intersection is
//! picked inside that region, and the map oracle plans the path. Three
//! interchangeable policies share this shape:
//!
//! - **Random**: uniform over all indexed intersections, no demand weighting
//! - **StaticFrequency**: historical per-region frequency weights
//! - **TemporalFrequency**: decayed look-ahead net-demand weights

use h3o::CellIndex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::demand::DemandModel;
use crate::network::{IntersectionId, LocationOnRoad, RouteOracle};
use crate::regions::RegionIndex;
use crate::route::plan_hops;

/// Topological distance assumed when the grid distance is undefined.
const UNDEFINED_DISTANCE: i32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CruisingPolicy {
    /// Uniform random destination, ignoring demand entirely.
    Random,
    /// Static historical frequency weights, ignoring time.
    #[default]
    StaticFrequency,
    /// Time-indexed predicted net demand.
    TemporalFrequency,
}

/// One candidate region with its normalized selection probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionProbability {
    pub cell: CellIndex,
    pub probability: f64,
}

/// Turn demand weights into a categorical distribution over candidate
/// regions: `netValue = weight / (distance + 1)`, normalized to sum to 1.
/// The result is sorted by ascending probability (ties by cell id) so the
/// inverse-CDF walk in [`select_region_by_draw`] is well-defined.
pub fn region_probabilities(
    source: CellIndex,
    weighted: &[(CellIndex, f64)],
    regions: &RegionIndex,
) -> Vec<RegionProbability> {
    let mut net_values: Vec<(CellIndex, f64)> = weighted
        .iter()
        .map(|&(cell, weight)| {
            let distance = regions
                .topological_distance(source, cell)
                .filter(|d| *d >= 0)
                .unwrap_or(UNDEFINED_DISTANCE);
            (cell, weight / (distance + 1) as f64)
        })
        .collect();

    let sum: f64 = net_values.iter().map(|(_, value)| value).sum();
    if sum <= 0.0 {
        // All-zero weights: fall back to a uniform distribution.
        let uniform = 1.0 / net_values.len().max(1) as f64;
        for (_, value) in &mut net_values {
            *value = uniform;
        }
    } else {
        for (_, value) in &mut net_values {
            *value /= sum;
        }
    }

    let mut probabilities: Vec<RegionProbability> = net_values
        .into_iter()
        .map(|(cell, probability)| RegionProbability { cell, probability })
        .collect();
    probabilities.sort_by(|a, b| {
        a.probability
            .partial_cmp(&b.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cell.cmp(&b.cell))
    });
    probabilities
}

/// Inverse-CDF selection: walk the candidates in ascending-probability order,
/// accumulating mass until it meets or exceeds `draw` (uniform in [0, 1)).
pub fn select_region_by_draw(
    probabilities: &[RegionProbability],
    draw: f64,
) -> Option<CellIndex> {
    let mut cumulative = 0.0;
    for candidate in probabilities {
        cumulative += candidate.probability;
        if cumulative >= draw {
            return Some(candidate.cell);
        }
    }
    // Floating-point mass can fall just short of 1; the last (heaviest)
    // candidate absorbs the remainder.
    probabilities.last().map(|candidate| candidate.cell)
}

/// Sample one region from the distribution using the given generator.
pub fn sample_region<R: Rng>(
    probabilities: &[RegionProbability],
    rng: &mut R,
) -> Option<CellIndex> {
    select_region_by_draw(probabilities, rng.gen::<f64>())
}

/// Pick one intersection uniformly at random from a region's indexed list.
pub fn pick_intersection<R: Rng>(
    regions: &RegionIndex,
    cell: CellIndex,
    rng: &mut R,
) -> Option<IntersectionId> {
    let intersections = regions.intersections(cell);
    if intersections.is_empty() {
        return None;
    }
    Some(intersections[rng.gen_range(0..intersections.len())])
}

/// Uniform random destination over every indexed intersection. When the draw
/// lands on the source intersection the next entry is used instead, so the
/// destination always differs from where the agent already is.
fn random_destination<R: Rng>(
    regions: &RegionIndex,
    source: IntersectionId,
    rng: &mut R,
) -> Option<IntersectionId> {
    let all = regions.all_intersections();
    if all.is_empty() {
        return None;
    }
    let mut index = rng.gen_range(0..all.len());
    if all[index] == source {
        index = (index + 1) % all.len();
    }
    (all[index] != source).then_some(all[index])
}

/// Plan a cruising route for an idle agent at `current`. Returns the hop
/// sequence for the route cursor; empty when no usable target exists (nothing
/// indexed, or the position cannot be resolved to a cell).
pub fn plan_cruise<R: Rng>(
    policy: CruisingPolicy,
    regions: &RegionIndex,
    demand: &mut DemandModel,
    oracle: &dyn RouteOracle,
    current: LocationOnRoad,
    time: u64,
    rng: &mut R,
) -> Vec<IntersectionId> {
    let source = current.road.to;

    let destination = match policy {
        CruisingPolicy::Random => random_destination(regions, source, rng),
        CruisingPolicy::StaticFrequency | CruisingPolicy::TemporalFrequency => {
            let Some(cell) = regions.cell_of_location(current) else {
                return Vec::new();
            };
            let candidates = regions.indexed_candidates_near(cell);
            if candidates.is_empty() {
                return Vec::new();
            }
            let weighted: Vec<(CellIndex, f64)> = candidates
                .iter()
                .map(|&candidate| {
                    let weight = match policy {
                        CruisingPolicy::StaticFrequency => demand.static_weight(candidate),
                        _ => demand.temporal_weight(candidate, time),
                    };
                    (candidate, weight)
                })
                .collect();
            let probabilities = region_probabilities(cell, &weighted, regions);
            sample_region(&probabilities, rng)
                .and_then(|selected| pick_intersection(regions, selected, rng))
        }
    };

    match destination {
        Some(destination) => plan_hops(oracle, source, destination),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::Resolution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build_index_with_two_neighbors() -> (RegionIndex, CellIndex, CellIndex, CellIndex) {
        let mut index = RegionIndex::new(Resolution::Eight);
        let source = index.cell_of(52.52, 13.40).expect("valid coords");
        let ring = index.ring(source, 1);
        let (a, b) = (ring[0], ring[1]);
        for (i, cell) in [a, b].iter().enumerate() {
            let ll: h3o::LatLng = (*cell).into();
            index.insert(IntersectionId(i as u64 + 1), ll.lat(), ll.lng());
        }
        (index, source, a, b)
    }

    #[test]
    fn probabilities_normalize_and_sort_ascending() {
        let (index, source, x, y) = build_index_with_two_neighbors();
        // Both candidates sit at distance 1: netValue = weight / 2.
        let probabilities = region_probabilities(source, &[(x, 10.0), (y, 2.0)], &index);

        assert_eq!(probabilities.len(), 2);
        assert_eq!(probabilities[0].cell, y);
        assert!((probabilities[0].probability - 2.0 / 12.0).abs() < 1e-9);
        assert_eq!(probabilities[1].cell, x);
        assert!((probabilities[1].probability - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn draw_walks_cumulative_mass_ascending() {
        let (index, source, x, y) = build_index_with_two_neighbors();
        let probabilities = region_probabilities(source, &[(x, 10.0), (y, 2.0)], &index);

        // Cumulative order is y (0.1667) then x (1.0): a draw of 0.5 lands on x.
        assert_eq!(select_region_by_draw(&probabilities, 0.5), Some(x));
        assert_eq!(select_region_by_draw(&probabilities, 0.1), Some(y));
        assert_eq!(select_region_by_draw(&probabilities, 0.9999), Some(x));
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let (index, source, x, y) = build_index_with_two_neighbors();
        let probabilities = region_probabilities(source, &[(x, 0.0), (y, 0.0)], &index);
        for candidate in &probabilities {
            assert!((candidate.probability - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn intersection_pick_is_seed_deterministic() {
        let (index, _, a, _) = build_index_with_two_neighbors();
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        assert_eq!(
            pick_intersection(&index, a, &mut rng1),
            pick_intersection(&index, a, &mut rng2)
        );
    }

    #[test]
    fn random_destination_avoids_source() {
        let mut index = RegionIndex::new(Resolution::Eight);
        index.insert(IntersectionId(1), 52.52, 13.40);
        index.insert(IntersectionId(2), 52.53, 13.41);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let destination = random_destination(&index, IntersectionId(1), &mut rng);
            assert_eq!(destination, Some(IntersectionId(2)));
        }
    }
}

//! Per-agent route cursor: the remaining intersections of the active plan.

use std::collections::VecDeque;

use bevy_ecs::prelude::Component;

use crate::network::{IntersectionId, RouteOracle};

/// Plan the hop sequence from `source` to `destination`. The oracle's path
/// includes its start node; since the agent is already heading into `source`,
/// a leading hop equal to `source` is dropped so the cursor only holds
/// intersections still ahead.
pub fn plan_hops(
    oracle: &dyn RouteOracle,
    source: IntersectionId,
    destination: IntersectionId,
) -> Vec<IntersectionId> {
    let mut path = oracle.shortest_travel_time_path(source, destination);
    if path.first() == Some(&source) {
        path.remove(0);
    }
    path
}

/// Ordered intersections still ahead of the agent, consumed head-first.
/// A cursor is never shared between agents and is replaced wholesale whenever
/// a new plan is computed.
#[derive(Debug, Clone, Default, Component)]
pub struct RouteCursor {
    hops: VecDeque<IntersectionId>,
}

impl RouteCursor {
    /// Pop the next intersection, or `None` when the route is exhausted and
    /// the owner must replan.
    pub fn next_hop(&mut self) -> Option<IntersectionId> {
        self.hops.pop_front()
    }

    /// Replace the whole route with a freshly planned one.
    pub fn replace(&mut self, hops: impl IntoIterator<Item = IntersectionId>) {
        self.hops = hops.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.hops.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.hops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_come_out_in_order() {
        let mut cursor = RouteCursor::default();
        cursor.replace([IntersectionId(3), IntersectionId(7), IntersectionId(9)]);
        assert_eq!(cursor.next_hop(), Some(IntersectionId(3)));
        assert_eq!(cursor.next_hop(), Some(IntersectionId(7)));
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.next_hop(), Some(IntersectionId(9)));
        assert_eq!(cursor.next_hop(), None);
        assert!(cursor.is_empty());
    }

    #[test]
    fn replace_discards_previous_plan() {
        let mut cursor = RouteCursor::default();
        cursor.replace([IntersectionId(1), IntersectionId(2)]);
        cursor.replace([IntersectionId(8)]);
        assert_eq!(cursor.next_hop(), Some(IntersectionId(8)));
        assert_eq!(cursor.next_hop(), None);
    }
}

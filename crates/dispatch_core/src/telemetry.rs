//! Counters and per-trip records accumulated while the engine runs.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{AgentId, ResourceId};

/// One completed trip, recorded at drop-off time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTripRecord {
    pub resource_id: ResourceId,
    pub agent_id: AgentId,
    /// Time from the request becoming available to pickup.
    pub wait_time: u64,
    /// Time from pickup to drop-off.
    pub trip_time: u64,
    pub dropped_off_at: u64,
}

/// Aggregate dispatch telemetry, stored in the ECS world.
#[derive(Debug, Clone, Default, Resource)]
pub struct DispatchTelemetry {
    pub total_assignments: u64,
    pub expired_resources: u64,
    pub total_wait_time: u64,
    pub total_trip_time: u64,
    pub completed_trips: Vec<CompletedTripRecord>,
}

impl DispatchTelemetry {
    pub fn record_completed_trip(&mut self, record: CompletedTripRecord) {
        self.total_wait_time += record.wait_time;
        self.total_trip_time += record.trip_time;
        self.completed_trips.push(record);
    }

    pub fn completed_count(&self) -> usize {
        self.completed_trips.len()
    }

    pub fn average_wait_time(&self) -> f64 {
        if self.completed_trips.is_empty() {
            return 0.0;
        }
        self.total_wait_time as f64 / self.completed_trips.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_trips_accumulate_totals() {
        let mut telemetry = DispatchTelemetry::default();
        telemetry.record_completed_trip(CompletedTripRecord {
            resource_id: 1,
            agent_id: 10,
            wait_time: 120,
            trip_time: 600,
            dropped_off_at: 1_000,
        });
        telemetry.record_completed_trip(CompletedTripRecord {
            resource_id: 2,
            agent_id: 11,
            wait_time: 60,
            trip_time: 300,
            dropped_off_at: 2_000,
        });

        assert_eq!(telemetry.completed_count(), 2);
        assert_eq!(telemetry.total_wait_time, 180);
        assert_eq!(telemetry.total_trip_time, 900);
        assert!((telemetry.average_wait_time() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_wait_is_zero_without_trips() {
        let telemetry = DispatchTelemetry::default();
        assert_eq!(telemetry.average_wait_time(), 0.0);
    }
}

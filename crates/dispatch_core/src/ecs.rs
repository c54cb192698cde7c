//! Components for agents and trip requests, and the request lifecycle.

use bevy_ecs::prelude::Component;

use crate::network::LocationOnRoad;

pub type AgentId = u64;
pub type ResourceId = u64;

/// Lifecycle of one trip request. Transitions are driven exclusively by
/// scheduler notifications; the state machine never advances time itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Waiting,
    Assigned,
    PickedUp,
    DroppedOff,
    Expired,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::DroppedOff | RequestState::Expired)
    }

    /// Legal transitions. Notifications that would violate these are stale
    /// (e.g. an expiration check firing after drop-off) and must be no-ops.
    pub fn can_transition_to(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (RequestState::Waiting, RequestState::Assigned)
                | (RequestState::Waiting, RequestState::Expired)
                | (RequestState::Assigned, RequestState::PickedUp)
                | (RequestState::Assigned, RequestState::Expired)
                | (RequestState::PickedUp, RequestState::DroppedOff)
        )
    }
}

/// One trip request as tracked by the engine.
#[derive(Debug, Clone, Copy, Component)]
pub struct TripRequest {
    pub id: ResourceId,
    pub pickup: LocationOnRoad,
    pub dropoff: LocationOnRoad,
    pub available_at: u64,
    /// `available_at` plus the fixed maximum lifetime.
    pub expires_at: u64,
    pub assigned_agent: Option<AgentId>,
    pub picked_up_at: Option<u64>,
    pub state: RequestState,
}

/// Per-agent dispatch state. An agent holds at most one request at a time.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct AgentState {
    pub assigned: Option<ResourceId>,
    /// Completed trips, consumed by the fairness-weighted assignment policy.
    pub completed_trips: u64,
}

/// Last observed position and when it was observed. Current position is
/// interpolated on demand from this pair.
#[derive(Debug, Clone, Copy, Component)]
pub struct LastSeen {
    pub location: LocationOnRoad,
    pub time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_follows_the_happy_path() {
        assert!(RequestState::Waiting.can_transition_to(RequestState::Assigned));
        assert!(RequestState::Assigned.can_transition_to(RequestState::PickedUp));
        assert!(RequestState::PickedUp.can_transition_to(RequestState::DroppedOff));
    }

    #[test]
    fn expiration_is_reachable_until_pickup() {
        assert!(RequestState::Waiting.can_transition_to(RequestState::Expired));
        assert!(RequestState::Assigned.can_transition_to(RequestState::Expired));
        assert!(!RequestState::PickedUp.can_transition_to(RequestState::Expired));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for next in [
            RequestState::Waiting,
            RequestState::Assigned,
            RequestState::PickedUp,
            RequestState::DroppedOff,
            RequestState::Expired,
        ] {
            assert!(!RequestState::DroppedOff.can_transition_to(next));
            assert!(!RequestState::Expired.can_transition_to(next));
        }
    }
}

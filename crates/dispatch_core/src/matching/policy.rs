//! Agent selection policies for the assignment engine.
//!
//! Both directions of the greedy match live here as pure functions over
//! candidate lists, so they can be exercised without an engine:
//!
//! - `choose_best_agent`: pick an idle agent for a newly available request
//! - `choose_best_waiting`: pick a waiting request for a freed agent

use serde::{Deserialize, Serialize};

use crate::ecs::{AgentId, ResourceId};

/// How idle agents are ranked when a request becomes available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentPolicy {
    /// Minimize estimated arrival time at the pickup.
    #[default]
    Nearest,
    /// Minimize `arrival × (1 + completed trips)`, biasing toward agents with
    /// fewer completed trips. The multiplicative form is intentional and must
    /// not be "improved": experiment parity depends on it.
    Fair,
}

impl AssignmentPolicy {
    /// Ranking key; smaller is better. Widened to `u128` so the fairness
    /// product cannot overflow for large timestamps.
    pub fn selection_key(self, arrival: u64, completed_trips: u64) -> u128 {
        match self {
            AssignmentPolicy::Nearest => arrival as u128,
            AssignmentPolicy::Fair => arrival as u128 * (1 + completed_trips as u128),
        }
    }
}

/// One idle agent considered for a newly available request.
#[derive(Debug, Clone, Copy)]
pub struct AgentCandidate {
    pub agent_id: AgentId,
    /// Estimated arrival time at the pickup (now + travel time).
    pub arrival: u64,
    pub completed_trips: u64,
}

/// Select the agent minimizing the policy key, ties broken by lowest agent id.
/// Returns `None` when there are no candidates or when the best candidate
/// would arrive after the request expires (the deadline gate applies to the
/// policy winner, not to the overall-nearest agent).
pub fn choose_best_agent(
    candidates: &[AgentCandidate],
    policy: AssignmentPolicy,
    expires_at: u64,
) -> Option<AgentId> {
    let best = candidates.iter().min_by_key(|candidate| {
        (
            policy.selection_key(candidate.arrival, candidate.completed_trips),
            candidate.agent_id,
        )
    })?;
    (best.arrival <= expires_at).then_some(best.agent_id)
}

/// One waiting request considered for a freed agent.
#[derive(Debug, Clone, Copy)]
pub struct WaitingCandidate {
    pub resource_id: ResourceId,
    /// Estimated arrival time at the pickup from the freed agent's location.
    pub arrival: u64,
    pub expires_at: u64,
}

/// Among waiting requests still reachable before their expiration, select the
/// one with minimum arrival, ties broken by lowest resource id. This is a
/// single best-of-waiting pick, not a re-optimization over all agents.
pub fn choose_best_waiting(candidates: &[WaitingCandidate]) -> Option<ResourceId> {
    candidates
        .iter()
        .filter(|candidate| candidate.arrival <= candidate.expires_at)
        .min_by_key(|candidate| (candidate.arrival, candidate.resource_id))
        .map(|candidate| candidate.resource_id)
}

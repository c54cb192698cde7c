//! The fleet dispatch engine.
//!
//! The engine is purely reactive: an external scheduler owns time and the
//! road network, and drives the engine through notifications. Each callback
//! inspects the current fleet state, possibly commits an assignment, and
//! returns what the scheduler should do next. The engine never advances time
//! and never moves an agent itself.
//!
//! Determinism: all id collections are ordered (`BTreeMap` / `BTreeSet`), and
//! every agent carries its own seeded random stream, so equal configs and
//! equal notification sequences replay to identical results.

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::cruising::plan_cruise;
use crate::demand::DemandModel;
use crate::ecs::{AgentId, AgentState, LastSeen, RequestState, ResourceId, TripRequest};
use crate::matching::{choose_best_agent, choose_best_waiting, AgentCandidate, WaitingCandidate};
use crate::network::{advance_along_road, IntersectionId, LocationOnRoad, RouteOracle};
use crate::regions::RegionIndex;
use crate::route::{plan_hops, RouteCursor};
use crate::telemetry::{CompletedTripRecord, DispatchTelemetry};

/// Which lifecycle edge a resource notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityChange {
    /// The request just entered the system and is waiting for an agent.
    Available,
    /// The assigned agent reached the pickup and the rider boarded.
    PickedUp,
    /// The carrying agent reached the drop-off.
    DroppedOff,
    /// The request's maximum lifetime elapsed before pickup.
    Expired,
}

/// The scheduler's view of one trip request, passed with every notification.
#[derive(Debug, Clone, Copy)]
pub struct ResourceNotice {
    pub id: ResourceId,
    pub pickup: LocationOnRoad,
    pub dropoff: LocationOnRoad,
    pub available_at: u64,
    pub expires_at: u64,
}

/// What the scheduler should do after a resource notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    /// Send `agent_id` to pick up `resource_id`.
    AssignTo {
        agent_id: AgentId,
        resource_id: ResourceId,
    },
    DoNothing,
}

pub struct FleetEngine {
    world: World,
    oracle: Box<dyn RouteOracle>,
    regions: RegionIndex,
    demand: DemandModel,
    config: EngineConfig,
    agents: BTreeMap<AgentId, Entity>,
    resources: BTreeMap<ResourceId, Entity>,
    /// Agents with no assignment, by id for deterministic scan order.
    idle: BTreeSet<AgentId>,
    /// Unassigned, unexpired requests, by id for deterministic scan order.
    waiting: BTreeSet<ResourceId>,
    /// One random stream per agent, seeded from the config seed and agent id.
    rngs: BTreeMap<AgentId, StdRng>,
}

impl FleetEngine {
    pub fn new(
        oracle: Box<dyn RouteOracle>,
        regions: RegionIndex,
        demand: DemandModel,
        config: EngineConfig,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(DispatchTelemetry::default());
        Self {
            world,
            oracle,
            regions,
            demand,
            config,
            agents: BTreeMap::new(),
            resources: BTreeMap::new(),
            idle: BTreeSet::new(),
            waiting: BTreeSet::new(),
            rngs: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        self.world.resource::<DispatchTelemetry>()
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    pub fn idle_agent_count(&self) -> usize {
        self.idle.len()
    }

    pub fn waiting_resource_count(&self) -> usize {
        self.waiting.len()
    }

    /// Current interpolated position of an agent.
    pub fn agent_location(&self, agent_id: AgentId, time: u64) -> Option<LocationOnRoad> {
        let entity = *self.agents.get(&agent_id)?;
        let seen = self.world.get::<LastSeen>(entity)?;
        Some(advance_along_road(seen.location, seen.time, time))
    }

    pub fn request_state(&self, resource_id: ResourceId) -> Option<RequestState> {
        let entity = *self.resources.get(&resource_id)?;
        Some(self.world.get::<TripRequest>(entity)?.state)
    }

    // --- scheduler callbacks ---

    /// Register a new empty agent at its starting position.
    pub fn on_agent_introduced(&mut self, agent_id: AgentId, location: LocationOnRoad, time: u64) {
        let entity = self
            .world
            .spawn((
                AgentState::default(),
                LastSeen { location, time },
                RouteCursor::default(),
            ))
            .id();
        self.agents.insert(agent_id, entity);
        self.idle.insert(agent_id);
        self.rngs
            .insert(agent_id, StdRng::seed_from_u64(self.config.rng_seed ^ agent_id));
    }

    /// React to a resource lifecycle notification.
    pub fn on_resource_availability_change(
        &mut self,
        notice: ResourceNotice,
        change: AvailabilityChange,
        time: u64,
    ) -> DispatchAction {
        match change {
            AvailabilityChange::Available => self.resource_available(notice, time),
            AvailabilityChange::PickedUp => self.resource_picked_up(notice.id, time),
            AvailabilityChange::DroppedOff => self.resource_dropped_off(notice, time),
            AvailabilityChange::Expired => self.resource_expired(notice.id),
        }
    }

    /// An empty agent reached an intersection: hand back the next hop of its
    /// plan, replanning first when the cursor is exhausted. `None` means the
    /// agent has no usable target and stays put until the next notification.
    pub fn on_reach_intersection(
        &mut self,
        agent_id: AgentId,
        time: u64,
        current: LocationOnRoad,
    ) -> Option<IntersectionId> {
        let entity = *self.agents.get(&agent_id)?;
        self.record_position(entity, current, time);

        let assigned = self.world.get::<AgentState>(entity)?.assigned;
        if self.world.get::<RouteCursor>(entity)?.is_empty() {
            let hops = match assigned {
                Some(resource_id) => {
                    let target = self.resource_pickup(resource_id)?;
                    plan_hops(self.oracle.as_ref(), current.road.to, target.road.from)
                }
                None => {
                    let rng = self.rngs.get_mut(&agent_id)?;
                    plan_cruise(
                        self.config.cruising_policy,
                        &self.regions,
                        &mut self.demand,
                        self.oracle.as_ref(),
                        current,
                        time,
                        rng,
                    )
                }
            };
            self.world.get_mut::<RouteCursor>(entity)?.replace(hops);
        }

        self.pop_next_hop(entity, current, time)
    }

    /// An agent carrying a rider reached an intersection: same contract as
    /// [`Self::on_reach_intersection`], but the plan targets the drop-off.
    pub fn on_reach_intersection_with_resource(
        &mut self,
        agent_id: AgentId,
        time: u64,
        current: LocationOnRoad,
    ) -> Option<IntersectionId> {
        let entity = *self.agents.get(&agent_id)?;
        self.record_position(entity, current, time);

        if self.world.get::<RouteCursor>(entity)?.is_empty() {
            let resource_id = self.world.get::<AgentState>(entity)?.assigned?;
            let resource_entity = *self.resources.get(&resource_id)?;
            let dropoff = self.world.get::<TripRequest>(resource_entity)?.dropoff;
            let hops = plan_hops(self.oracle.as_ref(), current.road.to, dropoff.road.from);
            self.world.get_mut::<RouteCursor>(entity)?.replace(hops);
        }

        self.pop_next_hop(entity, current, time)
    }

    /// Check internal consistency of the fleet state. Returns every violated
    /// condition rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        for (&agent_id, &entity) in &self.agents {
            let Some(state) = self.world.get::<AgentState>(entity) else {
                violations.push(format!("agent {agent_id} has no state component"));
                continue;
            };
            match state.assigned {
                None => {
                    if !self.idle.contains(&agent_id) {
                        violations.push(format!("agent {agent_id} is unassigned but not idle"));
                    }
                }
                Some(resource_id) => {
                    if self.idle.contains(&agent_id) {
                        violations.push(format!("agent {agent_id} is assigned but marked idle"));
                    }
                    match self.resources.get(&resource_id) {
                        None => violations.push(format!(
                            "agent {agent_id} assigned to unknown resource {resource_id}"
                        )),
                        Some(&resource_entity) => {
                            if let Some(request) = self.world.get::<TripRequest>(resource_entity) {
                                if request.assigned_agent != Some(agent_id) {
                                    violations.push(format!(
                                        "assignment of agent {agent_id} to resource {resource_id} is one-sided"
                                    ));
                                }
                                if !matches!(
                                    request.state,
                                    RequestState::Assigned | RequestState::PickedUp
                                ) {
                                    violations.push(format!(
                                        "resource {resource_id} held by agent {agent_id} is in state {:?}",
                                        request.state
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }

        for &resource_id in &self.waiting {
            match self.resources.get(&resource_id) {
                None => violations.push(format!("waiting set holds unknown resource {resource_id}")),
                Some(&entity) => {
                    if let Some(request) = self.world.get::<TripRequest>(entity) {
                        if request.state != RequestState::Waiting {
                            violations.push(format!(
                                "waiting set holds resource {resource_id} in state {:?}",
                                request.state
                            ));
                        }
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    // --- lifecycle handlers ---

    fn resource_available(&mut self, notice: ResourceNotice, time: u64) -> DispatchAction {
        let entity = self
            .world
            .spawn(TripRequest {
                id: notice.id,
                pickup: notice.pickup,
                dropoff: notice.dropoff,
                available_at: notice.available_at,
                expires_at: notice.expires_at,
                assigned_agent: None,
                picked_up_at: None,
                state: RequestState::Waiting,
            })
            .id();
        self.resources.insert(notice.id, entity);

        let mut candidates = Vec::with_capacity(self.idle.len());
        for &agent_id in &self.idle {
            let Some(&agent_entity) = self.agents.get(&agent_id) else {
                continue;
            };
            let (Some(seen), Some(state)) = (
                self.world.get::<LastSeen>(agent_entity),
                self.world.get::<AgentState>(agent_entity),
            ) else {
                continue;
            };
            let current = advance_along_road(seen.location, seen.time, time);
            let arrival = time.saturating_add(
                self.oracle.travel_time_between(current, notice.pickup),
            );
            candidates.push(AgentCandidate {
                agent_id,
                arrival,
                completed_trips: state.completed_trips,
            });
        }

        match choose_best_agent(&candidates, self.config.assignment_policy, notice.expires_at) {
            Some(agent_id) => {
                self.commit_assignment(agent_id, notice.id);
                DispatchAction::AssignTo {
                    agent_id,
                    resource_id: notice.id,
                }
            }
            None => {
                self.waiting.insert(notice.id);
                DispatchAction::DoNothing
            }
        }
    }

    fn resource_picked_up(&mut self, resource_id: ResourceId, time: u64) -> DispatchAction {
        let Some(&entity) = self.resources.get(&resource_id) else {
            return DispatchAction::DoNothing;
        };
        let Some(request) = self.world.get::<TripRequest>(entity) else {
            return DispatchAction::DoNothing;
        };
        // A stale pickup (e.g. after expiration already fired) is a no-op.
        if !request.state.can_transition_to(RequestState::PickedUp) {
            return DispatchAction::DoNothing;
        }
        let (pickup, agent) = (request.pickup, request.assigned_agent);

        if let Some(mut request) = self.world.get_mut::<TripRequest>(entity) {
            request.state = RequestState::PickedUp;
            request.picked_up_at = Some(time);
        }
        if let Some(&agent_entity) = agent.and_then(|id| self.agents.get(&id)) {
            self.record_position(agent_entity, pickup, time);
            if let Some(mut cursor) = self.world.get_mut::<RouteCursor>(agent_entity) {
                cursor.clear();
            }
        }
        DispatchAction::DoNothing
    }

    fn resource_dropped_off(&mut self, notice: ResourceNotice, time: u64) -> DispatchAction {
        let Some(&entity) = self.resources.get(&notice.id) else {
            return DispatchAction::DoNothing;
        };
        let Some(request) = self.world.get::<TripRequest>(entity) else {
            return DispatchAction::DoNothing;
        };
        if !request.state.can_transition_to(RequestState::DroppedOff) {
            return DispatchAction::DoNothing;
        }
        let (dropoff, available_at, picked_up_at, agent) = (
            request.dropoff,
            request.available_at,
            request.picked_up_at,
            request.assigned_agent,
        );

        if let Some(mut request) = self.world.get_mut::<TripRequest>(entity) {
            request.state = RequestState::DroppedOff;
        }

        if let (Some(agent_id), Some(picked_up_at)) = (agent, picked_up_at) {
            self.world
                .resource_mut::<DispatchTelemetry>()
                .record_completed_trip(CompletedTripRecord {
                    resource_id: notice.id,
                    agent_id,
                    wait_time: picked_up_at.saturating_sub(available_at),
                    trip_time: time.saturating_sub(picked_up_at),
                    dropped_off_at: time,
                });
        }

        let Some(agent_id) = agent else {
            return DispatchAction::DoNothing;
        };
        let Some(&agent_entity) = self.agents.get(&agent_id) else {
            return DispatchAction::DoNothing;
        };
        if let Some(mut state) = self.world.get_mut::<AgentState>(agent_entity) {
            state.assigned = None;
            state.completed_trips += 1;
        }
        self.record_position(agent_entity, dropoff, time);
        if let Some(mut cursor) = self.world.get_mut::<RouteCursor>(agent_entity) {
            cursor.clear();
        }

        // The freed agent immediately rescans the waiting pool.
        let mut candidates = Vec::with_capacity(self.waiting.len());
        for &waiting_id in &self.waiting {
            let Some(&waiting_entity) = self.resources.get(&waiting_id) else {
                continue;
            };
            let Some(waiting_request) = self.world.get::<TripRequest>(waiting_entity) else {
                continue;
            };
            let arrival = time.saturating_add(
                self.oracle
                    .travel_time_between(dropoff, waiting_request.pickup),
            );
            candidates.push(WaitingCandidate {
                resource_id: waiting_id,
                arrival,
                expires_at: waiting_request.expires_at,
            });
        }

        match choose_best_waiting(&candidates) {
            Some(resource_id) => {
                self.commit_assignment(agent_id, resource_id);
                DispatchAction::AssignTo {
                    agent_id,
                    resource_id,
                }
            }
            None => {
                self.idle.insert(agent_id);
                DispatchAction::DoNothing
            }
        }
    }

    fn resource_expired(&mut self, resource_id: ResourceId) -> DispatchAction {
        let Some(&entity) = self.resources.get(&resource_id) else {
            return DispatchAction::DoNothing;
        };
        let Some(request) = self.world.get::<TripRequest>(entity) else {
            return DispatchAction::DoNothing;
        };
        // Expiration fires on a timer; by the time it lands the request may
        // already be picked up or dropped off. Those are no-ops.
        if !request.state.can_transition_to(RequestState::Expired) {
            return DispatchAction::DoNothing;
        }
        let agent = request.assigned_agent;

        if let Some(mut request) = self.world.get_mut::<TripRequest>(entity) {
            request.state = RequestState::Expired;
            request.assigned_agent = None;
        }
        self.waiting.remove(&resource_id);
        self.world.resource_mut::<DispatchTelemetry>().expired_resources += 1;

        if let Some(&agent_entity) = agent.and_then(|id| self.agents.get(&id)) {
            if let Some(mut state) = self.world.get_mut::<AgentState>(agent_entity) {
                state.assigned = None;
            }
            if let Some(mut cursor) = self.world.get_mut::<RouteCursor>(agent_entity) {
                cursor.clear();
            }
        }
        if let Some(agent_id) = agent {
            self.idle.insert(agent_id);
        }
        DispatchAction::DoNothing
    }

    // --- internals ---

    fn commit_assignment(&mut self, agent_id: AgentId, resource_id: ResourceId) {
        self.idle.remove(&agent_id);
        self.waiting.remove(&resource_id);

        if let Some(&agent_entity) = self.agents.get(&agent_id) {
            if let Some(mut state) = self.world.get_mut::<AgentState>(agent_entity) {
                state.assigned = Some(resource_id);
            }
            // The cruising plan is abandoned; the next intersection callback
            // replans toward the pickup.
            if let Some(mut cursor) = self.world.get_mut::<RouteCursor>(agent_entity) {
                cursor.clear();
            }
        }
        if let Some(&resource_entity) = self.resources.get(&resource_id) {
            if let Some(mut request) = self.world.get_mut::<TripRequest>(resource_entity) {
                request.state = RequestState::Assigned;
                request.assigned_agent = Some(agent_id);
            }
        }
        self.world
            .resource_mut::<DispatchTelemetry>()
            .total_assignments += 1;
    }

    fn record_position(&mut self, entity: Entity, location: LocationOnRoad, time: u64) {
        if let Some(mut seen) = self.world.get_mut::<LastSeen>(entity) {
            *seen = LastSeen { location, time };
        }
    }

    fn resource_pickup(&self, resource_id: ResourceId) -> Option<LocationOnRoad> {
        let entity = *self.resources.get(&resource_id)?;
        Some(self.world.get::<TripRequest>(entity)?.pickup)
    }

    /// Pop the next hop and move the last-seen position onto the start of the
    /// road toward it, so interpolation tracks the new segment.
    fn pop_next_hop(
        &mut self,
        entity: Entity,
        current: LocationOnRoad,
        time: u64,
    ) -> Option<IntersectionId> {
        let next = self.world.get_mut::<RouteCursor>(entity)?.next_hop()?;
        if let Some(road) = self.oracle.road_between(current.road.to, next) {
            self.record_position(entity, LocationOnRoad::road_start(road), time);
        }
        Some(next)
    }
}

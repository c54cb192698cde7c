//! Discrete-event harness that plays the scheduler role for the engine.
//!
//! The engine itself is reactive; this harness owns time, the road network,
//! and agent movement. Events live in a min-heap ordered by `(time, seq)`, so
//! simultaneous events resolve in insertion order and every run with the same
//! scenario replays identically.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dispatch_core::demand::DemandModel;
use dispatch_core::ecs::{AgentId, RequestState, ResourceId};
use dispatch_core::test_helpers::GridNetwork;
use dispatch_core::{
    AvailabilityChange, DispatchAction, EngineConfig, FleetEngine, RegionIndex, ResourceNotice,
    RouteOracle,
};

/// How long an agent without a usable cruise target waits before retrying.
const IDLE_RETRY_SECS: u64 = 60;

/// Scenario shape for one harness run.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScenarioConfig {
    pub grid_rows: u64,
    pub grid_cols: u64,
    /// Travel time of every grid edge, in seconds.
    pub edge_time: u64,
    pub agents: u64,
    pub requests: u64,
    /// Mean gap between request arrivals, in seconds.
    pub request_interval: u64,
    /// Maximum time a request waits for pickup before expiring.
    pub max_lifetime: u64,
    pub engine: EngineConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            grid_rows: 10,
            grid_cols: 10,
            edge_time: 60,
            agents: 10,
            requests: 100,
            request_interval: 30,
            max_lifetime: 600,
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    IntroduceAgent { agent_id: AgentId },
    IntroduceResource { resource_id: ResourceId },
    ExpirationCheck { resource_id: ResourceId },
    PickupArrival { resource_id: ResourceId },
    DropoffArrival { resource_id: ResourceId },
    ReachIntersection { agent_id: AgentId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledEvent {
    time: u64,
    seq: u64,
    event: Event,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct SimulationHarness {
    engine: FleetEngine,
    grid: GridNetwork,
    queue: BinaryHeap<Reverse<ScheduledEvent>>,
    seq: u64,
    now: u64,
    notices: BTreeMap<ResourceId, ResourceNotice>,
    agent_starts: BTreeMap<AgentId, dispatch_core::LocationOnRoad>,
    /// Resources currently assigned or carried, with their agent.
    assigned: BTreeMap<ResourceId, AgentId>,
    busy: BTreeSet<AgentId>,
}

impl SimulationHarness {
    /// Build a harness from a scenario: agents spread over the grid, requests
    /// drawn from a seeded generator at roughly `request_interval` spacing.
    pub fn from_scenario(config: ScenarioConfig) -> Self {
        let grid = GridNetwork::new(config.grid_rows, config.grid_cols, config.edge_time);
        let regions =
            RegionIndex::from_intersections(config.engine.resolution, grid.intersections());
        let engine = FleetEngine::new(
            Box::new(grid),
            regions,
            DemandModel::default(),
            config.engine,
        );
        let mut harness = Self {
            engine,
            grid,
            queue: BinaryHeap::new(),
            seq: 0,
            now: 0,
            notices: BTreeMap::new(),
            agent_starts: BTreeMap::new(),
            assigned: BTreeMap::new(),
            busy: BTreeSet::new(),
        };

        let mut rng = StdRng::seed_from_u64(config.engine.rng_seed);
        for agent_id in 0..config.agents {
            let location = harness.random_location(&mut rng, config);
            harness.agent_starts.insert(agent_id, location);
            harness.schedule(0, Event::IntroduceAgent { agent_id });
        }

        let mut arrival = 0u64;
        for resource_id in 0..config.requests {
            arrival += rng.gen_range(1..=config.request_interval.max(1) * 2);
            let pickup = harness.random_location(&mut rng, config);
            let dropoff = harness.random_location(&mut rng, config);
            harness.notices.insert(
                resource_id,
                ResourceNotice {
                    id: resource_id,
                    pickup,
                    dropoff,
                    available_at: arrival,
                    expires_at: arrival + config.max_lifetime,
                },
            );
            harness.schedule(arrival, Event::IntroduceResource { resource_id });
        }
        harness
    }

    fn random_location(
        &self,
        rng: &mut StdRng,
        config: ScenarioConfig,
    ) -> dispatch_core::LocationOnRoad {
        // Pick a random eastbound or southbound road so every draw is valid.
        loop {
            let row = rng.gen_range(0..config.grid_rows);
            let col = rng.gen_range(0..config.grid_cols);
            let east = rng.gen_bool(0.5);
            let (to_row, to_col) = if east { (row, col + 1) } else { (row + 1, col) };
            if to_row < config.grid_rows && to_col < config.grid_cols {
                return self
                    .grid
                    .location(self.grid.intersection(row, col), self.grid.intersection(to_row, to_col));
            }
        }
    }

    fn schedule(&mut self, time: u64, event: Event) {
        self.queue.push(Reverse(ScheduledEvent {
            time,
            seq: self.seq,
            event,
        }));
        self.seq += 1;
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn engine(&self) -> &FleetEngine {
        &self.engine
    }

    /// Pump events until the queue empties or simulation time passes `until`.
    pub fn run(&mut self, until: u64) {
        while let Some(Reverse(scheduled)) = self.queue.peek().copied() {
            if scheduled.time > until {
                break;
            }
            self.queue.pop();
            self.now = scheduled.time;
            self.handle(scheduled.event);
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::IntroduceAgent { agent_id } => self.introduce_agent(agent_id),
            Event::IntroduceResource { resource_id } => self.introduce_resource(resource_id),
            Event::ExpirationCheck { resource_id } => self.expiration_check(resource_id),
            Event::PickupArrival { resource_id } => self.pickup_arrival(resource_id),
            Event::DropoffArrival { resource_id } => self.dropoff_arrival(resource_id),
            Event::ReachIntersection { agent_id } => self.reach_intersection(agent_id),
        }
    }

    fn introduce_agent(&mut self, agent_id: AgentId) {
        let Some(&location) = self.agent_starts.get(&agent_id) else {
            return;
        };
        self.engine.on_agent_introduced(agent_id, location, self.now);
        self.schedule(
            self.now + location.remaining_time(),
            Event::ReachIntersection { agent_id },
        );
    }

    fn introduce_resource(&mut self, resource_id: ResourceId) {
        let Some(&notice) = self.notices.get(&resource_id) else {
            return;
        };
        let action = self.engine.on_resource_availability_change(
            notice,
            AvailabilityChange::Available,
            self.now,
        );
        self.schedule(notice.expires_at, Event::ExpirationCheck { resource_id });
        self.apply_action(action);
    }

    fn expiration_check(&mut self, resource_id: ResourceId) {
        let Some(&notice) = self.notices.get(&resource_id) else {
            return;
        };
        self.engine.on_resource_availability_change(
            notice,
            AvailabilityChange::Expired,
            self.now,
        );
        // When the expiration actually landed, any holding agent is idle again.
        if self.engine.request_state(resource_id) == Some(RequestState::Expired) {
            if let Some(agent_id) = self.assigned.remove(&resource_id) {
                self.busy.remove(&agent_id);
                self.schedule(self.now, Event::ReachIntersection { agent_id });
            }
        }
    }

    fn pickup_arrival(&mut self, resource_id: ResourceId) {
        // The assignment may have expired while the agent was en route.
        if self.engine.request_state(resource_id) != Some(RequestState::Assigned) {
            return;
        }
        let Some(&notice) = self.notices.get(&resource_id) else {
            return;
        };
        self.engine.on_resource_availability_change(
            notice,
            AvailabilityChange::PickedUp,
            self.now,
        );
        let trip_time = self
            .grid
            .travel_time_between(notice.pickup, notice.dropoff);
        self.schedule(self.now + trip_time, Event::DropoffArrival { resource_id });
    }

    fn dropoff_arrival(&mut self, resource_id: ResourceId) {
        let Some(&notice) = self.notices.get(&resource_id) else {
            return;
        };
        let agent_id = self.assigned.remove(&resource_id);
        let action = self.engine.on_resource_availability_change(
            notice,
            AvailabilityChange::DroppedOff,
            self.now,
        );
        if let Some(agent_id) = agent_id {
            self.busy.remove(&agent_id);
            self.schedule(self.now, Event::ReachIntersection { agent_id });
        }
        self.apply_action(action);
    }

    fn reach_intersection(&mut self, agent_id: AgentId) {
        // Travel to pickups and drop-offs is modeled as a direct travel-time
        // jump; intersection events only drive cruising.
        if self.busy.contains(&agent_id) {
            return;
        }
        let Some(location) = self.engine.agent_location(agent_id, self.now) else {
            return;
        };
        match self.engine.on_reach_intersection(agent_id, self.now, location) {
            Some(next) => {
                let hop_time = self
                    .grid
                    .road_between(location.road.to, next)
                    .map(|road| road.travel_time)
                    .unwrap_or(IDLE_RETRY_SECS);
                self.schedule(self.now + hop_time, Event::ReachIntersection { agent_id });
            }
            None => {
                self.schedule(
                    self.now + IDLE_RETRY_SECS,
                    Event::ReachIntersection { agent_id },
                );
            }
        }
    }

    fn apply_action(&mut self, action: DispatchAction) {
        let DispatchAction::AssignTo {
            agent_id,
            resource_id,
        } = action
        else {
            return;
        };
        self.assigned.insert(resource_id, agent_id);
        self.busy.insert(agent_id);
        if let (Some(location), Some(&notice)) = (
            self.engine.agent_location(agent_id, self.now),
            self.notices.get(&resource_id),
        ) {
            let travel = self.grid.travel_time_between(location, notice.pickup);
            self.schedule(self.now + travel, Event::PickupArrival { resource_id });
        }
    }
}

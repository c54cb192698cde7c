//! Dispatch core for an on-demand ride fleet.
//!
//! A reactive dispatch engine for discrete-event fleet simulation: an external
//! scheduler owns time and movement, and drives the engine through
//! notifications about trip requests and agents reaching intersections. The
//! engine decides assignments and cruising routes and hands instructions back.
//!
//! Module map:
//!
//! - [`network`]: road-network vocabulary and the map oracle contract
//! - [`regions`]: hexagonal region index over intersections
//! - [`demand`]: static and temporal per-region demand weights
//! - [`ecs`]: agent and trip-request components, request lifecycle
//! - [`route`]: per-agent route cursor and hop planning
//! - [`matching`]: assignment policies and candidate selection
//! - [`cruising`]: demand-aware destination sampling for idle agents
//! - [`engine`]: the dispatch engine and its scheduler callbacks
//! - [`telemetry`]: counters and per-trip records
//! - [`config`]: engine configuration

pub mod config;
pub mod cruising;
pub mod demand;
pub mod ecs;
pub mod engine;
pub mod matching;
pub mod network;
pub mod regions;
pub mod route;
pub mod telemetry;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use config::EngineConfig;
pub use cruising::CruisingPolicy;
pub use engine::{AvailabilityChange, DispatchAction, FleetEngine, ResourceNotice};
pub use matching::AssignmentPolicy;
pub use network::{IntersectionId, LocationOnRoad, RoadSegment, RouteOracle};
pub use regions::RegionIndex;

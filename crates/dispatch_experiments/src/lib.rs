//! Experimentation harness for the dispatch engine.
//!
//! The engine in `dispatch_core` is reactive; this crate supplies the other
//! half of the contract: a deterministic discrete-event scheduler, scenario
//! generation, metrics extraction, parallel parameter sweeps, and result
//! export.
//!
//! # Quick start
//!
//! ```no_run
//! use dispatch_core::{AssignmentPolicy, CruisingPolicy};
//! use dispatch_experiments::{policy_seed_grid, run_sweep, ScenarioConfig};
//!
//! let points = policy_seed_grid(
//!     ScenarioConfig::default(),
//!     &[AssignmentPolicy::Nearest, AssignmentPolicy::Fair],
//!     &[CruisingPolicy::Random, CruisingPolicy::StaticFrequency],
//!     &[1, 2, 3],
//! );
//! let results = run_sweep(&points, 50_000);
//! ```
//!
//! Modules:
//!
//! - [`harness`]: event queue and scheduler driving the engine
//! - [`metrics`]: run-level metrics from engine telemetry
//! - [`sweep`]: parallel policy/seed sweeps using rayon
//! - [`export`]: CSV and JSON result writers

pub mod export;
pub mod harness;
pub mod metrics;
pub mod sweep;

pub use export::{export_to_csv, export_to_json};
pub use harness::{ScenarioConfig, SimulationHarness};
pub use metrics::{extract_metrics, RunMetrics};
pub use sweep::{policy_seed_grid, run_point, run_sweep, run_sweep_with_progress, SweepPoint};

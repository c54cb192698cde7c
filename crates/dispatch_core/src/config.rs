//! Engine configuration.

use h3o::Resolution;
use serde::{Deserialize, Serialize};

use crate::cruising::CruisingPolicy;
use crate::matching::AssignmentPolicy;

/// Everything the engine needs decided up front. Values are fixed for the
/// lifetime of an engine; runs with equal configs and equal notification
/// sequences produce identical results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hexagonal cell resolution for the region index.
    pub resolution: Resolution,
    pub assignment_policy: AssignmentPolicy,
    pub cruising_policy: CruisingPolicy,
    /// Base seed; each agent derives its own stream as `rng_seed ^ agent_id`.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Eight,
            assignment_policy: AssignmentPolicy::default(),
            cruising_policy: CruisingPolicy::default(),
            rng_seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_assignment_policy(mut self, policy: AssignmentPolicy) -> Self {
        self.assignment_policy = policy;
        self
    }

    pub fn with_cruising_policy(mut self, policy: CruisingPolicy) -> Self {
        self.cruising_policy = policy;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = EngineConfig::default()
            .with_assignment_policy(AssignmentPolicy::Fair)
            .with_cruising_policy(CruisingPolicy::Random)
            .with_rng_seed(7);

        assert_eq!(config.assignment_policy, AssignmentPolicy::Fair);
        assert_eq!(config.cruising_policy, CruisingPolicy::Random);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.resolution, Resolution::Eight);
    }
}

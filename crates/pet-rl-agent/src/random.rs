//! Random policy for baseline comparisons

use rand::rngs::StdRng;
use rand::SeedableRng;

use pet_rl_core::{ActionSpace, DiscreteState, PetAction, PetActionSpace, Policy};

/// Policy that selects actions uniformly at random and never learns
pub struct RandomPolicy {
    action_space: PetActionSpace,
    rng: StdRng,
}

impl RandomPolicy {
    /// Create a new random policy
    #[must_use]
    pub fn new(action_space: PetActionSpace, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self { action_space, rng }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new(PetActionSpace::default(), None)
    }
}

impl Policy for RandomPolicy {
    fn select(&mut self, _state: &DiscreteState) -> Option<PetAction> {
        self.action_space.sample(&mut self.rng)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

//! Policy seam between the agent loop and whatever picks actions

use crate::{DiscreteState, PetAction, Transition};

/// Something that proposes actions for discrete states and may learn from
/// the outcome.
pub trait Policy: Send {
    /// Propose an action, or `None` to decline (the caller falls back)
    fn select(&mut self, state: &DiscreteState) -> Option<PetAction>;

    /// Feed back the observed transition. Non-learning policies ignore it.
    fn observe(&mut self, _transition: &Transition) {}

    /// Short name for logs
    fn name(&self) -> &'static str;
}

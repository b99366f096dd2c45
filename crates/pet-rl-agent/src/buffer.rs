//! Prioritized experience replay

use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

use pet_rl_core::Transition;

/// A batch drawn from the replay buffer
#[derive(Debug, Clone, PartialEq)]
pub struct SampledBatch {
    /// Sampled transitions, possibly repeated
    pub transitions: Vec<Transition>,
    /// Importance sampling weights, max 1
    pub weights: Vec<f64>,
    /// Buffer indices of the sampled transitions
    pub indices: Vec<usize>,
}

impl SampledBatch {
    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the batch is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// A transition with its stored priority, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransition {
    /// The transition
    pub transition: Transition,
    /// Its sampling priority
    pub priority: f64,
}

/// Bounded FIFO of transitions with a parallel priority list.
///
/// Both sequences share index positions. Every mutation goes through both,
/// and a length mismatch is repaired by truncating to the shorter one.
#[derive(Debug, Clone)]
pub struct PrioritizedReplayBuffer {
    transitions: VecDeque<Transition>,
    priorities: VecDeque<f64>,
    capacity: usize,
}

impl PrioritizedReplayBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(1024)),
            priorities: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Build from raw parts without checking that the lengths agree
    #[must_use]
    pub fn from_parts(transitions: Vec<Transition>, priorities: Vec<f64>, capacity: usize) -> Self {
        Self {
            transitions: transitions.into(),
            priorities: priorities.into(),
            capacity,
        }
    }

    /// Restore from persisted entries, keeping the most recent `capacity`
    #[must_use]
    pub fn from_stored(entries: Vec<StoredTransition>, capacity: usize) -> Self {
        let skip = entries.len().saturating_sub(capacity);
        let mut buffer = Self::new(capacity);
        for entry in entries.into_iter().skip(skip) {
            buffer.push(entry.transition, entry.priority);
        }
        buffer
    }

    /// Add a transition, evicting the oldest when full
    pub fn push(&mut self, transition: Transition, priority: f64) {
        if self.capacity == 0 {
            return;
        }
        self.repair();
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
            self.priorities.pop_front();
        }
        self.transitions.push_back(transition);
        self.priorities.push_back(sanitize(priority));
    }

    /// Truncate both sequences to the shorter length. Returns whether
    /// anything had to be dropped.
    pub fn repair(&mut self) -> bool {
        let (t, p) = (self.transitions.len(), self.priorities.len());
        if t == p {
            return false;
        }
        let keep = t.min(p);
        warn!(
            transitions = t,
            priorities = p,
            keep,
            "Replay buffer out of sync, truncating"
        );
        self.transitions.truncate(keep);
        self.priorities.truncate(keep);
        true
    }

    /// Draw `batch_size` samples with replacement, proportional to priority.
    ///
    /// With fewer stored transitions than `batch_size`, every transition is
    /// returned once with weight 1. Returns `None` only when the buffer is
    /// empty or `batch_size` is zero.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        batch_size: usize,
        beta: f64,
        rng: &mut R,
    ) -> Option<SampledBatch> {
        self.repair();
        let n = self.transitions.len();
        if n == 0 || batch_size == 0 {
            return None;
        }

        if n < batch_size {
            return Some(SampledBatch {
                transitions: self.transitions.iter().cloned().collect(),
                weights: vec![1.0; n],
                indices: (0..n).collect(),
            });
        }

        let Ok(dist) = WeightedIndex::new(self.priorities.iter().copied()) else {
            warn!("Replay priorities unusable, sampling uniformly");
            let indices: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..n)).collect();
            return Some(self.batch_from(indices, vec![1.0; batch_size]));
        };

        let total: f64 = self.priorities.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let size = n as f64;
        let indices: Vec<usize> = (0..batch_size).map(|_| dist.sample(rng)).collect();
        let mut weights: Vec<f64> = indices
            .iter()
            .map(|&i| (size * self.priorities[i] / total).powf(-beta))
            .collect();
        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        if max_weight > 0.0 && max_weight.is_finite() {
            for w in &mut weights {
                *w /= max_weight;
            }
        } else {
            weights.iter_mut().for_each(|w| *w = 1.0);
        }

        Some(self.batch_from(indices, weights))
    }

    fn batch_from(&self, indices: Vec<usize>, weights: Vec<f64>) -> SampledBatch {
        SampledBatch {
            transitions: indices.iter().map(|&i| self.transitions[i].clone()).collect(),
            weights,
            indices,
        }
    }

    /// Overwrite the priority at `index`; out-of-range indices are ignored
    pub fn update_priority(&mut self, index: usize, priority: f64) {
        if let Some(slot) = self.priorities.get_mut(index) {
            *slot = sanitize(priority);
        }
    }

    /// Stored transitions, oldest first
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Stored priorities, oldest first
    pub fn priorities(&self) -> impl Iterator<Item = f64> + '_ {
        self.priorities.iter().copied()
    }

    /// Length of the priority list, which may briefly differ from [`len`](Self::len)
    #[must_use]
    pub fn priorities_len(&self) -> usize {
        self.priorities.len()
    }

    /// Snapshot of paired entries for persistence
    #[must_use]
    pub fn to_stored(&self) -> Vec<StoredTransition> {
        self.transitions
            .iter()
            .zip(self.priorities.iter())
            .map(|(transition, &priority)| StoredTransition {
                transition: transition.clone(),
                priority,
            })
            .collect()
    }

    /// Maximum number of transitions kept
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.priorities.clear();
    }
}

fn sanitize(priority: f64) -> f64 {
    if priority.is_finite() && priority > 0.0 {
        priority
    } else {
        f64::MIN_POSITIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_rl_core::{DiscreteState, PetAction};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transition(reward: f64) -> Transition {
        let s = DiscreteState::new([0, 0, 0, 0, 0], None);
        Transition::new(s, PetAction::Rest, reward, s, false)
    }

    #[test]
    fn test_small_buffer_returns_everything_uniformly() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut buffer = PrioritizedReplayBuffer::new(10);
        buffer.push(transition(1.0), 5.0);
        buffer.push(transition(2.0), 0.1);

        let batch = buffer.sample(32, 0.4, &mut rng).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.weights, vec![1.0, 1.0]);
        assert_eq!(batch.indices, vec![0, 1]);
    }

    #[test]
    fn test_empty_buffer_samples_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut buffer = PrioritizedReplayBuffer::new(10);
        assert!(buffer.sample(4, 0.4, &mut rng).is_none());
    }

    #[test]
    fn test_weights_are_normalized() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut buffer = PrioritizedReplayBuffer::new(10);
        for i in 0..6 {
            buffer.push(transition(f64::from(i)), f64::from(i + 1));
        }

        let batch = buffer.sample(4, 0.5, &mut rng).unwrap();
        assert_eq!(batch.len(), 4);
        let max = batch.weights.iter().copied().fold(0.0, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(batch.weights.iter().all(|w| *w > 0.0 && *w <= 1.0));
        assert!(batch.indices.iter().all(|i| *i < 6));
    }

    #[test]
    fn test_high_priority_dominates_sampling() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut buffer = PrioritizedReplayBuffer::new(10);
        buffer.push(transition(0.0), 1e-6);
        buffer.push(transition(1.0), 1e-6);
        buffer.push(transition(2.0), 1000.0);

        let batch = buffer.sample(3, 0.4, &mut rng).unwrap();
        let hits = batch.indices.iter().filter(|i| **i == 2).count();
        assert_eq!(hits, 3);
    }

    #[test]
    fn test_update_priority_ignores_out_of_range() {
        let mut buffer = PrioritizedReplayBuffer::new(4);
        buffer.push(transition(0.0), 1.0);
        buffer.update_priority(0, 3.0);
        buffer.update_priority(8, 3.0);
        assert_eq!(buffer.priorities().collect::<Vec<_>>(), vec![3.0]);
    }

    #[test]
    fn test_from_stored_keeps_most_recent() {
        let entries: Vec<StoredTransition> = (0..5)
            .map(|i| StoredTransition {
                transition: transition(f64::from(i)),
                priority: 1.0,
            })
            .collect();
        let buffer = PrioritizedReplayBuffer::from_stored(entries, 3);
        let rewards: Vec<f64> = buffer.transitions().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut buffer = PrioritizedReplayBuffer::new(0);
        buffer.push(transition(1.0), 1.0);
        assert!(buffer.is_empty());
    }
}

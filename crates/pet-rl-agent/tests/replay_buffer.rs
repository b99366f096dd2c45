use pet_rl_agent::PrioritizedReplayBuffer;
use pet_rl_core::{DiscreteState, PetAction, Transition};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn transition(reward: f64) -> Transition {
    let state = DiscreteState::new([1, 2, 0, 3, 1], None);
    Transition::new(state, PetAction::Feed, reward, state, false)
}

#[test]
fn overflow_keeps_only_most_recent_capacity() {
    let mut buffer = PrioritizedReplayBuffer::new(100);
    for i in 0..250 {
        buffer.push(transition(f64::from(i)), 1.0);
    }

    assert_eq!(buffer.len(), 100);
    assert_eq!(buffer.priorities_len(), 100);
    let rewards: Vec<f64> = buffer.transitions().map(|t| t.reward).collect();
    let expected: Vec<f64> = (150..250).map(f64::from).collect();
    assert_eq!(rewards, expected);
}

#[test]
fn desynced_lists_heal_on_sample() {
    let transitions: Vec<Transition> = (0..5).map(|i| transition(f64::from(i))).collect();
    let priorities = vec![1.0; 7];
    let mut buffer = PrioritizedReplayBuffer::from_parts(transitions, priorities, 10);
    let mut rng = StdRng::seed_from_u64(21);

    let batch = buffer.sample(3, 0.4, &mut rng).unwrap();
    assert_eq!(batch.len(), 3);
    assert!(buffer.len() <= 5);
    assert!(buffer.priorities_len() <= 5);
    assert_eq!(buffer.len(), buffer.priorities_len());
}

#[test]
fn desynced_lists_heal_on_push() {
    let transitions: Vec<Transition> = (0..4).map(|i| transition(f64::from(i))).collect();
    let mut buffer = PrioritizedReplayBuffer::from_parts(transitions, vec![1.0; 2], 10);

    buffer.push(transition(9.0), 1.0);
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.priorities_len(), 3);
}

proptest! {
    #[test]
    fn sampling_never_panics_on_any_desync(
        n_transitions in 0usize..20,
        n_priorities in 0usize..20,
        batch in 0usize..8,
        seed in any::<u64>(),
    ) {
        let transitions: Vec<Transition> =
            (0..n_transitions).map(|i| transition(i as f64)).collect();
        let mut buffer =
            PrioritizedReplayBuffer::from_parts(transitions, vec![0.5; n_priorities], 32);
        let mut rng = StdRng::seed_from_u64(seed);

        let sampled = buffer.sample(batch, 0.4, &mut rng);
        let shorter = n_transitions.min(n_priorities);
        prop_assert_eq!(buffer.len(), shorter);
        prop_assert_eq!(buffer.priorities_len(), shorter);
        if let Some(batch) = sampled {
            prop_assert!(batch.indices.iter().all(|i| *i < shorter));
        }
    }
}

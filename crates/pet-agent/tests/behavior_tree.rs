use proptest::prelude::*;
use std::collections::BTreeMap;

use pet_agent::{BehaviorTree, Pet, PetConfig, Status};
use pet_rl_core::Need;

fn pet_from(needs: [f64; 5], sleeping: bool) -> Pet {
    let mut pet = Pet::with_traits("Pip", "hamster", PetConfig::default(), BTreeMap::new());
    for (need, value) in Need::ALL.into_iter().zip(needs) {
        pet.set_need(need, value);
    }
    if sleeping {
        pet.sleep();
    }
    pet
}

proptest! {
    #[test]
    fn default_tree_always_succeeds(
        needs in prop::array::uniform5(-50.0f64..150.0),
        sleeping in any::<bool>(),
        ticks in 1usize..5,
    ) {
        let mut tree = BehaviorTree::pet_default();
        let mut pet = pet_from(needs, sleeping);
        for _ in 0..ticks {
            prop_assert_eq!(tree.tick(&mut pet), Status::Success);
        }
    }

    #[test]
    fn tree_actions_keep_needs_in_range(
        needs in prop::array::uniform5(0.0f64..=100.0),
        sleeping in any::<bool>(),
    ) {
        let mut tree = BehaviorTree::pet_default();
        let mut pet = pet_from(needs, sleeping);
        tree.tick(&mut pet);
        for need in Need::ALL {
            let value = pet.attributes().get(need);
            prop_assert!((0.0..=100.0).contains(&value), "{} out of range: {}", need, value);
        }
    }
}

#[test]
fn sleeping_pet_that_cannot_clean_explores_or_rests() {
    let mut tree = BehaviorTree::pet_default();
    let mut pet = pet_from([100.0, 0.0, 80.0, 10.0, 100.0], true);
    assert_eq!(tree.tick(&mut pet), Status::Success);
    assert!(pet.is_sleeping());
    assert_eq!(pet.attributes().hygiene, 10.0);
}

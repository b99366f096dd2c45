use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pet_rl_agent::{QLearningConfig, QLearningEngine};
use pet_rl_core::{DiscreteState, PetAction};

fn state(i: u8) -> DiscreteState {
    DiscreteState::new([i % 4, (i / 4) % 4, 2, 1, 3], None)
}

fn warmed_engine() -> QLearningEngine {
    let mut engine = QLearningEngine::new(QLearningConfig {
        seed: Some(1),
        ..QLearningConfig::default()
    });
    for i in 0..=255u8 {
        let action = PetAction::ALL[usize::from(i) % PetAction::ALL.len()];
        engine.learn(state(i), action, f64::from(i % 5) - 2.0, state(i.wrapping_add(1)), false);
    }
    engine
}

fn bench_learn(c: &mut Criterion) {
    c.bench_function("learn_full_batch", |b| {
        b.iter_batched(
            warmed_engine,
            |mut engine| {
                for i in 0..64u8 {
                    engine.learn(
                        black_box(state(i)),
                        PetAction::Feed,
                        1.0,
                        state(i.wrapping_add(3)),
                        false,
                    );
                }
                engine
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("choose_action", |b| {
        let mut engine = warmed_engine();
        b.iter(|| engine.choose_action(black_box(&state(7))));
    });
}

criterion_group!(benches, bench_learn);
criterion_main!(benches);

//! Simulation benchmarks for outbreak_core.
//!
//! Run with: `cargo bench -p outbreak_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use outbreak_core::config::Difficulty;
use outbreak_core::game_state::GameState;
use outbreak_core::map_generation::{generate_map, MapConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Map generation at each size preset.
pub fn map_generation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_generation");
    for (name, config) in [
        ("small", MapConfig::small()),
        ("standard", MapConfig::standard()),
        ("large", MapConfig::large()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| generate_map(black_box(&config)));
        });
    }
    group.finish();
}

/// A crowded mid-game position advanced by one full round.
pub fn ai_round_benchmark(c: &mut Criterion) {
    let map = MapConfig::standard().with_seed(777);
    let mut rng = ChaCha8Rng::seed_from_u64(map.seed);
    let Ok(mut state) = GameState::new_game(&map, Difficulty::Hard, &mut rng) else {
        return;
    };
    for _ in 0..30 {
        state.advance_round(&mut rng);
    }

    c.bench_function("advance_round_turn_30", |b| {
        b.iter_batched(
            || (state.clone(), ChaCha8Rng::seed_from_u64(1)),
            |(mut s, mut r)| {
                s.advance_round(&mut r);
                s
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash", |b| b.iter(|| black_box(&state).state_hash()));

    c.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let bytes = state.snapshot_bytes().ok()?;
            GameState::from_snapshot(&bytes).ok()
        });
    });
}

criterion_group!(benches, map_generation_benchmark, ai_round_benchmark);
criterion_main!(benches);

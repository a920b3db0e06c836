//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seed must fully determine a game: replays, batch statistics and
//! save/load all depend on it. Sources of non-determinism include:
//!
//! - **Floating-point math**: movement points use fixed-point arithmetic
//!   via [`outbreak_core::math::Fixed`]. The map noise is the one float
//!   computation and only feeds terrain thresholds.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The state keeps units and cities in vectors and keyed data in
//!   `BTreeMap`s.
//!
//! - **System randomness**: every draw comes from a caller-supplied RNG.
//!   The harness always uses [`ChaCha8Rng`] seeded from the map seed.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (combat, spawning, production)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full seeded games are reproducible
//! 4. **Parallel tests**: Running N games on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use outbreak_core::config::Difficulty;
use outbreak_core::game_state::GameState;
use outbreak_core::map_generation::MapConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel game runs.
#[derive(Debug, Clone)]
pub struct ParallelGameResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Number of rounds each game ran.
    pub rounds: u32,
    /// Number of games run.
    pub num_games: usize,
}

impl ParallelGameResult {
    /// Check if all games produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all games matched.
    ///
    /// # Panics
    ///
    /// Panics if games produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel games diverged!\n\
                 Games: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_games,
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// A game state paired with the RNG that drives it.
#[derive(Debug, Clone)]
pub struct SeededGame {
    /// The simulation.
    pub state: GameState,
    /// Source of every random draw after map generation.
    pub rng: ChaCha8Rng,
}

impl SeededGame {
    /// Start a new game on `map`, seeding the turn RNG from the map seed.
    ///
    /// # Panics
    ///
    /// Panics if the map configuration is invalid.
    #[must_use]
    pub fn new(map: MapConfig, difficulty: Difficulty) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(map.seed);
        let state = GameState::new_game(&map, difficulty, &mut rng)
            .unwrap_or_else(|e| panic!("invalid map config {map:?}: {e}"));
        Self { state, rng }
    }

    /// Small-map game on medium difficulty.
    #[must_use]
    pub fn small(seed: u64) -> Self {
        Self::new(MapConfig::small().with_seed(seed), Difficulty::Medium)
    }

    /// Play one full round: the zombie phase, then the next player turn.
    pub fn advance(&mut self) {
        self.state.advance_round(&mut self.rng);
    }

    /// Play `rounds` rounds, stopping early once the game is decided.
    pub fn play(&mut self, rounds: u32) {
        for _ in 0..rounds {
            if self.state.is_game_over() || self.state.game_won {
                break;
            }
            self.advance();
        }
    }

    /// Hash of the simulation state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }
}

/// Run a game multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the game
/// * `steps` - Number of steps to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use outbreak_test_utils::determinism::{verify_determinism, SeededGame};
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     20, // 20 rounds each
///     || SeededGame::small(7),
///     SeededGame::advance,
///     SeededGame::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Simplified determinism check for a seeded game.
///
/// Plays the same seed twice for `rounds` rounds and compares the final
/// state hashes.
pub fn verify_game_determinism(seed: u64, difficulty: Difficulty, rounds: u32) -> bool {
    let map = MapConfig::small().with_seed(seed);
    verify_determinism(
        2,
        rounds,
        || SeededGame::new(map, difficulty),
        SeededGame::advance,
        SeededGame::state_hash,
    )
    .is_deterministic
}

/// Run N copies of a game on separate threads and collect final hashes.
///
/// This catches non-determinism that only shows under thread scheduling
/// or memory layout differences.
pub fn run_parallel_games<F>(setup_fn: F, num_games: usize, rounds: u32) -> ParallelGameResult
where
    F: Fn() -> SeededGame + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..rounds {
                        game.advance();
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    ParallelGameResult {
        hashes,
        rounds,
        num_games,
    }
}

/// Compare two runs round-by-round, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(round)` if they diverge at
/// that round (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, rounds: u32) -> Option<u32>
where
    F: Fn() -> SeededGame,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for round in 1..=rounds {
        a.advance();
        b.advance();

        if a.state_hash() != b.state_hash() {
            return Some(round);
        }
    }

    None
}

/// Verify that a bincode snapshot round-trip preserves the state exactly.
pub fn verify_snapshot_round_trip(state: &GameState) -> bool {
    let Ok(bytes) = state.snapshot_bytes() else {
        return false;
    };
    GameState::from_snapshot(&bytes).is_ok_and(|restored| restored.state_hash() == state.state_hash())
}

/// Verify that a JSON save round-trip preserves the state exactly.
pub fn verify_save_round_trip(state: &GameState) -> bool {
    let Ok(json) = state.to_json() else {
        return false;
    };
    GameState::from_json(&json).is_ok_and(|restored| restored.state_hash() == state.state_hash())
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![10, 10, 10]);
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_nondeterminism_is_reported() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_seeded_game_determinism() {
        assert!(verify_game_determinism(42, Difficulty::Medium, 10));
        assert!(verify_game_determinism(7, Difficulty::Hard, 10));
    }

    #[test]
    fn test_find_divergence_on_deterministic_game() {
        assert_eq!(find_first_divergence(|| SeededGame::small(99), 8), None);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = SeededGame::small(1);
        let b = SeededGame::small(2);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_snapshot_preserves_played_game() {
        let mut game = SeededGame::small(5);
        game.play(6);
        assert!(verify_snapshot_round_trip(&game.state));
    }

    #[test]
    fn test_save_preserves_played_game() {
        let mut game = SeededGame::small(11);
        game.play(6);
        assert!(verify_save_round_trip(&game.state));
    }

    #[test]
    fn test_parallel_games() {
        let result = run_parallel_games(|| SeededGame::small(2024), 4, 5);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }
}

//! Batch game runner for balance statistics.
//!
//! Runs many autopilot games with consecutive seeds in parallel using
//! rayon and aggregates the outcomes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::runner::{run_game, GameSummary, Outcome, RunConfig};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Settings shared by every game; the seed is replaced per game.
    pub run: RunConfig,
    /// Number of games to run.
    pub game_count: u32,
    /// Seed of the first game.
    pub seed_start: u64,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Directory for `batch_results.json`, if any.
    pub output_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
            output_dir: None,
        }
    }
}

impl BatchConfig {
    /// Batch of `game_count` games with the default run settings.
    #[must_use]
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set the per-game settings.
    #[must_use]
    pub fn with_run(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games that finished.
    pub total_games: u32,
    /// Games won with the cure.
    pub victories: u32,
    /// Games lost.
    pub defeats: u32,
    /// Games stopped at the round limit.
    pub survived: u32,
    /// Mean final turn counter.
    pub mean_turns: f64,
    /// Shortest game.
    pub min_turns: u32,
    /// Longest game.
    pub max_turns: u32,
    /// Mean zombies killed per game.
    pub mean_zombies_killed: f64,
    /// Mean cities standing at the end.
    pub mean_cities: f64,
}

impl BatchSummary {
    /// Aggregate a set of game summaries.
    #[must_use]
    pub fn from_games(games: &[GameSummary]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let count = games.len() as f64;
        let outcomes = |o: Outcome| {
            let n = games.iter().filter(|g| g.outcome == o).count();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        let turns = games.iter().map(|g| f64::from(g.turns)).sum::<f64>();
        let kills = games
            .iter()
            .map(|g| f64::from(g.events.zombies_killed))
            .sum::<f64>();
        let cities = games.iter().map(|g| g.cities as f64).sum::<f64>();

        Self {
            total_games: u32::try_from(games.len()).unwrap_or(u32::MAX),
            victories: outcomes(Outcome::Victory),
            defeats: outcomes(Outcome::Defeat),
            survived: outcomes(Outcome::Survived),
            mean_turns: turns / count,
            min_turns: games.iter().map(|g| g.turns).min().unwrap_or(0),
            max_turns: games.iter().map(|g| g.turns).max().unwrap_or(0),
            mean_zombies_killed: kills / count,
            mean_cities: cities / count,
        }
    }

    /// Fraction of games won (0.0 to 1.0).
    #[must_use]
    pub fn victory_rate(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.victories) / f64::from(self.total_games)
    }
}

/// Error during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game summaries, in seed order.
    pub games: Vec<GameSummary>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of games.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        rounds = config.run.max_rounds,
        difficulty = %config.run.game.difficulty,
        "starting batch"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameSummary, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let run = config.run.clone().with_seed(seed);
            match run_game(&run) {
                Ok((_, summary)) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(summary)
                }
                Err(e) => {
                    warn!(game = i, seed, error = %e, "game failed");
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameSummary> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({} victories, {} defeats)",
        games.len(),
        duration_seconds,
        summary.victories,
        summary.defeats
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MapSize;

    fn small_batch(count: u32) -> BatchConfig {
        let mut run = RunConfig::default();
        run.game.map = MapSize::Small.config(0);
        run.max_rounds = 10;
        BatchConfig::new(count).with_run(run).with_seed(100)
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345);

        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/results")));
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(small_batch(4));

        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
    }

    #[test]
    fn test_batch_is_reproducible() {
        let a = run_batch(small_batch(3));
        let b = run_batch(small_batch(3));
        let hashes = |r: &BatchResults| r.games.iter().map(|g| g.state_hash).collect::<Vec<_>>();
        assert_eq!(hashes(&a), hashes(&b));
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.victory_rate(), 0.0);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(small_batch(2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.game_count, 2);
    }
}

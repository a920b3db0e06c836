//! Single-game runner: new game, autopilot turns, summary.

use outbreak_core::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autopilot::{Autopilot, AutopilotConfig, AutopilotStats};

/// Map size presets selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MapSize {
    /// 40x40 tiles.
    Small,
    /// 50x50 tiles.
    #[default]
    Standard,
    /// 80x80 tiles.
    Large,
}

impl MapSize {
    /// Map configuration for this preset with `seed`.
    #[must_use]
    pub const fn config(self, seed: u64) -> MapConfig {
        match self {
            Self::Small => MapConfig::small(),
            Self::Standard => MapConfig::standard(),
            Self::Large => MapConfig::large(),
        }
        .with_seed(seed)
    }
}

/// Everything needed to play one headless game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Map, difficulty and save settings.
    pub game: GameConfig,
    /// Rounds to play before stopping.
    pub max_rounds: u32,
    /// Player policy.
    pub autopilot: AutopilotConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            max_rounds: 100,
            autopilot: AutopilotConfig::default(),
        }
    }
}

impl RunConfig {
    /// Same settings with a different map seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.game.map.seed = seed;
        self
    }
}

/// How a headless game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The cure was manufactured.
    Victory,
    /// Every unit and city was lost.
    Defeat,
    /// The round limit was reached with the colony still standing.
    Survived,
}

/// Tallies taken from the event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    /// Zombies and super zombies killed by any means.
    pub zombies_killed: u32,
    /// Player units lost.
    pub units_lost: u32,
    /// Cities destroyed.
    pub cities_lost: u32,
    /// Zombies that appeared at the edges, super zombies included.
    pub zombies_spawned: u32,
    /// Level-ups across both sides.
    pub level_ups: u32,
}

impl EventTally {
    /// Count one event.
    pub fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::UnitKilled { team: Team::Enemy, .. } => self.zombies_killed += 1,
            GameEvent::UnitKilled { team: Team::Player, .. } => self.units_lost += 1,
            GameEvent::CityDestroyed { .. } => self.cities_lost += 1,
            GameEvent::ZombiesSpawned { count } => self.zombies_spawned += count,
            GameEvent::SuperZombieSpawned { .. } => self.zombies_spawned += 1,
            GameEvent::LeveledUp { .. } | GameEvent::ZombieAged { .. } => self.level_ups += 1,
            _ => {}
        }
    }
}

/// Result of one headless game, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Map seed.
    pub seed: u64,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// Autopilot policy name.
    pub policy: String,
    /// How the game ended.
    pub outcome: Outcome,
    /// Turn counter when play stopped.
    pub turns: u32,
    /// Player units alive at the end.
    pub player_units: usize,
    /// Zombies alive at the end.
    pub enemy_units: usize,
    /// Cities standing at the end.
    pub cities: usize,
    /// Unspent tech points.
    pub tech_points: u32,
    /// Techs researched.
    pub researched: Vec<TechId>,
    /// Tiles ever seen.
    pub explored_tiles: usize,
    /// Commands the autopilot issued.
    pub autopilot: AutopilotStats,
    /// Counted events.
    pub events: EventTally,
    /// Final state hash, for determinism checks.
    pub state_hash: u64,
}

impl GameSummary {
    /// Summarize a finished or stopped game.
    #[must_use]
    pub fn from_state(
        state: &GameState,
        seed: u64,
        policy: &str,
        autopilot: AutopilotStats,
        events: EventTally,
    ) -> Self {
        let outcome = if state.game_won {
            Outcome::Victory
        } else if state.is_game_over() {
            Outcome::Defeat
        } else {
            Outcome::Survived
        };
        Self {
            seed,
            difficulty: state.difficulty,
            policy: policy.to_string(),
            outcome,
            turns: state.turn,
            player_units: state.player_units().count(),
            enemy_units: state.enemy_units().count(),
            cities: state.cities.len(),
            tech_points: state.techs.tech_points,
            researched: state.techs.researched.iter().copied().collect(),
            explored_tiles: state.fog.explored_count(),
            autopilot,
            events,
            state_hash: state.state_hash(),
        }
    }

    /// Write this result to the matching leaderboard.
    ///
    /// Defeats go on the high-score board, victories on the cure board for
    /// their difficulty. Games stopped at the round limit are not recorded.
    pub fn record(&self, boards: &Leaderboards, date: &str) -> Result<()> {
        match self.outcome {
            Outcome::Victory => {
                boards.record_cure_victory(self.turns, self.difficulty, date)?;
            }
            Outcome::Defeat => {
                boards.record_high_score(self.turns, date)?;
            }
            Outcome::Survived => {}
        }
        Ok(())
    }
}

/// Play one game with the autopilot.
///
/// Returns the final state alongside its summary so callers can save it.
pub fn run_game(config: &RunConfig) -> Result<(GameState, GameSummary)> {
    let seed = config.game.map.seed;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = GameState::from_config(&config.game, &mut rng)?;
    let mut pilot = Autopilot::new(config.autopilot.clone());
    let mut tally = EventTally::default();

    for round in 0..config.max_rounds {
        pilot.play_turn(&mut state);
        for event in state.take_events() {
            tally.record(&event);
        }
        if state.game_won || state.is_game_over() {
            break;
        }
        for report in state.advance_round(&mut rng) {
            for event in &report.events {
                tally.record(event);
            }
        }
        if round % 10 == 9 {
            debug!(seed, turn = state.turn, zombies = state.enemy_units().count(), "progress");
        }
        if state.is_game_over() {
            break;
        }
    }

    let summary = GameSummary::from_state(&state, seed, &config.autopilot.name, pilot.stats(), tally);
    info!(
        seed,
        outcome = ?summary.outcome,
        turns = summary.turns,
        "game finished"
    );
    Ok((state, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(seed: u64) -> RunConfig {
        RunConfig {
            game: GameConfig {
                map: MapSize::Small.config(seed),
                ..GameConfig::default()
            },
            max_rounds: 15,
            autopilot: AutopilotConfig::default(),
        }
    }

    #[test]
    fn test_map_size_presets() {
        assert_eq!(MapSize::Small.config(3).width, 40);
        assert_eq!(MapSize::Large.config(3).height, 80);
        assert_eq!(MapSize::Standard.config(3).seed, 3);
    }

    #[test]
    fn test_run_game_is_reproducible() {
        let (_, a) = run_game(&quick_config(42)).unwrap();
        let (_, b) = run_game(&quick_config(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_matches_final_state() {
        let (state, summary) = run_game(&quick_config(7)).unwrap();
        assert_eq!(summary.turns, state.turn);
        assert_eq!(summary.cities, state.cities.len());
        assert_eq!(summary.state_hash, state.state_hash());
        assert!(summary.turns <= 16);
        assert_eq!(summary.autopilot.cities_founded, 1);
    }

    #[test]
    fn test_tally_counts_kills_by_side() {
        let mut tally = EventTally::default();
        tally.record(&GameEvent::UnitKilled {
            unit: UnitId(1),
            unit_type: UnitType::Zombie,
            team: Team::Enemy,
            at: Coord::new(1, 1),
        });
        tally.record(&GameEvent::UnitKilled {
            unit: UnitId(2),
            unit_type: UnitType::Scout,
            team: Team::Player,
            at: Coord::new(2, 2),
        });
        tally.record(&GameEvent::ZombiesSpawned { count: 4 });
        assert_eq!(tally.zombies_killed, 1);
        assert_eq!(tally.units_lost, 1);
        assert_eq!(tally.zombies_spawned, 4);
    }

    #[test]
    fn test_record_routes_by_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let boards = Leaderboards::new(dir.path());
        let (state, mut summary) = run_game(&quick_config(9)).unwrap();
        assert_eq!(summary.turns, state.turn);

        summary.outcome = Outcome::Defeat;
        summary.record(&boards, "2026-03-01 12:00:00").unwrap();
        summary.outcome = Outcome::Victory;
        summary.record(&boards, "2026-03-02 12:00:00").unwrap();
        summary.outcome = Outcome::Survived;
        summary.record(&boards, "2026-03-03 12:00:00").unwrap();

        assert_eq!(boards.high_scores().len(), 1);
        assert_eq!(boards.cure_victories(summary.difficulty).len(), 1);
    }
}

//! Difficulty levels and game configuration.
//!
//! [`GameConfig`] is loaded from RON. Difficulty-derived constants live in
//! [`DifficultySettings`] and are always recomputed from the [`Difficulty`],
//! never stored.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::map_generation::MapConfig;

/// Game difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Fewer, weaker zombies and more starting supplies.
    Easy,
    /// Baseline.
    #[default]
    Medium,
    /// More, stronger zombies and fewer starting supplies.
    Hard,
}

/// Constants derived from a [`Difficulty`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySettings {
    /// Probability that zombies spawn at the start of a player turn.
    pub zombie_spawn_rate: f64,
    /// Inclusive range added to the turn-banded spawn count, minus one.
    pub spawn_count_min: u32,
    /// Upper bound of the spawn adjustment.
    pub spawn_count_max: u32,
    /// Starting survivor supplies, as a percentage of the baseline.
    pub starting_resources_percent: u32,
    /// Zombie health and attack, as a percentage of the base stat.
    pub zombie_stat_percent: u32,
}

impl Difficulty {
    /// Every difficulty, easiest first.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Lowercase name used in saves and leaderboard file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Derived constants for this difficulty.
    #[must_use]
    pub const fn settings(self) -> DifficultySettings {
        match self {
            Self::Easy => DifficultySettings {
                zombie_spawn_rate: 0.15,
                spawn_count_min: 1,
                spawn_count_max: 2,
                starting_resources_percent: 150,
                zombie_stat_percent: 70,
            },
            Self::Medium => DifficultySettings {
                zombie_spawn_rate: 0.25,
                spawn_count_min: 1,
                spawn_count_max: 3,
                starting_resources_percent: 100,
                zombie_stat_percent: 100,
            },
            Self::Hard => DifficultySettings {
                zombie_spawn_rate: 0.35,
                spawn_count_min: 2,
                spawn_count_max: 4,
                starting_resources_percent: 70,
                zombie_stat_percent: 140,
            },
        }
    }

    /// Scale a zombie base stat, truncating.
    #[must_use]
    pub const fn scale_zombie_stat(self, base: u32) -> u32 {
        base * self.settings().zombie_stat_percent / 100
    }

    /// Scale a starting supply amount, truncating.
    #[must_use]
    pub const fn scale_starting_supply(self, base: u32) -> u32 {
        base * self.settings().starting_resources_percent / 100
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::InvalidConfig(format!("unknown difficulty '{s}'")))
    }
}

/// Settings for a new game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Map dimensions and seed.
    pub map: MapConfig,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Directory for saves and leaderboards.
    pub save_dir: PathBuf,
    /// Write `autosave.json` at the start of every player turn.
    pub autosave: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            difficulty: Difficulty::default(),
            save_dir: PathBuf::from("saves"),
            autosave: false,
        }
    }
}

impl GameConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents).map_err(|e| match e {
            GameError::ConfigParse { message, .. } => GameError::ConfigParse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate a configuration from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_str).map_err(|e| GameError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.map.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zombie_scaling() {
        assert_eq!(Difficulty::Easy.scale_zombie_stat(100), 70);
        assert_eq!(Difficulty::Medium.scale_zombie_stat(10), 10);
        assert_eq!(Difficulty::Hard.scale_zombie_stat(200), 280);
        assert_eq!(Difficulty::Hard.scale_zombie_stat(10), 14);
        assert_eq!(Difficulty::Easy.scale_zombie_stat(10), 7);
    }

    #[test]
    fn test_starting_supplies() {
        assert_eq!(Difficulty::Easy.scale_starting_supply(20), 30);
        assert_eq!(Difficulty::Easy.scale_starting_supply(40), 60);
        assert_eq!(Difficulty::Hard.scale_starting_supply(20), 14);
        assert_eq!(Difficulty::Hard.scale_starting_supply(40), 28);
    }

    #[test]
    fn test_spawn_rates_escalate() {
        let rates: Vec<f64> = Difficulty::ALL
            .iter()
            .map(|d| d.settings().zombie_spawn_rate)
            .collect();
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("nightmare".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Medium.to_string(), "medium");
    }

    #[test]
    fn test_config_from_ron() {
        let config = GameConfig::from_ron_str(
            "(map: (width: 30, height: 25, seed: 9), difficulty: hard, autosave: true)",
        )
        .unwrap();
        assert_eq!(config.map.width, 30);
        assert_eq!(config.map.seed, 9);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert!(config.autosave);
        assert_eq!(config.save_dir, PathBuf::from("saves"));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config = GameConfig::from_ron_str("()").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_config_rejects_small_map() {
        let err = GameConfig::from_ron_str("(map: (width: 10, height: 10))").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_parse_error() {
        let err = GameConfig::from_ron_str("(map: nope)").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));
    }
}

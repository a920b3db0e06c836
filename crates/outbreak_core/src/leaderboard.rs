//! High-score and cure-victory leaderboards.
//!
//! Both are small JSON arrays next to the save files. A missing or
//! unreadable file reads as an empty board. Callers supply the date string
//! so recording stays deterministic under test.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Difficulty;
use crate::error::Result;
use crate::persistence::{read_json, write_json_atomic};

/// File holding the turns-survived board.
pub const HIGH_SCORES_FILE: &str = "highscores.json";

/// Prefix of the per-difficulty cure boards.
pub const CURE_FILE_PREFIX: &str = "cure_leaderboard_";

/// Entries kept on each board.
pub const LEADERBOARD_SIZE: usize = 10;

/// Format for entry dates, as produced by `chrono::Local::now().format(..)`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns survived in a lost game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    /// Turns survived.
    pub turns: u32,
    /// When the game ended.
    pub date: String,
}

/// Turns taken to manufacture the cure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CureVictory {
    /// Turns to victory.
    pub turns: u32,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// When the game was won.
    pub date: String,
}

/// Leaderboard files in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboards {
    dir: PathBuf,
}

impl Leaderboards {
    /// Boards stored in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the high-score board.
    #[must_use]
    pub fn high_scores_path(&self) -> PathBuf {
        self.dir.join(HIGH_SCORES_FILE)
    }

    /// Path of the cure board for a difficulty.
    #[must_use]
    pub fn cure_path(&self, difficulty: Difficulty) -> PathBuf {
        self.dir
            .join(format!("{CURE_FILE_PREFIX}{}.json", difficulty.name()))
    }

    /// High scores, best first.
    #[must_use]
    pub fn high_scores(&self) -> Vec<HighScore> {
        read_board(&self.high_scores_path())
    }

    /// Cure victories for a difficulty, fastest first.
    #[must_use]
    pub fn cure_victories(&self, difficulty: Difficulty) -> Vec<CureVictory> {
        read_board(&self.cure_path(difficulty))
    }

    /// Add a score and keep the ten longest survivals.
    pub fn record_high_score(&self, turns: u32, date: impl Into<String>) -> Result<Vec<HighScore>> {
        let mut scores = self.high_scores();
        scores.push(HighScore {
            turns,
            date: date.into(),
        });
        scores.sort_by(|a, b| b.turns.cmp(&a.turns));
        scores.truncate(LEADERBOARD_SIZE);
        write_json_atomic(&self.high_scores_path(), &scores)?;
        debug!(turns, "high score recorded");
        Ok(scores)
    }

    /// Add a victory and keep the ten fastest for its difficulty.
    pub fn record_cure_victory(
        &self,
        turns: u32,
        difficulty: Difficulty,
        date: impl Into<String>,
    ) -> Result<Vec<CureVictory>> {
        let mut victories = self.cure_victories(difficulty);
        victories.push(CureVictory {
            turns,
            difficulty,
            date: date.into(),
        });
        victories.sort_by_key(|v| v.turns);
        victories.truncate(LEADERBOARD_SIZE);
        write_json_atomic(&self.cure_path(difficulty), &victories)?;
        debug!(turns, %difficulty, "cure victory recorded");
        Ok(victories)
    }
}

fn read_board<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    if !path.exists() {
        return Vec::new();
    }
    read_json(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable leaderboard, starting empty");
        Vec::new()
    })
}

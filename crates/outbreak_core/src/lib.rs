//! # Outbreak Core
//!
//! Deterministic simulation core for the Outbreak survival-strategy game.
//!
//! This crate contains the rules and nothing else:
//! - No rendering
//! - No input handling
//! - No system randomness (every random draw comes from a caller's `Rng`)
//!
//! Presentation layers read [`game_state::GameState`], forward player
//! intents as command calls and drain [`events::GameEvent`]s to show what
//! happened.
//!
//! ## Crate Structure
//!
//! - [`map_generation`] - Procedural terrain, piles and research lab
//! - [`unit`], [`city`] - Entity stats, leveling and economy
//! - [`game_state`] - World state, queries and visibility
//! - [`actions`] - Player commands
//! - [`ai`] - Zombie decision-making
//! - [`turn`] - Phase machine, production and spawning
//! - [`tech`] - Tech tree
//! - [`persistence`], [`leaderboard`] - Save files and score boards

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod ai;
pub mod city;
pub mod config;
pub mod error;
pub mod events;
pub mod game_state;
pub mod leaderboard;
pub mod map_generation;
pub mod math;
pub mod persistence;
pub mod resources;
pub mod tech;
pub mod terrain;
pub mod turn;
pub mod unit;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{HealOutcome, MoveOutcome};
    pub use crate::ai::AiTarget;
    pub use crate::city::{Building, City, StructureKind};
    pub use crate::config::{Difficulty, GameConfig};
    pub use crate::error::{ActionError, ActionResult, GameError, Result};
    pub use crate::events::GameEvent;
    pub use crate::game_state::{GameState, Occupant};
    pub use crate::leaderboard::{CureVictory, HighScore, Leaderboards};
    pub use crate::map_generation::{generate_map, GeneratedMap, MapConfig};
    pub use crate::math::{Coord, Fixed};
    pub use crate::persistence::{SaveData, SaveStore};
    pub use crate::resources::{Resource, ResourceBundle};
    pub use crate::tech::{TechId, TechProgress};
    pub use crate::terrain::{TileGrid, TileType};
    pub use crate::turn::TurnReport;
    pub use crate::unit::{Team, Unit, UnitId, UnitType};
    pub use crate::visibility::FogOfWar;
}

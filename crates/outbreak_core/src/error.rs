//! Error types for the outbreak simulation.
//!
//! Two families live here:
//! - [`GameError`] covers faults: file I/O, malformed saves, bad configuration.
//! - [`ActionError`] covers rule rejections for player commands. A command
//!   that returns one of these leaves the game state untouched.

use thiserror::Error;

use crate::math::Coord;
use crate::resources::ResourceBundle;
use crate::tech::TechId;
use crate::unit::{UnitId, UnitType};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Result type alias for player commands.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Top-level error type for faults outside the rules of play.
#[derive(Debug, Error)]
pub enum GameError {
    /// Filesystem failure while reading or writing game data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Save file parsed but its contents are inconsistent.
    #[error("Invalid save data: {0}")]
    InvalidSave(String),

    /// Save file written by an incompatible version.
    #[error("Unsupported save version {found} (supported up to {supported})")]
    UnsupportedSaveVersion {
        /// Version stored in the file.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },

    /// Configuration file parsing error.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration values that cannot produce a playable game.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Why a player command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Commands are only accepted during the player phase.
    #[error("it is not the player's turn")]
    NotPlayerTurn,

    /// The game has already been won or lost.
    #[error("the game is over")]
    GameOver,

    /// No unit with this id exists.
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    /// The unit belongs to the enemy.
    #[error("unit {0} is not controlled by the player")]
    NotPlayerUnit(UnitId),

    /// No city stands on this tile.
    #[error("no city at {0}")]
    CityNotFound(Coord),

    /// The unit has spent all of its movement points.
    #[error("unit {0} has no moves left")]
    NoMovesLeft(UnitId),

    /// A step must move exactly one tile.
    #[error("invalid step ({dx}, {dy})")]
    InvalidStep {
        /// Horizontal component.
        dx: i32,
        /// Vertical component.
        dy: i32,
    },

    /// Target tile lies outside the map.
    #[error("{0} is outside the map")]
    OutOfBounds(Coord),

    /// A friendly unit already stands there.
    #[error("{0} is blocked by a friendly unit")]
    BlockedByFriendly(Coord),

    /// Cities must keep their distance from each other.
    #[error("too close to an existing city (distance {distance}, need at least {required})")]
    TooCloseToCity {
        /// Chebyshev distance to the nearest city.
        distance: i32,
        /// Minimum allowed distance.
        required: i32,
    },

    /// A building already occupies the tile.
    #[error("a building already stands at {0}")]
    TileHasBuilding(Coord),

    /// A unit or city occupies the tile.
    #[error("{0} is occupied")]
    TileOccupied(Coord),

    /// There is no scavenge pile under the unit.
    #[error("nothing to scavenge at {0}")]
    NothingToScavenge(Coord),

    /// Only a medic can carry the cure.
    #[error("only a medic can safely carry the cure")]
    CureRequiresMedic,

    /// The unit is not standing on a city.
    #[error("unit {0} is not in a city")]
    NotInCity(UnitId),

    /// Nothing to move between the unit and the city.
    #[error("nothing to transfer")]
    NothingToTransfer,

    /// The command needs a medic.
    #[error("unit {0} is not a medic")]
    NotAMedic(UnitId),

    /// No damaged friendly unit is adjacent to the medic.
    #[error("no wounded ally next to unit {0}")]
    NoPatientInRange(UnitId),

    /// The city cannot pay for the command.
    #[error("not enough resources: need {required}, have {available}")]
    InsufficientResources {
        /// Full cost of the command.
        required: ResourceBundle,
        /// Current stock.
        available: ResourceBundle,
    },

    /// Structure is too far from the city.
    #[error("{kind} must be within {max} tiles of the city (distance {distance})")]
    OutOfBuildRange {
        /// Structure name.
        kind: &'static str,
        /// Chebyshev distance from the city.
        distance: i32,
        /// Maximum allowed distance.
        max: i32,
    },

    /// Distant walls need line of sight.
    #[error("{0} is not currently visible")]
    TileNotVisible(Coord),

    /// Docks only float on water.
    #[error("docks must be built on water")]
    RequiresWater,

    /// Land structures cannot go on water.
    #[error("cannot build {0} on water")]
    CannotBuildOnWater(&'static str),

    /// Cure manufacture needs a hospital.
    #[error("city needs a hospital to manufacture the cure")]
    HospitalRequired,

    /// Cure manufacture needs the cure sample in stock.
    #[error("city does not hold the cure sample")]
    CureSampleMissing,

    /// No building on the tile.
    #[error("no building at {0}")]
    NoBuildingAt(Coord),

    /// Building cannot be upgraded further.
    #[error("building at {0} is already at maximum level")]
    MaxLevel(Coord),

    /// This unit type cannot be recruited, or not yet.
    #[error("cannot recruit {0}")]
    NotRecruitable(UnitType),

    /// Tech already unlocked.
    #[error("{0} is already researched")]
    AlreadyResearched(TechId),

    /// A prerequisite tech is missing.
    #[error("{tech} requires {missing}")]
    MissingPrerequisite {
        /// Tech being researched.
        tech: TechId,
        /// First missing prerequisite.
        missing: TechId,
    },

    /// Not enough tech points.
    #[error("not enough tech points: need {required}, have {available}")]
    InsufficientTechPoints {
        /// Cost after discounts.
        required: u32,
        /// Current balance.
        available: u32,
    },

    /// The command depends on a tech that has not been researched.
    #[error("requires {0}")]
    TechLocked(TechId),

    /// Airlift needs a different city as destination.
    #[error("airlift destination must be another city")]
    SameCity,
}

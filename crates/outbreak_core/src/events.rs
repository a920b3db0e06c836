//! Events emitted by commands and turn transitions.
//!
//! The game state appends to an internal log; presentation layers drain it
//! with [`crate::game_state::GameState::take_events`] and decide how to show
//! each entry.

use serde::{Deserialize, Serialize};

use crate::city::StructureKind;
use crate::math::Coord;
use crate::resources::ResourceBundle;
use crate::tech::TechId;
use crate::unit::{Team, UnitId, UnitType};

/// Something that happened in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A unit stepped onto a new tile.
    UnitMoved {
        /// Mover.
        unit: UnitId,
        /// Previous anchor.
        from: Coord,
        /// New anchor.
        to: Coord,
    },
    /// A unit hit another unit.
    UnitAttacked {
        /// Attacker.
        attacker: UnitId,
        /// Victim.
        target: UnitId,
        /// Damage dealt after modifiers.
        damage: i32,
        /// Victim health afterwards.
        remaining: i32,
    },
    /// A unit died.
    UnitKilled {
        /// Dead unit.
        unit: UnitId,
        /// Its type.
        unit_type: UnitType,
        /// Its side.
        team: Team,
        /// Where it fell.
        at: Coord,
    },
    /// A dead unit's inventory became a scavenge pile.
    ItemsDropped {
        /// Pile tile.
        at: Coord,
        /// What was dropped.
        items: ResourceBundle,
    },
    /// A zombie hit a city.
    CityAttacked {
        /// Attacker.
        attacker: UnitId,
        /// City name.
        city: String,
        /// Damage dealt.
        damage: i32,
        /// City health afterwards.
        remaining: i32,
    },
    /// A city fell.
    CityDestroyed {
        /// City name.
        city: String,
        /// City tile.
        at: Coord,
    },
    /// A zombie hit a structure.
    BuildingAttacked {
        /// Attacker.
        attacker: UnitId,
        /// Structure tile.
        at: Coord,
        /// Structure kind.
        kind: StructureKind,
        /// Structure health afterwards.
        remaining: i32,
    },
    /// A structure was torn down.
    BuildingDestroyed {
        /// Structure tile.
        at: Coord,
        /// Structure kind.
        kind: StructureKind,
    },
    /// Automated defenses fired at a zombie.
    DefensesFired {
        /// Defended tile.
        from: Coord,
        /// Zombie hit.
        target: UnitId,
        /// Damage dealt.
        damage: i32,
    },
    /// A unit gained at least one level from experience.
    LeveledUp {
        /// Unit.
        unit: UnitId,
        /// New level.
        level: u32,
    },
    /// A zombie leveled up from age.
    ZombieAged {
        /// Zombie.
        unit: UnitId,
        /// New level.
        level: u32,
        /// Age in turns.
        age: u32,
    },
    /// Zombies appeared on the map edges.
    ZombiesSpawned {
        /// Zombies actually placed.
        count: u32,
    },
    /// A super zombie appeared.
    SuperZombieSpawned {
        /// New unit.
        unit: UnitId,
        /// Anchor tile.
        at: Coord,
        /// Its health.
        health: i32,
        /// Its attack.
        attack: i32,
    },
    /// A city produced its yield.
    ResourcesProduced {
        /// City name.
        city: String,
        /// Yield added.
        amount: ResourceBundle,
    },
    /// The player earned tech points.
    TechPointsEarned {
        /// Points added.
        points: u32,
    },
    /// A tech was unlocked.
    TechResearched {
        /// Tech.
        tech: TechId,
        /// Points spent.
        cost: u32,
    },
    /// A new city was founded.
    CityFounded {
        /// City name.
        city: String,
        /// City tile.
        at: Coord,
        /// Starting stock.
        resources: ResourceBundle,
    },
    /// A unit picked up a scavenge pile.
    Scavenged {
        /// Unit.
        unit: UnitId,
        /// What it took.
        items: ResourceBundle,
    },
    /// Resources moved between a unit and a city.
    Transferred {
        /// Unit.
        unit: UnitId,
        /// City name.
        city: String,
        /// Amount moved.
        items: ResourceBundle,
        /// `true` for unit to city, `false` for city to unit.
        deposit: bool,
    },
    /// A medic healed an ally.
    Healed {
        /// Medic.
        medic: UnitId,
        /// Patient.
        patient: UnitId,
        /// Health restored.
        amount: i32,
    },
    /// A city placed a structure.
    StructureBuilt {
        /// City name.
        city: String,
        /// Structure kind.
        kind: StructureKind,
        /// Structure tile.
        at: Coord,
    },
    /// A structure gained a level.
    BuildingUpgraded {
        /// Structure tile.
        at: Coord,
        /// New level.
        level: u32,
    },
    /// A city trained a unit.
    Recruited {
        /// New unit.
        unit: UnitId,
        /// Its type.
        unit_type: UnitType,
        /// City name.
        city: String,
    },
    /// A unit flew between cities.
    Airlifted {
        /// Unit.
        unit: UnitId,
        /// Departure tile.
        from: Coord,
        /// Arrival tile.
        to: Coord,
    },
    /// The cure was manufactured and the game is won.
    CureManufactured {
        /// City name.
        city: String,
        /// Turn of victory.
        turn: u32,
        /// Zombies turned back into survivors.
        converted: u32,
    },
}

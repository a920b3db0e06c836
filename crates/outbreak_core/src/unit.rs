//! Units: survivors, soldiers, medics, scouts and the zombies hunting them.
//!
//! A unit's base stats come from a fixed per-type table. Zombie health and
//! attack are scaled by difficulty; player units never are. Units level up
//! from experience (player) or from age (zombies), growing the same way.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::math::{fixed_serde, moves, Coord, Fixed, ROAD_MOVE_COST, STEP_MOVE_COST};
use crate::resources::ResourceBundle;
use crate::terrain::TileType;

/// Experience needed to reach level 2.
pub const BASE_XP_TO_LEVEL: u32 = 100;

/// Stable identifier for a unit within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Human survivors.
    Player,
    /// The horde.
    Enemy,
}

impl Team {
    /// Lowercase name used in saves.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Generalist; can found cities.
    Survivor,
    /// Fast, far-sighted, earns experience by exploring.
    Scout,
    /// Slow, tough, hits hard.
    Soldier,
    /// Heals adjacent allies; the only unit that can carry the cure.
    Medic,
    /// Standard undead.
    Zombie,
    /// Hulking 2x2 undead.
    SuperZombie,
    /// Elite recruit unlocked by research.
    SuperSoldier,
}

/// Base statistics for a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Starting and maximum health.
    pub max_health: i32,
    /// Movement points per turn.
    pub max_moves: i32,
    /// Damage per attack.
    pub attack_power: i32,
    /// Side length of the square footprint.
    pub size: i32,
}

impl UnitType {
    /// Every unit type.
    pub const ALL: [Self; 7] = [
        Self::Survivor,
        Self::Scout,
        Self::Soldier,
        Self::Medic,
        Self::Zombie,
        Self::SuperZombie,
        Self::SuperSoldier,
    ];

    /// Lowercase name used in saves.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Survivor => "survivor",
            Self::Scout => "scout",
            Self::Soldier => "soldier",
            Self::Medic => "medic",
            Self::Zombie => "zombie",
            Self::SuperZombie => "super_zombie",
            Self::SuperSoldier => "super_soldier",
        }
    }

    /// Whether this is one of the undead types.
    #[must_use]
    pub const fn is_zombie(self) -> bool {
        matches!(self, Self::Zombie | Self::SuperZombie)
    }

    /// Base stats for this type at the given difficulty.
    #[must_use]
    pub const fn base_stats(self, difficulty: Difficulty) -> UnitStats {
        let (max_health, max_moves, attack_power, size) = match self {
            Self::Survivor => (100, 3, 10, 1),
            Self::Scout => (75, 5, 8, 1),
            Self::Soldier => (120, 2, 20, 1),
            Self::Medic => (80, 3, 5, 1),
            Self::SuperSoldier => (150, 3, 30, 1),
            Self::Zombie => (
                difficulty.scale_zombie_stat(100) as i32,
                2,
                difficulty.scale_zombie_stat(10) as i32,
                1,
            ),
            Self::SuperZombie => (
                difficulty.scale_zombie_stat(200) as i32,
                2,
                difficulty.scale_zombie_stat(50) as i32,
                2,
            ),
        };
        UnitStats {
            max_health,
            max_moves,
            attack_power,
            size,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown unit type '{s}'"))
    }
}

/// Age at which a zombie reaches each level beyond 1.
#[must_use]
pub const fn zombie_level_for_age(age_in_turns: u32) -> u32 {
    match age_in_turns {
        75.. => 4,
        50.. => 3,
        25.. => 2,
        _ => 1,
    }
}

/// A unit on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, stable for the lifetime of the unit.
    pub id: UnitId,
    /// Anchor tile (top-left of the footprint).
    pub position: Coord,
    /// Kind of unit.
    pub unit_type: UnitType,
    /// Owning side.
    pub team: Team,
    /// Current health; the unit dies at zero or below.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
    /// Damage dealt per attack.
    pub attack_power: i32,
    /// Movement points restored each turn.
    pub max_moves: i32,
    /// Movement points left this turn.
    #[serde(with = "fixed_serde")]
    pub moves_remaining: Fixed,
    /// Footprint side length.
    pub size: i32,
    /// Carried resources.
    pub inventory: ResourceBundle,
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience toward the next level.
    pub xp: u32,
    /// Experience needed for the next level.
    pub xp_to_next_level: u32,
    /// Turns survived; drives zombie leveling.
    pub age_in_turns: u32,
    /// Tiles a scout has entered.
    pub tiles_explored: BTreeSet<Coord>,
}

impl Unit {
    /// Create a fresh level-1 unit with full health and moves.
    #[must_use]
    pub fn new(
        id: UnitId,
        unit_type: UnitType,
        team: Team,
        position: Coord,
        difficulty: Difficulty,
    ) -> Self {
        let stats = unit_type.base_stats(difficulty);
        Self {
            id,
            position,
            unit_type,
            team,
            health: stats.max_health,
            max_health: stats.max_health,
            attack_power: stats.attack_power,
            max_moves: stats.max_moves,
            moves_remaining: moves(stats.max_moves),
            size: stats.size,
            inventory: ResourceBundle::EMPTY,
            level: 1,
            xp: 0,
            xp_to_next_level: BASE_XP_TO_LEVEL,
            age_in_turns: 0,
            tiles_explored: BTreeSet::new(),
        }
    }

    /// Whether health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the unit is at full health.
    #[must_use]
    pub const fn is_wounded(&self) -> bool {
        self.health < self.max_health
    }

    /// Whether any movement points remain.
    #[must_use]
    pub fn can_move(&self) -> bool {
        self.moves_remaining > Fixed::ZERO
    }

    /// Whether the unit's footprint covers `tile`.
    #[must_use]
    pub const fn occupies(&self, tile: Coord) -> bool {
        self.position.footprint_contains(self.size, tile)
    }

    /// Tiles covered by the footprint.
    pub fn footprint(&self) -> impl Iterator<Item = Coord> {
        self.position.footprint(self.size)
    }

    /// Whether this is an enemy zombie, the only units that age.
    #[must_use]
    pub const fn is_hostile_zombie(&self) -> bool {
        matches!(self.team, Team::Enemy) && self.unit_type.is_zombie()
    }

    /// Movement cost of entering a tile.
    #[must_use]
    pub fn move_cost(terrain: TileType) -> Fixed {
        if terrain == TileType::Road {
            ROAD_MOVE_COST
        } else {
            STEP_MOVE_COST
        }
    }

    /// Deduct movement points, never dropping below zero.
    pub fn spend_moves(&mut self, cost: Fixed) {
        self.moves_remaining = (self.moves_remaining - cost).max(Fixed::ZERO);
    }

    /// Step by `(dx, dy)` onto a tile of type `terrain`.
    ///
    /// Collision checks are the caller's job. Returns `false` without moving
    /// when no movement points remain.
    pub fn step(&mut self, dx: i32, dy: i32, terrain: TileType) -> bool {
        if !self.can_move() {
            return false;
        }
        self.position = self.position.offset(dx, dy);
        self.spend_moves(Self::move_cost(terrain));
        true
    }

    /// Restore movement points for a new turn.
    pub fn reset_moves(&mut self) {
        self.moves_remaining = moves(self.max_moves);
    }

    /// Apply damage. Returns `true` if the unit died.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = self.health.saturating_sub(amount.max(0));
        !self.is_alive()
    }

    /// Restore health up to the cap. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount.max(0)).min(self.max_health);
        self.health - before
    }

    fn grow(&mut self) {
        let hp_boost = self.max_health / 10;
        self.max_health += hp_boost;
        self.health += hp_boost;
        self.attack_power += self.attack_power / 10 + 1;
    }

    /// Add experience, leveling up as many times as it covers.
    ///
    /// Each level grants +10% max health (also healed), +10% attack plus one,
    /// and multiplies the next threshold by 1.5. Returns whether any level
    /// was gained.
    pub fn gain_xp(&mut self, amount: u32) -> bool {
        self.xp = self.xp.saturating_add(amount);
        let mut leveled = false;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level += 1;
            self.grow();
            self.xp_to_next_level = self.xp_to_next_level * 3 / 2;
            leveled = true;
        }
        leveled
    }

    /// Raise the unit to `level` without consuming experience.
    pub fn promote_to(&mut self, level: u32) -> u32 {
        let mut gained = 0;
        while self.level < level {
            self.level += 1;
            self.grow();
            gained += 1;
        }
        gained
    }

    /// Level an enemy zombie up to what its age warrants. Returns levels gained.
    pub fn apply_age_level_ups(&mut self) -> u32 {
        if !self.is_hostile_zombie() {
            return 0;
        }
        self.promote_to(zombie_level_for_age(self.age_in_turns))
    }

    /// Record a tile entered by a scout. Returns `true` the first time.
    pub fn record_explored(&mut self, tile: Coord) -> bool {
        self.unit_type == UnitType::Scout && self.tiles_explored.insert(tile)
    }

    /// Turn into a fresh level-1 player survivor, keeping position and inventory.
    pub fn convert_to_survivor(&mut self) {
        let stats = UnitType::Survivor.base_stats(Difficulty::Medium);
        self.unit_type = UnitType::Survivor;
        self.team = Team::Player;
        self.health = stats.max_health;
        self.max_health = stats.max_health;
        self.attack_power = stats.attack_power;
        self.max_moves = stats.max_moves;
        self.moves_remaining = moves(stats.max_moves);
        self.size = stats.size;
        self.level = 1;
        self.xp = 0;
        self.xp_to_next_level = BASE_XP_TO_LEVEL;
        self.age_in_turns = 0;
        self.tiles_explored.clear();
    }
}

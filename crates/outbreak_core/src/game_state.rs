//! The game state: map, fog, units, cities and research.
//!
//! This module holds the data and the queries. Player commands live in
//! [`crate::actions`], the zombie phase in [`crate::ai`] and the turn
//! machine in [`crate::turn`]; all of them are `impl GameState` blocks.
//!
//! # Determinism
//!
//! Every random decision draws from an `Rng` passed in by the caller.
//! Coordinate-keyed maps are `BTreeMap`s and units are stored in creation
//! order, so iteration order never depends on hashing.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::city::{Building, City, StructureKind};
use crate::config::{Difficulty, GameConfig};
use crate::error::{ActionError, ActionResult, GameError, Result};
use crate::events::GameEvent;
use crate::map_generation::{generate_map, GeneratedMap, MapConfig};
use crate::math::Coord;
use crate::resources::ResourceBundle;
use crate::tech::{TechId, TechProgress};
use crate::terrain::{TileGrid, TileType};
use crate::unit::{Team, Unit, UnitId, UnitType};
use crate::visibility::{
    FogOfWar, BUILDING_VISION, CITY_VISION, SCOUT_VISION, UNIT_VISION,
};

/// Tiles the three starting survivors stand on.
pub const STARTING_SURVIVORS: [Coord; 3] = [Coord::new(5, 5), Coord::new(6, 5), Coord::new(7, 5)];

/// Food and materials each starting survivor carries before difficulty scaling.
pub const STARTING_SUPPLIES: (u32, u32) = (20, 40);

/// Zombies placed on the map at the start.
pub const INITIAL_ZOMBIES: usize = 5;

/// Minimum Chebyshev distance between cities.
pub const MIN_CITY_DISTANCE: i32 = 3;

/// Extra vision for scouts with Scout Training.
const SCOUT_TRAINING_VISION: i32 = 1;

/// Extra city vision with Watchtower.
const WATCHTOWER_VISION: i32 = 2;

/// Tech points for destroying a zombie.
pub const ZOMBIE_KILL_POINTS: u32 = 1;

/// Tech points for destroying a super zombie.
pub const SUPER_ZOMBIE_KILL_POINTS: u32 = 5;

/// What occupies a tile, as seen by a moving unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// Another unit; its footprint covers the tile.
    Unit(UnitId),
    /// A city stands on the tile.
    City(Coord),
    /// A structure stands on the tile.
    Building(Coord),
}

/// Complete simulation state for one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Terrain, fixed after generation.
    pub grid: TileGrid,
    /// Scavenge piles keyed by tile.
    pub resources: BTreeMap<Coord, ResourceBundle>,
    /// Research lab tile, if the map has one.
    pub research_lab: Option<Coord>,
    /// Turn counter, starting at 1.
    pub turn: u32,
    /// Side whose phase it is.
    pub current_team: Team,
    /// Set once the cure has been manufactured.
    pub game_won: bool,
    /// Difficulty; spawn constants derive from it.
    pub difficulty: Difficulty,
    /// Player fog of war.
    pub fog: FogOfWar,
    /// Every unit, in creation order.
    pub units: Vec<Unit>,
    /// Every city, in founding order.
    pub cities: Vec<City>,
    /// Research state and tech points.
    pub techs: TechProgress,
    next_unit_id: u32,
    #[serde(skip)]
    autosave_dir: Option<PathBuf>,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Wrap a generated map with no units or cities, at turn 1.
    #[must_use]
    pub fn from_map(map: GeneratedMap, difficulty: Difficulty) -> Self {
        let fog = FogOfWar::new(map.grid.width(), map.grid.height());
        Self {
            grid: map.grid,
            resources: map.resources,
            research_lab: Some(map.research_lab),
            turn: 1,
            current_team: Team::Player,
            game_won: false,
            difficulty,
            fog,
            units: Vec::new(),
            cities: Vec::new(),
            techs: TechProgress::default(),
            next_unit_id: 0,
            autosave_dir: None,
            events: Vec::new(),
        }
    }

    /// An all-grass world with no lab, piles, units or cities.
    ///
    /// Used for hand-built scenarios.
    #[must_use]
    pub fn blank(width: i32, height: i32, difficulty: Difficulty) -> Self {
        let mut state = Self::from_map(
            GeneratedMap {
                grid: TileGrid::filled(width, height, TileType::Grass),
                resources: BTreeMap::new(),
                research_lab: Coord::default(),
            },
            difficulty,
        );
        state.research_lab = None;
        state
    }

    /// Generate a map and place the starting survivors and zombies.
    pub fn new_game<R: Rng>(map: &MapConfig, difficulty: Difficulty, rng: &mut R) -> Result<Self> {
        let generated = generate_map(map)?;
        let mut state = Self::from_map(generated, difficulty);
        state.spawn_initial_units(rng);
        state.update_visibility();
        info!(
            seed = map.seed,
            width = map.width,
            height = map.height,
            %difficulty,
            "new game"
        );
        Ok(state)
    }

    /// New game from a full configuration, enabling autosave if requested.
    pub fn from_config<R: Rng>(config: &GameConfig, rng: &mut R) -> Result<Self> {
        let mut state = Self::new_game(&config.map, config.difficulty, rng)?;
        if config.autosave {
            state.set_autosave_dir(Some(config.save_dir.clone()));
        }
        Ok(state)
    }

    fn spawn_initial_units<R: Rng>(&mut self, rng: &mut R) {
        let food = self.difficulty.scale_starting_supply(STARTING_SUPPLIES.0);
        let materials = self.difficulty.scale_starting_supply(STARTING_SUPPLIES.1);
        for tile in STARTING_SURVIVORS {
            let id = self.spawn_unit(UnitType::Survivor, Team::Player, tile);
            if let Some(unit) = self.unit_mut(id) {
                unit.inventory = ResourceBundle::supplies(food, materials);
            }
        }

        let (w, h) = (self.grid.width(), self.grid.height());
        for _ in 0..INITIAL_ZOMBIES {
            let free = (0..100)
                .map(|_| Coord::new(rng.gen_range(10..=w - 5), rng.gen_range(10..=h - 5)))
                .find(|&c| self.unit_at(c).is_none());
            if let Some(tile) = free {
                self.spawn_unit(UnitType::Zombie, Team::Enemy, tile);
            }
        }
    }

    /// Directory for `autosave.json`, or `None` to disable autosave.
    pub fn set_autosave_dir(&mut self, dir: Option<PathBuf>) {
        self.autosave_dir = dir;
    }

    /// Current autosave directory.
    #[must_use]
    pub fn autosave_dir(&self) -> Option<&Path> {
        self.autosave_dir.as_deref()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Unit bookkeeping
    // ========================================================================

    /// Create a unit and append it. Returns its id.
    pub fn spawn_unit(&mut self, unit_type: UnitType, team: Team, position: Coord) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units
            .push(Unit::new(id, unit_type, team, position, self.difficulty));
        id
    }

    /// Append an already-built unit, assigning it a fresh id.
    pub fn insert_unit(&mut self, mut unit: Unit) -> UnitId {
        unit.id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let id = unit.id;
        self.units.push(unit);
        id
    }

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Unit whose footprint covers `tile`.
    #[must_use]
    pub fn unit_at(&self, tile: Coord) -> Option<&Unit> {
        self.unit_at_excluding(tile, None)
    }

    /// Unit whose footprint covers `tile`, ignoring `exclude`.
    #[must_use]
    pub fn unit_at_excluding(&self, tile: Coord, exclude: Option<UnitId>) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| Some(u.id) != exclude && u.occupies(tile))
    }

    /// Player units.
    pub fn player_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.team == Team::Player)
    }

    /// Enemy units.
    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.team == Team::Enemy)
    }

    /// Remove a unit, dropping its inventory on its tile.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let idx = self.units.iter().position(|u| u.id == id)?;
        let unit = self.units.remove(idx);
        self.emit(GameEvent::UnitKilled {
            unit: unit.id,
            unit_type: unit.unit_type,
            team: unit.team,
            at: unit.position,
        });
        self.drop_items(unit.position, unit.inventory);
        Some(unit)
    }

    /// Merge `items` into the scavenge pile at `tile`.
    pub fn drop_items(&mut self, tile: Coord, items: ResourceBundle) {
        if items.is_empty() {
            return;
        }
        self.resources.entry(tile).or_default().merge(&items);
        debug!(%tile, %items, "items dropped");
        self.emit(GameEvent::ItemsDropped { at: tile, items });
    }

    /// Deal `raw` damage to a unit, applying Fortification to player units
    /// standing on a wall. Kills and removes the unit at zero health.
    ///
    /// Returns the damage dealt and whether the unit died.
    pub(crate) fn damage_unit(&mut self, attacker: UnitId, target: UnitId, raw: i32) -> (i32, bool) {
        let fortified = self.techs.has(TechId::Fortification)
            && self.unit(target).is_some_and(|u| {
                u.team == Team::Player
                    && self
                        .building_at(u.position)
                        .is_some_and(|b| b.kind == StructureKind::Wall)
            });
        let damage = if fortified { raw / 2 } else { raw };
        let Some(victim) = self.unit_mut(target) else {
            return (0, false);
        };
        let died = victim.take_damage(damage);
        let remaining = victim.health;
        self.emit(GameEvent::UnitAttacked {
            attacker,
            target,
            damage,
            remaining,
        });
        if died {
            self.remove_unit(target);
            self.update_visibility();
        }
        (damage, died)
    }

    /// Tech points for killing a unit of this type.
    #[must_use]
    pub const fn kill_reward(unit_type: UnitType) -> u32 {
        match unit_type {
            UnitType::SuperZombie => SUPER_ZOMBIE_KILL_POINTS,
            UnitType::Zombie => ZOMBIE_KILL_POINTS,
            _ => 0,
        }
    }

    pub(crate) fn award_tech_points(&mut self, points: u32) {
        if points > 0 {
            self.techs.earn(points);
            self.emit(GameEvent::TechPointsEarned { points });
        }
    }

    // ========================================================================
    // Cities and buildings
    // ========================================================================

    /// City standing on `tile`.
    #[must_use]
    pub fn city_at(&self, tile: Coord) -> Option<&City> {
        self.cities.iter().find(|c| c.position == tile)
    }

    pub(crate) fn city_index_at(&self, tile: Coord) -> Option<usize> {
        self.cities.iter().position(|c| c.position == tile)
    }

    /// Structure on `tile`, whichever city owns it.
    #[must_use]
    pub fn building_at(&self, tile: Coord) -> Option<&Building> {
        self.cities.iter().find_map(|c| c.building_at(tile))
    }

    /// Index of the city owning the structure on `tile`.
    #[must_use]
    pub fn building_owner(&self, tile: Coord) -> Option<usize> {
        self.cities
            .iter()
            .position(|c| c.building_locations.contains_key(&tile))
    }

    /// First occupant found over the footprint a unit would cover at `anchor`.
    ///
    /// Each tile is checked for another unit, then a city, then a structure.
    #[must_use]
    pub fn check_collision_for_multitile_unit(
        &self,
        mover: UnitId,
        anchor: Coord,
        size: i32,
    ) -> Option<Occupant> {
        anchor.footprint(size).find_map(|tile| {
            if let Some(u) = self.unit_at_excluding(tile, Some(mover)) {
                Some(Occupant::Unit(u.id))
            } else if self.city_at(tile).is_some() {
                Some(Occupant::City(tile))
            } else if self.building_at(tile).is_some() {
                Some(Occupant::Building(tile))
            } else {
                None
            }
        })
    }

    /// Whether any unit, city or structure sits on any tile of the footprint.
    #[must_use]
    pub fn footprint_blocked(&self, anchor: Coord, size: i32) -> bool {
        anchor.footprint(size).any(|tile| {
            self.unit_at(tile).is_some()
                || self.city_at(tile).is_some()
                || self.building_at(tile).is_some()
        })
    }

    /// Check the city-spacing rule for a new city at `tile`.
    pub fn can_found_city(&self, tile: Coord) -> ActionResult<()> {
        if let Some(distance) = self.cities.iter().map(|c| c.position.chebyshev(tile)).min() {
            if distance < MIN_CITY_DISTANCE {
                return Err(ActionError::TooCloseToCity {
                    distance,
                    required: MIN_CITY_DISTANCE,
                });
            }
        }
        Ok(())
    }

    /// Next free "New Hope N" name.
    #[must_use]
    pub fn suggest_city_name(&self) -> String {
        let highest = self
            .cities
            .iter()
            .filter_map(|c| c.name.strip_prefix("New Hope ")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("New Hope {}", highest + 1)
    }

    /// Sum of all player inventories and city stockpiles.
    #[must_use]
    pub fn total_resources(&self) -> ResourceBundle {
        let mut total = ResourceBundle::EMPTY;
        for unit in self.player_units() {
            total.merge(&unit.inventory);
        }
        for city in &self.cities {
            total.merge(&city.resources);
        }
        total
    }

    /// Next-turn yield of every city, in founding order.
    #[must_use]
    pub fn production_preview(&self) -> Vec<(String, ResourceBundle)> {
        self.cities
            .iter()
            .map(|c| (c.name.clone(), c.calculate_production(&self.techs)))
            .collect()
    }

    // ========================================================================
    // Visibility and outcome
    // ========================================================================

    /// Current vision sources as `(center, radius)` pairs.
    #[must_use]
    pub fn vision_sources(&self) -> Vec<(Coord, i32)> {
        let scout_vision = SCOUT_VISION
            + if self.techs.has(TechId::ScoutTraining) {
                SCOUT_TRAINING_VISION
            } else {
                0
            };
        let city_vision = CITY_VISION
            + if self.techs.has(TechId::Watchtower) {
                WATCHTOWER_VISION
            } else {
                0
            };
        let mut sources: Vec<(Coord, i32)> = self
            .player_units()
            .map(|u| {
                let radius = if u.unit_type == UnitType::Scout {
                    scout_vision
                } else {
                    UNIT_VISION
                };
                (u.position, radius)
            })
            .collect();
        for city in &self.cities {
            sources.push((city.position, city_vision));
            sources.extend(
                city.building_locations
                    .keys()
                    .map(|&tile| (tile, BUILDING_VISION)),
            );
        }
        sources
    }

    /// Rebuild the visible layer; explored only grows.
    pub fn update_visibility(&mut self) {
        if self.game_won {
            self.fog.reveal_all();
            return;
        }
        let sources = self.vision_sources();
        self.fog.recompute(sources);
    }

    /// No player units and no cities remain.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.player_units().next().is_none() && self.cities.is_empty()
    }

    /// Win the game: reveal the map and turn every enemy into a survivor.
    pub(crate) fn win_with_cure(&mut self, city: String) {
        self.game_won = true;
        self.fog.reveal_all();
        let mut converted = 0;
        for unit in self.units.iter_mut().filter(|u| u.team == Team::Enemy) {
            unit.convert_to_survivor();
            converted += 1;
        }
        info!(%city, turn = self.turn, converted, "cure manufactured");
        self.emit(GameEvent::CureManufactured {
            city,
            turn: self.turn,
            converted,
        });
    }

    /// Tile type at `tile`, treating off-map as `None`.
    #[must_use]
    pub fn terrain(&self, tile: Coord) -> Option<TileType> {
        self.grid.get(tile)
    }

    // ========================================================================
    // Determinism
    // ========================================================================

    /// Hash of the full simulation state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.turn.hash(&mut hasher);
        self.current_team.hash(&mut hasher);
        self.game_won.hash(&mut hasher);
        self.difficulty.hash(&mut hasher);
        self.grid.hash(&mut hasher);
        self.resources.hash(&mut hasher);
        self.research_lab.hash(&mut hasher);
        self.fog.hash(&mut hasher);
        self.units.hash(&mut hasher);
        self.cities.hash(&mut hasher);
        self.techs.hash(&mut hasher);
        self.next_unit_id.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the state to a compact bincode snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game state: {e}")))
    }

    /// Restore a state from [`GameState::snapshot_bytes`] output.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_snapshot(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize game state: {e}"))
        })
    }

    /// Id the next spawned unit will receive.
    #[must_use]
    pub const fn next_unit_id(&self) -> u32 {
        self.next_unit_id
    }

    pub(crate) fn set_next_unit_id(&mut self, next: u32) {
        self.next_unit_id = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Resource;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_state() -> GameState {
        GameState::blank(30, 30, Difficulty::Medium)
    }

    #[test]
    fn test_new_game_setup() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let state = GameState::new_game(&MapConfig::standard(), Difficulty::Easy, &mut rng).unwrap();
        let survivors: Vec<&Unit> = state.player_units().collect();
        assert_eq!(survivors.len(), 3);
        assert_eq!(survivors[0].position, Coord::new(5, 5));
        assert_eq!(survivors[0].inventory, ResourceBundle::supplies(30, 60));
        assert_eq!(state.enemy_units().count(), INITIAL_ZOMBIES);
        for z in state.enemy_units() {
            assert!((10..=45).contains(&z.position.x));
            assert!((10..=45).contains(&z.position.y));
        }
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_team, Team::Player);
        assert!(state.fog.is_visible(Coord::new(5, 5)));
        assert!(state.fog.is_explored(Coord::new(9, 7)));
        assert!(!state.fog.is_explored(Coord::new(30, 30)));
    }

    #[test]
    fn test_new_medium_game_on_standard_map() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let state = GameState::new_game(&MapConfig::standard(), Difficulty::Medium, &mut rng).unwrap();
        assert_eq!((state.grid.width(), state.grid.height()), (50, 50));

        let survivors: Vec<&Unit> = state.player_units().collect();
        let positions: Vec<Coord> = survivors.iter().map(|u| u.position).collect();
        assert_eq!(positions, vec![Coord::new(5, 5), Coord::new(6, 5), Coord::new(7, 5)]);
        for survivor in &survivors {
            assert_eq!(survivor.unit_type, UnitType::Survivor);
            assert_eq!(survivor.inventory.get(Resource::Food), 20);
            assert_eq!(survivor.inventory.get(Resource::Materials), 40);
            assert_eq!(survivor.inventory.get(Resource::Medicine), 0);
        }

        let zombies: Vec<&Unit> = state.enemy_units().collect();
        assert_eq!(zombies.len(), 5);
        for z in zombies {
            assert_eq!(z.unit_type, UnitType::Zombie);
            assert_eq!((z.max_health, z.attack_power), (100, 10));
            assert!((10..=45).contains(&z.position.x), "zombie x {}", z.position.x);
            assert!((10..=45).contains(&z.position.y), "zombie y {}", z.position.y);
        }
        assert!(state.cities.is_empty());
        assert_eq!(state.turn, 1);
    }

    #[test]
    fn test_unit_ids_are_unique() {
        let mut state = open_state();
        let a = state.spawn_unit(UnitType::Scout, Team::Player, Coord::new(1, 1));
        let b = state.spawn_unit(UnitType::Scout, Team::Player, Coord::new(2, 1));
        assert_ne!(a, b);
        assert_eq!(state.unit(b).unwrap().position, Coord::new(2, 1));
    }

    #[test]
    fn test_multitile_collision_checks_every_cell() {
        let mut state = open_state();
        let sz = state.spawn_unit(UnitType::SuperZombie, Team::Enemy, Coord::new(10, 10));
        let blocker = state.spawn_unit(UnitType::Survivor, Team::Player, Coord::new(13, 11));
        assert_eq!(state.check_collision_for_multitile_unit(sz, Coord::new(11, 10), 2), None);
        assert_eq!(
            state.check_collision_for_multitile_unit(sz, Coord::new(12, 10), 2),
            Some(Occupant::Unit(blocker))
        );
        state.cities.push(City::new("Haven", Coord::new(11, 13)));
        assert_eq!(
            state.check_collision_for_multitile_unit(sz, Coord::new(10, 12), 2),
            Some(Occupant::City(Coord::new(11, 13)))
        );
        // The mover never collides with itself.
        assert_eq!(state.check_collision_for_multitile_unit(sz, Coord::new(10, 10), 2), None);
    }

    #[test]
    fn test_unit_at_covers_footprint() {
        let mut state = open_state();
        let sz = state.spawn_unit(UnitType::SuperZombie, Team::Enemy, Coord::new(4, 4));
        assert_eq!(state.unit_at(Coord::new(5, 5)).map(|u| u.id), Some(sz));
        assert!(state.unit_at(Coord::new(6, 5)).is_none());
    }

    #[test]
    fn test_city_spacing() {
        let mut state = open_state();
        state.cities.push(City::new("Haven", Coord::new(10, 10)));
        assert_eq!(
            state.can_found_city(Coord::new(12, 8)),
            Err(ActionError::TooCloseToCity {
                distance: 2,
                required: 3
            })
        );
        assert!(state.can_found_city(Coord::new(13, 10)).is_ok());
    }

    #[test]
    fn test_suggest_city_name() {
        let mut state = open_state();
        assert_eq!(state.suggest_city_name(), "New Hope 1");
        state.cities.push(City::new("New Hope 4", Coord::new(0, 0)));
        state.cities.push(City::new("Haven", Coord::new(9, 9)));
        assert_eq!(state.suggest_city_name(), "New Hope 5");
    }

    #[test]
    fn test_visibility_radii() {
        let mut state = open_state();
        state.spawn_unit(UnitType::Survivor, Team::Player, Coord::new(5, 5));
        state.spawn_unit(UnitType::Scout, Team::Player, Coord::new(20, 5));
        state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(5, 20));
        state.update_visibility();
        assert!(state.fog.is_visible(Coord::new(7, 7)));
        assert!(!state.fog.is_visible(Coord::new(8, 5)));
        assert!(state.fog.is_visible(Coord::new(23, 8)));
        assert!(!state.fog.is_visible(Coord::new(5, 20)));
    }

    #[test]
    fn test_tech_vision_bonuses() {
        let mut state = open_state();
        state.spawn_unit(UnitType::Scout, Team::Player, Coord::new(10, 10));
        state.cities.push(City::new("Haven", Coord::new(20, 20)));
        state.techs.researched.insert(TechId::ScoutTraining);
        state.techs.researched.insert(TechId::Watchtower);
        state.update_visibility();
        assert!(state.fog.is_visible(Coord::new(14, 14)));
        assert!(state.fog.is_visible(Coord::new(25, 25)));
        assert!(!state.fog.is_visible(Coord::new(26, 20)));
    }

    #[test]
    fn test_buildings_provide_vision() {
        let mut state = open_state();
        let mut city = City::new("Haven", Coord::new(10, 10));
        city.building_locations.insert(
            Coord::new(11, 10),
            Building::new(StructureKind::Farm, TileType::Grass),
        );
        state.cities.push(city);
        state.update_visibility();
        assert!(state.fog.is_visible(Coord::new(14, 10)));
        assert!(!state.fog.is_visible(Coord::new(15, 10)));
    }

    #[test]
    fn test_game_over() {
        let mut state = open_state();
        assert!(state.is_game_over());
        state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(1, 1));
        assert!(state.is_game_over());
        state.cities.push(City::new("Haven", Coord::new(5, 5)));
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_total_resources() {
        let mut state = open_state();
        let id = state.spawn_unit(UnitType::Survivor, Team::Player, Coord::new(1, 1));
        state.unit_mut(id).unwrap().inventory = ResourceBundle::supplies(5, 6);
        let z = state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(2, 2));
        state.unit_mut(z).unwrap().inventory = ResourceBundle::supplies(100, 100);
        let mut city = City::new("Haven", Coord::new(8, 8));
        city.resources = ResourceBundle::new(1, 2, 3, 1);
        state.cities.push(city);
        assert_eq!(state.total_resources(), ResourceBundle::new(6, 8, 3, 1));
    }

    #[test]
    fn test_death_drops_inventory_into_pile() {
        let mut state = open_state();
        let z = state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(3, 3));
        let victim = state.spawn_unit(UnitType::Survivor, Team::Player, Coord::new(4, 4));
        state.unit_mut(victim).unwrap().inventory = ResourceBundle::supplies(5, 0);
        state.resources.insert(Coord::new(4, 4), ResourceBundle::supplies(1, 1));
        let (damage, died) = state.damage_unit(z, victim, 500);
        assert_eq!(damage, 500);
        assert!(died);
        assert!(state.unit(victim).is_none());
        assert_eq!(state.resources[&Coord::new(4, 4)], ResourceBundle::supplies(6, 1));
    }

    #[test]
    fn test_fortification_halves_damage_on_walls() {
        let mut state = open_state();
        let z = state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(3, 3));
        let guard = state.spawn_unit(UnitType::Soldier, Team::Player, Coord::new(4, 4));
        let mut city = City::new("Haven", Coord::new(6, 6));
        city.building_locations.insert(
            Coord::new(4, 4),
            Building::new(StructureKind::Wall, TileType::Grass),
        );
        state.cities.push(city);
        assert_eq!(state.damage_unit(z, guard, 10), (10, false));
        state.techs.researched.insert(TechId::Fortification);
        assert_eq!(state.damage_unit(z, guard, 10), (5, false));
        assert_eq!(state.unit(guard).unwrap().health, 105);
    }

    #[test]
    fn test_win_converts_enemies() {
        let mut state = open_state();
        state.spawn_unit(UnitType::SuperZombie, Team::Enemy, Coord::new(3, 3));
        state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(9, 3));
        state.win_with_cure("Haven".to_string());
        assert!(state.game_won);
        assert_eq!(state.enemy_units().count(), 0);
        assert!(state.units.iter().all(|u| u.unit_type == UnitType::Survivor && u.size == 1));
        assert_eq!(state.fog.explored_count(), 900);
        assert_eq!(state.fog.visible_count(), 900);
    }

    #[test]
    fn test_state_hash_and_bytes_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let state = GameState::new_game(&MapConfig::small(), Difficulty::Hard, &mut rng).unwrap();
        let bytes = state.snapshot_bytes().unwrap();
        let restored = GameState::from_snapshot(&bytes).unwrap();
        assert_eq!(restored.state_hash(), state.state_hash());
    }
}

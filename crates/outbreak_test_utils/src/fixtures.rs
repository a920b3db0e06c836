//! Test fixtures and helpers.
//!
//! Hand-built game states and entity configurations
//! for consistent testing.

use outbreak_core::city::City;
use outbreak_core::config::Difficulty;
use outbreak_core::game_state::GameState;
use outbreak_core::math::{Coord, Fixed};
use outbreak_core::resources::ResourceBundle;
use outbreak_core::terrain::TileType;
use outbreak_core::unit::{Team, UnitId, UnitType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Side length of [`open_field`].
pub const FIELD_SIZE: i32 = 30;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Deterministic RNG for tests that drive turns by hand.
#[must_use]
pub fn test_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Shorthand coordinate constructor.
#[must_use]
pub const fn at(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

/// A 30x30 all-grass world on medium difficulty with nothing in it.
#[must_use]
pub fn open_field() -> GameState {
    GameState::blank(FIELD_SIZE, FIELD_SIZE, Difficulty::Medium)
}

/// Spawn a player unit of `unit_type` at (`x`, `y`).
pub fn spawn_player(state: &mut GameState, unit_type: UnitType, x: i32, y: i32) -> UnitId {
    state.spawn_unit(unit_type, Team::Player, at(x, y))
}

/// Spawn a regular zombie at (`x`, `y`).
pub fn spawn_zombie(state: &mut GameState, x: i32, y: i32) -> UnitId {
    state.spawn_unit(UnitType::Zombie, Team::Enemy, at(x, y))
}

/// Spawn a 2x2 super zombie anchored at (`x`, `y`).
pub fn spawn_super_zombie(state: &mut GameState, x: i32, y: i32) -> UnitId {
    state.spawn_unit(UnitType::SuperZombie, Team::Enemy, at(x, y))
}

/// Place a city at (`x`, `y`) with the given stockpile.
pub fn place_city(state: &mut GameState, name: &str, x: i32, y: i32, stock: ResourceBundle) -> Coord {
    let mut city = City::new(name, at(x, y));
    city.resources = stock;
    state.cities.push(city);
    state.update_visibility();
    at(x, y)
}

/// A stockpile large enough for any single structure or recruit.
#[must_use]
pub const fn rich_stock() -> ResourceBundle {
    ResourceBundle::new(1000, 1000, 500, 0)
}

/// Everything needed to manufacture the cure without research.
#[must_use]
pub const fn cure_stock() -> ResourceBundle {
    ResourceBundle::new(500, 500, 200, 1)
}

/// Paint a rectangle of terrain with its top-left corner at `from`.
pub fn paint(state: &mut GameState, from: Coord, width: i32, height: i32, tile: TileType) {
    for y in from.y..from.y + height {
        for x in from.x..from.x + width {
            state.grid.set(at(x, y), tile);
        }
    }
}

/// Drop a scavenge pile on a tile.
pub fn place_pile(state: &mut GameState, x: i32, y: i32, items: ResourceBundle) {
    state.resources.insert(at(x, y), items);
}

/// Grant tech points without going through kills.
pub fn grant_tech_points(state: &mut GameState, points: u32) {
    state.techs.earn(points);
}

/// A small colony under siege: one city with a soldier and a survivor
/// beside it, and three zombies closing in from the east.
#[must_use]
pub fn besieged_colony() -> GameState {
    let mut state = open_field();
    place_city(&mut state, "Haven", 10, 10, ResourceBundle::supplies(60, 80));
    spawn_player(&mut state, UnitType::Soldier, 11, 10);
    spawn_player(&mut state, UnitType::Survivor, 10, 11);
    spawn_zombie(&mut state, 14, 10);
    spawn_zombie(&mut state, 15, 12);
    spawn_zombie(&mut state, 16, 9);
    state.update_visibility();
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), Fixed::from_num(3));
        assert_eq!(fixed_f(0.5), Fixed::from_num(0.5));
    }

    #[test]
    fn test_open_field_is_empty() {
        let state = open_field();
        assert!(state.units.is_empty());
        assert!(state.cities.is_empty());
        assert_eq!(state.grid.count(TileType::Grass), (FIELD_SIZE * FIELD_SIZE) as usize);
    }

    #[test]
    fn test_besieged_colony_layout() {
        let state = besieged_colony();
        assert_eq!(state.cities.len(), 1);
        assert_eq!(state.player_units().count(), 2);
        assert_eq!(state.enemy_units().count(), 3);
        assert!(state.fog.is_visible(at(10, 10)));
    }

    #[test]
    fn test_paint_rectangle() {
        let mut state = open_field();
        paint(&mut state, at(2, 3), 3, 2, TileType::Water);
        assert_eq!(state.grid.count(TileType::Water), 6);
        assert_eq!(state.terrain(at(4, 4)), Some(TileType::Water));
        assert_eq!(state.terrain(at(5, 4)), Some(TileType::Grass));
    }
}

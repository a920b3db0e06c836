//! ASCII map rendering for terminal review.
//!
//! Renders what the player can see: unexplored tiles stay blank and units
//! only show on tiles currently in vision. `reveal` lifts the fog.

use std::fmt::Write as _;

use outbreak_core::prelude::*;

/// Glyph for a terrain tile.
#[must_use]
pub const fn terrain_char(tile: TileType) -> char {
    match tile {
        TileType::Grass => '.',
        TileType::Road => '=',
        TileType::BuildingRuined => '%',
        TileType::BuildingIntact => '#',
        TileType::Rubble => ',',
        TileType::Forest => 'T',
        TileType::Water => '~',
        TileType::ResearchLab => 'L',
    }
}

/// Glyph for a city structure.
#[must_use]
pub const fn structure_char(kind: StructureKind) -> char {
    match kind {
        StructureKind::Farm => 'f',
        StructureKind::Workshop => 'w',
        StructureKind::Hospital => 'h',
        StructureKind::Wall => 'W',
        StructureKind::Dock => 'd',
    }
}

/// Glyph for a unit.
#[must_use]
pub const fn unit_char(unit_type: UnitType) -> char {
    match unit_type {
        UnitType::Survivor => 's',
        UnitType::Scout => 'c',
        UnitType::Soldier => 'x',
        UnitType::Medic => '+',
        UnitType::SuperSoldier => 'X',
        UnitType::Zombie => 'z',
        UnitType::SuperZombie => 'Z',
    }
}

fn tile_char(state: &GameState, tile: Coord, reveal: bool) -> char {
    if !reveal && !state.fog.is_explored(tile) {
        return ' ';
    }
    if reveal || state.fog.is_visible(tile) {
        if let Some(unit) = state.unit_at(tile) {
            return unit_char(unit.unit_type);
        }
    }
    if state.city_at(tile).is_some() {
        return '@';
    }
    // City centres may carry a wall; the '@' above wins there.
    if let Some(building) = state.building_at(tile) {
        return structure_char(building.kind);
    }
    if state.resources.contains_key(&tile) {
        return '*';
    }
    state.terrain(tile).map_or(' ', terrain_char)
}

/// Render the map, one text row per tile row.
#[must_use]
pub fn render_map(state: &GameState, reveal: bool) -> String {
    let width = state.grid.width();
    let height = state.grid.height();
    let mut out = String::with_capacity(((width + 1) * height).max(0) as usize);
    for y in 0..height {
        for x in 0..width {
            out.push(tile_char(state, Coord::new(x, y), reveal));
        }
        out.push('\n');
    }
    out
}

/// Short status block shown under the map.
#[must_use]
pub fn render_summary(state: &GameState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Turn {} ({:?}) | difficulty {} | tech points {}",
        state.turn, state.current_team, state.difficulty, state.techs.tech_points
    );
    let _ = writeln!(
        out,
        "Units {} | zombies {} | explored {}/{}",
        state.player_units().count(),
        state.enemy_units().count(),
        state.fog.explored_count(),
        (state.grid.width() * state.grid.height()).max(0)
    );
    for city in &state.cities {
        let _ = writeln!(
            out,
            "  {} at ({}, {}) hp {}/{} pop {} | {}",
            city.name,
            city.position.x,
            city.position.y,
            city.health,
            city.max_health,
            city.population,
            city.resources
        );
    }
    if state.game_won {
        out.push_str("The cure has been manufactured.\n");
    } else if state.is_game_over() {
        out.push_str("The colony has fallen.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> GameState {
        GameState::blank(6, 4, Difficulty::Medium)
    }

    #[test]
    fn test_unexplored_map_is_blank() {
        let state = field();
        let map = render_map(&state, false);
        assert_eq!(map.lines().count(), 4);
        assert!(map.lines().all(|line| line == "      "));
    }

    #[test]
    fn test_reveal_shows_terrain_and_units() {
        let mut state = field();
        state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(5, 3));
        let map = render_map(&state, true);
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows[0], "......");
        assert_eq!(rows[3], ".....z");
    }

    #[test]
    fn test_units_hidden_outside_vision() {
        let mut state = field();
        state.spawn_unit(UnitType::Soldier, Team::Player, Coord::new(0, 0));
        state.update_visibility();
        state.fog.reveal(Coord::new(5, 3), 0);
        state.spawn_unit(UnitType::Zombie, Team::Enemy, Coord::new(5, 3));
        state.update_visibility();

        let map = render_map(&state, false);
        let rows: Vec<&str> = map.lines().collect();
        assert!(rows[0].starts_with('x'));
        // Explored earlier but out of sight now: terrain only.
        assert!(rows[3].ends_with('.'));
    }

    #[test]
    fn test_city_and_piles() {
        let mut state = field();
        state.cities.push(City::new("Haven", Coord::new(2, 1)));
        state.resources.insert(Coord::new(4, 1), ResourceBundle::supplies(5, 0));
        let map = render_map(&state, true);
        assert_eq!(map.lines().nth(1), Some("..@.*."));
    }

    #[test]
    fn test_summary_lists_cities() {
        let mut state = field();
        state.cities.push(City::new("Haven", Coord::new(2, 1)));
        let summary = render_summary(&state);
        assert!(summary.starts_with("Turn 1"));
        assert!(summary.contains("Haven at (2, 1)"));
    }
}

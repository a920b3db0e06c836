//! Proptest strategies for simulation inputs.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the core rules.

use outbreak_core::config::Difficulty;
use outbreak_core::math::Coord;
use outbreak_core::resources::ResourceBundle;
use outbreak_core::terrain::{TileGrid, TileType};
use outbreak_core::unit::UnitType;
use proptest::prelude::*;

/// Every terrain type.
pub const ALL_TILES: [TileType; 8] = [
    TileType::Grass,
    TileType::Road,
    TileType::BuildingRuined,
    TileType::BuildingIntact,
    TileType::Rubble,
    TileType::Forest,
    TileType::Water,
    TileType::ResearchLab,
];

/// Generate a coordinate inside a `width` x `height` map.
pub fn arb_coord(width: i32, height: i32) -> impl Strategy<Value = Coord> {
    (0..width, 0..height).prop_map(|(x, y)| Coord::new(x, y))
}

/// Generate a single-step direction: each component in `-1..=1`, not both zero.
pub fn arb_step() -> impl Strategy<Value = (i32, i32)> {
    (-1i32..=1, -1i32..=1).prop_filter("zero step", |&(dx, dy)| dx != 0 || dy != 0)
}

/// Generate a path of up to `max_len` single steps.
pub fn arb_path(max_len: usize) -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec(arb_step(), 0..=max_len)
}

/// Generate any terrain type.
pub fn arb_tile() -> impl Strategy<Value = TileType> {
    prop::sample::select(ALL_TILES.to_vec())
}

/// Generate a `width` x `height` grid of arbitrary terrain.
pub fn arb_grid(width: i32, height: i32) -> impl Strategy<Value = TileGrid> {
    let cells = usize::try_from(width * height).unwrap_or(0);
    prop::collection::vec(arb_tile(), cells).prop_map(move |tiles| {
        let mut grid = TileGrid::filled(width, height, TileType::Grass);
        for (i, tile) in tiles.into_iter().enumerate() {
            let i = i32::try_from(i).unwrap_or(i32::MAX);
            grid.set(Coord::new(i % width, i / width), tile);
        }
        grid
    })
}

/// Generate a difficulty level.
pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

/// Generate a unit type.
pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
    prop::sample::select(UnitType::ALL.to_vec())
}

/// Generate a sequence of experience grants.
pub fn arb_xp_grants() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..500, 0..30)
}

/// Generate a resource bundle with modest amounts.
pub fn arb_bundle() -> impl Strategy<Value = ResourceBundle> {
    (0u32..200, 0u32..200, 0u32..50, 0u32..2)
        .prop_map(|(food, materials, medicine, cure)| ResourceBundle::new(food, materials, medicine, cure))
}

/// Generate a list of vision sources (tile, radius) on a map.
pub fn arb_vision_sources(
    width: i32,
    height: i32,
    max: usize,
) -> impl Strategy<Value = Vec<(Coord, i32)>> {
    prop::collection::vec((arb_coord(width, height), 0i32..=5), 0..=max)
}

//! Terrain tiles and the map grid.

use serde::{Deserialize, Serialize};

use crate::math::Coord;

/// Terrain type of a single tile.
///
/// The discriminants are the integer codes written to save files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    /// Open ground.
    #[default]
    Grass = 0,
    /// Paved road, half movement cost.
    Road = 1,
    /// Collapsed building.
    BuildingRuined = 2,
    /// Standing building.
    BuildingIntact = 3,
    /// Debris around buildings.
    Rubble = 4,
    /// Woodland.
    Forest = 5,
    /// Lakes and rivers.
    Water = 6,
    /// The lab holding the cure sample.
    ResearchLab = 7,
}

impl TileType {
    /// Integer code used in save files.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a save-file integer.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Grass,
            1 => Self::Road,
            2 => Self::BuildingRuined,
            3 => Self::BuildingIntact,
            4 => Self::Rubble,
            5 => Self::Forest,
            6 => Self::Water,
            7 => Self::ResearchLab,
            _ => return None,
        })
    }

    /// Whether this tile is one of the two building kinds.
    #[must_use]
    pub const fn is_building(self) -> bool {
        matches!(self, Self::BuildingRuined | Self::BuildingIntact)
    }
}

/// Row-major terrain grid.
///
/// Immutable once generation finishes; all lookups are bounds-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Create a grid filled with one tile type.
    #[must_use]
    pub fn filled(width: i32, height: i32, tile: TileType) -> Self {
        let len = usize::try_from(width.max(0) * height.max(0)).unwrap_or(0);
        Self {
            width: width.max(0),
            height: height.max(0),
            tiles: vec![tile; len],
        }
    }

    /// Build a grid from rows (`rows[y][x]`). Returns `None` for ragged or empty input.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<TileType>>) -> Option<Self> {
        let height = i32::try_from(rows.len()).ok()?;
        let width = i32::try_from(rows.first()?.len()).ok()?;
        if width == 0 || rows.iter().any(|row| row.len() != rows[0].len()) {
            return None;
        }
        Some(Self {
            width,
            height,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    /// Rows of tiles, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileType]> {
        self.tiles.chunks(self.width.max(1) as usize)
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Map centre tile.
    #[must_use]
    pub const fn center(&self) -> Coord {
        Coord::new(self.width / 2, self.height / 2)
    }

    /// Check whether a coordinate lies on the map.
    #[must_use]
    pub const fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    /// Check whether a square footprint anchored at `anchor` fits on the map.
    #[must_use]
    pub const fn footprint_in_bounds(&self, anchor: Coord, size: i32) -> bool {
        self.in_bounds(anchor) && self.in_bounds(anchor.offset(size - 1, size - 1))
    }

    fn index(&self, c: Coord) -> Option<usize> {
        if self.in_bounds(c) {
            Some((c.y * self.width + c.x) as usize)
        } else {
            None
        }
    }

    /// Tile at a coordinate, or `None` off the map.
    #[must_use]
    pub fn get(&self, c: Coord) -> Option<TileType> {
        self.index(c).map(|i| self.tiles[i])
    }

    /// Overwrite a tile. Off-map writes are ignored.
    pub fn set(&mut self, c: Coord, tile: TileType) {
        if let Some(i) = self.index(c) {
            self.tiles[i] = tile;
        }
    }

    /// Whether the tile exists and has the given type.
    #[must_use]
    pub fn is(&self, c: Coord, tile: TileType) -> bool {
        self.get(c) == Some(tile)
    }

    /// Iterate over every coordinate with its tile, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, TileType)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().map(move |(i, &t)| {
            let i = i as i32;
            (Coord::new(i % width, i / width), t)
        })
    }

    /// Number of tiles of the given type.
    #[must_use]
    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_codes_round_trip() {
        for code in 0..=7 {
            let tile = TileType::from_code(code).unwrap();
            assert_eq!(tile.code(), code);
        }
        assert_eq!(TileType::from_code(8), None);
    }

    #[test]
    fn test_grid_bounds() {
        let grid = TileGrid::filled(10, 6, TileType::Grass);
        assert!(grid.in_bounds(Coord::new(0, 0)));
        assert!(grid.in_bounds(Coord::new(9, 5)));
        assert!(!grid.in_bounds(Coord::new(10, 5)));
        assert!(!grid.in_bounds(Coord::new(-1, 0)));
        assert_eq!(grid.get(Coord::new(3, 6)), None);
        assert!(grid.footprint_in_bounds(Coord::new(8, 4), 2));
        assert!(!grid.footprint_in_bounds(Coord::new(9, 4), 2));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = TileGrid::filled(5, 5, TileType::Grass);
        grid.set(Coord::new(2, 3), TileType::Road);
        grid.set(Coord::new(7, 7), TileType::Water);
        assert_eq!(grid.get(Coord::new(2, 3)), Some(TileType::Road));
        assert_eq!(grid.count(TileType::Road), 1);
        assert_eq!(grid.count(TileType::Water), 0);
    }

    #[test]
    fn test_rows_round_trip() {
        let mut grid = TileGrid::filled(4, 3, TileType::Forest);
        grid.set(Coord::new(3, 1), TileType::ResearchLab);
        let rows: Vec<Vec<TileType>> = grid.rows().map(<[TileType]>::to_vec).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][3], TileType::ResearchLab);
        assert_eq!(TileGrid::from_rows(rows), Some(grid));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![TileType::Grass; 3], vec![TileType::Grass; 2]];
        assert_eq!(TileGrid::from_rows(rows), None);
        assert_eq!(TileGrid::from_rows(Vec::new()), None);
    }

    #[test]
    fn test_iter_coordinates() {
        let grid = TileGrid::filled(3, 2, TileType::Grass);
        let coords: Vec<Coord> = grid.iter().map(|(c, _)| c).collect();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[3], Coord::new(0, 1));
        assert_eq!(coords.len(), 6);
    }
}

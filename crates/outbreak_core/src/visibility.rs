//! Fog of war.
//!
//! Two boolean layers over the map. `explored` only ever gains tiles;
//! `visible` is rebuilt from scratch on every update from the current
//! vision sources.

use serde::{Deserialize, Serialize};

use crate::math::Coord;

/// Vision radius of an ordinary player unit.
pub const UNIT_VISION: i32 = 2;

/// Vision radius of a scout.
pub const SCOUT_VISION: i32 = 3;

/// Vision radius of a city.
pub const CITY_VISION: i32 = 3;

/// Vision radius of a placed structure.
pub const BUILDING_VISION: i32 = 3;

/// What the player knows about a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileVisibility {
    /// Never seen.
    #[default]
    Unknown,
    /// Seen before, not in view now.
    Explored,
    /// In view now.
    Visible,
}

/// Explored and visible layers for the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FogOfWar {
    width: i32,
    height: i32,
    explored: Vec<bool>,
    visible: Vec<bool>,
}

impl FogOfWar {
    /// Fully shrouded fog for a map.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let len = usize::try_from(width.max(0) * height.max(0)).unwrap_or(0);
        Self {
            width: width.max(0),
            height: height.max(0),
            explored: vec![false; len],
            visible: vec![false; len],
        }
    }

    /// Rebuild fog from a saved explored layer (`rows[y][x]`), with nothing visible.
    ///
    /// Returns `None` if the rows do not match the dimensions.
    #[must_use]
    pub fn from_explored_rows(width: i32, height: i32, rows: &[Vec<bool>]) -> Option<Self> {
        if usize::try_from(height).ok()? != rows.len()
            || rows.iter().any(|r| usize::try_from(width).ok() != Some(r.len()))
        {
            return None;
        }
        let mut fog = Self::new(width, height);
        fog.explored = rows.iter().flatten().copied().collect();
        Some(fog)
    }

    /// Explored layer as rows, for saving.
    #[must_use]
    pub fn explored_rows(&self) -> Vec<Vec<bool>> {
        self.explored
            .chunks(self.width.max(1) as usize)
            .map(<[bool]>::to_vec)
            .collect()
    }

    fn index(&self, c: Coord) -> Option<usize> {
        if c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height {
            Some((c.y * self.width + c.x) as usize)
        } else {
            None
        }
    }

    /// Whether the tile has ever been seen.
    #[must_use]
    pub fn is_explored(&self, c: Coord) -> bool {
        self.index(c).is_some_and(|i| self.explored[i])
    }

    /// Whether the tile is in view.
    #[must_use]
    pub fn is_visible(&self, c: Coord) -> bool {
        self.index(c).is_some_and(|i| self.visible[i])
    }

    /// Combined state of a tile.
    #[must_use]
    pub fn state(&self, c: Coord) -> TileVisibility {
        if self.is_visible(c) {
            TileVisibility::Visible
        } else if self.is_explored(c) {
            TileVisibility::Explored
        } else {
            TileVisibility::Unknown
        }
    }

    /// Number of explored tiles.
    #[must_use]
    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|&&e| e).count()
    }

    /// Number of visible tiles.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|&&v| v).count()
    }

    /// Mark the square of Chebyshev radius `radius` around `center` as
    /// visible and explored, clipped to the map.
    pub fn reveal(&mut self, center: Coord, radius: i32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if let Some(i) = self.index(center.offset(dx, dy)) {
                    self.visible[i] = true;
                    self.explored[i] = true;
                }
            }
        }
    }

    /// Clear the visible layer and reveal around every `(center, radius)` source.
    pub fn recompute<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = (Coord, i32)>,
    {
        self.visible.fill(false);
        for (center, radius) in sources {
            self.reveal(center, radius);
        }
    }

    /// Reveal the whole map.
    pub fn reveal_all(&mut self) {
        self.visible.fill(true);
        self.explored.fill(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_square_clipped() {
        let mut fog = FogOfWar::new(10, 10);
        fog.reveal(Coord::new(0, 0), 2);
        assert_eq!(fog.visible_count(), 9);
        assert!(fog.is_visible(Coord::new(2, 2)));
        assert!(!fog.is_visible(Coord::new(3, 0)));
        assert_eq!(fog.state(Coord::new(1, 1)), TileVisibility::Visible);
    }

    #[test]
    fn test_recompute_drops_old_vision_keeps_explored() {
        let mut fog = FogOfWar::new(20, 20);
        fog.recompute([(Coord::new(3, 3), 2)]);
        fog.recompute([(Coord::new(15, 15), 2)]);
        assert!(!fog.is_visible(Coord::new(3, 3)));
        assert!(fog.is_explored(Coord::new(3, 3)));
        assert_eq!(fog.state(Coord::new(3, 3)), TileVisibility::Explored);
        assert!(fog.is_visible(Coord::new(15, 15)));
        assert_eq!(fog.state(Coord::new(10, 10)), TileVisibility::Unknown);
    }

    #[test]
    fn test_out_of_bounds_queries_are_false() {
        let fog = FogOfWar::new(5, 5);
        assert!(!fog.is_visible(Coord::new(-1, 0)));
        assert!(!fog.is_explored(Coord::new(5, 5)));
    }

    #[test]
    fn test_explored_rows_round_trip() {
        let mut fog = FogOfWar::new(6, 4);
        fog.reveal(Coord::new(5, 3), 1);
        let rows = fog.explored_rows();
        assert_eq!(rows.len(), 4);
        let restored = FogOfWar::from_explored_rows(6, 4, &rows).unwrap();
        assert_eq!(restored.explored_count(), fog.explored_count());
        assert_eq!(restored.visible_count(), 0);
        assert!(FogOfWar::from_explored_rows(5, 4, &rows).is_none());
    }

    #[test]
    fn test_reveal_all() {
        let mut fog = FogOfWar::new(4, 4);
        fog.reveal_all();
        assert_eq!(fog.explored_count(), 16);
        assert_eq!(fog.visible_count(), 16);
    }
}

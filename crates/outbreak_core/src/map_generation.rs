//! Procedural map generation.
//!
//! Produces the terrain grid, the scavenge piles and the research lab for a
//! new game. Generation is a pure function of the seed: the same
//! [`MapConfig`] always yields the same [`GeneratedMap`].
//!
//! Passes, in order:
//! 1. Noise field assigns water and forest on a grass base.
//! 2. Ruined-city clusters lay road lattices, buildings and rubble.
//! 3. Straight roads cross the whole map.
//! 4. One research lab is placed away from the edges.
//! 5. Building tiles may receive a pile of food and materials.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, Result};
use crate::math::Coord;
use crate::resources::ResourceBundle;
use crate::terrain::{TileGrid, TileType};

/// Smallest playable side length; the lab window needs 10 tiles of margin.
pub const MIN_MAP_SIDE: i32 = 20;

/// Area the cluster and road counts are scaled against.
const BASELINE_AREA: f64 = 2500.0;

/// Attempts to place the research lab before falling back to the centre.
const LAB_ATTEMPTS: u32 = 100;

/// Map configuration for procedural generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Map width in tiles.
    pub width: i32,
    /// Map height in tiles.
    pub height: i32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl MapConfig {
    /// Create a small map (40x40).
    #[must_use]
    pub const fn small() -> Self {
        Self {
            width: 40,
            height: 40,
            seed: 12345,
        }
    }

    /// Create the standard map (50x50), the baseline for cluster and road counts.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            width: 50,
            height: 50,
            seed: 12345,
        }
    }

    /// Create a large map (80x80).
    #[must_use]
    pub const fn large() -> Self {
        Self {
            width: 80,
            height: 80,
            seed: 12345,
        }
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the map dimensions.
    #[must_use]
    pub const fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reject dimensions that cannot host a research lab.
    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_MAP_SIDE || self.height < MIN_MAP_SIDE {
            return Err(GameError::InvalidConfig(format!(
                "map must be at least {MIN_MAP_SIDE}x{MIN_MAP_SIDE}, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    fn area_scale(&self) -> f64 {
        f64::from(self.width * self.height) / BASELINE_AREA
    }
}

/// Output of [`generate_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMap {
    /// Terrain grid.
    pub grid: TileGrid,
    /// Scavenge piles keyed by tile, including the cure sample at the lab.
    pub resources: BTreeMap<Coord, ResourceBundle>,
    /// The single research lab tile.
    pub research_lab: Coord,
}

/// Generate a map from its configuration.
///
/// The RNG is seeded from `config.seed`, so the result is reproducible.
pub fn generate_map(config: &MapConfig) -> Result<GeneratedMap> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    generate_map_with_rng(config, &mut rng)
}

/// Generate a map drawing randomness from a caller-supplied source.
///
/// The noise field still uses `config.seed` as its phase.
pub fn generate_map_with_rng<R: Rng>(config: &MapConfig, rng: &mut R) -> Result<GeneratedMap> {
    config.validate()?;

    let mut grid = TileGrid::filled(config.width, config.height, TileType::Grass);
    apply_noise(config, &mut grid);

    let scale = config.area_scale();
    let min_clusters = scaled_count(3, scale);
    let max_clusters = scaled_count(6, scale);
    let clusters = rng.gen_range(min_clusters..=max_clusters);
    for _ in 0..clusters {
        generate_cluster(&mut grid, rng);
    }

    generate_roads(config, &mut grid, rng);

    let research_lab = place_research_lab(&mut grid, rng);
    let mut resources = place_resources(&grid, rng);
    resources.insert(research_lab, ResourceBundle::CURE_SAMPLE);

    debug!(
        seed = config.seed,
        clusters,
        piles = resources.len(),
        lab = %research_lab,
        "map generated"
    );

    Ok(GeneratedMap {
        grid,
        resources,
        research_lab,
    })
}

/// `max(base, floor(base * scale))`.
fn scaled_count(base: u32, scale: f64) -> u32 {
    // Truncation is the intended rounding.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (f64::from(base) * scale) as u32;
    base.max(scaled)
}

/// Three-term sine/cosine pseudo-noise.
fn noise(x: i32, y: i32, phase: f64) -> f64 {
    let (x, y) = (f64::from(x), f64::from(y));
    (x * 0.1 + phase).sin() * (y * 0.1 + phase).cos() * 0.5
        + (x * 0.05).sin() * (y * 0.05).sin() * 0.3
        + (x * 0.02 + y * 0.02).cos() * 0.2
}

fn apply_noise(config: &MapConfig, grid: &mut TileGrid) {
    #[allow(clippy::cast_precision_loss)]
    let phase = (config.seed % 1_000_000) as f64;
    for y in 0..config.height {
        for x in 0..config.width {
            let n = noise(x, y, phase);
            if n < -0.3 {
                grid.set(Coord::new(x, y), TileType::Water);
            } else if n > 0.4 {
                grid.set(Coord::new(x, y), TileType::Forest);
            }
        }
    }
}

fn generate_cluster<R: Rng>(grid: &mut TileGrid, rng: &mut R) {
    let center = Coord::new(
        rng.gen_range(5..=grid.width() - 5),
        rng.gen_range(5..=grid.height() - 5),
    );
    let radius = rng.gen_range(5..=8);

    // Road lattice every fourth row and column through the centre.
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let tile = center.offset(dx, dy);
            if (dx % 4 == 0 || dy % 4 == 0) && grid.get(tile).is_some_and(|t| t != TileType::Water)
            {
                grid.set(tile, TileType::Road);
            }
        }
    }

    let points: usize = rng.gen_range(10..=20);
    let mut buildings = Vec::with_capacity(points);
    for _ in 0..points {
        let tile = Coord::new(
            (center.x + rng.gen_range(-radius..=radius)).clamp(0, grid.width() - 1),
            (center.y + rng.gen_range(-radius..=radius)).clamp(0, grid.height() - 1),
        );
        match grid.get(tile) {
            Some(TileType::Water) | None => continue,
            Some(TileType::Road) if rng.gen_bool(0.8) => continue,
            _ => {}
        }
        let kind = if rng.gen_bool(0.6) {
            TileType::BuildingRuined
        } else {
            TileType::BuildingIntact
        };
        grid.set(tile, kind);
        buildings.push(tile);
    }

    for building in buildings {
        for n in building.neighbors() {
            if grid.is(n, TileType::Grass) && rng.gen_bool(0.4) {
                grid.set(n, TileType::Rubble);
            }
        }
    }
}

fn generate_roads<R: Rng>(config: &MapConfig, grid: &mut TileGrid, rng: &mut R) {
    let scale = config.area_scale();
    let count = rng.gen_range(scaled_count(3, scale)..=scaled_count(5, scale));
    for _ in 0..count {
        let tiles: Vec<Coord> = if rng.gen_bool(0.5) {
            let y = rng.gen_range(0..grid.height());
            (0..grid.width()).map(|x| Coord::new(x, y)).collect()
        } else {
            let x = rng.gen_range(0..grid.width());
            (0..grid.height()).map(|y| Coord::new(x, y)).collect()
        };
        for tile in tiles {
            if matches!(grid.get(tile), Some(t) if t != TileType::Water && !t.is_building()) {
                grid.set(tile, TileType::Road);
            }
        }
    }
}

fn place_research_lab<R: Rng>(grid: &mut TileGrid, rng: &mut R) -> Coord {
    for _ in 0..LAB_ATTEMPTS {
        let tile = Coord::new(
            rng.gen_range(10..=grid.width() - 10),
            rng.gen_range(10..=grid.height() - 10),
        );
        if matches!(grid.get(tile), Some(TileType::Grass | TileType::Road)) {
            grid.set(tile, TileType::ResearchLab);
            return tile;
        }
    }
    let center = grid.center();
    grid.set(center, TileType::ResearchLab);
    center
}

fn place_resources<R: Rng>(grid: &TileGrid, rng: &mut R) -> BTreeMap<Coord, ResourceBundle> {
    let mut piles = BTreeMap::new();
    for (tile, kind) in grid.iter() {
        let pile = match kind {
            TileType::BuildingRuined if rng.gen_bool(0.6) => {
                ResourceBundle::supplies(rng.gen_range(8..=20), rng.gen_range(15..=35))
            }
            TileType::BuildingIntact if rng.gen_bool(0.8) => {
                ResourceBundle::supplies(rng.gen_range(15..=40), rng.gen_range(20..=45))
            }
            _ => continue,
        };
        piles.insert(tile, pile);
    }
    piles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Resource;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.width, 50);
        assert_eq!(config.height, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_map() {
        let config = MapConfig::default().with_size(19, 40);
        assert!(matches!(
            generate_map(&config),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_minimum_map_generates() {
        let map = generate_map(&MapConfig::default().with_size(20, 20)).unwrap();
        assert_eq!(map.research_lab.x, 10);
        assert_eq!(map.grid.width(), 20);
    }

    #[test]
    fn test_determinism() {
        let config = MapConfig::standard().with_seed(777);
        let a = generate_map(&config).unwrap();
        let b = generate_map(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds() {
        let a = generate_map(&MapConfig::standard().with_seed(1)).unwrap();
        let b = generate_map(&MapConfig::standard().with_seed(2)).unwrap();
        assert_ne!(a.grid, b.grid);
    }

    #[test]
    fn test_exactly_one_lab() {
        for seed in 0..10 {
            let map = generate_map(&MapConfig::standard().with_seed(seed)).unwrap();
            assert_eq!(map.grid.count(TileType::ResearchLab), 1);
            assert_eq!(map.grid.get(map.research_lab), Some(TileType::ResearchLab));
        }
    }

    #[test]
    fn test_cure_sample_only_at_lab() {
        let map = generate_map(&MapConfig::standard().with_seed(42)).unwrap();
        let cure_tiles: Vec<Coord> = map
            .resources
            .iter()
            .filter(|(_, b)| b.get(Resource::Cure) > 0)
            .map(|(&c, _)| c)
            .collect();
        assert_eq!(cure_tiles, vec![map.research_lab]);
        assert_eq!(map.resources[&map.research_lab], ResourceBundle::CURE_SAMPLE);
    }

    #[test]
    fn test_piles_sit_on_buildings_within_ranges() {
        let map = generate_map(&MapConfig::large().with_seed(9)).unwrap();
        assert!(map.resources.len() > 1);
        for (&tile, pile) in &map.resources {
            if tile == map.research_lab {
                continue;
            }
            assert_eq!(pile.get(Resource::Medicine), 0);
            match map.grid.get(tile) {
                Some(TileType::BuildingRuined) => {
                    assert!((8..=20).contains(&pile.get(Resource::Food)));
                    assert!((15..=35).contains(&pile.get(Resource::Materials)));
                }
                Some(TileType::BuildingIntact) => {
                    assert!((15..=40).contains(&pile.get(Resource::Food)));
                    assert!((20..=45).contains(&pile.get(Resource::Materials)));
                }
                other => panic!("pile on non-building tile {other:?}"),
            }
        }
    }

    #[test]
    fn test_scaled_counts() {
        assert_eq!(scaled_count(3, 1.0), 3);
        assert_eq!(scaled_count(3, 0.64), 3);
        assert_eq!(scaled_count(6, 2.56), 15);
    }

    #[test]
    fn test_noise_is_bounded() {
        for y in 0..50 {
            for x in 0..50 {
                assert!(noise(x, y, 12345.0).abs() <= 1.0);
            }
        }
    }
}

//! Grid coordinates and fixed-point movement points.
//!
//! Movement points use I32F32 fixed-point so the half-point road cost is
//! exact and comparisons never depend on float rounding.

use std::fmt;
use std::str::FromStr;

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type used for movement points.
pub type Fixed = I32F32;

/// Cost of stepping onto a road tile.
pub const ROAD_MOVE_COST: Fixed = Fixed::from_bits(1 << 31);

/// Cost of stepping onto any other tile, and of every attack.
pub const STEP_MOVE_COST: Fixed = Fixed::from_bits(1 << 32);

/// Whole number of movement points as [`Fixed`].
#[must_use]
pub const fn moves(n: i32) -> Fixed {
    Fixed::from_bits((n as i64) << 32)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers in human-readable files.
///
/// Save files store movement points as plain decimals (`2.5`).
pub mod fixed_decimal_serde {
    use super::Fixed;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal number.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize from a decimal number, rejecting non-finite or huge values.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(raw)
            .ok_or_else(|| D::Error::custom(format!("movement value {raw} out of range")))
    }
}

// ============================================================================
// Coordinates
// ============================================================================

/// A tile position on the map.
///
/// Ordering is by `x`, then `y`, which gives every coordinate-keyed map a
/// stable iteration order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Manhattan distance: `|dx| + |dy|`.
    #[must_use]
    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Signed unit step from `self` toward `target`, each component in `-1..=1`.
    #[must_use]
    pub fn step_toward(self, target: Self) -> (i32, i32) {
        ((target.x - self.x).signum(), (target.y - self.y).signum())
    }

    /// Tiles covered by a square footprint of side `size` anchored here.
    pub fn footprint(self, size: i32) -> impl Iterator<Item = Self> {
        (0..size).flat_map(move |dy| (0..size).map(move |dx| self.offset(dx, dy)))
    }

    /// Whether `tile` lies inside the square footprint of side `size` anchored here.
    #[must_use]
    pub const fn footprint_contains(self, size: i32, tile: Self) -> bool {
        tile.x >= self.x && tile.x < self.x + size && tile.y >= self.y && tile.y < self.y + size
    }

    /// The eight surrounding tiles, column-major (x outer, y inner).
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1)
                .filter(move |&dy| dx != 0 || dy != 0)
                .map(move |dy| self.offset(dx, dy))
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Failure parsing a `"x,y"` coordinate key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate key '{0}'")]
pub struct CoordParseError(pub String);

impl FromStr for Coord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse().map_err(|_| err())?;
        let y = y.trim().parse().map_err(|_| err())?;
        Ok(Self { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_costs_are_exact() {
        assert_eq!(ROAD_MOVE_COST + ROAD_MOVE_COST, STEP_MOVE_COST);
        assert_eq!(moves(3) - STEP_MOVE_COST, moves(2));
        assert_eq!(ROAD_MOVE_COST.to_num::<f64>(), 0.5);
    }

    #[test]
    fn test_distances() {
        let a = Coord::new(2, 3);
        let b = Coord::new(5, -1);
        assert_eq!(a.chebyshev(b), 4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(a), 0);
    }

    #[test]
    fn test_step_toward() {
        let origin = Coord::new(4, 4);
        assert_eq!(origin.step_toward(Coord::new(9, 4)), (1, 0));
        assert_eq!(origin.step_toward(Coord::new(0, 0)), (-1, -1));
        assert_eq!(origin.step_toward(origin), (0, 0));
    }

    #[test]
    fn test_footprint_covers_square() {
        let tiles: Vec<Coord> = Coord::new(3, 7).footprint(2).collect();
        assert_eq!(
            tiles,
            vec![
                Coord::new(3, 7),
                Coord::new(4, 7),
                Coord::new(3, 8),
                Coord::new(4, 8)
            ]
        );
        assert!(Coord::new(3, 7).footprint_contains(2, Coord::new(4, 8)));
        assert!(!Coord::new(3, 7).footprint_contains(2, Coord::new(5, 8)));
        assert!(!Coord::new(3, 7).footprint_contains(1, Coord::new(4, 7)));
    }

    #[test]
    fn test_neighbors_order() {
        let n: Vec<Coord> = Coord::new(0, 0).neighbors().collect();
        assert_eq!(n.len(), 8);
        assert_eq!(n[0], Coord::new(-1, -1));
        assert_eq!(n[1], Coord::new(-1, 0));
        assert!(!n.contains(&Coord::new(0, 0)));
    }

    #[test]
    fn test_coord_key_round_trip() {
        let c = Coord::new(12, -3);
        assert_eq!(c.to_string(), "12,-3");
        assert_eq!("12,-3".parse::<Coord>(), Ok(c));
        assert_eq!(" 4 , 5".parse::<Coord>(), Ok(Coord::new(4, 5)));
        assert!("12".parse::<Coord>().is_err());
        assert!("a,b".parse::<Coord>().is_err());
    }
}

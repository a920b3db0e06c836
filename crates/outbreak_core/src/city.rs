//! Cities: resource stock, structure ledger, production and upgrades.
//!
//! A city only knows about itself. Placement rules that need the rest of
//! the world (occupancy, visibility, distance to other cities) are checked
//! by the game state before it calls into the city.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ActionError, ActionResult};
use crate::math::Coord;
use crate::resources::{Resource, ResourceBundle};
use crate::tech::{TechId, TechProgress};
use crate::terrain::TileType;
use crate::unit::UnitType;

/// Highest level a building can be upgraded to.
pub const MAX_BUILDING_LEVEL: u32 = 3;

/// Health of a newly founded city.
pub const CITY_BASE_HEALTH: i32 = 50;

/// City health after a wall is raised on the city tile.
pub const CITY_WALLED_HEALTH: i32 = 100;

/// Name of the structure every city starts with.
pub const SHELTER: &str = "shelter";

/// Cost of manufacturing the cure before discounts.
pub const CURE_COST: ResourceBundle = ResourceBundle::new(500, 500, 200, 1);

/// Cure cost after Cure Research, as a percentage.
const CURE_RESEARCH_PERCENT: u32 = 70;

/// A structure a city can place on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// Food on grass or forest.
    Farm,
    /// Materials from ruins, roads and rubble.
    Workshop,
    /// Medicine; required for the cure.
    Hospital,
    /// Blocks zombies; can sit on the city tile.
    Wall,
    /// Food from water.
    Dock,
}

impl StructureKind {
    /// Every structure.
    pub const ALL: [Self; 5] = [
        Self::Farm,
        Self::Workshop,
        Self::Hospital,
        Self::Wall,
        Self::Dock,
    ];

    /// Lowercase name used in saves and the city ledger.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Farm => "farm",
            Self::Workshop => "workshop",
            Self::Hospital => "hospital",
            Self::Wall => "wall",
            Self::Dock => "dock",
        }
    }

    /// Materials needed to build.
    #[must_use]
    pub const fn cost(self) -> ResourceBundle {
        ResourceBundle::materials(match self {
            Self::Farm => 30,
            Self::Workshop => 50,
            Self::Hospital | Self::Dock => 40,
            Self::Wall => 5,
        })
    }

    /// Health of a new building of this kind.
    #[must_use]
    pub const fn base_health(self) -> i32 {
        match self {
            Self::Wall => 200,
            _ => 20,
        }
    }

    /// Materials per target level for an upgrade.
    #[must_use]
    pub const fn upgrade_rate(self) -> u32 {
        match self {
            Self::Farm => 15,
            Self::Workshop => 25,
            Self::Hospital | Self::Dock => 20,
            Self::Wall => 12,
        }
    }

    /// Farthest Chebyshev distance from the city this can be built.
    #[must_use]
    pub const fn max_build_distance(self) -> i32 {
        match self {
            Self::Wall => 6,
            _ => 1,
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown structure '{s}'"))
    }
}

/// Recruitment cost, or `None` for types a city cannot train.
#[must_use]
pub const fn recruit_cost(unit_type: UnitType) -> Option<ResourceBundle> {
    Some(match unit_type {
        UnitType::Survivor => ResourceBundle::supplies(20, 10),
        UnitType::Scout => ResourceBundle::supplies(15, 5),
        UnitType::Soldier => ResourceBundle::supplies(30, 20),
        UnitType::Medic => ResourceBundle::new(25, 15, 10, 0),
        UnitType::SuperSoldier => ResourceBundle::new(40, 30, 10, 0),
        UnitType::Zombie | UnitType::SuperZombie => return None,
    })
}

/// Cure cost with any research discount applied.
#[must_use]
pub fn cure_cost(techs: &TechProgress) -> ResourceBundle {
    if techs.has(TechId::CureResearch) {
        let mut cost = CURE_COST.scaled_percent(CURE_RESEARCH_PERCENT);
        cost.set(Resource::Cure, CURE_COST.get(Resource::Cure));
        cost
    } else {
        CURE_COST
    }
}

/// A structure placed on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Kind of structure.
    pub kind: StructureKind,
    /// Terrain under the structure, fixed at construction.
    pub terrain: TileType,
    /// Upgrade level, `1..=3`.
    pub level: u32,
    /// Current health.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
}

impl Building {
    /// A fresh level-1 building.
    #[must_use]
    pub const fn new(kind: StructureKind, terrain: TileType) -> Self {
        let health = kind.base_health();
        Self {
            kind,
            terrain,
            level: 1,
            health,
            max_health: health,
        }
    }

    /// Per-turn yield of this building, without tech bonuses.
    #[must_use]
    pub const fn base_yield(&self) -> ResourceBundle {
        let level = self.level;
        match self.kind {
            StructureKind::Farm => {
                let food = match self.terrain {
                    TileType::Grass => 6,
                    TileType::Forest => 3,
                    _ => 0,
                };
                ResourceBundle::supplies(food * level, 0)
            }
            StructureKind::Dock => ResourceBundle::supplies(12 * level, 0),
            StructureKind::Workshop => {
                let materials = match self.terrain {
                    TileType::Rubble => 2,
                    TileType::BuildingRuined | TileType::Road => 4,
                    TileType::BuildingIntact => 8,
                    _ => 0,
                };
                ResourceBundle::materials(materials * level)
            }
            StructureKind::Hospital => {
                let medicine = match self.terrain {
                    TileType::BuildingIntact => 6,
                    _ => 2,
                };
                ResourceBundle::new(0, 0, medicine * level, 0)
            }
            StructureKind::Wall => ResourceBundle::EMPTY,
        }
    }

    /// Materials to reach the next level, or `None` at the cap.
    #[must_use]
    pub const fn upgrade_cost(&self) -> Option<ResourceBundle> {
        if self.level >= MAX_BUILDING_LEVEL {
            None
        } else {
            Some(ResourceBundle::materials(
                self.kind.upgrade_rate() * (self.level + 1),
            ))
        }
    }
}

/// A player settlement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City {
    /// Display name.
    pub name: String,
    /// City tile.
    pub position: Coord,
    /// Inhabitants.
    pub population: u32,
    /// Ledger of structure names, starting with the shelter.
    pub buildings: Vec<String>,
    /// Placed structures keyed by tile.
    pub building_locations: BTreeMap<Coord, Building>,
    /// Stockpile.
    pub resources: ResourceBundle,
    /// City level.
    pub level: u32,
    /// Current health; destroyed at zero or below.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
}

impl City {
    /// Found a city with a shelter and an empty stockpile.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Coord) -> Self {
        Self {
            name: name.into(),
            position,
            population: 5,
            buildings: vec![SHELTER.to_string()],
            building_locations: BTreeMap::new(),
            resources: ResourceBundle::EMPTY,
            level: 1,
            health: CITY_BASE_HEALTH,
            max_health: CITY_BASE_HEALTH,
        }
    }

    /// Whether the ledger lists a structure of this kind.
    #[must_use]
    pub fn has_structure(&self, kind: StructureKind) -> bool {
        self.buildings.iter().any(|b| b == kind.name())
    }

    /// Building on a tile, if this city owns one there.
    #[must_use]
    pub fn building_at(&self, tile: Coord) -> Option<&Building> {
        self.building_locations.get(&tile)
    }

    fn afford(&self, cost: ResourceBundle) -> ActionResult<ResourceBundle> {
        if self.resources.can_afford(&cost) {
            Ok(cost)
        } else {
            Err(ActionError::InsufficientResources {
                required: cost,
                available: self.resources,
            })
        }
    }

    fn debit(&mut self, cost: &ResourceBundle) {
        let paid = self.resources.spend(cost);
        debug_assert!(paid, "cost is checked before debiting");
    }

    fn recruit_check(&self, unit_type: UnitType, techs: &TechProgress) -> ActionResult<ResourceBundle> {
        let cost = recruit_cost(unit_type).ok_or(ActionError::NotRecruitable(unit_type))?;
        if unit_type == UnitType::SuperSoldier && !techs.has(TechId::SuperSoldierProgram) {
            return Err(ActionError::TechLocked(TechId::SuperSoldierProgram));
        }
        self.afford(cost)
    }

    fn cure_check(&self, techs: &TechProgress) -> ActionResult<ResourceBundle> {
        if !self.has_structure(StructureKind::Hospital) {
            return Err(ActionError::HospitalRequired);
        }
        if self.resources.get(Resource::Cure) == 0 {
            return Err(ActionError::CureSampleMissing);
        }
        self.afford(cure_cost(techs))
    }

    /// Whether the stockpile covers a structure of this kind.
    ///
    /// Placement rules are the game state's concern; this only checks cost.
    #[must_use]
    pub fn can_build(&self, kind: StructureKind) -> bool {
        self.resources.can_afford(&kind.cost())
    }

    /// Whether a unit of this type is trainable, unlocked and affordable here.
    #[must_use]
    pub fn can_recruit(&self, unit_type: UnitType, techs: &TechProgress) -> bool {
        self.recruit_check(unit_type, techs).is_ok()
    }

    /// Whether the city has a hospital, the cure sample and the stock to
    /// manufacture the cure.
    #[must_use]
    pub fn can_manufacture_cure(&self, techs: &TechProgress) -> bool {
        self.cure_check(techs).is_ok()
    }

    /// Pay for and record a structure at `tile`.
    ///
    /// A wall on the city's own tile raises city health to 100.
    pub fn build_structure(
        &mut self,
        kind: StructureKind,
        tile: Coord,
        terrain: TileType,
    ) -> ActionResult<()> {
        if self.building_locations.contains_key(&tile) {
            return Err(ActionError::TileHasBuilding(tile));
        }
        if !self.can_build(kind) {
            return Err(ActionError::InsufficientResources {
                required: kind.cost(),
                available: self.resources,
            });
        }
        self.debit(&kind.cost());
        self.buildings.push(kind.name().to_string());
        self.building_locations
            .insert(tile, Building::new(kind, terrain));
        if kind == StructureKind::Wall && tile == self.position {
            self.max_health = CITY_WALLED_HEALTH;
            self.health = CITY_WALLED_HEALTH;
        }
        debug!(city = %self.name, %kind, %tile, "structure built");
        Ok(())
    }

    /// Pay for a recruit. The caller spawns the unit.
    pub fn pay_for_recruit(&mut self, unit_type: UnitType, techs: &TechProgress) -> ActionResult<()> {
        let cost = self.recruit_check(unit_type, techs)?;
        self.debit(&cost);
        Ok(())
    }

    /// Check the hospital, the cure sample and the stockpile, then pay.
    pub fn manufacture_cure(&mut self, techs: &TechProgress) -> ActionResult<()> {
        let cost = self.cure_check(techs)?;
        self.debit(&cost);
        Ok(())
    }

    /// Per-turn yield without side effects.
    ///
    /// Base yield is 2 food and 2 materials, plus each building's terrain
    /// rate times its level, plus flat tech bonuses per building.
    #[must_use]
    pub fn calculate_production(&self, techs: &TechProgress) -> ResourceBundle {
        let mut total = ResourceBundle::supplies(2, 2);
        for building in self.building_locations.values() {
            total.merge(&building.base_yield());
            match building.kind {
                StructureKind::Farm if techs.has(TechId::AdvancedFarming) => {
                    total.add(Resource::Food, 2);
                }
                StructureKind::Workshop if techs.has(TechId::IndustrialWorkshops) => {
                    total.add(Resource::Materials, 3);
                }
                StructureKind::Hospital if techs.has(TechId::BasicMedicine) => {
                    total.add(Resource::Medicine, 2);
                }
                _ => {}
            }
        }
        total
    }

    /// Add this turn's yield to the stockpile and return it.
    pub fn produce_resources(&mut self, techs: &TechProgress) -> ResourceBundle {
        let produced = self.calculate_production(techs);
        self.resources.merge(&produced);
        produced
    }

    /// Whether the building at `tile` exists, is below the cap and is affordable.
    #[must_use]
    pub fn can_upgrade_building(&self, tile: Coord) -> bool {
        self.building_at(tile)
            .and_then(Building::upgrade_cost)
            .is_some_and(|cost| self.resources.can_afford(&cost))
    }

    /// Upgrade the building at `tile`. Returns the new level.
    pub fn upgrade_building(&mut self, tile: Coord) -> ActionResult<u32> {
        let cost = self
            .building_at(tile)
            .ok_or(ActionError::NoBuildingAt(tile))?
            .upgrade_cost()
            .ok_or(ActionError::MaxLevel(tile))?;
        let cost = self.afford(cost)?;
        self.debit(&cost);
        let building = self
            .building_locations
            .get_mut(&tile)
            .ok_or(ActionError::NoBuildingAt(tile))?;
        building.level += 1;
        Ok(building.level)
    }

    /// Damage the city. Returns `true` if it falls.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = self.health.saturating_sub(amount.max(0));
        self.health <= 0
    }

    /// Damage the building at `tile`, removing it when destroyed.
    ///
    /// Returns `Some(true)` if destroyed, `Some(false)` if it stands, and
    /// `None` when the city owns nothing there.
    pub fn damage_building(&mut self, tile: Coord, amount: i32) -> Option<bool> {
        let building = self.building_locations.get_mut(&tile)?;
        building.health = building.health.saturating_sub(amount.max(0));
        if building.health > 0 {
            return Some(false);
        }
        let kind = building.kind;
        self.building_locations.remove(&tile);
        if let Some(idx) = self.buildings.iter().position(|b| b == kind.name()) {
            self.buildings.remove(idx);
        }
        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_with(materials: u32) -> City {
        let mut city = City::new("Haven", Coord::new(10, 10));
        city.resources = ResourceBundle::materials(materials);
        city
    }

    #[test]
    fn test_new_city() {
        let city = City::new("Haven", Coord::new(1, 2));
        assert_eq!(city.population, 5);
        assert_eq!(city.buildings, vec!["shelter".to_string()]);
        assert_eq!((city.health, city.max_health), (50, 50));
        assert!(city.resources.is_empty());
    }

    #[test]
    fn test_build_farm_spends_materials() {
        let mut city = city_with(30);
        city.build_structure(StructureKind::Farm, Coord::new(11, 10), TileType::Grass)
            .unwrap();
        assert_eq!(city.resources.get(Resource::Materials), 0);
        let farm = city.building_at(Coord::new(11, 10)).unwrap();
        assert_eq!(farm.level, 1);
        assert_eq!(farm.health, 20);
        assert!(city.has_structure(StructureKind::Farm));
    }

    #[test]
    fn test_can_build_farm_once_materials_arrive() {
        let mut city = city_with(0);
        assert!(!city.can_build(StructureKind::Farm));

        city.resources.add(Resource::Materials, 30);
        assert!(city.can_build(StructureKind::Farm));
        assert_eq!(city.resources.get(Resource::Materials), 30);

        city.build_structure(StructureKind::Farm, Coord::new(11, 10), TileType::Grass)
            .unwrap();
        assert_eq!(city.resources.get(Resource::Materials), 0);
        assert_eq!(city.building_at(Coord::new(11, 10)).unwrap().level, 1);
        assert!(!city.can_build(StructureKind::Farm));
    }

    #[test]
    fn test_can_recruit_and_cure_match_payment() {
        let mut techs = TechProgress::default();
        let mut city = City::new("Haven", Coord::new(0, 0));
        city.resources = ResourceBundle::new(600, 600, 300, 0);

        assert!(city.can_recruit(UnitType::Soldier, &techs));
        assert!(!city.can_recruit(UnitType::Zombie, &techs));
        assert!(!city.can_recruit(UnitType::SuperSoldier, &techs));
        techs.researched.insert(TechId::SuperSoldierProgram);
        assert!(city.can_recruit(UnitType::SuperSoldier, &techs));

        assert!(!city.can_manufacture_cure(&techs));
        city.build_structure(StructureKind::Hospital, Coord::new(1, 0), TileType::Grass)
            .unwrap();
        assert!(!city.can_manufacture_cure(&techs));
        city.resources.set(Resource::Cure, 1);
        assert!(city.can_manufacture_cure(&techs));
        city.resources.set(Resource::Food, 499);
        assert!(!city.can_manufacture_cure(&techs));
        assert!(matches!(
            city.manufacture_cure(&techs),
            Err(ActionError::InsufficientResources { .. })
        ));
        assert_eq!(city.resources.get(Resource::Cure), 1);
    }

    #[test]
    fn test_build_without_resources_is_noop() {
        let mut city = city_with(29);
        let err = city
            .build_structure(StructureKind::Farm, Coord::new(11, 10), TileType::Grass)
            .unwrap_err();
        assert!(matches!(err, ActionError::InsufficientResources { .. }));
        assert_eq!(city.resources.get(Resource::Materials), 29);
        assert!(city.building_locations.is_empty());
    }

    #[test]
    fn test_wall_on_city_tile_doubles_health() {
        let mut city = city_with(10);
        city.build_structure(StructureKind::Wall, Coord::new(10, 10), TileType::Grass)
            .unwrap();
        assert_eq!((city.health, city.max_health), (100, 100));
        assert_eq!(city.building_at(Coord::new(10, 10)).unwrap().max_health, 200);
    }

    #[test]
    fn test_production_formula() {
        let mut city = city_with(1000);
        let techs = TechProgress::default();
        city.build_structure(StructureKind::Farm, Coord::new(11, 10), TileType::Grass)
            .unwrap();
        city.build_structure(StructureKind::Farm, Coord::new(9, 10), TileType::Forest)
            .unwrap();
        city.build_structure(StructureKind::Workshop, Coord::new(10, 11), TileType::BuildingIntact)
            .unwrap();
        city.build_structure(StructureKind::Hospital, Coord::new(10, 9), TileType::BuildingIntact)
            .unwrap();
        city.build_structure(StructureKind::Dock, Coord::new(11, 11), TileType::Water)
            .unwrap();
        let yield_ = city.calculate_production(&techs);
        assert_eq!(yield_, ResourceBundle::new(2 + 6 + 3 + 12, 2 + 8, 6, 0));
    }

    #[test]
    fn test_production_scales_with_level_and_tech() {
        let mut city = city_with(1000);
        let tile = Coord::new(11, 10);
        city.build_structure(StructureKind::Workshop, tile, TileType::Rubble)
            .unwrap();
        city.upgrade_building(tile).unwrap();
        let mut techs = TechProgress::default();
        assert_eq!(city.calculate_production(&techs).get(Resource::Materials), 2 + 4);
        techs.researched.insert(TechId::IndustrialWorkshops);
        assert_eq!(city.calculate_production(&techs).get(Resource::Materials), 2 + 4 + 3);
    }

    #[test]
    fn test_produce_adds_to_stock() {
        let mut city = City::new("Haven", Coord::new(0, 0));
        let produced = city.produce_resources(&TechProgress::default());
        assert_eq!(produced, ResourceBundle::supplies(2, 2));
        assert_eq!(city.resources, ResourceBundle::supplies(2, 2));
    }

    #[test]
    fn test_upgrade_costs_and_cap() {
        let mut city = city_with(30 + 30 + 45);
        let tile = Coord::new(11, 10);
        city.build_structure(StructureKind::Farm, tile, TileType::Grass)
            .unwrap();
        assert!(city.can_upgrade_building(tile));
        assert_eq!(city.upgrade_building(tile), Ok(2));
        assert_eq!(city.resources.get(Resource::Materials), 45);
        assert_eq!(city.upgrade_building(tile), Ok(3));
        assert_eq!(city.resources.get(Resource::Materials), 0);
        assert_eq!(city.upgrade_building(tile), Err(ActionError::MaxLevel(tile)));
        assert!(!city.can_upgrade_building(tile));
    }

    #[test]
    fn test_upgrade_missing_building() {
        let mut city = city_with(100);
        assert_eq!(
            city.upgrade_building(Coord::new(0, 0)),
            Err(ActionError::NoBuildingAt(Coord::new(0, 0)))
        );
    }

    #[test]
    fn test_cure_requires_hospital_and_sample() {
        let techs = TechProgress::default();
        let mut city = City::new("Haven", Coord::new(0, 0));
        city.resources = ResourceBundle::new(600, 600, 300, 1);
        assert_eq!(city.manufacture_cure(&techs), Err(ActionError::HospitalRequired));
        city.build_structure(StructureKind::Hospital, Coord::new(1, 0), TileType::Grass)
            .unwrap();
        city.resources.set(Resource::Cure, 0);
        assert_eq!(city.manufacture_cure(&techs), Err(ActionError::CureSampleMissing));
        city.resources.set(Resource::Cure, 1);
        assert_eq!(city.manufacture_cure(&techs), Ok(()));
        assert_eq!(city.resources, ResourceBundle::new(100, 60, 100, 0));
    }

    #[test]
    fn test_cure_research_discount() {
        let mut techs = TechProgress::default();
        techs.researched.insert(TechId::CureResearch);
        assert_eq!(cure_cost(&techs), ResourceBundle::new(350, 350, 140, 1));
    }

    #[test]
    fn test_recruit_costs() {
        let techs = TechProgress::default();
        let mut city = City::new("Haven", Coord::new(0, 0));
        city.resources = ResourceBundle::new(100, 100, 20, 0);
        assert_eq!(city.pay_for_recruit(UnitType::Medic, &techs), Ok(()));
        assert_eq!(city.resources, ResourceBundle::new(75, 85, 10, 0));
        assert_eq!(
            city.pay_for_recruit(UnitType::Zombie, &techs),
            Err(ActionError::NotRecruitable(UnitType::Zombie))
        );
        assert_eq!(
            city.pay_for_recruit(UnitType::SuperSoldier, &techs),
            Err(ActionError::TechLocked(TechId::SuperSoldierProgram))
        );
    }

    #[test]
    fn test_building_destruction_updates_ledger() {
        let mut city = city_with(100);
        let tile = Coord::new(11, 10);
        city.build_structure(StructureKind::Hospital, tile, TileType::Grass)
            .unwrap();
        assert_eq!(city.damage_building(tile, 15), Some(false));
        assert_eq!(city.damage_building(tile, 5), Some(true));
        assert!(!city.has_structure(StructureKind::Hospital));
        assert!(city.building_at(tile).is_none());
        assert_eq!(city.damage_building(tile, 5), None);
    }
}

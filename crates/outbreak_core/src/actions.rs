//! Player commands.
//!
//! Every command checks its preconditions before touching anything, so an
//! `Err` leaves the state exactly as it was.

use tracing::debug;

use crate::city::{City, StructureKind};
use crate::error::{ActionError, ActionResult};
use crate::events::GameEvent;
use crate::game_state::GameState;
use crate::math::{Coord, Fixed, STEP_MOVE_COST};
use crate::resources::{Resource, ResourceBundle};
use crate::tech::TechId;
use crate::terrain::TileType;
use crate::unit::{Team, Unit, UnitId, UnitType};

/// Experience for killing a unit in melee.
pub const KILL_XP: u32 = 50;

/// Experience a scout earns for entering a new tile.
pub const EXPLORE_XP: u32 = 1;

/// Healing by a level-1 medic.
pub const BASE_HEAL: i32 = 30;

/// Extra healing per medic level above 1.
pub const HEAL_PER_LEVEL: i32 = 10;

/// Extra healing with Tactical Medicine.
const TACTICAL_MEDICINE_HEAL: i32 = 20;

/// Food and materials granted to new cities with Quick Start.
const QUICK_START_SUPPLIES: u32 = 30;

/// Scavenging Efficiency bonus, in percent.
const SCAVENGE_BONUS_PERCENT: u32 = 25;

/// Level recruits start at with Combat Training.
const TRAINED_RECRUIT_LEVEL: u32 = 2;

/// Max-health bonus for recruits with Armor Plating.
const ARMOR_PLATING_HEALTH: i32 = 40;

/// Attack bonus for recruited soldiers with Advanced Weaponry.
const ADVANCED_WEAPONRY_ATTACK: i32 = 10;

/// Result of [`GameState::move_unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The unit stepped onto a new tile.
    Moved {
        /// Previous tile.
        from: Coord,
        /// New tile.
        to: Coord,
    },
    /// An enemy stood on the destination and was attacked.
    Attacked {
        /// Unit that was hit.
        target: UnitId,
        /// Damage dealt.
        damage: i32,
        /// Whether the target died.
        killed: bool,
    },
}

/// Result of [`GameState::heal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealOutcome {
    /// Unit that was healed.
    pub patient: UnitId,
    /// Health actually restored.
    pub amount: i32,
}

impl GameState {
    // ========================================================================
    // Preconditions
    // ========================================================================

    fn ensure_player_phase(&self) -> ActionResult<()> {
        if self.game_won || self.is_game_over() {
            return Err(ActionError::GameOver);
        }
        if self.current_team != Team::Player {
            return Err(ActionError::NotPlayerTurn);
        }
        Ok(())
    }

    fn player_unit(&self, id: UnitId) -> ActionResult<&Unit> {
        let unit = self.unit(id).ok_or(ActionError::UnitNotFound(id))?;
        if unit.team != Team::Player {
            return Err(ActionError::NotPlayerUnit(id));
        }
        Ok(unit)
    }

    fn city_index(&self, position: Coord) -> ActionResult<usize> {
        self.city_index_at(position)
            .ok_or(ActionError::CityNotFound(position))
    }

    fn grant_xp(&mut self, id: UnitId, amount: u32) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        if unit.gain_xp(amount) {
            let level = unit.level;
            debug!(%id, level, "unit leveled up");
            self.emit(GameEvent::LeveledUp { unit: id, level });
        }
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// Move a unit one step, attacking any enemy on the destination.
    ///
    /// Deltas are clamped to a single step.
    pub fn move_unit(&mut self, id: UnitId, dx: i32, dy: i32) -> ActionResult<MoveOutcome> {
        self.ensure_player_phase()?;
        let unit = self.player_unit(id)?;
        let (dx, dy) = (dx.signum(), dy.signum());
        if dx == 0 && dy == 0 {
            return Err(ActionError::InvalidStep { dx, dy });
        }
        if !unit.can_move() {
            return Err(ActionError::NoMovesLeft(id));
        }
        let from = unit.position;
        let size = unit.size;
        let attack = unit.attack_power;
        let dest = from.offset(dx, dy);
        if !self.grid.footprint_in_bounds(dest, size) {
            return Err(ActionError::OutOfBounds(dest));
        }

        let occupant = dest
            .footprint(size)
            .find_map(|tile| self.unit_at_excluding(tile, Some(id)))
            .map(|u| (u.id, u.team, u.unit_type));
        if let Some((target, team, target_type)) = occupant {
            if team == Team::Player {
                return Err(ActionError::BlockedByFriendly(dest));
            }
            if let Some(attacker) = self.unit_mut(id) {
                attacker.spend_moves(STEP_MOVE_COST);
            }
            let (damage, killed) = self.damage_unit(id, target, attack);
            debug!(%id, %target, damage, killed, "player attack");
            if killed {
                self.grant_xp(id, KILL_XP);
                self.award_tech_points(Self::kill_reward(target_type));
            }
            return Ok(MoveOutcome::Attacked {
                target,
                damage,
                killed,
            });
        }

        let terrain = self.grid.get(dest).ok_or(ActionError::OutOfBounds(dest))?;
        let explored_new = match self.unit_mut(id) {
            Some(unit) => {
                unit.step(dx, dy, terrain);
                unit.record_explored(dest)
            }
            None => false,
        };
        if explored_new {
            self.grant_xp(id, EXPLORE_XP);
        }
        self.emit(GameEvent::UnitMoved {
            unit: id,
            from,
            to: dest,
        });
        self.update_visibility();
        Ok(MoveOutcome::Moved { from, to: dest })
    }

    /// Found a city on the unit's tile, consuming the unit.
    ///
    /// The unit's whole inventory becomes the city's starting stock.
    pub fn found_city(&mut self, id: UnitId, name: impl Into<String>) -> ActionResult<Coord> {
        self.ensure_player_phase()?;
        let tile = self.player_unit(id)?.position;
        self.can_found_city(tile)?;
        if self.building_at(tile).is_some() {
            return Err(ActionError::TileHasBuilding(tile));
        }

        let Some(idx) = self.units.iter().position(|u| u.id == id) else {
            return Err(ActionError::UnitNotFound(id));
        };
        let founder = self.units.remove(idx);
        let mut city = City::new(name, tile);
        city.resources = founder.inventory;
        if self.techs.has(TechId::QuickStart) {
            city.resources
                .merge(&ResourceBundle::supplies(QUICK_START_SUPPLIES, QUICK_START_SUPPLIES));
        }
        debug!(city = %city.name, %tile, "city founded");
        self.emit(GameEvent::CityFounded {
            city: city.name.clone(),
            at: tile,
            resources: city.resources,
        });
        self.cities.push(city);
        self.update_visibility();
        Ok(tile)
    }

    /// Pick up the whole pile on the unit's tile.
    pub fn scavenge(&mut self, id: UnitId) -> ActionResult<ResourceBundle> {
        self.ensure_player_phase()?;
        let unit = self.player_unit(id)?;
        let tile = unit.position;
        let is_medic = unit.unit_type == UnitType::Medic;
        let pile = self
            .resources
            .get(&tile)
            .copied()
            .filter(|p| !p.is_empty())
            .ok_or(ActionError::NothingToScavenge(tile))?;
        if pile.get(Resource::Cure) > 0 && !is_medic {
            return Err(ActionError::CureRequiresMedic);
        }

        self.resources.remove(&tile);
        let mut items = pile;
        if self.techs.has(TechId::ScavengingEfficiency) {
            for resource in [Resource::Food, Resource::Materials, Resource::Medicine] {
                let amount = items.get(resource);
                items.add(resource, amount * SCAVENGE_BONUS_PERCENT / 100);
            }
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.inventory.merge(&items);
        }
        debug!(%id, %tile, %items, "scavenged");
        self.emit(GameEvent::Scavenged { unit: id, items });
        Ok(items)
    }

    fn transfer(&mut self, id: UnitId, deposit: bool) -> ActionResult<ResourceBundle> {
        self.ensure_player_phase()?;
        let tile = self.player_unit(id)?.position;
        let idx = self.city_index_at(tile).ok_or(ActionError::NotInCity(id))?;
        let items = if deposit {
            self.unit(id).map(|u| u.inventory)
        } else {
            Some(self.cities[idx].resources)
        }
        .unwrap_or_default();
        if items.is_empty() {
            return Err(ActionError::NothingToTransfer);
        }

        let Some(unit) = self.units.iter_mut().find(|u| u.id == id) else {
            return Err(ActionError::UnitNotFound(id));
        };
        let city = &mut self.cities[idx];
        if deposit {
            city.resources.merge(&unit.inventory.take_all());
        } else {
            unit.inventory.merge(&city.resources.take_all());
        }
        let city = city.name.clone();
        self.emit(GameEvent::Transferred {
            unit: id,
            city,
            items,
            deposit,
        });
        Ok(items)
    }

    /// Move the unit's whole inventory into the city it stands in.
    pub fn deposit(&mut self, id: UnitId) -> ActionResult<ResourceBundle> {
        self.transfer(id, true)
    }

    /// Move the whole stock of the city the unit stands in into its inventory.
    pub fn withdraw(&mut self, id: UnitId) -> ActionResult<ResourceBundle> {
        self.transfer(id, false)
    }

    /// Heal the first wounded friendly unit next to a medic.
    ///
    /// Neighbours are scanned column by column from the top-left. The medic
    /// earns experience equal to the health restored.
    pub fn heal(&mut self, medic_id: UnitId) -> ActionResult<HealOutcome> {
        self.ensure_player_phase()?;
        let medic = self.player_unit(medic_id)?;
        if medic.unit_type != UnitType::Medic {
            return Err(ActionError::NotAMedic(medic_id));
        }
        if !medic.can_move() {
            return Err(ActionError::NoMovesLeft(medic_id));
        }
        let level = i32::try_from(medic.level).unwrap_or(i32::MAX);
        let patient = medic
            .position
            .neighbors()
            .filter_map(|tile| self.unit_at_excluding(tile, Some(medic_id)))
            .find(|u| u.team == Team::Player && u.is_wounded())
            .map(|u| u.id)
            .ok_or(ActionError::NoPatientInRange(medic_id))?;

        let mut power = BASE_HEAL.saturating_add(HEAL_PER_LEVEL.saturating_mul(level - 1));
        if self.techs.has(TechId::TacticalMedicine) {
            power += TACTICAL_MEDICINE_HEAL;
        }
        let amount = self.unit_mut(patient).map_or(0, |p| p.heal(power));
        if let Some(medic) = self.unit_mut(medic_id) {
            medic.spend_moves(STEP_MOVE_COST);
        }
        self.grant_xp(medic_id, u32::try_from(amount).unwrap_or(0));
        self.emit(GameEvent::Healed {
            medic: medic_id,
            patient,
            amount,
        });
        Ok(HealOutcome { patient, amount })
    }

    /// Fly a unit from the city it stands in to another city.
    ///
    /// Spends all remaining moves.
    pub fn airlift(&mut self, id: UnitId, destination: Coord) -> ActionResult<Coord> {
        self.ensure_player_phase()?;
        if !self.techs.has(TechId::HelicopterTransport) {
            return Err(ActionError::TechLocked(TechId::HelicopterTransport));
        }
        let unit = self.player_unit(id)?;
        let from = unit.position;
        if self.city_at(from).is_none() {
            return Err(ActionError::NotInCity(id));
        }
        if !unit.can_move() {
            return Err(ActionError::NoMovesLeft(id));
        }
        self.city_index(destination)?;
        if destination == from {
            return Err(ActionError::SameCity);
        }
        if self.unit_at(destination).is_some() {
            return Err(ActionError::TileOccupied(destination));
        }

        if let Some(unit) = self.unit_mut(id) {
            unit.position = destination;
            unit.moves_remaining = Fixed::ZERO;
        }
        self.emit(GameEvent::Airlifted {
            unit: id,
            from,
            to: destination,
        });
        self.update_visibility();
        Ok(destination)
    }

    // ========================================================================
    // Cities
    // ========================================================================

    /// Place a structure for the city at `city_pos`.
    ///
    /// Walls may go up to six tiles out, but beyond the first ring only on a
    /// currently visible tile. Docks need water; nothing else may sit on it.
    pub fn build_structure(
        &mut self,
        city_pos: Coord,
        kind: StructureKind,
        tile: Coord,
    ) -> ActionResult<()> {
        self.ensure_player_phase()?;
        let idx = self.city_index(city_pos)?;
        let distance = city_pos.chebyshev(tile);
        let max = kind.max_build_distance();
        if distance > max {
            return Err(ActionError::OutOfBuildRange {
                kind: kind.name(),
                distance,
                max,
            });
        }
        if distance > 1 && !self.fog.is_visible(tile) {
            return Err(ActionError::TileNotVisible(tile));
        }
        let terrain = self.grid.get(tile).ok_or(ActionError::OutOfBounds(tile))?;
        match (kind, terrain == TileType::Water) {
            (StructureKind::Dock, false) => return Err(ActionError::RequiresWater),
            (StructureKind::Dock, true) | (_, false) => {}
            (_, true) => return Err(ActionError::CannotBuildOnWater(kind.name())),
        }
        if self.unit_at(tile).is_some() {
            return Err(ActionError::TileOccupied(tile));
        }
        let own_tile_wall = kind == StructureKind::Wall && tile == city_pos;
        if self.city_at(tile).is_some() && !own_tile_wall {
            return Err(ActionError::TileOccupied(tile));
        }
        if self.building_at(tile).is_some() {
            return Err(ActionError::TileHasBuilding(tile));
        }

        self.cities[idx].build_structure(kind, tile, terrain)?;
        let city = self.cities[idx].name.clone();
        self.emit(GameEvent::StructureBuilt { city, kind, at: tile });
        self.update_visibility();
        Ok(())
    }

    /// Recruit a unit on the city tile, applying unit techs.
    pub fn recruit(&mut self, city_pos: Coord, unit_type: UnitType) -> ActionResult<UnitId> {
        self.ensure_player_phase()?;
        let idx = self.city_index(city_pos)?;
        if self.unit_at(city_pos).is_some() {
            return Err(ActionError::TileOccupied(city_pos));
        }
        self.cities[idx].pay_for_recruit(unit_type, &self.techs)?;

        let id = self.spawn_unit(unit_type, Team::Player, city_pos);
        let techs = self.techs.clone();
        if let Some(unit) = self.unit_mut(id) {
            if techs.has(TechId::CombatTraining) {
                unit.promote_to(TRAINED_RECRUIT_LEVEL);
            }
            if techs.has(TechId::ArmorPlating) {
                unit.max_health += ARMOR_PLATING_HEALTH;
                unit.health += ARMOR_PLATING_HEALTH;
            }
            if techs.has(TechId::RapidResponse) {
                unit.max_moves += 1;
                unit.reset_moves();
            }
            if techs.has(TechId::AdvancedWeaponry) && unit_type == UnitType::Soldier {
                unit.attack_power += ADVANCED_WEAPONRY_ATTACK;
            }
        }
        let city = self.cities[idx].name.clone();
        debug!(%city, %unit_type, %id, "recruited");
        self.emit(GameEvent::Recruited {
            unit: id,
            unit_type,
            city,
        });
        self.update_visibility();
        Ok(id)
    }

    /// Upgrade the structure on `tile`, charging the owning city.
    pub fn upgrade_building(&mut self, tile: Coord) -> ActionResult<u32> {
        self.ensure_player_phase()?;
        let owner = self
            .building_owner(tile)
            .ok_or(ActionError::NoBuildingAt(tile))?;
        let level = self.cities[owner].upgrade_building(tile)?;
        self.emit(GameEvent::BuildingUpgraded { at: tile, level });
        Ok(level)
    }

    /// Manufacture the cure and win. Returns the number of converted enemies.
    pub fn manufacture_cure(&mut self, city_pos: Coord) -> ActionResult<u32> {
        self.ensure_player_phase()?;
        let idx = self.city_index(city_pos)?;
        self.cities[idx].manufacture_cure(&self.techs)?;
        let converted = u32::try_from(self.enemy_units().count()).unwrap_or(u32::MAX);
        let city = self.cities[idx].name.clone();
        self.win_with_cure(city);
        Ok(converted)
    }

    /// Research a tech. Returns the points spent.
    pub fn research(&mut self, tech: TechId) -> ActionResult<u32> {
        self.ensure_player_phase()?;
        let cost = self.techs.research(tech)?;
        debug!(%tech, cost, "researched");
        self.emit(GameEvent::TechResearched { tech, cost });
        self.update_visibility();
        Ok(cost)
    }
}

//! Scripted player for headless games.
//!
//! The autopilot plays the player side through the same commands a front
//! end would issue. It only looks at explored tiles and visible zombies.
//!
//! Each turn runs in a fixed order:
//! 1. Found a city with the first survivor if none exists
//! 2. Research the first affordable techs from the configured order
//! 3. Cities build a farm, then a workshop, then recruit
//! 4. Units scavenge, deposit, heal and move
//! 5. Cities holding the cure sample build a hospital and manufacture it

use std::path::Path;

use outbreak_core::actions::MoveOutcome;
use outbreak_core::ai::candidate_steps;
use outbreak_core::city::StructureKind;
use outbreak_core::game_state::GameState;
use outbreak_core::math::Coord;
use outbreak_core::resources::Resource;
use outbreak_core::tech::TechId;
use outbreak_core::unit::{Team, Unit, UnitId, UnitType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Upper bound on moves tried for one unit in one turn.
const MAX_STEPS_PER_UNIT: u32 = 16;

/// Error type for autopilot configuration.
#[derive(Error, Debug)]
pub enum AutopilotError {
    /// Failed to read file.
    #[error("Failed to read autopilot file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse autopilot: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Tunable parts of the autopilot policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Policy name, echoed in summaries.
    pub name: String,
    /// Soldiers kept per city before recruiting stops.
    pub soldiers_per_city: u32,
    /// Recruit one medic so the cure sample can be carried home.
    pub recruit_medic: bool,
    /// Techs to research, in priority order.
    pub research_order: Vec<TechId>,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            soldiers_per_city: 3,
            recruit_medic: true,
            research_order: vec![
                TechId::ScavengingEfficiency,
                TechId::AdvancedFarming,
                TechId::Fortification,
                TechId::CombatTraining,
                TechId::IndustrialWorkshops,
                TechId::BasicMedicine,
                TechId::AutomatedDefenses,
                TechId::TacticalMedicine,
                TechId::CureResearch,
            ],
        }
    }
}

impl AutopilotConfig {
    /// Load a policy from a RON file.
    pub fn load(path: &Path) -> Result<Self, AutopilotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a policy from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, AutopilotError> {
        Ok(ron::from_str(ron_str)?)
    }
}

/// Running totals of what the autopilot did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotStats {
    /// Cities founded.
    pub cities_founded: u32,
    /// Piles picked up.
    pub piles_scavenged: u32,
    /// Inventories unloaded into cities.
    pub deposits: u32,
    /// Structures placed.
    pub structures_built: u32,
    /// Units recruited.
    pub recruits: u32,
    /// Attacks made by moving into an enemy.
    pub attacks: u32,
    /// Enemies killed by those attacks.
    pub kills: u32,
    /// Heals performed.
    pub heals: u32,
    /// Techs researched.
    pub researched: u32,
}

/// A scripted player.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    config: AutopilotConfig,
    stats: AutopilotStats,
}

impl Autopilot {
    /// Create an autopilot with a policy.
    #[must_use]
    pub fn new(config: AutopilotConfig) -> Self {
        Self {
            config,
            stats: AutopilotStats::default(),
        }
    }

    /// Policy in use.
    #[must_use]
    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Totals so far.
    #[must_use]
    pub fn stats(&self) -> AutopilotStats {
        self.stats
    }

    /// Issue every command for the current player turn.
    ///
    /// Does nothing outside the player phase or once the game is decided.
    pub fn play_turn(&mut self, state: &mut GameState) {
        if state.current_team != Team::Player || state.game_won || state.is_game_over() {
            return;
        }
        self.found_first_city(state);
        self.research(state);

        let cities: Vec<Coord> = state.cities.iter().map(|c| c.position).collect();
        for &pos in &cities {
            self.develop_city(state, pos);
        }

        let ids: Vec<UnitId> = state.player_units().map(|u| u.id).collect();
        for id in ids {
            self.command_unit(state, id);
        }

        for &pos in &cities {
            if self.try_cure(state, pos) {
                return;
            }
        }
    }

    // ========================================================================
    // Economy
    // ========================================================================

    fn found_first_city(&mut self, state: &mut GameState) {
        if !state.cities.is_empty() {
            return;
        }
        let Some(founder) = state
            .player_units()
            .find(|u| u.unit_type == UnitType::Survivor)
            .map(|u| u.id)
        else {
            return;
        };
        let name = state.suggest_city_name();
        match state.found_city(founder, name) {
            Ok(at) => {
                debug!(%at, "autopilot founded a city");
                self.stats.cities_founded += 1;
            }
            Err(e) => debug!(error = %e, "autopilot could not found a city"),
        }
    }

    fn research(&mut self, state: &mut GameState) {
        for &tech in &self.config.research_order {
            if state.techs.can_research(tech) && state.research(tech).is_ok() {
                self.stats.researched += 1;
            }
        }
    }

    fn develop_city(&mut self, state: &mut GameState, pos: Coord) {
        let Some(city) = state.city_at(pos) else {
            return;
        };
        let next = [StructureKind::Farm, StructureKind::Workshop]
            .into_iter()
            .find(|&kind| !city.has_structure(kind));
        match next {
            Some(kind) => {
                if city.can_build(kind) {
                    self.build_near(state, pos, kind);
                }
            }
            None => self.recruit(state, pos),
        }
    }

    fn build_near(&mut self, state: &mut GameState, pos: Coord, kind: StructureKind) -> bool {
        for tile in pos.neighbors() {
            if state.build_structure(pos, kind, tile).is_ok() {
                self.stats.structures_built += 1;
                return true;
            }
        }
        false
    }

    fn recruit(&mut self, state: &mut GameState, pos: Coord) {
        if state.unit_at(pos).is_some() {
            return;
        }
        let has_medic = state.player_units().any(|u| u.unit_type == UnitType::Medic);
        let soldiers = state
            .player_units()
            .filter(|u| matches!(u.unit_type, UnitType::Soldier | UnitType::SuperSoldier))
            .count();
        let wanted = self.config.soldiers_per_city as usize * state.cities.len();

        let unit_type = if self.config.recruit_medic && !has_medic {
            UnitType::Medic
        } else if soldiers < wanted {
            UnitType::Soldier
        } else {
            return;
        };
        if state.recruit(pos, unit_type).is_ok() {
            self.stats.recruits += 1;
        }
    }

    fn try_cure(&mut self, state: &mut GameState, pos: Coord) -> bool {
        let Some(city) = state.city_at(pos) else {
            return false;
        };
        if city.resources.get(Resource::Cure) == 0 {
            return false;
        }
        if !city.has_structure(StructureKind::Hospital) {
            self.build_near(state, pos, StructureKind::Hospital);
        }
        state.manufacture_cure(pos).is_ok()
    }

    // ========================================================================
    // Units
    // ========================================================================

    fn command_unit(&mut self, state: &mut GameState, id: UnitId) {
        if state.unit(id).is_some_and(|u| u.unit_type == UnitType::Medic)
            && state.heal(id).is_ok()
        {
            self.stats.heals += 1;
        }
        self.collect_and_unload(state, id);

        for _ in 0..MAX_STEPS_PER_UNIT {
            let Some(unit) = state.unit(id) else {
                return;
            };
            if !unit.can_move() {
                return;
            }
            let from = unit.position;
            let Some(target) = self.pick_destination(state, unit) else {
                return;
            };
            if target == from || !self.step_toward(state, id, from, target) {
                return;
            }
            self.collect_and_unload(state, id);
        }
    }

    fn collect_and_unload(&mut self, state: &mut GameState, id: UnitId) {
        if state.scavenge(id).is_ok() {
            self.stats.piles_scavenged += 1;
        }
        if state.deposit(id).is_ok() {
            self.stats.deposits += 1;
        }
    }

    fn pick_destination(&self, state: &GameState, unit: &Unit) -> Option<Coord> {
        let from = unit.position;
        match unit.unit_type {
            UnitType::Soldier | UnitType::SuperSoldier => nearest(
                from,
                state
                    .enemy_units()
                    .filter(|z| state.fog.is_visible(z.position))
                    .map(|z| z.position),
            ),
            _ if !unit.inventory.is_empty() && !state.cities.is_empty() => {
                nearest(from, state.cities.iter().map(|c| c.position))
            }
            kind => {
                let medic = kind == UnitType::Medic;
                nearest(
                    from,
                    state
                        .resources
                        .iter()
                        .filter(|&(&tile, pile)| {
                            !pile.is_empty()
                                && state.fog.is_explored(tile)
                                && (medic || pile.get(Resource::Cure) == 0)
                        })
                        .map(|(&tile, _)| tile),
                )
            }
        }
    }

    fn step_toward(&mut self, state: &mut GameState, id: UnitId, from: Coord, target: Coord) -> bool {
        let (dx, dy) = from.step_toward(target);
        for (sx, sy) in candidate_steps(dx, dy) {
            match state.move_unit(id, sx, sy) {
                Ok(MoveOutcome::Moved { .. }) => return true,
                Ok(MoveOutcome::Attacked { killed, .. }) => {
                    self.stats.attacks += 1;
                    if killed {
                        self.stats.kills += 1;
                    }
                    return true;
                }
                Err(_) => {}
            }
        }
        false
    }
}

/// Closest tile by Manhattan distance; the first of equals wins.
fn nearest(from: Coord, tiles: impl Iterator<Item = Coord>) -> Option<Coord> {
    tiles.min_by_key(|&t| from.manhattan(t))
}

//! Zombie AI.
//!
//! Zombies share a vision network: a player unit within two tiles of any
//! zombie is known to all of them. Cities and buildings are always known.
//! Each zombie walks toward its nearest known target and attacks whatever
//! player-owned thing stands in its way.

use rand::Rng;
use tracing::{debug, info};

use crate::city::StructureKind;
use crate::events::GameEvent;
use crate::game_state::{GameState, Occupant};
use crate::math::{Coord, STEP_MOVE_COST};
use crate::unit::{Team, UnitId};

/// How far a zombie sees player units.
pub const ZOMBIE_VISION: i32 = 2;

/// Distance penalty that ranks walls below every other target.
pub const WALL_TARGET_PENALTY: i32 = 1000;

/// Chance a wandering zombie heads for the map centre.
const WANDER_CENTER_BIAS: f64 = 0.4;

/// Chance each axis of a wander step is re-rolled.
const WANDER_AXIS_JITTER: f64 = 0.3;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Something a zombie can head for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTarget {
    /// A player unit seen through the vision network.
    Unit {
        /// Target unit.
        id: UnitId,
        /// Its anchor tile.
        at: Coord,
    },
    /// A city.
    City {
        /// City tile.
        at: Coord,
    },
    /// A structure.
    Building {
        /// Structure tile.
        at: Coord,
        /// Structure kind.
        kind: StructureKind,
    },
}

impl AiTarget {
    /// Tile the zombie steers toward.
    #[must_use]
    pub const fn position(&self) -> Coord {
        match *self {
            Self::Unit { at, .. } | Self::City { at } | Self::Building { at, .. } => at,
        }
    }
}

/// Candidate steps for an intended direction: the direct step first, then
/// fallbacks so a blocked zombie slides around the blocker.
#[must_use]
pub const fn candidate_steps(dx: i32, dy: i32) -> [(i32, i32); 3] {
    if dx != 0 && dy != 0 {
        [(dx, dy), (dx, 0), (0, dy)]
    } else if dx != 0 {
        [(dx, 0), (dx, 1), (dx, -1)]
    } else {
        [(0, dy), (1, dy), (-1, dy)]
    }
}

fn random_axis<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(-1..=1)
}

impl GameState {
    /// Run the whole zombie phase: aging, then every zombie's moves.
    pub fn run_enemy_phase<R: Rng>(&mut self, rng: &mut R) {
        self.age_zombies();

        let shared = self.shared_vision();
        let zombies: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| u.is_hostile_zombie())
            .map(|u| u.id)
            .collect();
        debug!(zombies = zombies.len(), spotted = shared.len(), "enemy phase");

        for id in zombies {
            self.run_zombie(id, &shared, rng);
        }
    }

    fn age_zombies(&mut self) {
        let mut aged = Vec::new();
        for unit in self.units.iter_mut().filter(|u| u.is_hostile_zombie()) {
            unit.age_in_turns += 1;
            if unit.apply_age_level_ups() > 0 {
                info!(unit = %unit.id, level = unit.level, age = unit.age_in_turns, "zombie leveled up with age");
                aged.push(GameEvent::ZombieAged {
                    unit: unit.id,
                    level: unit.level,
                    age: unit.age_in_turns,
                });
            }
        }
        for event in aged {
            self.emit(event);
        }
    }

    /// Player units within [`ZOMBIE_VISION`] of any zombie, in unit order.
    #[must_use]
    pub fn shared_vision(&self) -> Vec<UnitId> {
        let zombies: Vec<Coord> = self
            .enemy_units()
            .map(|z| z.position)
            .collect();
        self.player_units()
            .filter(|u| {
                zombies
                    .iter()
                    .any(|&z| z.chebyshev(u.position) <= ZOMBIE_VISION)
            })
            .map(|u| u.id)
            .collect()
    }

    /// Nearest target by Manhattan distance from `from`.
    ///
    /// Candidates are the spotted units, then cities, then buildings; the
    /// first minimum wins. Walls carry [`WALL_TARGET_PENALTY`].
    #[must_use]
    pub fn select_target(&self, from: Coord, spotted: &[UnitId]) -> Option<AiTarget> {
        let units = spotted
            .iter()
            .filter_map(|&id| self.unit(id))
            .map(|u| AiTarget::Unit {
                id: u.id,
                at: u.position,
            });
        let cities = self.cities.iter().map(|c| AiTarget::City { at: c.position });
        let buildings = self.cities.iter().flat_map(|c| {
            c.building_locations
                .iter()
                .map(|(&at, b)| AiTarget::Building { at, kind: b.kind })
        });

        let mut best: Option<(i32, AiTarget)> = None;
        for target in units.chain(cities).chain(buildings) {
            let mut distance = from.manhattan(target.position());
            if matches!(
                target,
                AiTarget::Building {
                    kind: StructureKind::Wall,
                    ..
                }
            ) {
                distance += WALL_TARGET_PENALTY;
            }
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, target));
            }
        }
        best.map(|(_, target)| target)
    }

    fn run_zombie<R: Rng>(&mut self, id: UnitId, spotted: &[UnitId], rng: &mut R) {
        loop {
            let Some(zombie) = self.unit(id) else {
                return;
            };
            if !zombie.can_move() {
                return;
            }
            let from = zombie.position;
            let acted = match self.select_target(from, spotted) {
                Some(target) => {
                    let (mut dx, mut dy) = from.step_toward(target.position());
                    if dx == 0 && dy == 0 {
                        (dx, dy) = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
                    }
                    candidate_steps(dx, dy)
                        .into_iter()
                        .any(|(cx, cy)| self.zombie_try_step(id, cx, cy))
                }
                None => self.wander(id, rng),
            };
            if !acted {
                return;
            }
        }
    }

    /// Try one candidate step. Returns whether the zombie moved or attacked.
    fn zombie_try_step(&mut self, id: UnitId, dx: i32, dy: i32) -> bool {
        let Some(zombie) = self.unit(id) else {
            return false;
        };
        let (from, size, attack) = (zombie.position, zombie.size, zombie.attack_power);
        let dest = from.offset(dx, dy);
        if !self.grid.footprint_in_bounds(dest, size) {
            return false;
        }

        let occupant = match self.check_collision_for_multitile_unit(id, dest, size) {
            Some(Occupant::Unit(target)) if self.unit(target).map(|u| u.team) != Some(Team::Player) => {
                // Another zombie stands in the way; the city or structure under it is still hit.
                match self.structure_in_footprint(dest, size) {
                    Some(structure) => Some(structure),
                    None => return false,
                }
            }
            other => other,
        };
        match occupant {
            Some(Occupant::Unit(target)) => {
                self.zombie_spend_attack(id);
                self.damage_unit(id, target, attack);
            }
            Some(Occupant::City(at)) => {
                self.zombie_spend_attack(id);
                self.zombie_attack_city(id, at, attack);
            }
            Some(Occupant::Building(at)) => {
                self.zombie_spend_attack(id);
                self.zombie_attack_building(id, at, attack);
            }
            None => {
                let Some(terrain) = self.grid.get(dest) else {
                    return false;
                };
                if let Some(zombie) = self.unit_mut(id) {
                    zombie.step(dx, dy, terrain);
                }
                self.emit(GameEvent::UnitMoved {
                    unit: id,
                    from,
                    to: dest,
                });
            }
        }
        true
    }

    /// First city or structure over a footprint, ignoring units.
    fn structure_in_footprint(&self, anchor: Coord, size: i32) -> Option<Occupant> {
        anchor.footprint(size).find_map(|tile| {
            if self.city_at(tile).is_some() {
                Some(Occupant::City(tile))
            } else if self.building_at(tile).is_some() {
                Some(Occupant::Building(tile))
            } else {
                None
            }
        })
    }

    fn zombie_spend_attack(&mut self, id: UnitId) {
        if let Some(zombie) = self.unit_mut(id) {
            zombie.spend_moves(STEP_MOVE_COST);
        }
    }

    fn zombie_attack_city(&mut self, attacker: UnitId, at: Coord, damage: i32) {
        let Some(idx) = self.city_index_at(at) else {
            return;
        };
        let fallen = self.cities[idx].take_damage(damage);
        let city = self.cities[idx].name.clone();
        self.emit(GameEvent::CityAttacked {
            attacker,
            city: city.clone(),
            damage,
            remaining: self.cities[idx].health,
        });
        if fallen {
            info!(%city, %at, "city destroyed");
            self.cities.remove(idx);
            self.emit(GameEvent::CityDestroyed { city, at });
            self.update_visibility();
        }
    }

    fn zombie_attack_building(&mut self, attacker: UnitId, at: Coord, damage: i32) {
        let Some(owner) = self.building_owner(at) else {
            return;
        };
        let Some(kind) = self.cities[owner].building_at(at).map(|b| b.kind) else {
            return;
        };
        let destroyed = self.cities[owner].damage_building(at, damage) == Some(true);
        let remaining = self.cities[owner].building_at(at).map_or(0, |b| b.health);
        self.emit(GameEvent::BuildingAttacked {
            attacker,
            at,
            kind,
            remaining,
        });
        if destroyed {
            info!(%kind, %at, "building destroyed");
            self.emit(GameEvent::BuildingDestroyed { at, kind });
            self.update_visibility();
        }
    }

    /// Aimless step when nothing is known. Returns whether the zombie moved.
    fn wander<R: Rng>(&mut self, id: UnitId, rng: &mut R) -> bool {
        let Some(zombie) = self.unit(id) else {
            return false;
        };
        let (from, size) = (zombie.position, zombie.size);
        let (mut dx, mut dy) = if rng.gen_bool(WANDER_CENTER_BIAS) {
            from.step_toward(self.grid.center())
        } else {
            (random_axis(rng), random_axis(rng))
        };
        if rng.gen_bool(WANDER_AXIS_JITTER) {
            dx = random_axis(rng);
        }
        if rng.gen_bool(WANDER_AXIS_JITTER) {
            dy = random_axis(rng);
        }
        while dx == 0 && dy == 0 {
            dx = random_axis(rng);
            dy = random_axis(rng);
        }

        let dest = from.offset(dx, dy);
        if !self.grid.footprint_in_bounds(dest, size)
            || self
                .check_collision_for_multitile_unit(id, dest, size)
                .is_some()
        {
            return false;
        }
        let Some(terrain) = self.grid.get(dest) else {
            return false;
        };
        if let Some(zombie) = self.unit_mut(id) {
            zombie.step(dx, dy, terrain);
        }
        self.emit(GameEvent::UnitMoved {
            unit: id,
            from,
            to: dest,
        });
        true
    }
}

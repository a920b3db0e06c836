//! Turn machine: phase hand-off, production, defenses and zombie spawns.
//!
//! A round is two calls to [`GameState::end_turn`]: the player ends their
//! turn and the zombies act, then the enemy phase ends and the next player
//! turn begins.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::events::GameEvent;
use crate::game_state::GameState;
use crate::math::Coord;
use crate::persistence::SaveStore;
use crate::tech::TechId;
use crate::unit::{Team, UnitId, UnitType};

/// First turn super zombies may appear.
pub const SUPER_ZOMBIE_FIRST_TURN: u32 = 25;

/// Damage automated defenses deal to each adjacent zombie.
pub const DEFENSE_DAMAGE: i32 = 10;

/// Tech points each city yields per turn.
pub const CITY_TECH_POINTS: u32 = 1;

/// What happened during one phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Side whose phase begins.
    pub phase: Team,
    /// Turn counter after the transition.
    pub turn: u32,
    /// Events recorded during the transition.
    pub events: Vec<GameEvent>,
}

/// Inclusive range of regular zombies spawned on `turn`, before difficulty.
#[must_use]
pub const fn spawn_band(turn: u32) -> (u32, u32) {
    match turn {
        0..=5 => (1, 2),
        6..=10 => (2, 3),
        11..=15 => (3, 4),
        16..=20 => (4, 5),
        21..=30 => (5, 7),
        31..=40 => (7, 10),
        _ => (10, 15),
    }
}

/// Whether a super zombie spawn is attempted on `turn`.
#[must_use]
pub const fn super_zombie_turn(turn: u32) -> bool {
    turn >= SUPER_ZOMBIE_FIRST_TURN && (turn % 3 == 0 || turn % 4 == 0)
}

impl GameState {
    /// Hand the turn to the other side.
    ///
    /// From the player phase this runs the whole zombie phase. From the
    /// enemy phase it starts the next player turn: counter, moves,
    /// autosave, production, defenses, spawns and visibility.
    pub fn end_turn<R: Rng>(&mut self, rng: &mut R) -> TurnReport {
        match self.current_team {
            Team::Player => {
                self.current_team = Team::Enemy;
                for unit in self.units.iter_mut().filter(|u| u.team == Team::Enemy) {
                    unit.reset_moves();
                }
                self.run_enemy_phase(rng);
                self.update_visibility();
            }
            Team::Enemy => self.begin_player_turn(rng),
        }
        TurnReport {
            phase: self.current_team,
            turn: self.turn,
            events: self.take_events(),
        }
    }

    /// Play out the zombie phase and start the next player turn.
    ///
    /// Returns both reports, enemy phase first.
    pub fn advance_round<R: Rng>(&mut self, rng: &mut R) -> [TurnReport; 2] {
        if self.current_team == Team::Enemy {
            self.begin_player_turn(rng);
        }
        let enemy = self.end_turn(rng);
        let player = self.end_turn(rng);
        [enemy, player]
    }

    fn begin_player_turn<R: Rng>(&mut self, rng: &mut R) {
        self.turn += 1;
        self.current_team = Team::Player;
        for unit in self.units.iter_mut().filter(|u| u.team == Team::Player) {
            unit.reset_moves();
        }

        if let Some(dir) = self.autosave_dir().map(std::path::Path::to_path_buf) {
            if let Err(e) = SaveStore::new(dir).autosave(self) {
                warn!(error = %e, "autosave failed");
            }
        }

        self.run_production();
        if self.techs.has(TechId::AutomatedDefenses) {
            self.fire_defenses();
        }
        self.spawn_zombies(rng);
        self.update_visibility();

        if self.is_game_over() {
            info!(turn = self.turn, "all survivors and cities lost");
        } else {
            debug!(turn = self.turn, "player turn begins");
        }
    }

    fn run_production(&mut self) {
        let mut produced = Vec::with_capacity(self.cities.len());
        for city in &mut self.cities {
            let amount = city.produce_resources(&self.techs);
            produced.push(GameEvent::ResourcesProduced {
                city: city.name.clone(),
                amount,
            });
        }
        let points = CITY_TECH_POINTS * u32::try_from(produced.len()).unwrap_or(u32::MAX);
        for event in produced {
            self.emit(event);
        }
        self.award_tech_points(points);
    }

    /// Every city and structure hits each adjacent zombie once.
    fn fire_defenses(&mut self) {
        let sources: Vec<Coord> = self
            .cities
            .iter()
            .flat_map(|c| std::iter::once(c.position).chain(c.building_locations.keys().copied()))
            .collect();
        for from in sources {
            let mut targets: Vec<UnitId> = Vec::new();
            for tile in from.neighbors() {
                if let Some(z) = self.unit_at(tile).filter(|u| u.is_hostile_zombie()) {
                    if !targets.contains(&z.id) {
                        targets.push(z.id);
                    }
                }
            }
            for target in targets {
                self.defense_hit(from, target);
            }
        }
    }

    fn defense_hit(&mut self, from: Coord, target: UnitId) {
        let Some(zombie) = self.unit_mut(target) else {
            return;
        };
        let died = zombie.take_damage(DEFENSE_DAMAGE);
        let unit_type = zombie.unit_type;
        self.emit(GameEvent::DefensesFired {
            from,
            target,
            damage: DEFENSE_DAMAGE,
        });
        if died {
            self.remove_unit(target);
            self.award_tech_points(Self::kill_reward(unit_type));
        }
    }

    /// Roll for edge spawns. Returns how many units appeared.
    pub fn spawn_zombies<R: Rng>(&mut self, rng: &mut R) -> u32 {
        let settings = self.difficulty.settings();
        let (w, h) = (self.grid.width(), self.grid.height());
        let mut spawned = 0;

        if rng.gen_bool(settings.zombie_spawn_rate) {
            let (lo, hi) = spawn_band(self.turn);
            let count = rng.gen_range(lo..=hi)
                + rng.gen_range(settings.spawn_count_min..=settings.spawn_count_max)
                - 1;
            for _ in 0..count {
                let tile = match rng.gen_range(0..4) {
                    0 => Coord::new(rng.gen_range(0..w), 0),
                    1 => Coord::new(w - 1, rng.gen_range(0..h)),
                    2 => Coord::new(rng.gen_range(0..w), h - 1),
                    _ => Coord::new(0, rng.gen_range(0..h)),
                };
                if !self.footprint_blocked(tile, 1) {
                    self.spawn_unit(UnitType::Zombie, Team::Enemy, tile);
                    spawned += 1;
                }
            }
            if spawned > 0 {
                info!(turn = self.turn, count = spawned, "zombies appeared at the map edges");
                self.emit(GameEvent::ZombiesSpawned { count: spawned });
            }
        }

        if super_zombie_turn(self.turn) {
            let tile = match rng.gen_range(0..4) {
                0 => Coord::new(rng.gen_range(0..=w - 2), 0),
                1 => Coord::new(w - 2, rng.gen_range(0..=h - 2)),
                2 => Coord::new(rng.gen_range(0..=w - 2), h - 2),
                _ => Coord::new(0, rng.gen_range(0..=h - 2)),
            };
            if !self.footprint_blocked(tile, 2) {
                let id = self.spawn_unit(UnitType::SuperZombie, Team::Enemy, tile);
                if let Some(unit) = self.unit(id) {
                    let (health, attack) = (unit.health, unit.attack_power);
                    info!(turn = self.turn, %tile, health, attack, "super zombie appeared");
                    self.emit(GameEvent::SuperZombieSpawned {
                        unit: id,
                        at: tile,
                        health,
                        attack,
                    });
                }
                spawned += 1;
            }
        }
        spawned
    }
}

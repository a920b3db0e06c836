//! End-to-end scenarios driven through the public command API.
//!
//! Each scenario builds a small hand-made world with the shared fixtures,
//! issues player commands and ends turns the way a front end would.

use outbreak_core::prelude::*;
use outbreak_test_utils::determinism::SeededGame;
use outbreak_test_utils::fixtures::{
    at, besieged_colony, open_field, place_city, place_pile, spawn_player, spawn_super_zombie,
    spawn_zombie, test_rng,
};

// =============================================================================
// Combat
// =============================================================================

mod combat {
    use super::*;

    #[test]
    fn test_soldier_kill_awards_xp_and_tech_points() {
        let mut state = open_field();
        let soldier = spawn_player(&mut state, UnitType::Soldier, 5, 5);
        let zombie = spawn_zombie(&mut state, 6, 5);
        if let Some(z) = state.unit_mut(zombie) {
            z.health = 15;
            z.inventory = ResourceBundle::supplies(4, 2);
        }

        let outcome = state.move_unit(soldier, 1, 0).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Attacked {
                target: zombie,
                damage: 20,
                killed: true
            }
        );
        assert!(state.unit(zombie).is_none());
        assert_eq!(state.unit(soldier).unwrap().position, at(5, 5));
        assert_eq!(state.unit(soldier).unwrap().xp, 50);
        assert_eq!(state.techs.tech_points, 1);
        assert_eq!(state.resources.get(&at(6, 5)), Some(&ResourceBundle::supplies(4, 2)));
    }

    #[test]
    fn test_super_zombie_kill_is_worth_five_points() {
        let mut state = open_field();
        let soldier = spawn_player(&mut state, UnitType::Soldier, 5, 5);
        let brute = spawn_super_zombie(&mut state, 6, 4);
        state.unit_mut(brute).unwrap().health = 1;

        // The destination (6,5) is the lower-left cell of the 2x2 footprint.
        let outcome = state.move_unit(soldier, 1, 0).unwrap();
        assert!(matches!(outcome, MoveOutcome::Attacked { killed: true, .. }));
        assert_eq!(state.techs.tech_points, 5);
    }

    #[test]
    fn test_zombie_kills_last_survivor_and_ends_game() {
        let mut state = open_field();
        let survivor = spawn_player(&mut state, UnitType::Survivor, 5, 5);
        spawn_zombie(&mut state, 6, 5);
        state.unit_mut(survivor).unwrap().health = 5;

        let report = state.end_turn(&mut test_rng(1));
        assert_eq!(report.phase, Team::Enemy);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::UnitKilled { unit, .. } if *unit == survivor)));
        assert!(state.is_game_over());

        state.end_turn(&mut test_rng(2));
        let zombie = state.enemy_units().next().unwrap().id;
        assert_eq!(state.move_unit(zombie, 1, 0), Err(ActionError::GameOver));
    }
}

// =============================================================================
// Siege
// =============================================================================

mod siege {
    use super::*;

    fn distance_to_city(state: &GameState) -> i32 {
        state
            .enemy_units()
            .map(|z| z.position.manhattan(at(10, 10)))
            .sum()
    }

    #[test]
    fn test_zombies_converge_on_colony() {
        let mut state = besieged_colony();
        let before = distance_to_city(&state);

        state.end_turn(&mut test_rng(3));
        assert_eq!(state.current_team, Team::Enemy);
        assert!(distance_to_city(&state) < before);
    }

    #[test]
    fn test_wall_is_a_last_resort_target() {
        let mut state = open_field();
        let city = place_city(&mut state, "Bastion", 10, 10, ResourceBundle::materials(100));
        state.build_structure(city, StructureKind::Wall, at(12, 10)).unwrap();

        // The wall is two tiles away and the city four.
        let target = state.select_target(at(14, 10), &[]).unwrap();
        assert_eq!(target, AiTarget::City { at: city });
    }

    #[test]
    fn test_spotted_unit_wins_distance_tie() {
        let mut state = besieged_colony();
        let survivor = state
            .player_units()
            .find(|u| u.unit_type == UnitType::Survivor)
            .unwrap()
            .id;
        state.unit_mut(survivor).unwrap().position = at(12, 12);

        let target = state.select_target(at(12, 10), &[survivor]).unwrap();
        assert_eq!(
            target,
            AiTarget::Unit {
                id: survivor,
                at: at(12, 12)
            }
        );
    }

    #[test]
    fn test_automated_defenses_hit_adjacent_zombies() {
        let mut state = open_field();
        let city = place_city(&mut state, "Turret", 10, 10, ResourceBundle::EMPTY);
        state.techs.researched.insert(TechId::AutomatedDefenses);
        let zombie = spawn_zombie(&mut state, 11, 11);

        // The zombie spends its phase hitting the city, then the city fires back.
        state.advance_round(&mut test_rng(4));
        assert_eq!(state.unit(zombie).unwrap().position, at(11, 11));
        assert_eq!(state.unit(zombie).unwrap().health, 90);
        assert_eq!(state.city_at(city).unwrap().health, 30);
    }
}

// =============================================================================
// Economy and victory
// =============================================================================

mod economy {
    use super::*;

    #[test]
    fn test_found_city_from_starting_survivor() {
        let mut rng = test_rng(10);
        let mut state = GameState::new_game(&MapConfig::small(), Difficulty::Easy, &mut rng).unwrap();
        let founder = state.player_units().next().unwrap().id;
        let tile = state.unit(founder).unwrap().position;
        let supplies = state.unit(founder).unwrap().inventory;

        state.found_city(founder, state.suggest_city_name()).unwrap();
        let city = state.city_at(tile).unwrap();
        assert_eq!(city.name, "New Hope 1");
        assert_eq!(city.resources, supplies);
        assert_eq!(state.player_units().count(), 2);
    }

    #[test]
    fn test_production_accumulates_over_turns() {
        let mut state = open_field();
        let city = place_city(&mut state, "Farmstead", 10, 10, ResourceBundle::materials(30));
        state.build_structure(city, StructureKind::Farm, at(11, 10)).unwrap();
        let stock = state.city_at(city).unwrap().resources;

        let mut rng = test_rng(11);
        state.advance_round(&mut rng);

        let after = state.city_at(city).unwrap().resources;
        assert!(after.get(Resource::Food) > stock.get(Resource::Food));
        assert_eq!(state.techs.tech_points, 1);
    }

    #[test]
    fn test_medic_carries_cure_to_victory() {
        let mut state = open_field();
        let city = place_city(&mut state, "Lab City", 10, 10, ResourceBundle::new(500, 540, 200, 0));
        let medic = spawn_player(&mut state, UnitType::Medic, 12, 12);
        place_pile(&mut state, 12, 12, ResourceBundle::CURE_SAMPLE);
        spawn_zombie(&mut state, 25, 25);
        spawn_zombie(&mut state, 26, 20);

        state.scavenge(medic).unwrap();
        state.move_unit(medic, -1, -1).unwrap();
        state.move_unit(medic, -1, -1).unwrap();
        assert_eq!(state.unit(medic).unwrap().position, city);
        state.deposit(medic).unwrap();

        assert_eq!(state.manufacture_cure(city), Err(ActionError::HospitalRequired));
        state.build_structure(city, StructureKind::Hospital, at(9, 10)).unwrap();
        let converted = state.manufacture_cure(city).unwrap();

        assert_eq!(converted, 2);
        assert!(state.game_won);
        assert_eq!(state.enemy_units().count(), 0);
        assert_eq!(state.fog.explored_count(), 30 * 30);
        assert_eq!(state.research(TechId::Fortification), Err(ActionError::GameOver));
    }
}

// =============================================================================
// Full games
// =============================================================================

mod full_game {
    use super::*;

    #[test]
    fn test_seeded_game_keeps_invariants() {
        let mut game = SeededGame::small(31337);
        for _ in 0..15 {
            game.advance();
            let state = &game.state;
            assert_eq!(state.current_team, Team::Player);
            for unit in &state.units {
                assert!(state.grid.footprint_in_bounds(unit.position, unit.size));
                assert!(unit.is_alive());
                assert!(unit.moves_remaining >= Fixed::ZERO);
            }
            assert!(state.fog.explored_count() >= state.fog.visible_count());
        }
        assert_eq!(game.state.turn, 16);
    }

    #[test]
    fn test_zombie_pressure_grows() {
        let mut game = SeededGame::new(MapConfig::small().with_seed(8), Difficulty::Hard);
        let start = game.state.enemy_units().count();
        game.play(20);
        assert!(game.state.enemy_units().count() > start || game.state.is_game_over());
    }
}

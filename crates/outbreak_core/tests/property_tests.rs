//! Property-based tests for the core rules.

use outbreak_core::prelude::*;
use outbreak_core::math::{moves, ROAD_MOVE_COST, STEP_MOVE_COST};
use outbreak_test_utils::fixtures::{open_field, spawn_player, spawn_super_zombie, FIELD_SIZE};
use outbreak_test_utils::proptest::prelude::*;
use outbreak_test_utils::strategies::{
    arb_coord, arb_grid, arb_path, arb_step, arb_unit_type, arb_vision_sources, arb_xp_grants,
};

proptest! {
    /// Explored tiles never become unexplored, and visible implies explored.
    #[test]
    fn prop_fog_explored_is_monotonic(
        rounds in prop::collection::vec(arb_vision_sources(20, 20, 4), 1..8),
    ) {
        let mut fog = FogOfWar::new(20, 20);
        let mut explored_before = 0;
        for sources in rounds {
            let previous = fog.explored_rows();
            fog.recompute(sources);
            prop_assert!(fog.explored_count() >= explored_before);
            explored_before = fog.explored_count();
            for (y, row) in previous.iter().enumerate() {
                for (x, &was_explored) in row.iter().enumerate() {
                    let c = Coord::new(x as i32, y as i32);
                    if was_explored {
                        prop_assert!(fog.is_explored(c));
                    }
                    if fog.is_visible(c) {
                        prop_assert!(fog.is_explored(c));
                    }
                }
            }
        }
    }

    /// Levels only go up, and stats never shrink as experience accrues.
    #[test]
    fn prop_leveling_is_monotonic(
        unit_type in arb_unit_type(),
        grants in arb_xp_grants(),
    ) {
        let mut unit = Unit::new(UnitId(0), unit_type, Team::Player, Coord::new(0, 0), Difficulty::Medium);
        for amount in grants {
            let (level, max_health, attack, threshold) =
                (unit.level, unit.max_health, unit.attack_power, unit.xp_to_next_level);
            let leveled = unit.gain_xp(amount);
            prop_assert!(unit.level >= level);
            prop_assert_eq!(leveled, unit.level > level);
            prop_assert!(unit.max_health >= max_health);
            prop_assert!(unit.attack_power >= attack);
            if leveled {
                prop_assert!(unit.xp_to_next_level > threshold);
            } else {
                prop_assert_eq!(unit.xp_to_next_level, threshold);
            }
            prop_assert!(unit.xp < unit.xp_to_next_level);
        }
    }

    /// Each step costs half a point on roads and one point elsewhere, and
    /// movement points never go negative.
    #[test]
    fn prop_move_cost_bounds(
        grid in arb_grid(12, 12),
        path in arb_path(12),
    ) {
        let mut unit = Unit::new(UnitId(0), UnitType::Scout, Team::Player, Coord::new(6, 6), Difficulty::Medium);
        for (dx, dy) in path {
            let dest = unit.position.offset(dx, dy);
            let Some(terrain) = grid.get(dest) else {
                continue;
            };
            let before = unit.moves_remaining;
            if !unit.step(dx, dy, terrain) {
                prop_assert_eq!(before, Fixed::ZERO);
                continue;
            }
            let spent = before - unit.moves_remaining;
            prop_assert!(unit.moves_remaining >= Fixed::ZERO);
            prop_assert!(unit.moves_remaining <= moves(unit.max_moves));
            if terrain == TileType::Road {
                prop_assert!(spent <= ROAD_MOVE_COST);
            } else {
                prop_assert!(spent <= STEP_MOVE_COST);
            }
            prop_assert!(spent > Fixed::ZERO);
        }
    }

    /// A 2x2 unit collides with anything under any of its four cells.
    #[test]
    fn prop_multitile_collision_covers_footprint(
        anchor in arb_coord(FIELD_SIZE - 1, FIELD_SIZE - 1),
        other in arb_coord(FIELD_SIZE, FIELD_SIZE),
    ) {
        let mut state = open_field();
        let brute = spawn_super_zombie(&mut state, anchor.x, anchor.y);
        prop_assume!(!anchor.footprint_contains(2, other));
        let blocker = spawn_player(&mut state, UnitType::Survivor, other.x, other.y);

        for dy in -2..=2 {
            for dx in -2..=2 {
                let candidate = anchor.offset(dx, dy);
                let hit = state.check_collision_for_multitile_unit(brute, candidate, 2);
                let overlaps = candidate.footprint_contains(2, other);
                prop_assert_eq!(hit == Some(Occupant::Unit(blocker)), overlaps);
            }
        }
    }

    /// Player moves are clamped to one step whatever deltas are passed in.
    #[test]
    fn prop_move_is_single_step(
        (dx, dy) in arb_step(),
        scale in 1i32..10,
    ) {
        let mut state = open_field();
        let scout = spawn_player(&mut state, UnitType::Scout, 15, 15);
        let outcome = state.move_unit(scout, dx * scale, dy * scale).unwrap();
        prop_assert_eq!(
            outcome,
            MoveOutcome::Moved { from: Coord::new(15, 15), to: Coord::new(15 + dx, 15 + dy) }
        );
    }
}

//! Property tests over random formations and command streams.

use proptest::prelude::*;
use siege_core::combat::calculate_damage;
use siege_core::economy::gather_rate;
use siege_core::math::from_tenths;
use siege_core::prelude::*;
use siege_test_utils::determinism::strategies::{arb_command_sequence, arb_formation};

fn assert_health_bounds(game: &Match) {
    for unit in game.units() {
        assert!(unit.health.current <= unit.health.max, "{}", unit.id);
        assert!(unit.is_alive(), "dead unit {} left on the roster", unit.id);
    }
    for installation in game.installations().iter() {
        assert!(installation.health.current <= installation.health.max);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_damage_is_at_least_one(attack in 1i64..5_000, defense in 0i64..5_000) {
        let damage = calculate_damage(from_tenths(attack), from_tenths(defense));
        prop_assert!(damage >= 1);
    }

    #[test]
    fn prop_gather_rate_is_monotonic(m in 1u32..500) {
        prop_assert!(gather_rate(m + 1) >= gather_rate(m));
    }

    #[test]
    fn prop_state_invariants_hold(
        north in arb_formation(),
        south in arb_formation(),
        commands in arb_command_sequence(120),
    ) {
        let mut game = Match::new(&north, &south).unwrap();
        let thresholds = game.config().spawn_thresholds.len();
        let mut last_turn = game.turn();
        let mut last_totals = (0, 0);

        for command in &commands {
            command.apply(&mut game);

            assert_health_bounds(&game);
            prop_assert!(game.turn() >= last_turn);
            prop_assert_ne!(game.phase(), Phase::Simulating);

            let north_pool = game.pool(Faction::North);
            let south_pool = game.pool(Faction::South);
            prop_assert!(north_pool.total >= last_totals.0);
            prop_assert!(south_pool.total >= last_totals.1);
            prop_assert!(north_pool.spawned <= thresholds);
            prop_assert!(south_pool.spawned <= thresholds);

            last_turn = game.turn();
            last_totals = (north_pool.total, south_pool.total);
        }
    }

    #[test]
    fn prop_blocked_advance_changes_nothing(commands in arb_command_sequence(80)) {
        let mut game = Match::new(&Formation::standard(), &Formation::standard()).unwrap();
        for command in &commands {
            command.apply(&mut game);
            if game.phase().blocks_advance() {
                let before = game.state_hash();
                prop_assert!(game.advance_turn().is_empty());
                prop_assert_eq!(game.state_hash(), before);
            }
        }
    }

    #[test]
    fn prop_decided_match_stays_decided(commands in arb_command_sequence(150)) {
        let mut game = Match::new(&Formation::standard(), &Formation::standard()).unwrap();
        let mut decided: Option<Outcome> = None;
        for command in &commands {
            command.apply(&mut game);
            if let Some(outcome) = decided {
                prop_assert_eq!(game.outcome(), outcome);
                prop_assert_eq!(game.phase(), Phase::MatchOver);
            } else if game.outcome().is_decided() {
                decided = Some(game.outcome());
            }
        }
    }
}

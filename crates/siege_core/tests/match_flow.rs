//! End-to-end match scenarios driven through the public controller API.

use siege_core::prelude::*;
use siege_test_utils::fixtures::{
    autopilot_step, placement, run_to_completion, skirmish_match, standard_match, unit_id,
};

// =============================================================================
// Setup
// =============================================================================

mod setup {
    use super::*;

    #[test]
    fn test_placement_overrides_default_position() {
        let infantry = unit_id(Faction::North, Archetype::Infantry, 1);
        let north = Formation {
            placements: vec![placement(infantry, 2, 10)],
            ..Formation::standard()
        };
        let game = Match::new(&north, &Formation::standard()).unwrap();
        assert_eq!(
            game.unit(infantry).unwrap().position,
            Some(GridPos::new(2, 10))
        );
    }

    #[test]
    fn test_placement_in_enemy_zone_is_rejected() {
        let infantry = unit_id(Faction::North, Archetype::Infantry, 1);
        let north = Formation {
            placements: vec![placement(infantry, 2, 20)],
            ..Formation::standard()
        };
        let err = Match::new(&north, &Formation::standard()).unwrap_err();
        match err {
            GameError::FormationRejected { faction, messages } => {
                assert_eq!(faction, Faction::North);
                assert_eq!(messages.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_supply_stays_off_board() {
        let game = standard_match();
        let supply = game
            .unit(unit_id(Faction::South, Archetype::Supply, 1))
            .unwrap();
        assert_eq!(supply.position, None);
    }

    #[test]
    fn test_config_from_ron() {
        let config =
            MatchConfig::from_ron_str("(max_turns: 40, target_setting_interval: 4)")
                .unwrap();
        let game =
            Match::with_config(config, &Formation::standard(), &Formation::standard()).unwrap();
        assert_eq!(game.config().max_turns, 40);
        assert_eq!(game.config().spawn_thresholds, vec![500, 800, 1000, 1200]);
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let config = MatchConfig {
            spawn_thresholds: vec![800, 500],
            ..MatchConfig::default()
        };
        assert!(matches!(
            Match::with_config(config, &Formation::standard(), &Formation::standard()),
            Err(GameError::InvalidConfig(_))
        ));
    }
}

// =============================================================================
// Battle
// =============================================================================

mod battle {
    use super::*;

    #[test]
    fn test_armies_meet_and_fight() {
        let mut game = skirmish_match();
        let mut damage_seen = false;
        for _ in 0..5 {
            let events = game.advance_turn();
            damage_seen |= !events.damage.is_empty();
        }
        assert!(damage_seen, "armies marched to the center but never fought");
    }

    #[test]
    fn test_every_damage_event_deals_at_least_one() {
        let mut game = skirmish_match();
        for _ in 0..4 {
            for event in game.advance_turn().damage {
                assert!(event.damage >= 1, "{event:?}");
            }
        }
    }

    #[test]
    fn test_destroyed_units_leave_roster_and_log() {
        let mut game = skirmish_match();
        let mut destroyed = Vec::new();
        for _ in 0..30 {
            if game.phase() != Phase::Idle {
                autopilot_step(&mut game);
                continue;
            }
            let events = game.advance_turn();
            destroyed.extend(events.events.iter().filter_map(|e| match e {
                MatchEvent::UnitDestroyed { unit } => Some(*unit),
                _ => None,
            }));
        }
        assert!(!destroyed.is_empty());
        for id in &destroyed {
            assert!(game.unit(*id).is_none(), "{id} still on the roster");
        }
    }

    #[test]
    fn test_full_match_reaches_a_decision() {
        let mut game = skirmish_match();
        run_to_completion(&mut game, 1_000);
        assert_eq!(game.phase(), Phase::MatchOver);
        assert!(game.outcome().is_decided());
        assert!(game.turn() <= game.config().max_turns + 1);

        let last = game.event_log().iter().last().unwrap();
        assert!(
            last.contains("wins") || last.contains("draw"),
            "last message was {last:?}"
        );
    }
}

// =============================================================================
// Turn cap and vehicles
// =============================================================================

mod pacing {
    use super::*;

    #[test]
    fn test_quiet_match_is_drawn_at_turn_cap() {
        let config =
            MatchConfig::from_ron_str("(max_turns: 10, target_setting_interval: 3)")
                .unwrap();
        let mut game =
            Match::with_config(config, &Formation::standard(), &Formation::standard()).unwrap();
        run_to_completion(&mut game, 100);

        assert_eq!(game.outcome(), Outcome::Draw);
        assert_eq!(game.turn(), 11);
        assert!(game
            .event_log()
            .iter()
            .any(|m| m == "Turn limit of 10 reached: draw"));
    }

    #[test]
    fn test_vehicle_follows_its_lane() {
        let mut game = standard_match();
        let vehicle = unit_id(Faction::North, Archetype::Vehicle, 1);
        let mut steps = 0;
        while game.unit(vehicle).is_none() {
            assert!(autopilot_step(&mut game));
            steps += 1;
            assert!(steps < 100, "no vehicle deployed");
        }

        let unit = game.unit(vehicle).unwrap();
        assert_eq!(unit.position, Some(GridPos::new(3, 6)));
        assert_eq!(unit.route_state().unwrap().route, RouteId::Left);
        assert_eq!(game.phase(), Phase::Idle);

        let events = game.advance_turn();
        assert!(events.moves.iter().any(|m| m.unit == vehicle
            && m.from == GridPos::new(3, 6)
            && m.to == GridPos::new(3, 7)));
        assert!(game
            .set_unit_target(vehicle, GridPos::new(0, 0))
            .is_err());
    }

    #[test]
    fn test_route_selection_blocks_turns() {
        let mut game = standard_match();
        while game.phase() != Phase::RouteSelecting {
            assert!(autopilot_step(&mut game));
        }
        let turn = game.turn();
        let hash = game.state_hash();
        assert!(game.advance_turn().is_empty());
        assert!(game.complete_target_setting().is_err());
        assert_eq!(game.turn(), turn);
        assert_eq!(game.state_hash(), hash);
        assert_eq!(game.pending_factions().len(), 2);
    }
}

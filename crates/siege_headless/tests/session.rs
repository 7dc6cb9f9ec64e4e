//! Scripted sessions checked against matches driven directly.

use serde_json::Value;
use siege_headless::{HeadlessConfig, HeadlessRunner, Scenario};
use siege_test_utils::fixtures::{autopilot_route, standard_match};
use siege_core::prelude::*;

fn run_script(script: &str) -> Vec<Value> {
    let mut runner = HeadlessRunner::from_scenario(
        &Scenario::standard(),
        HeadlessConfig::default(),
        script.as_bytes(),
        Vec::new(),
    )
    .unwrap();
    runner.run().unwrap();
    String::from_utf8(runner.into_output())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn last_hash(lines: &[Value]) -> u64 {
    lines
        .iter()
        .rev()
        .find(|v| v["type"] == "state_hash")
        .and_then(|v| v["hash"].as_u64())
        .unwrap()
}

#[test]
fn test_session_matches_direct_play() {
    let script = r#"
        {"cmd":"set_target","unit":"north_infantry_2","x":9,"y":12}
        {"cmd":"set_target","unit":"south_raider_1","x":11,"y":16}
        {"cmd":"complete_targets"}
        {"cmd":"advance","count":4}
        {"cmd":"hash"}
    "#;
    let lines = run_script(script);

    let mut game = standard_match();
    game.set_unit_target(
        UnitId::new(Faction::North, Archetype::Infantry, 2),
        GridPos::new(9, 12),
    )
    .unwrap();
    game.set_unit_target(
        UnitId::new(Faction::South, Archetype::Raider, 1),
        GridPos::new(11, 16),
    )
    .unwrap();
    game.complete_target_setting().unwrap();
    for _ in 0..4 {
        game.advance_turn();
    }

    assert_eq!(last_hash(&lines), game.state_hash());
}

#[test]
fn test_session_through_vehicle_deployment() {
    let mut script = String::from("{\"cmd\":\"complete_targets\"}\n");
    for _ in 0..4 {
        script.push_str("{\"cmd\":\"advance\",\"count\":5}\n{\"cmd\":\"complete_targets\"}\n");
    }
    for faction in ["north", "south"] {
        script.push_str(&format!(
            "{{\"cmd\":\"confirm_route\",\"faction\":\"{faction}\",\"route\":{}}}\n",
            autopilot_route(0).number()
        ));
    }
    script.push_str("{\"cmd\":\"advance\",\"count\":3}\n{\"cmd\":\"hash\"}\n");
    let lines = run_script(&script);

    let mut game = standard_match();
    game.complete_target_setting().unwrap();
    while game.phase() != Phase::RouteSelecting {
        if game.phase() == Phase::TargetSetting {
            game.complete_target_setting().unwrap();
        } else {
            game.advance_turn();
        }
    }
    for faction in Faction::ALL {
        game.confirm_route(faction, autopilot_route(0)).unwrap();
    }
    for _ in 0..3 {
        game.advance_turn();
    }

    assert_eq!(last_hash(&lines), game.state_hash());
}

//! Test fixtures and helpers.
//!
//! Pre-built matches, formations and units for consistent testing.

use fixed::types::I32F32;
use siege_core::components::{Archetype, Unit, UnitId};
use siege_core::factions::Faction;
use siege_core::formation::{Formation, Placement};
use siege_core::math::GridPos;
use siege_core::routes::RouteId;
use siege_core::simulation::{Match, Phase};
use siege_core::stats::{base_range, derive_stats};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Shorthand for a unit identity.
#[must_use]
pub const fn unit_id(faction: Faction, archetype: Archetype, ordinal: u16) -> UnitId {
    UnitId::new(faction, archetype, ordinal)
}

/// A standalone unit with stats derived from `headcount`, standing at `at`.
#[must_use]
pub fn unit_at(id: UnitId, headcount: u32, at: GridPos) -> Unit {
    Unit::new(
        id,
        Some(at),
        derive_stats(id.archetype, headcount),
        headcount,
        base_range(id.archetype),
    )
}

/// A deployment override.
#[must_use]
pub const fn placement(unit: UnitId, x: i32, y: i32) -> Placement {
    Placement {
        unit,
        position: GridPos::new(x, y),
    }
}

/// The smallest legal formation: a lone battalion.
#[must_use]
pub fn battalion_only(headcount: u32) -> Formation {
    Formation {
        battalion: headcount,
        ..Formation::default()
    }
}

/// Standard formations on both sides, waiting in target setting on turn 1.
///
/// # Panics
///
/// Panics if the standard formation stops being valid.
#[must_use]
pub fn standard_match() -> Match {
    Match::new(&Formation::standard(), &Formation::standard())
        .expect("standard formation is valid")
}

/// Standard match with every maneuverable unit ordered to the center line,
/// target setting closed. Armies meet within a few turns.
///
/// # Panics
///
/// Panics if the standard formation stops being valid.
#[must_use]
pub fn skirmish_match() -> Match {
    let mut game = standard_match();
    let orders: Vec<(UnitId, GridPos)> = game
        .units()
        .filter(|u| u.archetype().is_maneuverable())
        .filter_map(|u| {
            let pos = u.position?;
            let row = match u.faction() {
                Faction::North => 14,
                Faction::South => 15,
            };
            Some((u.id, GridPos::new(pos.x, row)))
        })
        .collect();
    for (unit, target) in orders {
        game.set_unit_target(unit, target)
            .expect("target setting is open on turn 1");
    }
    game.complete_target_setting()
        .expect("target setting is open on turn 1");
    game
}

/// Route chosen for a faction's `n`th vehicle by [`autopilot_step`].
#[must_use]
pub const fn autopilot_route(vehicle_index: usize) -> RouteId {
    RouteId::ALL[vehicle_index % RouteId::ALL.len()]
}

/// Drive the match one step without player input.
///
/// Closes target setting with no new orders, deploys waiting vehicles on
/// rotating routes, and otherwise advances a turn. Returns `false` once the
/// match is over.
///
/// # Panics
///
/// Panics if the controller rejects a request its phase allows.
pub fn autopilot_step(game: &mut Match) -> bool {
    match game.phase() {
        Phase::TargetSetting => {
            game.complete_target_setting()
                .expect("target setting is open");
        }
        Phase::RouteSelecting => {
            for faction in game.pending_factions() {
                let index = game.pending_spawn(faction).unwrap_or_default();
                game.confirm_route(faction, autopilot_route(index))
                    .expect("vehicle is pending");
            }
        }
        Phase::Idle | Phase::Simulating => {
            game.advance_turn();
        }
        Phase::MatchOver => return false,
    }
    true
}

/// Drive the match with [`autopilot_step`] until it ends or `max_steps`
/// steps have been taken. Returns the number of steps taken.
pub fn run_to_completion(game: &mut Match, max_steps: u32) -> u32 {
    let mut steps = 0;
    while steps < max_steps && autopilot_step(game) {
        steps += 1;
    }
    tracing::debug!(steps, turn = game.turn(), outcome = %game.outcome(), "Autopilot stopped");
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::events::Outcome;

    #[test]
    fn test_skirmish_match_is_idle_on_turn_two() {
        let game = skirmish_match();
        assert_eq!(game.turn(), 2);
        assert_eq!(game.phase(), Phase::Idle);
        let infantry = game
            .unit(unit_id(Faction::North, Archetype::Infantry, 1))
            .unwrap();
        assert_eq!(infantry.target(), Some(GridPos::new(5, 14)));
    }

    #[test]
    fn test_autopilot_finishes_match() {
        let mut game = skirmish_match();
        run_to_completion(&mut game, 1_000);
        assert_eq!(game.phase(), Phase::MatchOver);
        assert_ne!(game.outcome(), Outcome::Undecided);
        assert!(game.turn() <= game.config().max_turns + 1);
    }

    #[test]
    fn test_autopilot_routes_rotate() {
        assert_eq!(autopilot_route(0), RouteId::Left);
        assert_eq!(autopilot_route(1), RouteId::Center);
        assert_eq!(autopilot_route(3), RouteId::Left);
    }

    #[test]
    fn test_unit_at_derives_stats() {
        let unit = unit_at(
            unit_id(Faction::South, Archetype::Raider, 1),
            3,
            GridPos::new(2, 20),
        );
        assert_eq!(unit.health.max, 250);
        assert_eq!(unit.range, 1);
    }
}

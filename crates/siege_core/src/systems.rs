//! Movement and cleanup systems.
//!
//! All systems are pure functions over the turn's working roster. They
//! iterate units in identity order so identical inputs give identical
//! results.

use serde::{Deserialize, Serialize};

use crate::components::{Mobility, Roster, Unit, UnitId};
use crate::grid::Grid;
use crate::math::GridPos;

/// A unit changed cells this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMoved {
    /// Unit that moved.
    pub unit: UnitId,
    /// Cell at the start of the turn.
    pub from: GridPos,
    /// Cell at the end of movement.
    pub to: GridPos,
}

/// Walk a maneuverable unit toward its target.
///
/// Takes up to `speed` single-cell steps, each along the axis with the
/// larger remaining delta (ties go to x). Terrain and other units do not
/// block. The target is cleared once reached.
pub fn step_toward_target(unit: &mut Unit, grid: &Grid) {
    let Some(mut position) = unit.position else {
        return;
    };
    let speed = unit.speed;
    let Mobility::Maneuverable { target } = &mut unit.mobility else {
        return;
    };
    let Some(goal) = *target else {
        return;
    };
    let goal = grid.clamp(goal);

    for _ in 0..speed {
        if position == goal {
            break;
        }
        position = grid.clamp(position.step_toward(goal));
    }

    if position == goal {
        *target = None;
    }
    unit.position = Some(position);
}

/// Move a route-bound unit one waypoint along its lane.
///
/// Does nothing once the final waypoint is reached; with the halt flag set
/// that is the waypoint before the target installation.
pub fn advance_route(unit: &mut Unit) {
    let Mobility::RouteBound(state) = &mut unit.mobility else {
        return;
    };
    if state.is_finished() {
        return;
    }
    state.progress += 1;
    if let Some(next) = state.waypoints.get(state.progress) {
        unit.position = Some(*next);
    }
}

/// Run movement for every living, deployed unit.
///
/// Route-bound units only advance when `turn` is a multiple of
/// `vehicle_advance_interval`.
///
/// # Returns
/// One record per unit whose cell changed, in identity order.
pub fn movement_system(
    units: &mut Roster,
    grid: &Grid,
    turn: u32,
    vehicle_advance_interval: u32,
) -> Vec<UnitMoved> {
    let vehicles_move = vehicle_advance_interval > 0 && turn % vehicle_advance_interval == 0;
    let mut moves = Vec::new();

    for unit in units.values_mut() {
        if !unit.is_deployed() {
            continue;
        }
        let Some(from) = unit.position else {
            continue;
        };
        match unit.mobility {
            Mobility::Maneuverable { .. } => step_toward_target(unit, grid),
            Mobility::RouteBound(_) if vehicles_move => advance_route(unit),
            Mobility::RouteBound(_) | Mobility::Stationary => {}
        }
        if let Some(to) = unit.position {
            if to != from {
                moves.push(UnitMoved {
                    unit: unit.id,
                    from,
                    to,
                });
            }
        }
    }

    moves
}

/// Scans the roster and returns the ids of units with no health left.
pub fn health_system(units: &Roster) -> Vec<UnitId> {
    units
        .values()
        .filter(|unit| unit.health.is_dead())
        .map(|unit| unit.id)
        .collect()
}

/// Remove every dead unit from the roster, returning their ids.
pub fn remove_dead(units: &mut Roster) -> Vec<UnitId> {
    let dead = health_system(units);
    for id in &dead {
        units.remove(id);
    }
    dead
}

//! Vehicle lanes.
//!
//! Each faction has three lanes, one per secondary-installation column. A
//! lane starts just past the faction's front line and runs straight down
//! (or up) the column to the opposing outpost's anchor cell.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::RouteState;
use crate::error::GameError;
use crate::factions::Faction;
use crate::installations::{standard_anchor, InstallationId, SECONDARY_COLUMNS};
use crate::math::GridPos;

/// Lane selector offered to the player when a vehicle is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RouteId {
    /// Western lane.
    Left = 1,
    /// Centre lane.
    Center = 2,
    /// Eastern lane.
    Right = 3,
}

impl RouteId {
    /// Every route in selector order.
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    /// Selector number (1..=3).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Ordinal of the secondary installation guarding this lane.
    #[must_use]
    pub const fn outpost_ordinal(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RouteId {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Left),
            2 => Ok(Self::Center),
            3 => Ok(Self::Right),
            other => Err(GameError::InvalidRoute(other)),
        }
    }
}

impl From<RouteId> for u8 {
    fn from(route: RouteId) -> Self {
        route.number()
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route {}", self.number())
    }
}

/// Row a vehicle of `faction` enters its lane on.
const fn entry_row(faction: Faction, board_height: i32) -> i32 {
    match faction {
        Faction::North => 6,
        Faction::South => board_height - 7,
    }
}

/// Opposing outpost at the end of `route` for vehicles of `faction`.
#[must_use]
pub fn target_installation(faction: Faction, route: RouteId) -> InstallationId {
    InstallationId::secondary(faction.opponent(), route.outpost_ordinal())
}

/// Waypoints of `route` for vehicles of `faction`, ending on the target
/// installation's anchor.
#[must_use]
pub fn waypoints(faction: Faction, route: RouteId, board_height: i32) -> Vec<GridPos> {
    let column = SECONDARY_COLUMNS[usize::from(route.number() - 1)];
    let target = standard_anchor(target_installation(faction, route), board_height);
    let start = entry_row(faction, board_height);
    if start <= target.y {
        (start..=target.y).map(|y| GridPos::new(column, y)).collect()
    } else {
        (target.y..=start).rev().map(|y| GridPos::new(column, y)).collect()
    }
}

/// Fresh lane state for a vehicle entering `route`.
#[must_use]
pub fn route_state(
    faction: Faction,
    route: RouteId,
    board_height: i32,
    halt_before_installation: bool,
) -> RouteState {
    RouteState {
        route,
        waypoints: waypoints(faction, route, board_height),
        progress: 0,
        halt_before_installation,
        target_installation: target_installation(faction, route),
    }
}

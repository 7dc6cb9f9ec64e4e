//! Unit records and their building blocks.
//!
//! Units are plain data. Behaviour lives in the subsystems
//! ([`crate::systems`], [`crate::combat`], [`crate::support`],
//! [`crate::economy`]) which the turn controller runs in order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GameError;
use crate::factions::Faction;
use crate::installations::InstallationId;
use crate::math::{fixed_serde, Fixed, GridPos};
use crate::routes::RouteId;
use crate::stats::UnitStats;

// ============================================================================
// Identity
// ============================================================================

/// Unit archetypes.
///
/// Declaration order is the stable tie-break order used wherever units of
/// one faction are compared by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Line troops.
    Infantry,
    /// The single large formation that absorbs any unassigned headcount.
    Battalion,
    /// Fast, fragile strike squad.
    Raider,
    /// Medics. Heal instead of attacking.
    Support,
    /// Off-board gatherers feeding the resource pool.
    Supply,
    /// Route-bound heavy vehicle bought with resources.
    Vehicle,
}

impl Archetype {
    /// Every archetype in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Infantry,
        Self::Battalion,
        Self::Raider,
        Self::Support,
        Self::Supply,
        Self::Vehicle,
    ];

    /// Lower-case tag used in identifiers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Infantry => "infantry",
            Self::Battalion => "battalion",
            Self::Raider => "raider",
            Self::Support => "support",
            Self::Supply => "supply",
            Self::Vehicle => "vehicle",
        }
    }

    /// Parse a tag produced by [`Archetype::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Whether a surviving unit of this archetype keeps its faction in the
    /// fight. Supply and vehicles do not.
    #[must_use]
    pub const fn is_combat_capable(self) -> bool {
        matches!(
            self,
            Self::Infantry | Self::Battalion | Self::Raider | Self::Support
        )
    }

    /// Whether players direct this archetype to target cells.
    #[must_use]
    pub const fn is_maneuverable(self) -> bool {
        matches!(
            self,
            Self::Infantry | Self::Battalion | Self::Raider | Self::Support
        )
    }

    /// What the unit does with its attack value.
    #[must_use]
    pub const fn action_mode(self) -> ActionMode {
        match self {
            Self::Support => ActionMode::Heal,
            _ => ActionMode::Attack,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable unit identity, rendered as `north_infantry_2`.
///
/// Ordinals start at 1 per faction and archetype in declaration order, so an
/// identity is known before the unit is materialized. Ordering is
/// `(faction, archetype, ordinal)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    /// Owning faction.
    pub faction: Faction,
    /// Archetype.
    pub archetype: Archetype,
    /// 1-based ordinal.
    pub ordinal: u16,
}

impl UnitId {
    /// Create a unit identity.
    #[must_use]
    pub const fn new(faction: Faction, archetype: Archetype, ordinal: u16) -> Self {
        Self {
            faction,
            archetype,
            ordinal,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.faction.short_name(),
            self.archetype.name(),
            self.ordinal
        )
    }
}

impl FromStr for UnitId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidUnitId(s.to_string());
        let mut parts = s.split('_');
        let faction = parts
            .next()
            .and_then(Faction::from_short_name)
            .ok_or_else(invalid)?;
        let archetype = parts
            .next()
            .and_then(Archetype::from_name)
            .ok_or_else(invalid)?;
        let ordinal = parts
            .next()
            .and_then(|n| n.parse::<u16>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(faction, archetype, ordinal))
    }
}

impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// State
// ============================================================================

/// Health for damageable units and installations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Missing health points.
    #[must_use]
    pub const fn deficit(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.deficit());
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            u32::try_from(u64::from(self.current) * 100 / u64::from(self.max)).unwrap_or(100)
        }
    }
}

/// What a unit does with its attack value each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Restore health to friendlies.
    Heal,
    /// Damage enemies.
    Attack,
}

/// Progress of a vehicle along its lane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteState {
    /// Lane the vehicle was deployed on.
    pub route: RouteId,
    /// Ordered cells of the lane, ending on the target installation.
    pub waypoints: Vec<GridPos>,
    /// Index of the waypoint the vehicle currently occupies.
    pub progress: usize,
    /// Stop one waypoint short of the target installation.
    pub halt_before_installation: bool,
    /// Installation at the end of the lane.
    pub target_installation: InstallationId,
}

impl RouteState {
    /// Index of the last waypoint this vehicle may occupy.
    #[must_use]
    pub fn final_index(&self) -> usize {
        let last = self.waypoints.len().saturating_sub(1);
        if self.halt_before_installation {
            last.saturating_sub(1)
        } else {
            last
        }
    }

    /// Whether the vehicle has reached its final waypoint.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress >= self.final_index()
    }
}

/// How a unit moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mobility {
    /// Walks toward a player-chosen cell.
    Maneuverable {
        /// Cell to walk to; cleared on arrival.
        target: Option<GridPos>,
    },
    /// Follows a fixed lane one waypoint per eligible turn.
    RouteBound(RouteState),
    /// Never moves.
    Stationary,
}

/// A unit on (or off) the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identity.
    pub id: UnitId,
    /// Cell occupied; `None` for off-board units.
    pub position: Option<GridPos>,
    /// Attack value. Heal amount for support units.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,
    /// Damage reduction.
    #[serde(with = "fixed_serde")]
    pub defense: Fixed,
    /// Hit points.
    pub health: Health,
    /// Chebyshev engagement range in cells.
    pub range: u32,
    /// Maximum single-cell steps per turn.
    pub speed: u32,
    /// Squad members the unit was derived from.
    pub headcount: u32,
    /// Heal or attack.
    pub mode: ActionMode,
    /// Resources gathered over the match (supply only).
    pub collected_supplies: u32,
    /// Movement behaviour.
    pub mobility: Mobility,
}

impl Unit {
    /// Materialize a unit at full health.
    ///
    /// Mobility follows the archetype: maneuverable archetypes start with no
    /// target, everything else is stationary until given a route.
    #[must_use]
    pub fn new(
        id: UnitId,
        position: Option<GridPos>,
        stats: UnitStats,
        headcount: u32,
        range: u32,
    ) -> Self {
        let mobility = if id.archetype.is_maneuverable() {
            Mobility::Maneuverable { target: None }
        } else {
            Mobility::Stationary
        };
        Self {
            id,
            position,
            attack: stats.attack,
            defense: stats.defense,
            health: Health::new(stats.hp),
            range,
            speed: stats.speed,
            headcount,
            mode: id.archetype.action_mode(),
            collected_supplies: 0,
            mobility,
        }
    }

    /// Owning faction.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.id.faction
    }

    /// Archetype.
    #[must_use]
    pub const fn archetype(&self) -> Archetype {
        self.id.archetype
    }

    /// Whether health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Alive and standing on the board.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.is_alive() && self.position.is_some()
    }

    /// Current walk target, if maneuverable.
    #[must_use]
    pub fn target(&self) -> Option<GridPos> {
        match &self.mobility {
            Mobility::Maneuverable { target } => *target,
            _ => None,
        }
    }

    /// Lane progress, if route-bound.
    #[must_use]
    pub fn route_state(&self) -> Option<&RouteState> {
        match &self.mobility {
            Mobility::RouteBound(state) => Some(state),
            _ => None,
        }
    }
}

/// Units of both factions keyed (and therefore iterated) in identity order.
pub type Roster = BTreeMap<UnitId, Unit>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::derive_stats;

    #[test]
    fn test_health_damage_saturates() {
        let mut health = Health::new(100);
        assert_eq!(health.apply_damage(30), 30);
        assert_eq!(health.current, 70);
        assert_eq!(health.apply_damage(500), 70);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_heal_clamps() {
        let mut health = Health::new(100);
        health.apply_damage(10);
        assert_eq!(health.deficit(), 10);
        assert_eq!(health.heal(25), 10);
        assert!(health.is_full());
        assert_eq!(health.percentage(), 100);
    }

    #[test]
    fn test_unit_id_display_and_parse() {
        let id = UnitId::new(Faction::North, Archetype::Infantry, 2);
        assert_eq!(id.to_string(), "north_infantry_2");
        assert_eq!("north_infantry_2".parse::<UnitId>().unwrap(), id);
        assert_eq!(
            "south_vehicle_4".parse::<UnitId>().unwrap(),
            UnitId::new(Faction::South, Archetype::Vehicle, 4)
        );
    }

    #[test]
    fn test_unit_id_rejects_garbage() {
        for raw in [
            "",
            "north",
            "north_infantry",
            "north_infantry_0",
            "east_raider_1",
            "north_raider_1_x",
        ] {
            assert!(raw.parse::<UnitId>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_unit_id_ordering() {
        let a = UnitId::new(Faction::North, Archetype::Infantry, 3);
        let b = UnitId::new(Faction::North, Archetype::Battalion, 1);
        let c = UnitId::new(Faction::South, Archetype::Infantry, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_unit_mobility_follows_archetype() {
        let stats = derive_stats(Archetype::Raider, 3);
        let raider = Unit::new(
            UnitId::new(Faction::South, Archetype::Raider, 1),
            Some(GridPos::new(4, 24)),
            stats,
            3,
            1,
        );
        assert_eq!(raider.mobility, Mobility::Maneuverable { target: None });
        assert_eq!(raider.mode, ActionMode::Attack);

        let supply = Unit::new(
            UnitId::new(Faction::South, Archetype::Supply, 1),
            None,
            derive_stats(Archetype::Supply, 10),
            10,
            0,
        );
        assert_eq!(supply.mobility, Mobility::Stationary);
        assert!(supply.is_alive());
        assert!(!supply.is_deployed());

        let medic = Unit::new(
            UnitId::new(Faction::North, Archetype::Support, 1),
            Some(GridPos::new(10, 4)),
            derive_stats(Archetype::Support, 5),
            5,
            1,
        );
        assert_eq!(medic.mode, ActionMode::Heal);
    }
}

//! The turn controller.
//!
//! [`Match`] owns every piece of battle state and is the only thing that
//! changes it. Each simulated turn runs the subsystems in a fixed order on a
//! working copy of the battlefield and commits the result at the end.
//!
//! # Determinism
//!
//! - No floating-point math (stats are fixed-point built from tenths)
//! - No randomness
//! - Units and installations iterate in identity order
//! - Same formations and commands always produce the same state hash
//!
//! # Example
//!
//! ```
//! use siege_core::prelude::*;
//!
//! let mut game = Match::new(&Formation::standard(), &Formation::standard()).unwrap();
//! assert_eq!(game.phase(), Phase::TargetSetting);
//!
//! let infantry = UnitId::new(Faction::North, Archetype::Infantry, 1);
//! game.set_unit_target(infantry, GridPos::new(5, 12)).unwrap();
//! game.complete_target_setting().unwrap();
//!
//! let events = game.advance_turn();
//! assert_eq!(events.turn, 2);
//! assert_eq!(game.turn(), 3);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat::{apply_damage, resolve_combat, DamageEvent};
use crate::components::{Archetype, Mobility, Roster, Unit, UnitId};
use crate::config::MatchConfig;
use crate::economy::{economy_system, EconomyEvent, ResourcePool};
use crate::error::{GameError, Result};
use crate::events::{DecisionReason, EventLog, MatchEvent, Outcome};
use crate::factions::{Faction, PerFaction};
use crate::formation::{generate_units, Formation};
use crate::grid::Grid;
use crate::installations::{Installation, InstallationRegistry};
use crate::math::GridPos;
use crate::routes::{self, RouteId};
use crate::stats::{base_range, derive_stats};
use crate::support::{support_system, HealEvent};
use crate::systems::{movement_system, UnitMoved};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ready to simulate the next turn.
    Idle,
    /// Waiting for target orders; turns do not advance.
    TargetSetting,
    /// A turn is being simulated.
    Simulating,
    /// Waiting for a route choice for a ready vehicle.
    RouteSelecting,
    /// The match is decided. Nothing changes any more.
    MatchOver,
}

impl Phase {
    /// Whether [`Match::advance_turn`] is a no-op in this phase.
    #[must_use]
    pub const fn blocks_advance(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Everything the subsystems read and write during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battlefield {
    /// Living units of both factions.
    pub units: Roster,
    /// All installations, destroyed ones included.
    pub installations: InstallationRegistry,
    /// Resource pools.
    pub pools: PerFaction<ResourcePool>,
}

impl Battlefield {
    /// Living combat-capable units of `faction`.
    #[must_use]
    pub fn combat_capable(&self, faction: Faction) -> usize {
        self.units
            .values()
            .filter(|u| u.faction() == faction && u.is_alive() && u.archetype().is_combat_capable())
            .count()
    }
}

/// Events generated during a single turn.
///
/// These events can be used by the presentation layer to animate the turn.
/// A blocked [`Match::advance_turn`] returns the empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnEvents {
    /// Turn that was simulated; zero when nothing ran.
    pub turn: u32,
    /// Units that changed cells.
    pub moves: Vec<UnitMoved>,
    /// Damage dealt in combat.
    pub damage: Vec<DamageEvent>,
    /// Healing done by supports.
    pub heals: Vec<HealEvent>,
    /// Resource gathering and vehicle readiness.
    pub economy: Vec<EconomyEvent>,
    /// Destructions, readiness signals and the match decision.
    pub events: Vec<MatchEvent>,
}

impl TurnEvents {
    /// Whether the turn produced nothing (or did not run).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turn == 0
    }

    /// Human-readable messages for [`TurnEvents::events`].
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

/// Decide the match from a battlefield, if any terminal condition holds.
///
/// Conditions are checked in priority order: a destroyed primary, then a
/// faction without combat-capable units, then the turn cap (higher primary
/// health wins). In each case both sides failing at once is a draw.
#[must_use]
pub fn evaluate_outcome(
    battlefield: &Battlefield,
    completed_turn: u32,
    max_turns: u32,
) -> Option<(Outcome, DecisionReason)> {
    let decide = |north_lost: bool, south_lost: bool| match (north_lost, south_lost) {
        (true, true) => Some(Outcome::Draw),
        (true, false) => Some(Outcome::victory_for(Faction::South)),
        (false, true) => Some(Outcome::victory_for(Faction::North)),
        (false, false) => None,
    };

    let installations = &battlefield.installations;
    if let Some(outcome) = decide(
        installations.primary_destroyed(Faction::North),
        installations.primary_destroyed(Faction::South),
    ) {
        return Some((outcome, DecisionReason::PrimaryDestroyed));
    }

    if let Some(outcome) = decide(
        battlefield.combat_capable(Faction::North) == 0,
        battlefield.combat_capable(Faction::South) == 0,
    ) {
        return Some((outcome, DecisionReason::Annihilation));
    }

    if completed_turn >= max_turns {
        let north = installations.primary_hp(Faction::North);
        let south = installations.primary_hp(Faction::South);
        let outcome = match north.cmp(&south) {
            std::cmp::Ordering::Greater => Outcome::victory_for(Faction::North),
            std::cmp::Ordering::Less => Outcome::victory_for(Faction::South),
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        return Some((outcome, DecisionReason::TurnLimit { max_turns }));
    }

    None
}

/// A match between North and South.
///
/// # Turn Order
///
/// Each simulated turn runs, on a working copy of the battlefield:
/// 1. **Movement** - units walk toward targets, vehicles advance along lanes
/// 2. **Combat** - targets chosen and damage computed from a snapshot, then applied
/// 3. **Support** - supports heal the most damaged friendly in range
/// 4. **Supply** - resources accrue and vehicle thresholds are checked
/// 5. **Terminal check** - primary destroyed, annihilation, turn cap
///
/// The copy is then committed and the turn counter advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    config: MatchConfig,
    grid: Grid,
    turn: u32,
    phase: Phase,
    battlefield: Battlefield,
    outcome: Outcome,
    event_log: EventLog,
}

impl Match {
    /// Start a match with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::FormationRejected`] if either formation breaks a
    /// composition rule.
    pub fn new(north: &Formation, south: &Formation) -> Result<Self> {
        Self::with_config(MatchConfig::default(), north, south)
    }

    /// Start a match with an explicit configuration.
    ///
    /// Validates both formations, materializes both rosters on the standard
    /// grid, resets the pools and opens target setting on turn 1.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for an unusable configuration
    /// and [`GameError::FormationRejected`] for a broken formation (North is
    /// checked first).
    pub fn with_config(config: MatchConfig, north: &Formation, south: &Formation) -> Result<Self> {
        config.validate()?;
        let grid = Grid::standard();

        let mut units = Roster::new();
        for (faction, formation) in [(Faction::North, north), (Faction::South, south)] {
            for unit in generate_units(faction, formation, &grid, &config.limits)? {
                units.insert(unit.id, unit);
            }
        }

        let installations =
            InstallationRegistry::standard(grid.height(), &config.primary, &config.secondary);
        let event_log = EventLog::new(config.event_log_capacity);

        let mut game = Self {
            config,
            grid,
            turn: 1,
            phase: Phase::Idle,
            battlefield: Battlefield {
                units,
                installations,
                pools: PerFaction::default(),
            },
            outcome: Outcome::Undecided,
            event_log,
        };
        game.settle();

        tracing::info!(
            units = game.battlefield.units.len(),
            max_turns = game.config.max_turns,
            "Match started"
        );
        Ok(game)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Order a maneuverable unit to walk to `target`.
    ///
    /// # Errors
    ///
    /// Rejected outside target setting, for cells off the board, for
    /// unknown units and for units that do not take target orders. A
    /// rejected order changes nothing.
    pub fn set_unit_target(&mut self, unit: UnitId, target: GridPos) -> Result<()> {
        self.require_phase(Phase::TargetSetting, "set a target")?;
        if !self.grid.in_bounds(target) {
            return Err(self.reject(GameError::OutOfBounds(target)));
        }
        let Some(entry) = self.battlefield.units.get_mut(&unit) else {
            return Err(self.reject(GameError::UnknownUnit(unit)));
        };
        let Mobility::Maneuverable { target: slot } = &mut entry.mobility else {
            return Err(self.reject(GameError::NotManeuverable(unit)));
        };
        *slot = Some(target);
        tracing::debug!(unit = %unit, target = %target, "Target set");
        Ok(())
    }

    /// Close target setting.
    ///
    /// Target setting occupies its turn: the counter advances and the turn
    /// cap is checked as if a turn had been simulated.
    ///
    /// # Errors
    ///
    /// Rejected outside target setting.
    pub fn complete_target_setting(&mut self) -> Result<()> {
        self.require_phase(Phase::TargetSetting, "complete target setting")?;
        let completed = self.turn;
        if let Some((outcome, reason)) =
            evaluate_outcome(&self.battlefield, completed, self.config.max_turns)
        {
            self.decide(outcome, reason);
        }
        self.turn += 1;
        self.settle();
        tracing::debug!(turn = self.turn, phase = ?self.phase, "Target setting complete");
        Ok(())
    }

    /// Simulate one turn.
    ///
    /// Does nothing and returns empty events unless the match is idle.
    pub fn advance_turn(&mut self) -> TurnEvents {
        if self.phase.blocks_advance() {
            tracing::debug!(turn = self.turn, phase = ?self.phase, "Advance ignored");
            return TurnEvents::default();
        }
        self.phase = Phase::Simulating;

        let turn = self.turn;
        let mut field = self.battlefield.clone();
        let mut events = TurnEvents {
            turn,
            ..TurnEvents::default()
        };

        // 1. Movement
        events.moves = movement_system(
            &mut field.units,
            &self.grid,
            turn,
            self.config.vehicle_advance_interval,
        );

        // 2. Combat: resolve against the snapshot, then apply
        events.damage = resolve_combat(&field.units, &field.installations);
        let combat = apply_damage(&mut field.units, &mut field.installations, &events.damage);
        events.events.extend(
            combat
                .destroyed_units
                .into_iter()
                .map(|unit| MatchEvent::UnitDestroyed { unit }),
        );
        events.events.extend(
            combat
                .destroyed_installations
                .into_iter()
                .map(|installation| MatchEvent::InstallationDestroyed { installation }),
        );

        // 3. Support
        events.heals = support_system(&mut field.units, &mut field.installations);

        // 4. Supply and spawn readiness
        events.economy = economy_system(
            &mut field.units,
            &mut field.pools,
            &self.config.spawn_thresholds,
        );
        events.events.extend(events.economy.iter().filter_map(|e| match *e {
            EconomyEvent::VehicleReady {
                faction,
                vehicle_index,
            } => Some(MatchEvent::VehicleReady {
                faction,
                vehicle_index,
            }),
            EconomyEvent::ResourcesGathered { .. } => None,
        }));

        enforce_invariants(&mut field);

        // 5. Terminal check, then commit
        let decision = evaluate_outcome(&field, turn, self.config.max_turns);
        self.battlefield = field;
        for event in &events.events {
            self.event_log.push(event.to_string());
        }
        if let Some((outcome, reason)) = decision {
            events.events.push(self.decide(outcome, reason));
        }

        self.turn += 1;
        self.settle();

        tracing::debug!(
            turn,
            moves = events.moves.len(),
            attacks = events.damage.len(),
            heals = events.heals.len(),
            phase = ?self.phase,
            "Turn simulated"
        );

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(turn, state_hash = hash, "Match state hash");
        }

        events
    }

    /// Deploy `faction`'s waiting vehicle on `route`.
    ///
    /// The vehicle appears on the lane's first waypoint and follows it from
    /// the next eligible turn.
    ///
    /// # Errors
    ///
    /// Rejected outside route selection, and for a faction with no vehicle
    /// waiting.
    pub fn confirm_route(&mut self, faction: Faction, route: RouteId) -> Result<UnitId> {
        self.require_phase(Phase::RouteSelecting, "confirm a route")?;
        let height = self.grid.height();
        let halt = self.config.halt_before_installation;

        let pool = self.battlefield.pools.get_mut(faction);
        let Some(vehicle_index) = pool.confirm_spawn() else {
            return Err(self.reject(GameError::NoPendingSpawn(faction)));
        };

        let id = UnitId::new(
            faction,
            Archetype::Vehicle,
            u16::try_from(vehicle_index + 1).unwrap_or(u16::MAX),
        );
        let state = routes::route_state(faction, route, height, halt);
        let mut vehicle = Unit::new(
            id,
            state.waypoints.first().copied(),
            derive_stats(Archetype::Vehicle, 1),
            1,
            base_range(Archetype::Vehicle),
        );
        vehicle.mobility = Mobility::RouteBound(state);
        self.battlefield.units.insert(id, vehicle);

        let event = MatchEvent::VehicleDeployed { unit: id, route };
        tracing::info!(unit = %id, route = route.number(), "Vehicle deployed");
        self.event_log.push(event.to_string());
        self.settle();
        Ok(id)
    }

    fn require_phase(&self, expected: Phase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.reject(GameError::InvalidTransition {
                action,
                phase: self.phase,
            }))
        }
    }

    fn reject(&self, error: GameError) -> GameError {
        tracing::debug!(turn = self.turn, phase = ?self.phase, %error, "Request rejected");
        error
    }

    /// Record a decision and return its event. The first decision sticks.
    fn decide(&mut self, outcome: Outcome, reason: DecisionReason) -> MatchEvent {
        let event = MatchEvent::MatchDecided { outcome, reason };
        if !self.outcome.is_decided() {
            self.outcome = outcome;
            self.event_log.push(event.to_string());
            tracing::info!(turn = self.turn, %outcome, ?reason, "Match decided");
        }
        event
    }

    /// Pick the phase implied by the current state.
    fn settle(&mut self) {
        self.phase = if self.outcome.is_decided() {
            Phase::MatchOver
        } else if self.battlefield.pools.iter().any(|(_, p)| p.pending.is_some()) {
            Phase::RouteSelecting
        } else if self.config.is_target_setting_turn(self.turn) {
            Phase::TargetSetting
        } else {
            Phase::Idle
        };
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    /// Current turn counter (starts at 1).
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Match outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Living units in identity order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.battlefield.units.values()
    }

    /// Look up a living unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.battlefield.units.get(&id)
    }

    /// All installations.
    #[must_use]
    pub const fn installations(&self) -> &InstallationRegistry {
        &self.battlefield.installations
    }

    /// Look up an installation.
    #[must_use]
    pub fn installation(&self, id: crate::installations::InstallationId) -> Option<&Installation> {
        self.battlefield.installations.get(id)
    }

    /// `faction`'s resource pool.
    #[must_use]
    pub fn pool(&self, faction: Faction) -> &ResourcePool {
        self.battlefield.pools.get(faction)
    }

    /// Index of `faction`'s vehicle awaiting a route.
    #[must_use]
    pub fn pending_spawn(&self, faction: Faction) -> Option<usize> {
        self.pool(faction).pending
    }

    /// Factions with a vehicle awaiting a route.
    #[must_use]
    pub fn pending_factions(&self) -> Vec<Faction> {
        Faction::ALL
            .into_iter()
            .filter(|f| self.pending_spawn(*f).is_some())
            .collect()
    }

    /// Most recent event messages, oldest first.
    #[must_use]
    pub const fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// The battlefield.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// The board.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Compute a hash of the match state for desync detection and
    /// determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.turn.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.battlefield.hash(&mut hasher);
        self.event_log.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the match to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize match: {e}")))
    }

    /// Restore a match from bytes produced by [`Match::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize match: {e}")))
    }
}

/// Clamp any health above its maximum back into range.
fn enforce_invariants(field: &mut Battlefield) {
    for unit in field.units.values_mut() {
        if unit.health.current > unit.health.max {
            tracing::warn!(
                unit = %unit.id,
                current = unit.health.current,
                max = unit.health.max,
                "Health above maximum clamped"
            );
            unit.health.current = unit.health.max;
        }
    }
    for installation in field.installations.iter_mut() {
        if installation.health.current > installation.health.max {
            tracing::warn!(installation = %installation.id, "Health above maximum clamped");
            installation.health.current = installation.health.max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installations::InstallationId;

    fn standard_match() -> Match {
        Match::new(&Formation::standard(), &Formation::standard()).unwrap()
    }

    fn infantry(faction: Faction, n: u16) -> UnitId {
        UnitId::new(faction, Archetype::Infantry, n)
    }

    #[test]
    fn test_new_match_opens_target_setting() {
        let game = standard_match();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.phase(), Phase::TargetSetting);
        assert_eq!(game.outcome(), Outcome::Undecided);
        assert_eq!(game.units().count(), 14);
        assert_eq!(game.installations().len(), 8);
        assert_eq!(game.pool(Faction::North), &ResourcePool::default());
        assert!(game.event_log().is_empty());
    }

    #[test]
    fn test_rejected_formation() {
        let bad = Formation {
            support: vec![5, 5],
            ..Formation::standard()
        };
        let err = Match::new(&Formation::standard(), &bad).unwrap_err();
        assert!(matches!(
            err,
            GameError::FormationRejected {
                faction: Faction::South,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_formation_rejected() {
        let huge = Formation {
            raider: vec![200_000_000],
            ..Formation::standard()
        };
        let err = Match::new(&huge, &Formation::standard()).unwrap_err();
        assert!(matches!(
            err,
            GameError::FormationRejected {
                faction: Faction::North,
                ..
            }
        ));
    }

    #[test]
    fn test_set_target_guards() {
        let mut game = standard_match();
        let before = game.state_hash();

        assert_eq!(
            game.set_unit_target(infantry(Faction::North, 1), GridPos::new(16, 0)),
            Err(GameError::OutOfBounds(GridPos::new(16, 0)))
        );
        assert_eq!(
            game.set_unit_target(infantry(Faction::North, 9), GridPos::new(1, 1)),
            Err(GameError::UnknownUnit(infantry(Faction::North, 9)))
        );
        let supply = UnitId::new(Faction::North, Archetype::Supply, 1);
        assert_eq!(
            game.set_unit_target(supply, GridPos::new(1, 1)),
            Err(GameError::NotManeuverable(supply))
        );
        assert_eq!(game.state_hash(), before);

        game.set_unit_target(infantry(Faction::North, 1), GridPos::new(5, 9))
            .unwrap();
        assert_eq!(
            game.unit(infantry(Faction::North, 1)).unwrap().target(),
            Some(GridPos::new(5, 9))
        );
    }

    #[test]
    fn test_advance_blocked_during_target_setting() {
        let mut game = standard_match();
        let before = game.state_hash();
        let events = game.advance_turn();
        assert!(events.is_empty());
        assert_eq!(game.state_hash(), before);
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn test_target_setting_consumes_turn() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        assert_eq!(game.turn(), 2);
        assert_eq!(game.phase(), Phase::Idle);
        assert!(matches!(
            game.complete_target_setting(),
            Err(GameError::InvalidTransition { .. })
        ));
        assert!(matches!(
            game.set_unit_target(infantry(Faction::North, 1), GridPos::new(5, 9)),
            Err(GameError::InvalidTransition {
                phase: Phase::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_target_setting_reopens_every_sixth_turn() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        for expected in 2..=6 {
            let events = game.advance_turn();
            assert_eq!(events.turn, expected);
        }
        assert_eq!(game.turn(), 7);
        assert_eq!(game.phase(), Phase::TargetSetting);
    }

    #[test]
    fn test_units_walk_to_targets() {
        let mut game = standard_match();
        let id = infantry(Faction::North, 1);
        game.set_unit_target(id, GridPos::new(5, 11)).unwrap();
        game.complete_target_setting().unwrap();

        let events = game.advance_turn();
        assert!(events.moves.iter().any(|m| m.unit == id
            && m.from == GridPos::new(5, 5)
            && m.to == GridPos::new(5, 9)));
        game.advance_turn();
        let unit = game.unit(id).unwrap();
        assert_eq!(unit.position, Some(GridPos::new(5, 11)));
        assert_eq!(unit.target(), None);
    }

    #[test]
    fn test_supply_accrues_and_blocks_for_route() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        // supply headcount 10 gathers 27 per turn; 19 turns reach 500
        let mut turns = 0;
        while game.phase() != Phase::RouteSelecting {
            if game.phase() == Phase::TargetSetting {
                game.complete_target_setting().unwrap();
                continue;
            }
            game.advance_turn();
            turns += 1;
            assert!(turns < 40, "vehicle never became ready");
        }
        assert_eq!(turns, 19);
        assert_eq!(game.pending_factions(), vec![Faction::North, Faction::South]);
        assert!(game.pool(Faction::North).total >= 500);

        let before = game.state_hash();
        assert!(game.advance_turn().is_empty());
        assert_eq!(game.state_hash(), before);

        let vehicle = game.confirm_route(Faction::North, RouteId::Left).unwrap();
        assert_eq!(vehicle, UnitId::new(Faction::North, Archetype::Vehicle, 1));
        assert_eq!(game.unit(vehicle).unwrap().position, Some(GridPos::new(3, 6)));
        assert_eq!(game.phase(), Phase::RouteSelecting);
        assert_eq!(
            game.confirm_route(Faction::North, RouteId::Left),
            Err(GameError::NoPendingSpawn(Faction::North))
        );

        game.confirm_route(Faction::South, RouteId::Right).unwrap();
        assert_ne!(game.phase(), Phase::RouteSelecting);
        assert_eq!(game.pool(Faction::South).spawned, 1);
    }

    #[test]
    fn test_confirm_route_rejected_without_pending() {
        let mut game = standard_match();
        assert!(matches!(
            game.confirm_route(Faction::North, RouteId::Center),
            Err(GameError::InvalidTransition {
                phase: Phase::TargetSetting,
                ..
            })
        ));
    }

    #[test]
    fn test_primary_destroyed_ends_match() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        game.battlefield
            .installations
            .get_mut(InstallationId::primary(Faction::South))
            .unwrap()
            .health
            .current = 0;

        let events = game.advance_turn();
        assert_eq!(game.outcome(), Outcome::NorthWins);
        assert_eq!(game.phase(), Phase::MatchOver);
        assert!(events.events.contains(&MatchEvent::MatchDecided {
            outcome: Outcome::NorthWins,
            reason: DecisionReason::PrimaryDestroyed,
        }));

        let before = game.state_hash();
        assert!(game.advance_turn().is_empty());
        assert_eq!(game.state_hash(), before);
    }

    #[test]
    fn test_annihilation_ends_match() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        game.battlefield
            .units
            .retain(|id, _| id.faction == Faction::North || id.archetype == Archetype::Supply);

        game.advance_turn();
        assert_eq!(game.outcome(), Outcome::NorthWins);
        assert!(game
            .event_log()
            .iter()
            .any(|m| m == "No combat units remain: North wins"));
    }

    #[test]
    fn test_turn_cap_compares_primaries() {
        let config = MatchConfig {
            max_turns: 4,
            ..MatchConfig::default()
        };
        let mut game =
            Match::with_config(config, &Formation::standard(), &Formation::standard()).unwrap();
        game.battlefield
            .installations
            .get_mut(InstallationId::primary(Faction::North))
            .unwrap()
            .health
            .apply_damage(1);
        game.complete_target_setting().unwrap();
        game.advance_turn();
        game.advance_turn();
        assert_eq!(game.outcome(), Outcome::Undecided);
        game.advance_turn();
        assert_eq!(game.outcome(), Outcome::SouthWins);
        assert_eq!(game.turn(), 5);
        assert!(game
            .event_log()
            .iter()
            .any(|m| m == "Turn limit of 4 reached: South wins"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut game = standard_match();
        game.complete_target_setting().unwrap();
        game.advance_turn();
        let bytes = game.serialize().unwrap();
        let restored = Match::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), game.state_hash());
        assert_eq!(restored.turn(), game.turn());
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = standard_match();
        let b = standard_match();
        assert_eq!(a.state_hash(), b.state_hash());
        a.set_unit_target(infantry(Faction::South, 2), GridPos::new(9, 20))
            .unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }
}

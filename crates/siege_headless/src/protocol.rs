//! JSON protocol for headless match communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controlling script
//! **Output (stdout):** Match updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}`
//! 2. The script sends commands as JSON lines
//! 3. Runner outputs one `turn` per simulated turn (and `state` on `query`)
//! 4. When a vehicle is ready, outputs `route_required` and waits
//! 5. On match end, outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","turn":1,"phase":"target_setting"}
//! -> {"cmd":"set_target","unit":"north_infantry_1","x":5,"y":12}
//! <- {"type":"ack","cmd":"set_target"}
//! -> {"cmd":"complete_targets"}
//! <- {"type":"ack","cmd":"complete_targets"}
//! -> {"cmd":"advance","count":3}
//! <- {"type":"turn","turn":2,...}
//! -> {"cmd":"confirm_route","faction":"north","route":2}
//! <- {"type":"rejected","cmd":"confirm_route","message":"..."}
//! ```

use serde::{Deserialize, Serialize};
use siege_core::components::{Health, Mobility};
use siege_core::economy::ResourcePool;
use siege_core::events::Outcome;
use siege_core::factions::Faction;
use siege_core::formation::FormationReport;
use siege_core::installations::Installation;
use siege_core::math::{to_tenths, GridPos};
use siege_core::prelude::{Match, Phase, TurnEvents, Unit};

/// Protocol version announced in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (script -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Order a maneuverable unit to a cell (target setting only).
    SetTarget {
        /// Unit identifier, e.g. `north_infantry_2`.
        unit: String,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Close target setting.
    CompleteTargets,

    /// Simulate up to N turns (default: 1), stopping early when blocked.
    Advance {
        /// Turns to simulate.
        #[serde(default = "default_advance_count")]
        count: u32,
    },

    /// Deploy a faction's waiting vehicle on a route (1, 2 or 3).
    ConfirmRoute {
        /// Faction deploying.
        faction: Faction,
        /// Route number.
        route: u8,
    },

    /// Re-run formation validation for a faction.
    Validate {
        /// Faction to check.
        faction: Faction,
    },

    /// Query the full match state without changing it.
    Query,

    /// Report the current state hash.
    Hash,

    /// Quit the session.
    Quit,
}

fn default_advance_count() -> u32 {
    1
}

impl Command {
    /// Parse from a JSON line.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed lines or unknown commands.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetTarget { .. } => "set_target",
            Self::CompleteTargets => "complete_targets",
            Self::Advance { .. } => "advance",
            Self::ConfirmRoute { .. } => "confirm_route",
            Self::Validate { .. } => "validate",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (runner -> script)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current turn.
        turn: u32,
        /// Current phase.
        phase: Phase,
    },

    /// Command accepted.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Command understood but refused by the match; nothing changed.
    Rejected {
        /// Command name.
        cmd: String,
        /// Why it was refused.
        message: String,
    },

    /// Line could not be processed.
    Error {
        /// Description.
        message: String,
        /// Command name, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Full match state.
    State(MatchState),

    /// Everything that happened in one simulated turn.
    Turn(TurnEvents),

    /// A vehicle is waiting for `confirm_route`.
    RouteRequired {
        /// Faction owning the vehicle.
        faction: Faction,
        /// 0-based vehicle index.
        vehicle_index: usize,
    },

    /// Formation validation result.
    Report {
        /// Faction checked.
        faction: Faction,
        /// Whether the formation passed.
        valid: bool,
        /// One message per violated rule.
        messages: Vec<String>,
        /// Declared headcount.
        total_headcount: u32,
        /// Squads fielded.
        active_squads: usize,
        /// Summed attack of the normalized roster, in tenths.
        estimated_attack_tenths: i64,
        /// Summed hit points of the normalized roster.
        estimated_hp: u32,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current turn.
        turn: u32,
        /// Hash value.
        hash: u64,
    },

    /// The match has ended.
    GameOver {
        /// Final outcome.
        outcome: Outcome,
        /// Winning faction, absent on a draw.
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<Faction>,
        /// Turn counter at the end.
        turn: u32,
        /// Last log messages.
        log: Vec<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Snapshot of the whole match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchState {
    /// Current turn.
    pub turn: u32,
    /// Current phase.
    pub phase: Phase,
    /// Outcome so far.
    pub outcome: Outcome,
    /// Living units in identity order.
    pub units: Vec<UnitState>,
    /// Installations in identity order.
    pub installations: Vec<InstallationState>,
    /// Resource pools.
    pub pools: Vec<PoolState>,
    /// Recent messages, oldest first.
    pub log: Vec<String>,
    /// State hash.
    pub hash: u64,
}

/// State of a single unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitState {
    /// Identifier.
    pub id: String,
    /// Owning faction.
    pub faction: Faction,
    /// Archetype name.
    pub archetype: &'static str,
    /// Cell, absent for off-board units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPos>,
    /// Health.
    pub health: HealthState,
    /// Attack in tenths.
    pub attack_tenths: i64,
    /// Defense in tenths.
    pub defense_tenths: i64,
    /// Squad members.
    pub headcount: u32,
    /// Current target cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<GridPos>,
    /// Route number for lane-bound units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<u8>,
    /// Resources gathered (supply units).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected: Option<u32>,
}

/// State of an installation.
#[derive(Debug, Clone, Serialize)]
pub struct InstallationState {
    /// Identifier.
    pub id: String,
    /// Owning faction.
    pub faction: Faction,
    /// Anchor cell.
    pub position: GridPos,
    /// Health.
    pub health: HealthState,
    /// Whether it has fallen.
    pub destroyed: bool,
}

/// Health state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthState {
    /// Current hit points.
    pub current: u32,
    /// Maximum hit points.
    pub max: u32,
    /// Current hit points as a whole percentage of the maximum.
    pub percent: u32,
}

impl From<&Health> for HealthState {
    fn from(health: &Health) -> Self {
        Self {
            current: health.current,
            max: health.max,
            percent: health.percentage(),
        }
    }
}

/// A faction's resource pool.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolState {
    /// Owning faction.
    pub faction: Faction,
    /// Resources gathered.
    pub total: u32,
    /// Vehicles deployed.
    pub spawned: usize,
    /// Vehicle waiting for a route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        let route = match &unit.mobility {
            Mobility::RouteBound(state) => Some(state.route.number()),
            Mobility::Maneuverable { .. } | Mobility::Stationary => None,
        };
        Self {
            id: unit.id.to_string(),
            faction: unit.faction(),
            archetype: unit.archetype().name(),
            position: unit.position,
            health: HealthState::from(&unit.health),
            attack_tenths: to_tenths(unit.attack),
            defense_tenths: to_tenths(unit.defense),
            headcount: unit.headcount,
            target: unit.target(),
            route,
            collected: (unit.collected_supplies > 0).then_some(unit.collected_supplies),
        }
    }
}

impl From<&Installation> for InstallationState {
    fn from(installation: &Installation) -> Self {
        Self {
            id: installation.id.to_string(),
            faction: installation.faction(),
            position: installation.anchor,
            health: HealthState::from(&installation.health),
            destroyed: installation.is_destroyed(),
        }
    }
}

impl PoolState {
    fn new(faction: Faction, pool: &ResourcePool) -> Self {
        Self {
            faction,
            total: pool.total,
            spawned: pool.spawned,
            pending: pool.pending,
        }
    }
}

impl MatchState {
    /// Capture the state of `game`.
    #[must_use]
    pub fn capture(game: &Match) -> Self {
        Self {
            turn: game.turn(),
            phase: game.phase(),
            outcome: game.outcome(),
            units: game.units().map(UnitState::from).collect(),
            installations: game.installations().iter().map(InstallationState::from).collect(),
            pools: Faction::ALL
                .into_iter()
                .map(|f| PoolState::new(f, game.pool(f)))
                .collect(),
            log: game.event_log().to_vec(),
            hash: game.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(game: &Match) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            turn: game.turn(),
            phase: game.phase(),
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create a rejection.
    #[must_use]
    pub fn rejected(cmd: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            message: message.into(),
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Create a formation report.
    #[must_use]
    pub fn report(faction: Faction, report: FormationReport) -> Self {
        Self::Report {
            faction,
            valid: report.is_valid(),
            total_headcount: report.summary.total_headcount,
            active_squads: report.summary.active_squads,
            estimated_attack_tenths: to_tenths(report.summary.estimated_attack),
            estimated_hp: report.summary.estimated_hp,
            messages: report.messages,
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

//! Error types for the battle simulation.

use thiserror::Error;

use crate::components::UnitId;
use crate::factions::Faction;
use crate::math::GridPos;
use crate::simulation::Phase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
///
/// None of these leave the match in a modified state; a rejected request can
/// be ignored and the match continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// A faction's formation broke one or more composition rules.
    #[error("{faction} formation rejected: {}", messages.join("; "))]
    FormationRejected {
        /// Faction whose formation was rejected.
        faction: Faction,
        /// One message per violated rule.
        messages: Vec<String>,
    },

    /// The request is not allowed in the current phase.
    #[error("cannot {action} during {phase:?}")]
    InvalidTransition {
        /// Requested action.
        action: &'static str,
        /// Phase the match was in.
        phase: Phase,
    },

    /// No live unit with this identity.
    #[error("unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// Malformed unit identifier string.
    #[error("invalid unit id: {0}")]
    InvalidUnitId(String),

    /// The unit cannot be given a target cell.
    #[error("unit {0} does not take target orders")]
    NotManeuverable(UnitId),

    /// The requested cell is off the board.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(GridPos),

    /// Route confirmation for a faction with no vehicle waiting.
    #[error("{0} has no vehicle awaiting a route")]
    NoPendingSpawn(Faction),

    /// Route number outside 1..=3.
    #[error("invalid route: {0}")]
    InvalidRoute(u8),

    /// Configuration values the controller cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid match state.
    #[error("invalid match state: {0}")]
    InvalidState(String),
}

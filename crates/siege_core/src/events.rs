//! Match events, outcomes and the rolling message log.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::UnitId;
use crate::factions::Faction;
use crate::installations::InstallationId;
use crate::routes::RouteId;

/// Result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Still being played.
    #[default]
    Undecided,
    /// North won.
    NorthWins,
    /// South won.
    SouthWins,
    /// Neither side won.
    Draw,
}

impl Outcome {
    /// Outcome in which `faction` wins.
    #[must_use]
    pub const fn victory_for(faction: Faction) -> Self {
        match faction {
            Faction::North => Self::NorthWins,
            Faction::South => Self::SouthWins,
        }
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }

    /// The winning faction, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Faction> {
        match self {
            Self::NorthWins => Some(Faction::North),
            Self::SouthWins => Some(Faction::South),
            Self::Undecided | Self::Draw => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecided => f.write_str("undecided"),
            Self::NorthWins => f.write_str("North wins"),
            Self::SouthWins => f.write_str("South wins"),
            Self::Draw => f.write_str("draw"),
        }
    }
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// One or both primary installations were destroyed.
    PrimaryDestroyed,
    /// One or both factions ran out of combat-capable units.
    Annihilation,
    /// The turn cap was reached; primary health decided.
    TurnLimit {
        /// The cap in force.
        max_turns: u32,
    },
}

/// Something noteworthy that happened during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A unit was destroyed and removed.
    UnitDestroyed {
        /// The unit.
        unit: UnitId,
    },
    /// An installation reached zero health.
    InstallationDestroyed {
        /// The installation.
        installation: InstallationId,
    },
    /// A vehicle is ready and waits for a route.
    VehicleReady {
        /// Faction owning the vehicle.
        faction: Faction,
        /// 0-based index among the faction's vehicles.
        vehicle_index: usize,
    },
    /// A vehicle entered its lane.
    VehicleDeployed {
        /// The new vehicle.
        unit: UnitId,
        /// Lane chosen.
        route: RouteId,
    },
    /// The match ended.
    MatchDecided {
        /// Final outcome.
        outcome: Outcome,
        /// Deciding condition.
        reason: DecisionReason,
    },
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitDestroyed { unit } => write!(f, "{unit} was destroyed"),
            Self::InstallationDestroyed { installation } => {
                write!(f, "{installation} has fallen")
            }
            Self::VehicleReady {
                faction,
                vehicle_index,
            } => write!(
                f,
                "{faction} vehicle {} is ready; choose a route",
                vehicle_index + 1
            ),
            Self::VehicleDeployed { unit, route } => write!(f, "{unit} deployed on {route}"),
            Self::MatchDecided { outcome, reason } => match reason {
                DecisionReason::PrimaryDestroyed => {
                    write!(f, "Primary installation destroyed: {outcome}")
                }
                DecisionReason::Annihilation => {
                    write!(f, "No combat units remain: {outcome}")
                }
                DecisionReason::TurnLimit { max_turns } => {
                    write!(f, "Turn limit of {max_turns} reached: {outcome}")
                }
            },
        }
    }
}

/// Bounded log of the most recent event messages, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<String>,
}

impl EventLog {
    /// Create an empty log keeping at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, dropping the oldest when full.
    pub fn push(&mut self, message: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    /// Iterate messages oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages as an owned list, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

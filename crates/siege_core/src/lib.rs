//! # Grid Siege Core
//!
//! Deterministic simulation core for Grid Siege, a turn-based battle between
//! North and South on a 16 x 30 grid.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless and scripted matches
//! - Snapshot save and restore
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`components`] - Units, health and mobility
//! - [`stats`] - Headcount-derived unit stats
//! - [`formation`] - Pre-match formation rules and deployment
//! - [`grid`] - The board and its terrain
//! - [`installations`] - Fixed fortifications
//! - [`routes`] - Vehicle lanes
//! - [`systems`] - Movement and cleanup
//! - [`combat`] - Two-pass combat resolution
//! - [`support`] - Healing
//! - [`economy`] - Supply gathering and vehicle readiness
//! - [`simulation`] - The turn controller
//! - [`math`] - Fixed-point math and grid positions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod factions;
pub mod formation;
pub mod grid;
pub mod installations;
pub mod math;
pub mod routes;
pub mod simulation;
pub mod stats;
pub mod support;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{DamageEvent, EntityRef};
    pub use crate::components::{
        ActionMode, Archetype, Health, Mobility, Roster, RouteState, Unit, UnitId,
    };
    pub use crate::config::{FormationLimits, InstallationProfile, MatchConfig};
    pub use crate::economy::{EconomyEvent, ResourcePool};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{DecisionReason, EventLog, MatchEvent, Outcome};
    pub use crate::factions::{Faction, PerFaction};
    pub use crate::formation::{Formation, FormationReport, Placement};
    pub use crate::grid::{Grid, Terrain};
    pub use crate::installations::{Installation, InstallationId, InstallationRegistry};
    pub use crate::math::{Fixed, GridPos};
    pub use crate::routes::RouteId;
    pub use crate::simulation::{Match, Phase, TurnEvents};
    pub use crate::stats::UnitStats;
    pub use crate::support::HealEvent;
    pub use crate::systems::UnitMoved;
}

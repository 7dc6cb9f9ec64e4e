//! Formation validation and unit generation.
//!
//! A formation is the composition a player submits for one faction: squad
//! headcounts per archetype plus optional deployment overrides. Validation
//! collects one message per broken rule and never fails fatally; generation
//! refuses invalid formations and otherwise materializes the roster.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{Archetype, Unit, UnitId};
use crate::config::FormationLimits;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::grid::Grid;
use crate::math::{Fixed, GridPos};
use crate::stats::{base_range, derive_stats};

/// Front-line columns, assigned centre-out in roster order.
pub const FRONT_COLUMNS: [i32; 8] = [7, 5, 9, 3, 11, 1, 13, 15];

/// Columns support squads deploy to, in roster order.
pub const SUPPORT_COLUMNS: [i32; 3] = [10, 4, 12];

/// Row the front line of `faction` deploys on.
#[must_use]
pub const fn front_row(faction: Faction, board_height: i32) -> i32 {
    match faction {
        Faction::North => 5,
        Faction::South => board_height - 6,
    }
}

/// Row support squads of `faction` deploy on, one behind the front line.
#[must_use]
pub const fn support_row(faction: Faction, board_height: i32) -> i32 {
    match faction {
        Faction::North => 4,
        Faction::South => board_height - 5,
    }
}

/// Explicit deployment cell for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Unit to place.
    pub unit: UnitId,
    /// Cell to deploy on.
    pub position: GridPos,
}

/// One faction's submitted composition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Formation {
    /// Battalion headcount.
    pub battalion: u32,
    /// Supply headcount. Zero fields no supply unit.
    pub supply: u32,
    /// Infantry squads, one unit each.
    pub infantry: Vec<u32>,
    /// Raider squads, one unit each.
    pub raider: Vec<u32>,
    /// Support squads, one unit each.
    pub support: Vec<u32>,
    /// Deployment overrides.
    pub placements: Vec<Placement>,
}

impl Formation {
    /// A balanced six-squad formation spending the full budget.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            battalion: 40,
            supply: 10,
            infantry: vec![12, 12, 12],
            raider: vec![8],
            support: vec![6],
            placements: Vec::new(),
        }
    }

    /// Total declared headcount.
    #[must_use]
    pub fn total_headcount(&self) -> u32 {
        let squads = self
            .infantry
            .iter()
            .chain(&self.raider)
            .chain(&self.support)
            .fold(0u32, |acc, n| acc.saturating_add(*n));
        squads
            .saturating_add(self.battalion)
            .saturating_add(self.supply)
    }

    /// Squads fielded on the board: every infantry, raider and support squad
    /// plus the battalion.
    #[must_use]
    pub fn active_squads(&self) -> usize {
        self.infantry.len() + self.raider.len() + self.support.len() + 1
    }

    /// Copy with any shortfall below `budget` absorbed into the battalion.
    #[must_use]
    pub fn normalized(&self, budget: u32) -> Self {
        let shortfall = budget.saturating_sub(self.total_headcount());
        Self {
            battalion: self.battalion.saturating_add(shortfall),
            ..self.clone()
        }
    }

    /// `(id, headcount)` for every unit this formation fields, in roster
    /// order.
    #[must_use]
    pub fn squads(&self, faction: Faction) -> Vec<(UnitId, u32)> {
        let mut squads = vec![(UnitId::new(faction, Archetype::Battalion, 1), self.battalion)];
        for (archetype, list) in [
            (Archetype::Infantry, &self.infantry),
            (Archetype::Raider, &self.raider),
            (Archetype::Support, &self.support),
        ] {
            squads.extend(
                list.iter()
                    .enumerate()
                    .map(|(i, n)| (UnitId::new(faction, archetype, ordinal(i)), *n)),
            );
        }
        if self.supply > 0 {
            squads.push((UnitId::new(faction, Archetype::Supply, 1), self.supply));
        }
        squads
    }
}

fn ordinal(index: usize) -> u16 {
    u16::try_from(index + 1).unwrap_or(u16::MAX)
}

/// Aggregate figures shown next to a formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormationSummary {
    /// Declared headcount before normalization.
    pub total_headcount: u32,
    /// Squads fielded on the board.
    pub active_squads: usize,
    /// Sum of derived attack over the normalized roster.
    #[serde(with = "crate::math::fixed_serde")]
    pub estimated_attack: Fixed,
    /// Sum of derived hit points over the normalized roster.
    pub estimated_hp: u32,
}

/// Result of validating a formation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormationReport {
    /// One human-readable message per violated rule.
    pub messages: Vec<String>,
    /// Aggregate figures.
    pub summary: FormationSummary,
}

impl FormationReport {
    /// Whether the formation broke no rule.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Check a formation against the caps, the budget and the board.
#[must_use]
pub fn validate(
    faction: Faction,
    formation: &Formation,
    grid: &Grid,
    limits: &FormationLimits,
) -> FormationReport {
    let mut messages = Vec::new();

    let total = formation.total_headcount();
    if total > limits.headcount_budget {
        messages.push(format!(
            "total headcount {total} exceeds the budget of {}",
            limits.headcount_budget
        ));
    }

    for (name, count, cap) in [
        ("infantry", formation.infantry.len(), limits.max_infantry),
        ("raider", formation.raider.len(), limits.max_raider),
        ("support", formation.support.len(), limits.max_support),
    ] {
        if count > cap {
            messages.push(format!("at most {cap} {name} squads allowed, got {count}"));
        }
    }

    if formation.battalion == 0 {
        messages.push("battalion needs at least 1 member".to_string());
    }

    let active = formation.active_squads();
    if active > limits.max_active_squads {
        messages.push(format!(
            "at most {} squads may be fielded, got {active}",
            limits.max_active_squads
        ));
    }

    for (name, list) in [
        ("infantry", &formation.infantry),
        ("raider", &formation.raider),
        ("support", &formation.support),
    ] {
        for (i, _) in list.iter().enumerate().filter(|(_, n)| **n == 0) {
            messages.push(format!("{name} squad {} has no members", i + 1));
        }
    }

    check_placements(faction, formation, grid, &mut messages);

    FormationReport {
        messages,
        summary: summarize(faction, formation, limits),
    }
}

fn check_placements(
    faction: Faction,
    formation: &Formation,
    grid: &Grid,
    messages: &mut Vec<String>,
) {
    let declared: BTreeSet<UnitId> = formation
        .squads(faction)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let rows = grid.deployment_rows(faction);
    let mut seen = BTreeSet::new();

    for placement in &formation.placements {
        let unit = placement.unit;
        let pos = placement.position;
        if !seen.insert(unit) {
            messages.push(format!("{unit} is placed more than once"));
            continue;
        }
        if !declared.contains(&unit) {
            messages.push(format!("placement for {unit} names no unit in this formation"));
            continue;
        }
        if unit.archetype == Archetype::Supply {
            messages.push(format!("{unit} operates off-board and cannot be placed"));
            continue;
        }
        if !grid.in_bounds(pos) {
            messages.push(format!("placement for {unit} at {pos} is outside the grid"));
        } else if !grid.is_deployable(pos) {
            messages.push(format!("placement for {unit} at {pos} is not deployable"));
        } else if !rows.contains(&pos.y) {
            messages.push(format!(
                "placement for {unit} at {pos} is outside the {} deployment zone",
                faction.short_name()
            ));
        }
    }
}

fn summarize(
    faction: Faction,
    formation: &Formation,
    limits: &FormationLimits,
) -> FormationSummary {
    let normalized = formation.normalized(limits.headcount_budget);
    let mut estimated_attack = Fixed::ZERO;
    let mut estimated_hp = 0u32;
    for (id, headcount) in normalized.squads(faction) {
        let stats = derive_stats(id.archetype, headcount);
        estimated_attack = estimated_attack.saturating_add(stats.attack);
        estimated_hp = estimated_hp.saturating_add(stats.hp);
    }
    FormationSummary {
        total_headcount: formation.total_headcount(),
        active_squads: formation.active_squads(),
        estimated_attack,
        estimated_hp,
    }
}

/// Default deployment cell of a unit, `None` for off-board archetypes.
///
/// `rank` is the unit's index among the faction's front-line units
/// (battalion first, then infantry, then raiders) or among its supports.
#[must_use]
pub fn default_position(
    faction: Faction,
    archetype: Archetype,
    rank: usize,
    board_height: i32,
) -> Option<GridPos> {
    match archetype {
        Archetype::Supply | Archetype::Vehicle => None,
        Archetype::Support => Some(GridPos::new(
            SUPPORT_COLUMNS[rank % SUPPORT_COLUMNS.len()],
            support_row(faction, board_height),
        )),
        Archetype::Infantry | Archetype::Battalion | Archetype::Raider => Some(GridPos::new(
            FRONT_COLUMNS[rank % FRONT_COLUMNS.len()],
            front_row(faction, board_height),
        )),
    }
}

/// Validate, normalize and materialize a faction's roster.
///
/// Overrides take precedence over default positions. Units come back in
/// roster order (battalion, infantry, raiders, supports, supply).
pub fn generate_units(
    faction: Faction,
    formation: &Formation,
    grid: &Grid,
    limits: &FormationLimits,
) -> Result<Vec<Unit>> {
    let report = validate(faction, formation, grid, limits);
    if !report.is_valid() {
        return Err(GameError::FormationRejected {
            faction,
            messages: report.messages,
        });
    }

    let normalized = formation.normalized(limits.headcount_budget);
    let mut front_rank = 0;
    let mut support_rank = 0;
    let mut units = Vec::new();

    for (id, headcount) in normalized.squads(faction) {
        let rank = match id.archetype {
            Archetype::Support => {
                support_rank += 1;
                support_rank - 1
            }
            _ => {
                front_rank += 1;
                front_rank - 1
            }
        };
        let position = normalized
            .placements
            .iter()
            .find(|p| p.unit == id)
            .map(|p| p.position)
            .or_else(|| default_position(faction, id.archetype, rank, grid.height()));
        units.push(Unit::new(
            id,
            position,
            derive_stats(id.archetype, headcount),
            headcount,
            base_range(id.archetype),
        ));
    }

    tracing::debug!(
        faction = faction.short_name(),
        units = units.len(),
        battalion = normalized.battalion,
        "Formation materialized"
    );
    Ok(units)
}

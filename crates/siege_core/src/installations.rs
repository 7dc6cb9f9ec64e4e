//! Fixed installations: each faction's primary keep and three secondary
//! outposts.
//!
//! Installations never move and are never removed from the registry. One at
//! zero health is destroyed; it stops attacking, can no longer be targeted
//! or healed, and (for a primary) decides the match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::Health;
use crate::config::InstallationProfile;
use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, GridPos};

/// Installation rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationTier {
    /// The keep. Losing it loses the match.
    Primary,
    /// A forward outpost guarding one vehicle lane.
    Secondary,
}

/// Stable installation identity.
///
/// Ordering is `(faction, tier, ordinal)`, which is also the order the
/// registry stores and iterates installations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstallationId {
    /// Owning faction.
    pub faction: Faction,
    /// Rank.
    pub tier: InstallationTier,
    /// 1-based position among installations of the same tier, west to east.
    pub ordinal: u8,
}

impl InstallationId {
    /// The primary installation of `faction`.
    #[must_use]
    pub const fn primary(faction: Faction) -> Self {
        Self {
            faction,
            tier: InstallationTier::Primary,
            ordinal: 1,
        }
    }

    /// The `ordinal`-th secondary installation of `faction`.
    #[must_use]
    pub const fn secondary(faction: Faction, ordinal: u8) -> Self {
        Self {
            faction,
            tier: InstallationTier::Secondary,
            ordinal,
        }
    }
}

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier {
            InstallationTier::Primary => write!(f, "{}_primary", self.faction.short_name()),
            InstallationTier::Secondary => {
                write!(f, "{}_secondary_{}", self.faction.short_name(), self.ordinal)
            }
        }
    }
}

/// Column of each secondary installation, west to east. Vehicle lanes run
/// down the same columns.
pub const SECONDARY_COLUMNS: [i32; 3] = [3, 8, 12];

/// Column of the primary installations.
pub const PRIMARY_COLUMN: i32 = 7;

/// Anchor cell of an installation on the standard board.
///
/// North occupies the top rows; South mirrors it vertically.
#[must_use]
pub fn standard_anchor(id: InstallationId, board_height: i32) -> GridPos {
    let (x, north_y) = match id.tier {
        InstallationTier::Primary => (PRIMARY_COLUMN, 1),
        InstallationTier::Secondary => {
            let index = usize::from(id.ordinal.saturating_sub(1)).min(SECONDARY_COLUMNS.len() - 1);
            (SECONDARY_COLUMNS[index], 3)
        }
    };
    match id.faction {
        Faction::North => GridPos::new(x, north_y),
        Faction::South => GridPos::new(x, board_height - 1 - north_y),
    }
}

/// Every installation identity on the standard board, in registry order.
#[must_use]
pub fn standard_ids() -> Vec<InstallationId> {
    let mut ids = Vec::with_capacity(8);
    for faction in Faction::ALL {
        ids.push(InstallationId::primary(faction));
        for ordinal in 1..=SECONDARY_COLUMNS.len() as u8 {
            ids.push(InstallationId::secondary(faction, ordinal));
        }
    }
    ids
}

/// A fixed installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Installation {
    /// Identity.
    pub id: InstallationId,
    /// Cell the installation stands on.
    pub anchor: GridPos,
    /// Hit points, clamped to `[0, max]`.
    pub health: Health,
    /// Damage reduction applied to incoming attacks.
    #[serde(with = "fixed_serde")]
    pub defense: Fixed,
    /// Damage dealt to the chosen target each turn. Zero disarms.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,
    /// Chebyshev engagement range in cells.
    pub range: u32,
}

impl Installation {
    /// Build an installation at full health from a profile.
    #[must_use]
    pub fn from_profile(
        id: InstallationId,
        anchor: GridPos,
        profile: &InstallationProfile,
    ) -> Self {
        Self {
            id,
            anchor,
            health: Health::new(profile.hp),
            defense: Fixed::from_num(profile.defense),
            attack: Fixed::from_num(profile.attack),
            range: profile.range,
        }
    }

    /// Owning faction.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.id.faction
    }

    /// Whether health has reached zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health.is_dead()
    }
}

/// All installations of a match, ordered by [`InstallationId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InstallationRegistry {
    entries: Vec<Installation>,
}

impl InstallationRegistry {
    /// Build a registry, sorting entries into id order.
    #[must_use]
    pub fn new(mut entries: Vec<Installation>) -> Self {
        entries.sort_by_key(|i| i.id);
        Self { entries }
    }

    /// The standard eight installations at full health.
    #[must_use]
    pub fn standard(
        board_height: i32,
        primary: &InstallationProfile,
        secondary: &InstallationProfile,
    ) -> Self {
        let entries = standard_ids()
            .into_iter()
            .map(|id| {
                let profile = match id.tier {
                    InstallationTier::Primary => primary,
                    InstallationTier::Secondary => secondary,
                };
                Installation::from_profile(id, standard_anchor(id, board_height), profile)
            })
            .collect();
        Self::new(entries)
    }

    /// Look up an installation.
    #[must_use]
    pub fn get(&self, id: InstallationId) -> Option<&Installation> {
        self.entries
            .binary_search_by_key(&id, |i| i.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Look up an installation mutably.
    pub fn get_mut(&mut self, id: InstallationId) -> Option<&mut Installation> {
        match self.entries.binary_search_by_key(&id, |i| i.id) {
            Ok(index) => Some(&mut self.entries[index]),
            Err(_) => None,
        }
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Installation> {
        self.entries.iter()
    }

    /// Iterate mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Installation> {
        self.entries.iter_mut()
    }

    /// Number of installations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current health of `faction`'s primary, zero if it has none.
    #[must_use]
    pub fn primary_hp(&self, faction: Faction) -> u32 {
        self.get(InstallationId::primary(faction))
            .map_or(0, |i| i.health.current)
    }

    /// Whether `faction`'s primary is destroyed (or missing).
    #[must_use]
    pub fn primary_destroyed(&self, faction: Faction) -> bool {
        self.primary_hp(faction) == 0
    }
}

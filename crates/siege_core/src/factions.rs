//! Faction identifiers and per-faction storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Deploys along the top rows and attacks southward.
    North,
    /// Deploys along the bottom rows and attacks northward.
    South,
}

impl Faction {
    /// Both factions in stable order.
    pub const ALL: [Self; 2] = [Self::North, Self::South];

    /// The opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
        }
    }

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::South => "South",
        }
    }

    /// Lower-case tag used in identifiers (`north_infantry_1`).
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
        }
    }

    /// Parse the lower-case tag produced by [`Faction::short_name`].
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One value per faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerFaction<T> {
    /// North's value.
    pub north: T,
    /// South's value.
    pub south: T,
}

impl<T> PerFaction<T> {
    /// Build from explicit values.
    pub const fn new(north: T, south: T) -> Self {
        Self { north, south }
    }

    /// Borrow the value for `faction`.
    pub fn get(&self, faction: Faction) -> &T {
        match faction {
            Faction::North => &self.north,
            Faction::South => &self.south,
        }
    }

    /// Mutably borrow the value for `faction`.
    pub fn get_mut(&mut self, faction: Faction) -> &mut T {
        match faction {
            Faction::North => &mut self.north,
            Faction::South => &mut self.south,
        }
    }

    /// Iterate `(faction, value)` in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Faction, &T)> {
        [(Faction::North, &self.north), (Faction::South, &self.south)].into_iter()
    }
}

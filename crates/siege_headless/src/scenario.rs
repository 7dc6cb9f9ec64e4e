//! Scenario loading and configuration.
//!
//! Scenarios define the starting formations for headless matches, plus an
//! optional match configuration overriding the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use siege_core::config::MatchConfig;
use siege_core::error::GameError;
use siege_core::factions::{Faction, PerFaction};
use siege_core::formation::{validate, Formation, FormationReport};
use siege_core::grid::Grid;
use siege_core::simulation::Match;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The match refused the scenario's configuration or formations.
    #[error("Scenario rejected: {0}")]
    Rejected(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Overrides for the default match configuration.
    #[serde(default)]
    pub config: Option<MatchConfig>,
    /// North's formation.
    pub north: Formation,
    /// South's formation.
    pub south: Formation,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::standard()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Fails for a missing or unreadable file, malformed RON, or an
    /// unusable configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Fails for malformed RON or an unusable configuration.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        if let Some(config) = &scenario.config {
            config.validate()?;
        }
        Ok(scenario)
    }

    /// Both sides field the standard formation under default rules.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "Standard".to_string(),
            description: "Mirror match with the standard formation".to_string(),
            config: None,
            north: Formation::standard(),
            south: Formation::standard(),
        }
    }

    /// Configuration in force for this scenario.
    #[must_use]
    pub fn match_config(&self) -> MatchConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Both formations.
    #[must_use]
    pub fn formations(&self) -> PerFaction<Formation> {
        PerFaction::new(self.north.clone(), self.south.clone())
    }

    /// Validate both formations against the standard board.
    #[must_use]
    pub fn check(&self) -> Vec<(Faction, FormationReport)> {
        let grid = Grid::standard();
        let limits = self.match_config().limits;
        let formations = self.formations();
        Faction::ALL
            .into_iter()
            .map(|faction| (faction, validate(faction, formations.get(faction), &grid, &limits)))
            .collect()
    }

    /// Start a match from this scenario.
    ///
    /// # Errors
    ///
    /// Fails if the match refuses the configuration or either formation.
    pub fn build_match(&self) -> Result<Match, ScenarioError> {
        let game = Match::with_config(self.match_config(), &self.north, &self.south)?;
        tracing::info!(scenario = %self.name, "Scenario loaded");
        Ok(game)
    }
}

//! Match configuration.
//!
//! Every tunable of a match lives in [`MatchConfig`]. The defaults describe
//! the standard ruleset; scenario files may override any field in RON.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Squad caps enforced by formation validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationLimits {
    /// Headcount every formation is normalized to.
    pub headcount_budget: u32,
    /// Maximum infantry squads.
    pub max_infantry: usize,
    /// Maximum raider squads.
    pub max_raider: usize,
    /// Maximum support squads.
    pub max_support: usize,
    /// Maximum squads fielded on the board (battalion included).
    pub max_active_squads: usize,
}

impl Default for FormationLimits {
    fn default() -> Self {
        Self {
            headcount_budget: 100,
            max_infantry: 5,
            max_raider: 2,
            max_support: 1,
            max_active_squads: 6,
        }
    }
}

/// Stat line of an installation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallationProfile {
    /// Maximum hit points.
    pub hp: u32,
    /// Damage reduction.
    pub defense: u32,
    /// Damage dealt per turn. Zero disarms the installation.
    pub attack: u32,
    /// Chebyshev engagement range.
    pub range: u32,
}

/// Tunables of a single match.
///
/// ```
/// use siege_core::config::MatchConfig;
///
/// let config = MatchConfig::from_ron_str("(max_turns: 40)").unwrap();
/// assert_eq!(config.max_turns, 40);
/// assert_eq!(config.spawn_thresholds, vec![500, 800, 1000, 1200]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The last turn that is played. The match is decided once it completes.
    pub max_turns: u32,
    /// Target setting opens on every turn `t` with `t % interval == 1`.
    pub target_setting_interval: u32,
    /// Resource totals unlocking each vehicle, consumed in order.
    pub spawn_thresholds: Vec<u32>,
    /// Squad caps.
    pub limits: FormationLimits,
    /// Primary installation stats.
    pub primary: InstallationProfile,
    /// Secondary installation stats.
    pub secondary: InstallationProfile,
    /// Vehicles advance on turns divisible by this interval.
    pub vehicle_advance_interval: u32,
    /// Vehicles stop one waypoint short of their target installation.
    pub halt_before_installation: bool,
    /// Messages kept in the rolling event log.
    pub event_log_capacity: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_turns: 100,
            target_setting_interval: 6,
            spawn_thresholds: vec![500, 800, 1000, 1200],
            limits: FormationLimits::default(),
            primary: InstallationProfile {
                hp: 10_000,
                defense: 0,
                attack: 50,
                range: 2,
            },
            secondary: InstallationProfile {
                hp: 6_000,
                defense: 0,
                attack: 30,
                range: 1,
            },
            vehicle_advance_interval: 1,
            halt_before_installation: true,
            event_log_capacity: 6,
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from RON. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(source).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the turn controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(GameError::InvalidConfig("max_turns must be positive".into()));
        }
        if self.target_setting_interval < 2 {
            return Err(GameError::InvalidConfig(
                "target_setting_interval must be at least 2".into(),
            ));
        }
        if self.vehicle_advance_interval == 0 {
            return Err(GameError::InvalidConfig(
                "vehicle_advance_interval must be positive".into(),
            ));
        }
        if self.spawn_thresholds.is_empty() {
            return Err(GameError::InvalidConfig(
                "spawn_thresholds must not be empty".into(),
            ));
        }
        if self.spawn_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GameError::InvalidConfig(
                "spawn_thresholds must be strictly increasing".into(),
            ));
        }
        if self.primary.hp == 0 || self.secondary.hp == 0 {
            return Err(GameError::InvalidConfig(
                "installation hp must be positive".into(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(GameError::InvalidConfig(
                "event_log_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Whether target setting opens on `turn`.
    ///
    /// Completing target setting consumes the turn, so an interval below 2
    /// would never let a turn simulate.
    #[must_use]
    pub fn is_target_setting_turn(&self, turn: u32) -> bool {
        self.target_setting_interval > 1 && turn % self.target_setting_interval == 1
    }
}

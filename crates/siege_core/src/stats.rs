//! Unit stat derivation from archetype and squad headcount.
//!
//! Each archetype has a base stat line for a single member plus a linear
//! increment for every member beyond the first. Fractional increments are
//! authored in tenths so the derived values are exact.

use serde::{Deserialize, Serialize};

use crate::components::Archetype;
use crate::math::{fixed_serde, from_tenths, Fixed};

/// Derived combat stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Attack (heal amount for support).
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,
    /// Defense.
    #[serde(with = "fixed_serde")]
    pub defense: Fixed,
    /// Maximum hit points.
    pub hp: u32,
    /// Steps per turn.
    pub speed: u32,
}

impl UnitStats {
    /// All-zero stat line, used for squads with no members.
    pub const ZERO: Self = Self {
        attack: Fixed::ZERO,
        defense: Fixed::ZERO,
        hp: 0,
        speed: 0,
    };
}

/// Per-archetype stat line: base values plus per-extra-member increments.
///
/// Attack and defense are in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatProfile {
    attack: (i64, i64),
    defense: (i64, i64),
    hp: (u32, u32),
    speed: u32,
    scales_with_headcount: bool,
}

const fn profile(archetype: Archetype) -> StatProfile {
    match archetype {
        Archetype::Infantry => StatProfile {
            attack: (800, 10),
            defense: (400, 5),
            hp: (500, 10),
            speed: 4,
            scales_with_headcount: true,
        },
        Archetype::Battalion => StatProfile {
            attack: (600, 8),
            defense: (300, 5),
            hp: (2000, 15),
            speed: 3,
            scales_with_headcount: true,
        },
        Archetype::Raider => StatProfile {
            attack: (1000, 12),
            defense: (200, 5),
            hp: (240, 5),
            speed: 5,
            scales_with_headcount: true,
        },
        Archetype::Support => StatProfile {
            attack: (200, 0),
            defense: (300, 5),
            hp: (600, 10),
            speed: 2,
            scales_with_headcount: true,
        },
        Archetype::Supply => StatProfile {
            attack: (0, 0),
            defense: (100, 3),
            hp: (400, 8),
            speed: 2,
            scales_with_headcount: true,
        },
        Archetype::Vehicle => StatProfile {
            attack: (0, 0),
            defense: (600, 0),
            hp: (1600, 0),
            speed: 1,
            scales_with_headcount: false,
        },
    }
}

/// Derive stats for a squad of `headcount` members.
///
/// ```text
/// stat = base + increment × max(headcount − 1, 0)
/// ```
///
/// A headcount-driven archetype with no members gets [`UnitStats::ZERO`].
/// Vehicles ignore headcount.
#[must_use]
pub fn derive_stats(archetype: Archetype, headcount: u32) -> UnitStats {
    let profile = profile(archetype);
    if profile.scales_with_headcount && headcount == 0 {
        return UnitStats::ZERO;
    }
    let extra = if profile.scales_with_headcount {
        headcount.saturating_sub(1)
    } else {
        0
    };
    let linear = |(base, step): (i64, i64)| from_tenths(base + step * i64::from(extra));
    UnitStats {
        attack: linear(profile.attack),
        defense: linear(profile.defense),
        hp: profile.hp.0.saturating_add(profile.hp.1.saturating_mul(extra)),
        speed: profile.speed,
    }
}

/// Engagement range of an archetype. Supply never stands on the board.
#[must_use]
pub const fn base_range(archetype: Archetype) -> u32 {
    match archetype {
        Archetype::Supply => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::to_tenths;

    #[test]
    fn test_infantry_twenty() {
        let stats = derive_stats(Archetype::Infantry, 20);
        assert_eq!(stats.attack, Fixed::from_num(99));
        assert_eq!(to_tenths(stats.defense), 495);
        assert_eq!(stats.hp, 690);
        assert_eq!(stats.speed, 4);
    }

    #[test]
    fn test_single_member_is_base_line() {
        let stats = derive_stats(Archetype::Battalion, 1);
        assert_eq!(stats.attack, Fixed::from_num(60));
        assert_eq!(stats.defense, Fixed::from_num(30));
        assert_eq!(stats.hp, 2000);
        assert_eq!(stats.speed, 3);
    }

    #[test]
    fn test_fractional_increments_are_exact() {
        let raider = derive_stats(Archetype::Raider, 6);
        assert_eq!(to_tenths(raider.attack), 1_060);
        let supply = derive_stats(Archetype::Supply, 11);
        assert_eq!(to_tenths(supply.defense), 130);
        let battalion = derive_stats(Archetype::Battalion, 51);
        assert_eq!(battalion.attack, Fixed::from_num(100));
        assert_eq!(battalion.hp, 2_750);
    }

    #[test]
    fn test_support_attack_is_flat() {
        assert_eq!(derive_stats(Archetype::Support, 1).attack, Fixed::from_num(20));
        assert_eq!(derive_stats(Archetype::Support, 30).attack, Fixed::from_num(20));
    }

    #[test]
    fn test_vehicle_ignores_headcount() {
        let a = derive_stats(Archetype::Vehicle, 0);
        let b = derive_stats(Archetype::Vehicle, 40);
        assert_eq!(a, b);
        assert_eq!(a.hp, 1600);
        assert_eq!(a.defense, Fixed::from_num(60));
        assert_eq!(a.attack, Fixed::ZERO);
    }

    #[test]
    fn test_empty_squad_has_zero_stats() {
        assert_eq!(derive_stats(Archetype::Infantry, 0), UnitStats::ZERO);
        assert_eq!(derive_stats(Archetype::Supply, 0), UnitStats::ZERO);
    }

    #[test]
    fn test_oversized_squad_saturates() {
        let stats = derive_stats(Archetype::Raider, u32::MAX);
        assert!(stats.attack > Fixed::from_num(1_000_000));
        assert_eq!(stats.hp, u32::MAX);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(base_range(Archetype::Raider), 1);
        assert_eq!(base_range(Archetype::Vehicle), 1);
        assert_eq!(base_range(Archetype::Supply), 0);
    }
}

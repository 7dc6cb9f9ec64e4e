//! Two-pass combat resolution.
//!
//! Every attacker picks a target and computes its damage against the state
//! at the start of combat ([`resolve_combat`]); only then is all damage
//! applied at once ([`apply_damage`]). Attack order therefore never changes
//! the outcome of a turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{ActionMode, Roster, UnitId};
use crate::factions::Faction;
use crate::installations::{InstallationId, InstallationRegistry};
use crate::math::{to_tenths, Fixed, GridPos};
use crate::systems::remove_dead;

/// Minimum damage dealt by any attacker with attack above zero.
pub const MIN_DAMAGE: u32 = 1;

/// A unit or an installation, as an attacker, target or heal recipient.
///
/// Ordering places every unit before every installation, then follows the
/// wrapped identity's order. Target selection uses it as the final
/// tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A unit.
    Unit(UnitId),
    /// An installation.
    Installation(InstallationId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => id.fmt(f),
            Self::Installation(id) => id.fmt(f),
        }
    }
}

/// Damage one attacker deals to one target this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// The entity dealing damage.
    pub attacker: EntityRef,
    /// The entity receiving damage.
    pub target: EntityRef,
    /// Amount of damage dealt.
    pub damage: u32,
}

/// Destructions produced by applying a turn's damage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatResult {
    /// Units that died and were removed from the roster.
    pub destroyed_units: Vec<UnitId>,
    /// Installations that reached zero health this turn.
    pub destroyed_installations: Vec<InstallationId>,
}

/// Calculate damage from attack and defense.
///
/// ```text
/// damage = max(0, floor(attack − defense))
/// damage = max(damage, MIN_DAMAGE)   when attack > 0
/// ```
///
/// Stats carry at most one decimal place, so the subtraction is done on
/// whole tenths.
#[must_use]
pub fn calculate_damage(attack: Fixed, defense: Fixed) -> u32 {
    if attack <= Fixed::ZERO {
        return 0;
    }
    let difference = to_tenths(attack) - to_tenths(defense);
    let whole = difference.div_euclid(10).max(0);
    u32::try_from(whole).unwrap_or(u32::MAX).max(MIN_DAMAGE)
}

/// A potential target as seen at the start of combat.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    entity: EntityRef,
    faction: Faction,
    position: GridPos,
    current_hp: u32,
    defense: Fixed,
}

/// An attacker as seen at the start of combat.
#[derive(Debug, Clone, Copy)]
struct Attacker {
    entity: EntityRef,
    faction: Faction,
    position: GridPos,
    attack: Fixed,
    range: u32,
}

fn snapshot(
    units: &Roster,
    installations: &InstallationRegistry,
) -> (Vec<Attacker>, Vec<Candidate>) {
    let mut attackers = Vec::new();
    let mut candidates = Vec::new();

    for unit in units.values() {
        let Some(position) = unit.position else {
            continue;
        };
        if !unit.is_alive() {
            continue;
        }
        let entity = EntityRef::Unit(unit.id);
        candidates.push(Candidate {
            entity,
            faction: unit.faction(),
            position,
            current_hp: unit.health.current,
            defense: unit.defense,
        });
        if unit.mode == ActionMode::Attack && unit.attack > Fixed::ZERO {
            attackers.push(Attacker {
                entity,
                faction: unit.faction(),
                position,
                attack: unit.attack,
                range: unit.range,
            });
        }
    }

    for installation in installations.iter().filter(|i| !i.is_destroyed()) {
        let entity = EntityRef::Installation(installation.id);
        candidates.push(Candidate {
            entity,
            faction: installation.faction(),
            position: installation.anchor,
            current_hp: installation.health.current,
            defense: installation.defense,
        });
        if installation.attack > Fixed::ZERO {
            attackers.push(Attacker {
                entity,
                faction: installation.faction(),
                position: installation.anchor,
                attack: installation.attack,
                range: installation.range,
            });
        }
    }

    (attackers, candidates)
}

/// Pass one: choose targets and compute damage against the snapshot.
///
/// Each attacker (units in attack mode with attack above zero, standing on
/// the board; armed, intact installations) picks the opposing unit or
/// installation within Chebyshev range with the smallest
/// `(distance, current hp, identity)`.
///
/// # Returns
/// One event per attacker that found a target, in attacker identity order.
#[must_use]
pub fn resolve_combat(units: &Roster, installations: &InstallationRegistry) -> Vec<DamageEvent> {
    let (attackers, candidates) = snapshot(units, installations);
    let mut events = Vec::new();

    for attacker in &attackers {
        let best = candidates
            .iter()
            .filter(|c| c.faction != attacker.faction)
            .map(|c| (c.position.chebyshev(attacker.position), c))
            .filter(|(distance, _)| *distance <= attacker.range)
            .min_by_key(|(distance, c)| (*distance, c.current_hp, c.entity));

        if let Some((_, target)) = best {
            events.push(DamageEvent {
                attacker: attacker.entity,
                target: target.entity,
                damage: calculate_damage(attacker.attack, target.defense),
            });
        }
    }

    events
}

/// Pass two: apply every damage event, remove dead units and report
/// destructions.
///
/// Health saturates at zero. A destruction is reported once, for the turn
/// in which the entity crossed from alive to dead.
pub fn apply_damage(
    units: &mut Roster,
    installations: &mut InstallationRegistry,
    events: &[DamageEvent],
) -> CombatResult {
    let intact_before: Vec<InstallationId> = installations
        .iter()
        .filter(|i| !i.is_destroyed())
        .map(|i| i.id)
        .collect();

    for event in events {
        match event.target {
            EntityRef::Unit(id) => {
                if let Some(unit) = units.get_mut(&id) {
                    unit.health.apply_damage(event.damage);
                }
            }
            EntityRef::Installation(id) => {
                if let Some(installation) = installations.get_mut(id) {
                    installation.health.apply_damage(event.damage);
                }
            }
        }
    }

    let destroyed_installations: Vec<InstallationId> = intact_before
        .into_iter()
        .filter(|id| installations.get(*id).is_some_and(|i| i.is_destroyed()))
        .collect();
    let destroyed_units = remove_dead(units);

    for id in &destroyed_units {
        tracing::info!(unit = %id, "Unit destroyed");
    }
    for id in &destroyed_installations {
        tracing::info!(installation = %id, "Installation destroyed");
    }

    CombatResult {
        destroyed_units,
        destroyed_installations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Archetype, Health, Unit};
    use crate::config::MatchConfig;
    use crate::math::from_tenths;
    use crate::stats::UnitStats;

    fn soldier(
        faction: Faction,
        ordinal: u16,
        at: GridPos,
        attack: u32,
        defense: u32,
        hp: u32,
    ) -> Unit {
        Unit::new(
            UnitId::new(faction, Archetype::Infantry, ordinal),
            Some(at),
            UnitStats {
                attack: Fixed::from_num(attack),
                defense: Fixed::from_num(defense),
                hp,
                speed: 4,
            },
            1,
            1,
        )
    }

    fn roster(units: Vec<Unit>) -> Roster {
        units.into_iter().map(|u| (u.id, u)).collect()
    }

    fn no_installations() -> InstallationRegistry {
        InstallationRegistry::default()
    }

    #[test]
    fn test_damage_saturates_for_extreme_stats() {
        assert!(calculate_damage(Fixed::MAX, Fixed::ZERO) > 2_000_000_000);
        assert_eq!(calculate_damage(Fixed::MAX, Fixed::MAX), MIN_DAMAGE);
        assert_eq!(calculate_damage(from_tenths(15), Fixed::MAX), MIN_DAMAGE);
    }

    #[test]
    fn test_damage_formula() {
        assert_eq!(calculate_damage(Fixed::from_num(80), Fixed::from_num(40)), 40);
        assert_eq!(calculate_damage(from_tenths(995), from_tenths(400)), 59);
        assert_eq!(calculate_damage(Fixed::from_num(20), Fixed::from_num(60)), MIN_DAMAGE);
        assert_eq!(calculate_damage(Fixed::ZERO, Fixed::ZERO), 0);
    }

    #[test]
    fn test_damage_on_fractional_boundary() {
        // 106.0 - 49.5 = 56.5
        assert_eq!(calculate_damage(from_tenths(1_060), from_tenths(495)), 56);
        // 99.2 - 49.2 = 50.0 exactly
        assert_eq!(calculate_damage(from_tenths(992), from_tenths(492)), 50);
    }

    #[test]
    fn test_exchange_is_simultaneous() {
        let mut units = roster(vec![
            soldier(Faction::North, 1, GridPos::new(5, 5), 80, 40, 40),
            soldier(Faction::South, 1, GridPos::new(5, 6), 80, 40, 40),
        ]);
        let mut installations = no_installations();
        let events = resolve_combat(&units, &installations);
        assert_eq!(events.len(), 2);

        let result = apply_damage(&mut units, &mut installations, &events);
        assert_eq!(result.destroyed_units.len(), 2);
        assert!(units.is_empty());
    }

    #[test]
    fn test_target_priority() {
        let attacker = soldier(Faction::North, 1, GridPos::new(5, 5), 80, 40, 500);
        let far = soldier(Faction::South, 1, GridPos::new(7, 5), 80, 40, 10);
        let near_healthy = soldier(Faction::South, 2, GridPos::new(5, 6), 80, 40, 500);
        let mut near_weak = soldier(Faction::South, 3, GridPos::new(4, 5), 80, 40, 500);
        near_weak.health.apply_damage(100);
        let attacker_id = attacker.id;
        let weak_id = near_weak.id;

        let units = roster(vec![attacker, far, near_healthy, near_weak]);
        let events = resolve_combat(&units, &no_installations());
        let chosen = events
            .iter()
            .find(|e| e.attacker == EntityRef::Unit(attacker_id))
            .unwrap();
        // the weakest enemy is out of range; of the adjacent two, lower hp wins
        assert_eq!(chosen.target, EntityRef::Unit(weak_id));
    }

    #[test]
    fn test_ties_break_on_identity() {
        let attacker = soldier(Faction::South, 1, GridPos::new(5, 5), 80, 40, 500);
        let a = soldier(Faction::North, 2, GridPos::new(5, 4), 80, 40, 500);
        let b = soldier(Faction::North, 1, GridPos::new(5, 6), 80, 40, 500);
        let expected = b.id;
        let units = roster(vec![attacker, a, b]);
        let events = resolve_combat(&units, &no_installations());
        let south = EntityRef::Unit(UnitId::new(Faction::South, Archetype::Infantry, 1));
        let chosen = events.iter().find(|e| e.attacker == south).unwrap();
        assert_eq!(chosen.target, EntityRef::Unit(expected));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let units = roster(vec![
            soldier(Faction::North, 1, GridPos::new(0, 0), 80, 40, 500),
            soldier(Faction::South, 1, GridPos::new(2, 0), 80, 40, 500),
        ]);
        assert!(resolve_combat(&units, &no_installations()).is_empty());
    }

    #[test]
    fn test_supports_and_unarmed_do_not_attack() {
        let mut medic = soldier(Faction::North, 1, GridPos::new(5, 5), 20, 30, 600);
        medic.mode = ActionMode::Heal;
        let unarmed = soldier(Faction::North, 2, GridPos::new(6, 5), 0, 60, 1600);
        let enemy = soldier(Faction::South, 1, GridPos::new(5, 6), 0, 40, 500);
        let units = roster(vec![medic, unarmed, enemy]);
        assert!(resolve_combat(&units, &no_installations()).is_empty());
    }

    #[test]
    fn test_installations_fight_and_fall() {
        let config = MatchConfig::default();
        let mut installations =
            InstallationRegistry::standard(30, &config.primary, &config.secondary);
        let outpost = InstallationId::secondary(Faction::South, 1);
        installations.get_mut(outpost).unwrap().health = Health { current: 30, max: 6_000 };

        // raider adjacent to the south-west outpost at (3, 26)
        let raider = soldier(Faction::North, 1, GridPos::new(3, 25), 100, 20, 240);
        let raider_id = raider.id;
        let mut units = roster(vec![raider]);

        let events = resolve_combat(&units, &installations);
        assert!(events.contains(&DamageEvent {
            attacker: EntityRef::Unit(raider_id),
            target: EntityRef::Installation(outpost),
            damage: 100,
        }));
        assert!(events.contains(&DamageEvent {
            attacker: EntityRef::Installation(outpost),
            target: EntityRef::Unit(raider_id),
            damage: 10,
        }));

        let result = apply_damage(&mut units, &mut installations, &events);
        assert_eq!(result.destroyed_installations, vec![outpost]);
        assert!(result.destroyed_units.is_empty());
        assert_eq!(units[&raider_id].health.current, 230);
        assert_eq!(installations.get(outpost).unwrap().health.current, 0);

        // a destroyed installation neither fights nor is reported again
        let events = resolve_combat(&units, &installations);
        assert!(events.is_empty());
        let result = apply_damage(&mut units, &mut installations, &events);
        assert!(result.destroyed_installations.is_empty());
    }
}

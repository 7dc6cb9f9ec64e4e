//! Support healing, run after combat.

use serde::{Deserialize, Serialize};

use crate::combat::EntityRef;
use crate::components::{ActionMode, Roster, UnitId};
use crate::installations::InstallationRegistry;

/// Health restored by one support unit this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealEvent {
    /// Support unit that healed.
    pub healer: UnitId,
    /// Recipient.
    pub target: EntityRef,
    /// Hit points actually restored.
    pub amount: u32,
}

/// Heal the most damaged friendly within range of each support unit.
///
/// Supports act one at a time in identity order, so a later support sees
/// earlier heals. Each picks the friendly unit (itself included) or intact
/// installation within Chebyshev range with the largest missing health,
/// breaking ties by distance and then identity, and restores
/// `floor(attack)` clamped to the recipient's maximum. A support with
/// nothing to heal does nothing.
pub fn support_system(
    units: &mut Roster,
    installations: &mut InstallationRegistry,
) -> Vec<HealEvent> {
    let healers: Vec<UnitId> = units
        .values()
        .filter(|u| u.mode == ActionMode::Heal && u.is_deployed())
        .map(|u| u.id)
        .collect();
    let mut events = Vec::new();

    for healer_id in healers {
        let Some(healer) = units.get(&healer_id) else {
            continue;
        };
        let Some(origin) = healer.position else {
            continue;
        };
        let faction = healer.faction();
        let range = healer.range;
        let amount = healer.attack.floor().to_num::<i64>().max(0);
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);

        let unit_candidates = units
            .values()
            .filter(|u| u.faction() == faction && u.is_alive())
            .filter_map(|u| {
                u.position
                    .map(|p| (u.health.deficit(), p.chebyshev(origin), EntityRef::Unit(u.id)))
            });
        let installation_candidates = installations
            .iter()
            .filter(|i| i.faction() == faction && !i.is_destroyed())
            .map(|i| {
                (
                    i.health.deficit(),
                    i.anchor.chebyshev(origin),
                    EntityRef::Installation(i.id),
                )
            });

        let best = unit_candidates
            .chain(installation_candidates)
            .filter(|(deficit, distance, _)| *deficit > 0 && *distance <= range)
            .min_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let Some((_, _, target)) = best else {
            continue;
        };

        let restored = match target {
            EntityRef::Unit(id) => units.get_mut(&id).map_or(0, |u| u.health.heal(amount)),
            EntityRef::Installation(id) => installations
                .get_mut(id)
                .map_or(0, |i| i.health.heal(amount)),
        };

        tracing::debug!(healer = %healer_id, target = %target, amount = restored, "Support heal");
        events.push(HealEvent {
            healer: healer_id,
            target,
            amount: restored,
        });
    }

    events
}

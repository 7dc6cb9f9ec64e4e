//! Supply gathering and threshold-gated vehicle readiness.
//!
//! Supply units work off-board and add to their faction's pool every turn.
//! Each time the pool reaches the next spawn threshold a vehicle becomes
//! ready; the match then waits for the player to pick its route.

use serde::{Deserialize, Serialize};

use crate::components::{Archetype, Roster, UnitId};
use crate::factions::{Faction, PerFaction};

/// Resources one supply unit gathers per turn.
///
/// ```text
/// m ≤ 6   → 20 + (m − 1)
/// m ≤ 25  → floor(25 + (m − 5) × 0.5)
/// m > 25  → floor(35 + (m − 25) × 0.3)
/// ```
///
/// A unit with no members gathers nothing.
#[must_use]
pub const fn gather_rate(headcount: u32) -> u32 {
    match headcount {
        0 => 0,
        1..=6 => 20 + (headcount - 1),
        7..=25 => 25 + (headcount - 5) / 2,
        _ => 35 + (headcount - 25).saturating_mul(3) / 10,
    }
}

/// A faction's resource pool.
///
/// The total never decreases; spawning a vehicle does not spend resources,
/// it only moves on to the next threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Resources gathered over the match.
    pub total: u32,
    /// Vehicles deployed so far.
    pub spawned: usize,
    /// Index of the vehicle waiting for a route, if any.
    pub pending: Option<usize>,
}

impl ResourcePool {
    /// Add gathered resources.
    pub fn deposit(&mut self, amount: u32) {
        self.total = self.total.saturating_add(amount);
    }

    /// Threshold unlocking the next vehicle, `None` once all are used.
    #[must_use]
    pub fn next_threshold(&self, thresholds: &[u32]) -> Option<u32> {
        thresholds.get(self.spawned).copied()
    }

    /// Mark the next vehicle ready if its threshold has been reached.
    ///
    /// Returns the vehicle index the first time it becomes ready. While a
    /// vehicle is pending no further vehicle can become ready.
    pub fn check_spawn(&mut self, thresholds: &[u32]) -> Option<usize> {
        if self.pending.is_some() {
            return None;
        }
        let threshold = self.next_threshold(thresholds)?;
        if self.total >= threshold {
            self.pending = Some(self.spawned);
            self.pending
        } else {
            None
        }
    }

    /// Consume the pending vehicle, returning its index.
    pub fn confirm_spawn(&mut self) -> Option<usize> {
        let index = self.pending.take()?;
        self.spawned += 1;
        Some(index)
    }
}

/// Events generated by the economy system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A supply unit gathered resources.
    ResourcesGathered {
        /// The supply unit.
        unit: UnitId,
        /// Amount gathered.
        amount: u32,
    },
    /// A faction's next vehicle reached its threshold.
    VehicleReady {
        /// Faction with a vehicle waiting.
        faction: Faction,
        /// 0-based index of the vehicle among the faction's spawns.
        vehicle_index: usize,
    },
}

/// Process supply gathering and spawn checks for one turn.
///
/// Every living supply unit adds its gather rate to its own counter and to
/// its faction's pool; then each faction's pool is checked against its next
/// threshold.
///
/// # Returns
///
/// Gathering events in unit order, followed by readiness events in faction
/// order.
pub fn economy_system(
    units: &mut Roster,
    pools: &mut PerFaction<ResourcePool>,
    thresholds: &[u32],
) -> Vec<EconomyEvent> {
    let mut events = Vec::new();

    for unit in units.values_mut() {
        if unit.archetype() != Archetype::Supply || !unit.is_alive() {
            continue;
        }
        let amount = gather_rate(unit.headcount);
        if amount == 0 {
            continue;
        }
        unit.collected_supplies = unit.collected_supplies.saturating_add(amount);
        pools.get_mut(unit.faction()).deposit(amount);
        events.push(EconomyEvent::ResourcesGathered {
            unit: unit.id,
            amount,
        });
    }

    for faction in Faction::ALL {
        let pool = pools.get_mut(faction);
        if let Some(vehicle_index) = pool.check_spawn(thresholds) {
            tracing::info!(
                faction = faction.short_name(),
                vehicle_index,
                total = pool.total,
                "Vehicle ready for route selection"
            );
            events.push(EconomyEvent::VehicleReady {
                faction,
                vehicle_index,
            });
        }
    }

    events
}

//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical formations and commands.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the core guards against:
//!
//! - **Floating-point math**: stats are fixed-point via
//!   [`siege_core::math::Fixed`], built from integer tenths.
//!
//! - **Map iteration order**: the roster is a `BTreeMap` and installations
//!   are kept sorted, so every subsystem walks entities in identity order.
//!
//! - **Randomness**: there is none. Target ties break on identity.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual subsystems (movement, combat, support)
//! 2. **Property tests**: random formations and command streams replay exactly
//! 3. **Integration tests**: full matches are reproducible
//! 4. **Parallel tests**: N matches on N threads all agree

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use siege_core::simulation::Match;

use crate::fixtures::autopilot_step;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use siege_test_utils::determinism::verify_determinism;
/// use siege_test_utils::fixtures::{autopilot_step, skirmish_match};
///
/// let result = verify_determinism(
///     3,
///     20,
///     skirmish_match,
///     |game| { autopilot_step(game); },
///     |game| game.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Run a match twice under the autopilot and compare final hashes.
pub fn verify_match_determinism<F>(setup_fn: F, steps: u64) -> bool
where
    F: Fn() -> Match,
{
    verify_determinism(
        2,
        steps,
        &setup_fn,
        |game| {
            autopilot_step(game);
        },
        Match::state_hash,
    )
    .is_deterministic
}

/// Run N matches on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_matches: usize, steps: u64) -> DeterminismResult
where
    F: Fn() -> Match + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..steps {
                        autopilot_step(&mut game);
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps,
    }
}

/// Step two copies of a match in lockstep, returning the first step at
/// which their hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, steps: u64) -> Option<u64>
where
    F: Fn() -> Match,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for step in 1..=steps {
        autopilot_step(&mut a);
        autopilot_step(&mut b);

        if a.state_hash() != b.state_hash() {
            return Some(step);
        }
    }

    None
}

/// Verify that a snapshot round-trip preserves the match exactly, and that
/// the restored match keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, steps: u64) -> bool
where
    F: Fn() -> Match,
{
    let mut game = setup_fn();
    for _ in 0..steps {
        autopilot_step(&mut game);
    }

    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Match::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    for _ in 0..steps {
        autopilot_step(&mut game);
        autopilot_step(&mut restored);
    }
    restored.state_hash() == game.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible formations and player
/// command streams.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::components::UnitId;
    use siege_core::factions::Faction;
    use siege_core::formation::Formation;
    use siege_core::math::GridPos;
    use siege_core::routes::RouteId;
    use siege_core::simulation::Match;

    /// Generate a squad headcount.
    pub fn arb_headcount() -> impl Strategy<Value = u32> {
        1u32..=20u32
    }

    /// Generate a cell on the standard board.
    pub fn arb_grid_pos() -> impl Strategy<Value = GridPos> {
        (0i32..16, 0i32..30).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Generate a faction.
    pub fn arb_faction() -> impl Strategy<Value = Faction> {
        prop_oneof![Just(Faction::North), Just(Faction::South)]
    }

    /// Generate a route.
    pub fn arb_route() -> impl Strategy<Value = RouteId> {
        prop_oneof![
            Just(RouteId::Left),
            Just(RouteId::Center),
            Just(RouteId::Right)
        ]
    }

    /// Generate a formation that passes the default limits.
    ///
    /// At most 6 squads and 90 members, no empty squads.
    pub fn arb_formation() -> impl Strategy<Value = Formation> {
        (
            1u32..=30,
            0u32..=10,
            proptest::collection::vec(1u32..=10, 0..=3),
            proptest::collection::vec(1u32..=10, 0..=1),
            proptest::collection::vec(1u32..=10, 0..=1),
        )
            .prop_map(|(battalion, supply, infantry, raider, support)| Formation {
                battalion,
                supply,
                infantry,
                raider,
                support,
                placements: Vec::new(),
            })
    }

    /// A player request against a running match.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MatchCommand {
        /// Order the `n`th living unit (modulo roster size) to a cell.
        SetTarget {
            /// Index into the living units.
            unit_index: usize,
            /// Destination.
            target: GridPos,
        },
        /// Close target setting.
        CompleteTargets,
        /// Simulate a turn.
        Advance,
        /// Deploy a waiting vehicle.
        ConfirmRoute {
            /// Faction deploying.
            faction: Faction,
            /// Lane.
            route: RouteId,
        },
    }

    impl MatchCommand {
        /// Apply to `game`, ignoring rejections.
        pub fn apply(&self, game: &mut Match) {
            match *self {
                Self::SetTarget { unit_index, target } => {
                    let ids: Vec<UnitId> = game.units().map(|u| u.id).collect();
                    if let Some(&unit) = ids.get(unit_index % ids.len().max(1)) {
                        let _ = game.set_unit_target(unit, target);
                    }
                }
                Self::CompleteTargets => {
                    let _ = game.complete_target_setting();
                }
                Self::Advance => {
                    game.advance_turn();
                }
                Self::ConfirmRoute { faction, route } => {
                    let _ = game.confirm_route(faction, route);
                }
            }
        }
    }

    /// Generate a single command, weighted toward advancing.
    pub fn arb_command() -> impl Strategy<Value = MatchCommand> {
        prop_oneof![
            2 => (0usize..32, arb_grid_pos())
                .prop_map(|(unit_index, target)| MatchCommand::SetTarget { unit_index, target }),
            2 => Just(MatchCommand::CompleteTargets),
            5 => Just(MatchCommand::Advance),
            1 => (arb_faction(), arb_route())
                .prop_map(|(faction, route)| MatchCommand::ConfirmRoute { faction, route }),
        ]
    }

    /// Generate a sequence of commands.
    pub fn arb_command_sequence(max_len: usize) -> impl Strategy<Value = Vec<MatchCommand>> {
        proptest::collection::vec(arb_command(), 0..max_len)
    }
}

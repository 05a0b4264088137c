//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replayable matches require 100% determinism. Sources of
//! non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine never iterates agent or override maps; tanks are stored
//!   in vectors and visited in spawn order.
//!
//! - **System randomness**: all "random" behavior flows through each
//!   agent's explicitly seeded PRNG; one seed, one stream.
//!
//! - **Search tie-breaks**: the pathfinding heap orders equal f-scores
//!   by insertion sequence, so frontiers expand identically every run.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual operations are deterministic
//! 2. **Property tests**: random inputs still produce deterministic outputs
//! 3. **Integration tests**: full matches are reproducible tick by tick

use tanksim_core::runner::{MatchRunner, MatchSetup};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the runs matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function creating the initial state
/// * `step` - Function advancing the state by one tick
/// * `hash` - Function computing the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
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
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Verify that a match setup replays identically.
///
/// Runs the match twice for `ticks` ticks and compares final state
/// hashes.
pub fn verify_match_determinism<F>(setup_fn: F, ticks: u64) -> bool
where
    F: Fn() -> MatchRunner,
{
    let result = verify_determinism(
        2,
        ticks,
        &setup_fn,
        |runner| runner.step(),
        |runner| runner.state().state_hash(),
    );
    result.is_deterministic
}

/// Compare two match runs tick by tick, finding the first divergence.
///
/// Returns `None` when the runs match, `Some(tick)` for the first tick
/// whose hashes differ. Useful for narrowing down where replays break.
pub fn find_first_divergence<F>(setup_fn: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> MatchRunner,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state().state_hash() != second.state().state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        first.step();
        second.step();
        if first.state().state_hash() != second.state().state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Build a runner over a fixture layout, panicking on layout errors.
///
/// # Panics
///
/// Panics if the layout fails to parse; fixtures are expected to be
/// valid.
#[must_use]
pub fn runner_for(layout: &[String], setup: MatchSetup) -> MatchRunner {
    MatchRunner::new(layout, setup).expect("fixture layout must parse")
}

/// Proptest strategies for determinism testing.
pub mod strategies {
    use proptest::prelude::*;
    use tanksim_core::agent::Policy;

    /// Any match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A board side length small enough to keep tests fast.
    pub fn arb_board_size() -> impl Strategy<Value = usize> {
        3usize..12
    }

    /// Any of the four policy variants.
    pub fn arb_policy() -> impl Strategy<Value = Policy> {
        prop_oneof![
            Just(Policy::AttackBase),
            Just(Policy::Random),
            Just(Policy::Defensive),
            Just(Policy::AStarAttack),
        ]
    }

    /// A tick budget for bounded match runs.
    pub fn arb_ticks() -> impl Strategy<Value = u64> {
        1u64..120
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use proptest::prelude::*;
    use tanksim_core::agent::Policy;
    use tanksim_core::runner::CheatSchedule;

    fn duel_setup(seed: u64) -> MatchRunner {
        let setup = MatchSetup::with_seed(seed)
            .tick_limit(200)
            .policies(Policy::AttackBase, Policy::Defensive);
        runner_for(&fixtures::duel_board(), setup)
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_duel_match_is_deterministic() {
        assert!(verify_match_determinism(|| duel_setup(42), 200));
    }

    #[test]
    fn test_fortress_match_is_deterministic() {
        let result = verify_determinism(
            3,
            300,
            || {
                let setup = MatchSetup::with_seed(7)
                    .tick_limit(300)
                    .policies(Policy::AStarAttack, Policy::AttackBase);
                runner_for(&fixtures::fortress_board(), setup)
            },
            |runner| runner.step(),
            |runner| runner.state().state_hash(),
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_no_divergence_in_cheated_match() {
        let divergence = find_first_divergence(
            || {
                let schedule = CheatSchedule::parse(
                    "0 spawn_tanks 2 B\n\
                     5 add_wall 2 2 steel\n\
                     10 heal_all A 3\n\
                     20 clear_walls\n",
                );
                let setup = MatchSetup::with_seed(13).tick_limit(100).schedule(schedule);
                runner_for(&fixtures::duel_board(), setup)
            },
            100,
        );
        assert_eq!(divergence, None);
    }

    proptest! {
        /// Any seed and policy pairing must replay identically.
        #[test]
        fn prop_matches_replay_for_any_seed(
            seed in strategies::arb_seed(),
            policy_a in strategies::arb_policy(),
            policy_b in strategies::arb_policy(),
            ticks in strategies::arb_ticks(),
        ) {
            let setup_fn = move || {
                let setup = MatchSetup::with_seed(seed)
                    .tick_limit(150)
                    .policies(policy_a, policy_b);
                runner_for(&fixtures::duel_board(), setup)
            };
            prop_assert!(verify_match_determinism(setup_fn, ticks));
        }

        /// Snapshot round-trips preserve the state hash mid-match.
        #[test]
        fn prop_snapshot_roundtrip_is_exact(
            seed in strategies::arb_seed(),
            ticks in strategies::arb_ticks(),
        ) {
            let mut runner = duel_setup(seed);
            for _ in 0..ticks {
                runner.step();
            }

            let bytes = runner.state().serialize().unwrap();
            let restored = tanksim_core::state::GameState::deserialize(&bytes).unwrap();
            prop_assert_eq!(runner.state().state_hash(), restored.state_hash());
        }
    }
}

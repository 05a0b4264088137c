//! Batch match runner for policy evaluation.
//!
//! Runs many matches in parallel with rayon, sweeping seeds from a
//! starting value, and aggregates win rates and match lengths. Every
//! match stays individually reproducible: seed `seed_start + i` always
//! plays out the same game.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use tanksim_core::agent::Policy;
use tanksim_core::entities::Team;
use tanksim_core::error::Result;
use tanksim_core::runner::{MatchRunner, MatchSetup};

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Level layout every match plays on.
    pub layout: Vec<String>,
    /// Number of matches.
    pub count: u32,
    /// First seed; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per match.
    pub max_frames: u64,
    /// Team A default policy.
    pub team_a_policy: Policy,
    /// Team B default policy.
    pub team_b_policy: Policy,
}

/// One match's contribution to the batch summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MatchOutcome {
    winner: Option<Team>,
    frames: u64,
    score: u32,
}

/// Aggregated results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub games: u32,
    /// Team A wins.
    pub wins_a: u32,
    /// Team B wins.
    pub wins_b: u32,
    /// Drawn matches.
    pub draws: u32,
    /// Mean frames per match.
    pub mean_frames: f64,
    /// Mean final score per match.
    pub mean_score: f64,
}

impl BatchSummary {
    /// Team A's win rate in [0, 1].
    #[must_use]
    pub fn win_rate_a(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins_a) / f64::from(self.games)
        }
    }
}

/// Run the configured batch and aggregate the outcomes.
///
/// # Errors
///
/// Fails when the layout cannot be parsed; individual matches cannot
/// fail once started.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary> {
    info!(
        games = config.count,
        seed_start = config.seed_start,
        policy_a = config.team_a_policy.name(),
        policy_b = config.team_b_policy.name(),
        "Starting batch"
    );

    let outcomes: Vec<MatchOutcome> = (0..config.count)
        .into_par_iter()
        .map(|i| -> Result<MatchOutcome> {
            let seed = config.seed_start + u64::from(i);
            let setup = MatchSetup::with_seed(seed)
                .tick_limit(config.max_frames)
                .policies(config.team_a_policy, config.team_b_policy);
            let mut runner = MatchRunner::new(&config.layout, setup)?;
            runner.run();

            let state = runner.state();
            Ok(MatchOutcome {
                winner: state.winner(),
                frames: state.frame(),
                score: state.score(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let games = outcomes.len() as u32;
    let wins_a = outcomes.iter().filter(|o| o.winner == Some(Team::A)).count() as u32;
    let wins_b = outcomes.iter().filter(|o| o.winner == Some(Team::B)).count() as u32;
    let draws = games - wins_a - wins_b;
    let total_frames: u64 = outcomes.iter().map(|o| o.frames).sum();
    let total_score: u64 = outcomes.iter().map(|o| u64::from(o.score)).sum();

    let summary = BatchSummary {
        games,
        wins_a,
        wins_b,
        draws,
        mean_frames: if games == 0 {
            0.0
        } else {
            total_frames as f64 / f64::from(games)
        },
        mean_score: if games == 0 {
            0.0
        } else {
            total_score as f64 / f64::from(games)
        },
    };

    info!(
        wins_a = summary.wins_a,
        wins_b = summary.wins_b,
        draws = summary.draws,
        mean_frames = summary.mean_frames,
        "Batch finished"
    );

    Ok(summary)
}

//! JSON match reports.
//!
//! The report mirrors what the match runner observed: configuration,
//! outcome, and the full cheat execution log with aggregate counts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tanksim_core::cheats::CheatLogEntry;
use tanksim_core::entities::Team;
use tanksim_core::runner::MatchRunner;

/// Error type for report writing.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The output file could not be written.
    #[error("failed to write report file: {0}")]
    Write(#[from] std::io::Error),
}

/// The result record of one finished match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Match seed.
    pub seed: u64,
    /// Ticks per second the front-end advertised (metadata only; the
    /// simulation itself is turn-synchronous).
    pub tick_rate: u32,
    /// Configured tick limit.
    pub max_frames: u64,
    /// Level name or file path.
    pub level: String,
    /// Cheat script path, empty when none was loaded.
    pub cheats_file: String,
    /// Frames actually elapsed.
    pub frames: u64,
    /// Final global score.
    pub score: u32,
    /// `"A"`, `"B"`, or `"Draw"`.
    pub winner: String,
    /// Every cheat attempted, in execution order.
    pub cheats_executed: Vec<CheatLogEntry>,
    /// Total cheats attempted.
    pub cheats_total: usize,
    /// Cheats that failed to parse, validate, or apply.
    pub cheats_failed: usize,
}

impl MatchReport {
    /// Snapshot a finished (or in-progress) match into a report.
    #[must_use]
    pub fn from_runner(runner: &MatchRunner, tick_rate: u32, level: &str, cheats_file: &str) -> Self {
        let state = runner.state();
        Self {
            seed: runner.seed(),
            tick_rate,
            max_frames: state.tick_limit(),
            level: level.to_string(),
            cheats_file: cheats_file.to_string(),
            frames: state.frame(),
            score: state.score(),
            winner: winner_label(state.winner(), state.is_game_over()),
            cheats_executed: runner.cheat_log().to_vec(),
            cheats_total: runner.cheat_log().len(),
            cheats_failed: runner.failed_cheats(),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON to a file.
    ///
    /// # Errors
    ///
    /// Fails when serialization or the file write fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Winner tag for reports: a team letter or `Draw`.
fn winner_label(winner: Option<Team>, game_over: bool) -> String {
    match winner {
        Some(team) => team.tag().to_string(),
        None if game_over => "Draw".to_string(),
        None => "Undecided".to_string(),
    }
}

//! The cheat runtime: textual commands mutating game state directly.
//!
//! Commands are whitespace-tokenized lines; the first token names the
//! command, the rest are positional arguments. Dispatch is a single
//! match over the closed command set, each arm validating its own arity
//! and argument parses. Failures are recorded in the execution log with
//! `success = false` and never abort the match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Team, WallKind};
use crate::error::GameError;
use crate::grid::Direction;
use crate::state::GameState;

/// Why a cheat command was rejected.
#[derive(Debug, Error)]
pub enum CheatError {
    /// The command name is not in the command set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The line held no command at all.
    #[error("empty command line")]
    Empty,

    /// Wrong number of positional arguments.
    #[error("expected {expected} argument(s), got {got}")]
    BadArity {
        /// Arguments the command takes.
        expected: usize,
        /// Arguments actually supplied.
        got: usize,
    },

    /// An argument failed to parse as an integer.
    #[error("invalid integer argument '{0}'")]
    BadInt(String),

    /// An argument was not a team tag.
    #[error("invalid team '{0}' (expected A or B)")]
    BadTeam(String),

    /// An argument was not a winner tag.
    #[error("invalid winner '{0}' (expected A, B or D)")]
    BadWinner(String),

    /// An argument was not a wall type name.
    #[error("invalid wall type '{0}' (expected brick or steel)")]
    BadWallType(String),

    /// An argument was not a direction index.
    #[error("invalid direction '{0}' (expected 0..=3)")]
    BadDirection(String),

    /// The game state rejected the mutation.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// One executed (or attempted) cheat command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatLogEntry {
    /// Frame the command ran at.
    pub frame: u64,
    /// The raw command text.
    pub command: String,
    /// Whether it parsed, validated, and applied.
    pub success: bool,
}

/// Executes cheat commands against a [`GameState`] and keeps the
/// success/failure log consumed by match reports.
#[derive(Debug, Clone, Default)]
pub struct CheatRuntime {
    log: Vec<CheatLogEntry>,
}

/// Every recognized command name, for help output and diagnostics.
pub const AVAILABLE_COMMANDS: &[&str] = &[
    "spawn_tank",
    "spawn_tanks",
    "kill_tank",
    "kill_all",
    "heal_tank",
    "heal_all",
    "set_lives",
    "heal_base",
    "set_base_health",
    "destroy_base",
    "wall_type",
    "all_walls_type",
    "add_wall",
    "remove_wall",
    "clear_walls",
    "restart",
    "game_over",
    "set_tick_limit",
    "set_score",
    "clear_bullets",
    "spawn_bullet",
    "pause",
    "resume",
    "remove_tank",
    "remove_all_tanks",
];

impl CheatRuntime {
    /// Create a runtime with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one command line at the given frame, recording the outcome.
    ///
    /// Returns whether the command succeeded. Failures are logged, traced,
    /// and otherwise swallowed - a broken cheat never stops the match.
    pub fn execute(&mut self, state: &mut GameState, frame: u64, line: &str) -> bool {
        let result = dispatch(state, line);
        let success = result.is_ok();
        match &result {
            Ok(()) => tracing::debug!(frame, command = line, "Cheat executed"),
            Err(error) => tracing::warn!(frame, command = line, %error, "Cheat failed"),
        }
        self.log.push(CheatLogEntry {
            frame,
            command: line.to_string(),
            success,
        });
        success
    }

    /// The full execution log, in execution order.
    #[must_use]
    pub fn log(&self) -> &[CheatLogEntry] {
        &self.log
    }

    /// Number of failed commands in the log.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.log.iter().filter(|e| !e.success).count()
    }
}

/// Parse and apply one command line.
fn dispatch(state: &mut GameState, line: &str) -> Result<(), CheatError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = tokens.split_first() else {
        return Err(CheatError::Empty);
    };

    match name {
        "spawn_tank" => {
            let [x, y, team] = expect_args(args)?;
            state.spawn_tank(parse_int(x)?, parse_int(y)?, parse_team(team)?)?;
            Ok(())
        }
        "spawn_tanks" => {
            let [count, team] = expect_args(args)?;
            state.spawn_tanks(parse_int(count)?, parse_team(team)?);
            Ok(())
        }
        "kill_tank" => {
            let [id] = expect_args(args)?;
            state.kill_tank(parse_int(id)?)?;
            Ok(())
        }
        "kill_all" => {
            let [team] = expect_args(args)?;
            state.kill_all_tanks(parse_team(team)?);
            Ok(())
        }
        "heal_tank" => {
            let [id, amount] = expect_args(args)?;
            state.heal_tank(parse_int(id)?, parse_int(amount)?)?;
            Ok(())
        }
        "heal_all" => {
            let [team, amount] = expect_args(args)?;
            state.heal_all_tanks(parse_team(team)?, parse_int(amount)?);
            Ok(())
        }
        "set_lives" => {
            let [id, lives] = expect_args(args)?;
            state.set_tank_lives(parse_int(id)?, parse_int(lives)?)?;
            Ok(())
        }
        "heal_base" => {
            let [team, amount] = expect_args(args)?;
            state.heal_base(parse_team(team)?, parse_int(amount)?);
            Ok(())
        }
        "set_base_health" => {
            let [team, health] = expect_args(args)?;
            state.set_base_health(parse_team(team)?, parse_int(health)?);
            Ok(())
        }
        "destroy_base" => {
            let [team] = expect_args(args)?;
            state.destroy_base(parse_team(team)?);
            Ok(())
        }
        "wall_type" => {
            let [x, y, kind] = expect_args(args)?;
            state.change_wall_type(parse_int(x)?, parse_int(y)?, parse_wall_type(kind)?)?;
            Ok(())
        }
        "all_walls_type" => {
            let [kind] = expect_args(args)?;
            state.change_all_walls_type(parse_wall_type(kind)?);
            Ok(())
        }
        "add_wall" => {
            let [x, y, kind] = expect_args(args)?;
            state.add_wall(parse_int(x)?, parse_int(y)?, parse_wall_type(kind)?)?;
            Ok(())
        }
        "remove_wall" => {
            let [x, y] = expect_args(args)?;
            state.remove_wall(parse_int(x)?, parse_int(y)?)?;
            Ok(())
        }
        "clear_walls" => {
            let [] = expect_args(args)?;
            state.clear_walls();
            Ok(())
        }
        "restart" => {
            let [] = expect_args(args)?;
            state.force_restart();
            Ok(())
        }
        "game_over" => {
            let [winner] = expect_args(args)?;
            state.force_game_over(parse_winner(winner)?);
            Ok(())
        }
        "set_tick_limit" => {
            let [limit] = expect_args(args)?;
            state.set_tick_limit(parse_int(limit)?);
            Ok(())
        }
        "set_score" => {
            let [score] = expect_args(args)?;
            state.set_score(parse_int(score)?);
            Ok(())
        }
        "clear_bullets" => {
            let [] = expect_args(args)?;
            state.clear_bullets();
            Ok(())
        }
        "spawn_bullet" => {
            let [x, y, direction, team] = expect_args(args)?;
            state.spawn_bullet(
                parse_int(x)?,
                parse_int(y)?,
                parse_direction(direction)?,
                parse_team(team)?,
            )?;
            Ok(())
        }
        "pause" => {
            let [] = expect_args(args)?;
            state.pause();
            Ok(())
        }
        "resume" => {
            let [] = expect_args(args)?;
            state.resume();
            Ok(())
        }
        "remove_tank" => {
            let [id] = expect_args(args)?;
            state.remove_tank(parse_int(id)?)?;
            Ok(())
        }
        "remove_all_tanks" => {
            let [team] = expect_args(args)?;
            state.remove_all_tanks(parse_team(team)?);
            Ok(())
        }
        other => Err(CheatError::UnknownCommand(other.to_string())),
    }
}

/// Require an exact argument count.
fn expect_args<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], CheatError> {
    args.try_into().map_err(|_| CheatError::BadArity {
        expected: N,
        got: args.len(),
    })
}

fn parse_int<T: std::str::FromStr>(token: &str) -> Result<T, CheatError> {
    token
        .parse()
        .map_err(|_| CheatError::BadInt(token.to_string()))
}

fn parse_team(token: &str) -> Result<Team, CheatError> {
    token
        .chars()
        .next()
        .and_then(Team::from_tag)
        .ok_or_else(|| CheatError::BadTeam(token.to_string()))
}

/// Winner tag for `game_over`: `A`, `B`, or `D` for a draw.
fn parse_winner(token: &str) -> Result<Option<Team>, CheatError> {
    match token {
        "A" | "a" => Ok(Some(Team::A)),
        "B" | "b" => Ok(Some(Team::B)),
        "D" | "d" => Ok(None),
        other => Err(CheatError::BadWinner(other.to_string())),
    }
}

fn parse_wall_type(token: &str) -> Result<WallKind, CheatError> {
    WallKind::from_name(token).ok_or_else(|| CheatError::BadWallType(token.to_string()))
}

fn parse_direction(token: &str) -> Result<Direction, CheatError> {
    token
        .parse::<u8>()
        .ok()
        .and_then(Direction::from_index)
        .ok_or_else(|| CheatError::BadDirection(token.to_string()))
}

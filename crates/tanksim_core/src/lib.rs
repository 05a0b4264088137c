//! # Tanksim Core
//!
//! Deterministic tank-battle simulation core.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (agents carry explicitly seeded PRNGs)
//! - No wall-clock time
//!
//! This separation enables:
//! - Reproducible matches (same seed, level, and cheat script replay
//!   the exact frame-by-frame trajectory)
//! - Headless batch runs
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`entities`] - Tank, wall, bullet, and base state holders
//! - [`state`] - The per-match game state and tick engine
//! - [`pathfinding`] - Weighted A* grid search used by agents
//! - [`agent`] - Scripted per-tank decision policies
//! - [`cheats`] - Textual cheat commands mutating game state directly
//! - [`runner`] - Per-tick match orchestration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod cheats;
pub mod entities;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod runner;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Action, Policy, ScriptedAgent};
    pub use crate::cheats::{CheatLogEntry, CheatRuntime};
    pub use crate::entities::{Base, Bullet, Tank, TankId, Team, Wall, WallKind};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{manhattan_distance, Direction};
    pub use crate::runner::{CheatSchedule, MatchRunner, MatchSetup};
    pub use crate::state::GameState;
}

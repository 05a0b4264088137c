//! Error types for the game simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A level layout could not be parsed.
    #[error("Invalid level layout: {0}")]
    InvalidLayout(String),

    /// A tank id did not resolve to a tank in this match.
    #[error("Tank not found: {0}")]
    TankNotFound(u32),

    /// A position is outside the board or otherwise unusable.
    #[error("Invalid position ({x}, {y}): {reason}")]
    InvalidPosition {
        /// X coordinate of the rejected cell.
        x: i32,
        /// Y coordinate of the rejected cell.
        y: i32,
        /// Why the cell was rejected.
        reason: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

//! Grid geometry: cardinal directions and distance helpers.
//!
//! The board is a square of integer cells with (0, 0) at the bottom-left
//! corner. All positions are `i32` so that off-board arithmetic (one cell
//! beyond an edge) never wraps before the bounds check runs.

use serde::{Deserialize, Serialize};

/// A cardinal facing/movement direction.
///
/// The discriminants match the wire encoding used by cheat commands and
/// replay records: 0 = North, 1 = East, 2 = South, 3 = West.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Towards increasing y.
    North = 0,
    /// Towards increasing x.
    East = 1,
    /// Towards decreasing y.
    South = 2,
    /// Towards decreasing x.
    West = 3,
}

impl Direction {
    /// All four directions in index order (N, E, S, W).
    ///
    /// Every place that enumerates directions iterates in this order so
    /// that decision and search results are reproducible.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The (dx, dy) cell offset of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Numeric index of this direction (0..=3).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode a direction from its numeric index.
    ///
    /// Returns `None` for values outside 0..=3.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Direction::North),
            1 => Some(Direction::East),
            2 => Some(Direction::South),
            3 => Some(Direction::West),
            _ => None,
        }
    }

    /// Apply one step in this direction to a cell.
    #[must_use]
    pub const fn step(self, x: i32, y: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

/// Manhattan (L1) distance between two cells.
///
/// Admissible as an A* heuristic here because the minimum per-step cost
/// on the grid is 1.
#[must_use]
pub fn manhattan_distance(x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
    x1.abs_diff(x2) + y1.abs_diff(y2)
}

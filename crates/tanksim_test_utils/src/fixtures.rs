//! Test fixtures and helpers.
//!
//! Canonical layouts shared by unit, integration, and property tests so
//! scenarios read the same everywhere.

/// Convert literal rows into the owned form the engine takes.
#[must_use]
pub fn layout(rows: &[&str]) -> Vec<String> {
    rows.iter().map(|r| (*r).to_string()).collect()
}

/// A bare square board: no tanks, no walls, default bases at the origin.
#[must_use]
pub fn open_board(size: usize) -> Vec<String> {
    vec![" ".repeat(size); size]
}

/// 5x5 duel: one tank and one base per team in opposite corners.
#[must_use]
pub fn duel_board() -> Vec<String> {
    layout(&[
        "B   b", //
        "     ", //
        "     ", //
        "     ", //
        "A   a",
    ])
}

/// 5x5 board with a single open east-west lane at mid-height; everything
/// else is steel.
#[must_use]
pub fn corridor_board() -> Vec<String> {
    layout(&[
        "SSSSS", //
        "SSSSS", //
        "     ", //
        "SSSSS", //
        "SSSSS",
    ])
}

/// Symmetric 13x13 fortress: mirrored spawns, walled bases, a steel
/// cross in the middle.
#[must_use]
pub fn fortress_board() -> Vec<String> {
    layout(&[
        "B    XbX    B",
        "X X   X   X X",
        "  S SSSSS S  ",
        "XX X     X XX",
        "   X  S  X   ",
        "   S  S  S   ",
        "X  X  X  X  X",
        "   S  S  S   ",
        "   X  S  X   ",
        "XX X     X XX",
        "  S SSSSS S  ",
        "X X   X   X X",
        "A    XaX    A",
    ])
}

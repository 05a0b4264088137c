//! Built-in level registry and layout file loading.
//!
//! Levels are plain ASCII grids (see the core crate's layout codes).
//! The built-in set covers an open duel, the classic symmetric fortress,
//! and a brick maze; arbitrary layouts load from text files.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Error type for level lookup and loading.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Name not in the built-in registry.
    #[error("unknown level '{0}' (available: level1, level2, level3)")]
    Unknown(String),

    /// Level file could not be read.
    #[error("failed to read level file: {0}")]
    Read(#[from] std::io::Error),

    /// Level file held no rows.
    #[error("level file is empty: {0}")]
    Empty(String),
}

/// Names accepted by [`by_name`].
pub const LEVEL_NAMES: &[&str] = &["level1", "level2", "level3"];

/// Open 9x9 duel: two tanks per team, bases on opposite edges.
#[must_use]
pub fn level1() -> Vec<String> {
    to_rows(&[
        "B   b   B",
        "         ",
        "         ",
        "         ",
        "         ",
        "         ",
        "         ",
        "         ",
        "A   a   A",
    ])
}

/// Symmetric 13x13 fortress with walled bases and a steel core.
#[must_use]
pub fn level2() -> Vec<String> {
    to_rows(&[
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

/// 11x11 brick maze with offset lanes.
#[must_use]
pub fn level3() -> Vec<String> {
    to_rows(&[
        "B        bB",
        " XXX XXX X ",
        "     S     ",
        " X XXXXX X ",
        " X       X ",
        "   XSXSX   ",
        " X       X ",
        " X XXXXX X ",
        "     S     ",
        " X XXX XXX ",
        "Aa        A",
    ])
}

/// Resolve a built-in level by name.
///
/// # Errors
///
/// Returns [`LevelError::Unknown`] for names outside the registry.
pub fn by_name(name: &str) -> Result<Vec<String>, LevelError> {
    match name {
        "level1" => Ok(level1()),
        "level2" => Ok(level2()),
        "level3" => Ok(level3()),
        other => Err(LevelError::Unknown(other.to_string())),
    }
}

/// Load a layout from a text file, one board row per line.
///
/// Trailing newlines are dropped; blank interior lines count as empty
/// rows so boards with open edges stay square.
///
/// # Errors
///
/// Fails when the file cannot be read or holds no rows.
pub fn load_file(path: &Path) -> Result<Vec<String>, LevelError> {
    let text = fs::read_to_string(path)?;
    let rows: Vec<String> = text
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();
    let rows = trim_trailing_blank(rows);
    if rows.is_empty() {
        return Err(LevelError::Empty(path.display().to_string()));
    }
    Ok(rows)
}

fn trim_trailing_blank(mut rows: Vec<String>) -> Vec<String> {
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    rows
}

fn to_rows(rows: &[&str]) -> Vec<String> {
    rows.iter().map(|r| (*r).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanksim_core::entities::Team;
    use tanksim_core::state::GameState;

    #[test]
    fn test_builtin_levels_parse_with_both_bases() {
        for name in LEVEL_NAMES {
            let rows = by_name(name).unwrap();
            let state = GameState::new(&rows, 100).unwrap();

            assert_eq!(state.board_size() as usize, rows.len(), "{name}");
            assert!(state.tank_count(Team::A) >= 1, "{name}");
            assert!(state.tank_count(Team::B) >= 1, "{name}");
            assert!(state.base(Team::A).is_alive(), "{name}");
            assert!(state.base(Team::B).is_alive(), "{name}");
        }
    }

    #[test]
    fn test_unknown_level_is_an_error() {
        assert!(matches!(by_name("level9"), Err(LevelError::Unknown(_))));
    }

    #[test]
    fn test_load_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.txt");
        std::fs::write(&path, "A b\n   \nB a\n\n").unwrap();

        let rows = load_file(&path).unwrap();
        assert_eq!(rows, vec!["A b", "   ", "B a"]);
    }

    #[test]
    fn test_load_empty_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n\n").unwrap();

        assert!(matches!(load_file(&path), Err(LevelError::Empty(_))));
    }
}

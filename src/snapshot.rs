//! Game state data model and text parsing helpers.
//!
//! A [`GameSnapshot`] is one observation of the rendered page: score, the
//! 4×4 tile grid, and the game-over flag. Snapshots are read fresh every
//! loop iteration and never cached, except for the previous maximum kept by
//! the session for trend comparison.

use std::sync::OnceLock;

use regex::Regex;

/// Board edge length. The games this targets render a fixed 4×4 grid.
pub const GRID_SIZE: usize = 4;

/// A 4×4 grid of tile values. Zero means empty.
pub type Grid = [[u32; GRID_SIZE]; GRID_SIZE];

/// One move direction, mapped to the WASD key the page listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The character dispatched to the page for this direction.
    pub fn key(self) -> char {
        match self {
            Direction::Up => 'w',
            Direction::Down => 's',
            Direction::Left => 'a',
            Direction::Right => 'd',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// One observation of the rendered game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub score: u32,
    pub grid: Grid,
    pub game_over: bool,
}

impl GameSnapshot {
    /// Largest tile currently on the board. Empty board reads as 0.
    pub fn max_tile(&self) -> u32 {
        self.grid
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit regex is valid"))
}

/// Extract the first run of digits from score element text.
///
/// "Score: 1234" → 1234. Missing digits, overflow, or empty text → 0; score
/// reads never fail the run.
pub fn parse_score(text: &str) -> u32 {
    digit_run()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse one cell's text content as a tile value.
///
/// Empty or non-numeric text means the cell is empty.
pub fn parse_tile(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Locate the maximum tile in row-major scan order.
///
/// Strict `>` comparison, so ties resolve to the first cell found (lowest
/// row, then lowest column). An empty board reports (0, 0) with value 0.
pub fn max_tile_position(grid: &Grid) -> (usize, usize, u32) {
    let mut max_val = 0;
    let mut max_pos = (0, 0);

    for (row, cells) in grid.iter().enumerate() {
        for (col, &value) in cells.iter().enumerate() {
            if value > max_val {
                max_val = value;
                max_pos = (row, col);
            }
        }
    }

    (max_pos.0, max_pos.1, max_val)
}

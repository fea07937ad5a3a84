//! Grid-aware policy: pin the largest tile to the bottom-left corner.
//!
//! Selection order per iteration:
//!
//! 1. Positional correction — if the maximum tile is not at (3, 0), move
//!    down (wrong row) or left (wrong column).
//! 2. Periodic overrides — up every 20th move, right every 50th.
//! 3. Stuck escape — after repeated stalls, rotate through all four
//!    directions to break the deadlock.
//! 4. Otherwise an 8-entry left/down snake pattern.

use crate::snapshot::{Direction, GRID_SIZE, max_tile_position};

use super::{MovePolicy, PolicyContext};

/// Corner the maximum tile is steered into (bottom-left).
const TARGET_ROW: usize = GRID_SIZE - 1;
const TARGET_COL: usize = 0;

/// Snake pattern used once the maximum is in position.
const BASE_PATTERN: [Direction; 8] = [
    Direction::Left,
    Direction::Down,
    Direction::Down,
    Direction::Left,
    Direction::Down,
    Direction::Left,
    Direction::Left,
    Direction::Down,
];

/// All-direction rotation used when the run is stuck.
const ESCAPE_ROTATION: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Left,
    Direction::Down,
];

const UP_INTERVAL: u32 = 20;
const RIGHT_INTERVAL: u32 = 50;

/// Stuck-counter value above which the escape rotation takes over.
const STUCK_THRESHOLD: u32 = 10;

const MOVE_CEILING: u32 = 500;
const STALL_WINDOW: u32 = 100;

/// The grid-aware agent.
pub struct CornerPolicy;

impl MovePolicy for CornerPolicy {
    fn name(&self) -> &'static str {
        "corner"
    }

    fn select(&self, ctx: &PolicyContext) -> Direction {
        let (row, col, _) = max_tile_position(&ctx.snapshot.grid);

        // Correction first: never pattern-play while the anchor is loose.
        if row < TARGET_ROW {
            return Direction::Down;
        }
        if col > TARGET_COL {
            return Direction::Left;
        }

        let m = ctx.move_count;
        if m % UP_INTERVAL == UP_INTERVAL - 1 {
            return Direction::Up;
        }
        if m % RIGHT_INTERVAL == RIGHT_INTERVAL - 1 {
            return Direction::Right;
        }

        if ctx.stuck_counter > STUCK_THRESHOLD {
            return ESCAPE_ROTATION[(m as usize) % ESCAPE_ROTATION.len()];
        }

        BASE_PATTERN[(m as usize) % BASE_PATTERN.len()]
    }

    fn move_ceiling(&self) -> Option<u32> {
        Some(MOVE_CEILING)
    }

    fn stall_window(&self) -> Option<u32> {
        Some(STALL_WINDOW)
    }

    fn progress_interval(&self) -> u32 {
        50
    }
}

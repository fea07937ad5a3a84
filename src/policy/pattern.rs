//! Fixed-pattern policy: consolidate toward the bottom-left.
//!
//! Cycles left/down with a down bias, forcing an up move every 10th move and
//! a right move every 30th to shake loose rows the base pattern can't merge.

use crate::snapshot::Direction;

use super::{MovePolicy, PolicyContext};

/// Left/down cycle, indexed by move count mod 7.
const BASE_PATTERN: [Direction; 7] = [
    Direction::Left,
    Direction::Down,
    Direction::Left,
    Direction::Down,
    Direction::Left,
    Direction::Down,
    Direction::Down,
];

const UP_INTERVAL: u32 = 10;
const RIGHT_INTERVAL: u32 = 30;

/// The simple round-robin agent.
pub struct PatternPolicy;

impl MovePolicy for PatternPolicy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn select(&self, ctx: &PolicyContext) -> Direction {
        let m = ctx.move_count;

        // Both overrides land on move 29, 59, 89, ... — the right move wins
        // there, so it is checked first.
        if m % RIGHT_INTERVAL == RIGHT_INTERVAL - 1 {
            return Direction::Right;
        }
        if m % UP_INTERVAL == UP_INTERVAL - 1 {
            return Direction::Up;
        }

        BASE_PATTERN[(m as usize) % BASE_PATTERN.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{GRID_SIZE, GameSnapshot};

    fn ctx_at(snapshot: &GameSnapshot, move_count: u32) -> PolicyContext<'_> {
        PolicyContext {
            snapshot,
            move_count,
            stuck_counter: 0,
        }
    }

    fn empty_snapshot() -> GameSnapshot {
        GameSnapshot {
            score: 0,
            grid: [[0; GRID_SIZE]; GRID_SIZE],
            game_over: false,
        }
    }

    #[test]
    fn base_pattern_cycles() {
        let snap = empty_snapshot();
        let policy = PatternPolicy;

        assert_eq!(policy.select(&ctx_at(&snap, 0)), Direction::Left);
        assert_eq!(policy.select(&ctx_at(&snap, 1)), Direction::Down);
        assert_eq!(policy.select(&ctx_at(&snap, 6)), Direction::Down);
        // Wraps at 7.
        assert_eq!(policy.select(&ctx_at(&snap, 7)), Direction::Left);
    }

    #[test]
    fn every_tenth_move_is_up() {
        let snap = empty_snapshot();
        let policy = PatternPolicy;

        assert_eq!(policy.select(&ctx_at(&snap, 9)), Direction::Up);
        assert_eq!(policy.select(&ctx_at(&snap, 19)), Direction::Up);
        assert_eq!(policy.select(&ctx_at(&snap, 39)), Direction::Up);
    }

    #[test]
    fn every_thirtieth_move_is_right() {
        let snap = empty_snapshot();
        let policy = PatternPolicy;

        assert_eq!(policy.select(&ctx_at(&snap, 59)), Direction::Right);
        assert_eq!(policy.select(&ctx_at(&snap, 89)), Direction::Right);
    }

    #[test]
    fn right_wins_when_overrides_coincide() {
        // Move 29 satisfies both m % 10 == 9 and m % 30 == 29.
        let snap = empty_snapshot();
        let policy = PatternPolicy;

        assert_eq!(policy.select(&ctx_at(&snap, 29)), Direction::Right);
        assert_eq!(policy.select(&ctx_at(&snap, 119)), Direction::Right);
    }

    #[test]
    fn override_precedence_over_full_range() {
        let snap = empty_snapshot();
        let policy = PatternPolicy;

        for m in 0..300 {
            let chosen = policy.select(&ctx_at(&snap, m));
            if m % 30 == 29 {
                assert_eq!(chosen, Direction::Right, "move {m}");
            } else if m % 10 == 9 {
                assert_eq!(chosen, Direction::Up, "move {m}");
            } else {
                assert_eq!(
                    chosen,
                    BASE_PATTERN[(m as usize) % BASE_PATTERN.len()],
                    "move {m}"
                );
            }
        }
    }

    #[test]
    fn ignores_grid_and_stuck_counter() {
        let mut snap = empty_snapshot();
        snap.grid[0][3] = 1024;
        let policy = PatternPolicy;

        let ctx = PolicyContext {
            snapshot: &snap,
            move_count: 0,
            stuck_counter: 99,
        };
        assert_eq!(policy.select(&ctx), Direction::Left);
    }
}

//! Move selection policies.
//!
//! A policy is a pure decision function: given the latest snapshot and the
//! session counters, pick the next direction. The control loop owns all
//! mutation; policies never see the driver and are tested against synthetic
//! snapshots.

pub mod corner;
pub mod pattern;

use crate::config::Strategy;
use crate::snapshot::{Direction, GameSnapshot};

/// Read-only view of the session handed to a policy each iteration.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub snapshot: &'a GameSnapshot,
    /// Moves dispatched so far this run.
    pub move_count: u32,
    /// Coarse stall counter (see `session`); only the corner policy reacts.
    pub stuck_counter: u32,
}

/// A move selection strategy.
pub trait MovePolicy {
    /// Short name for logs and the run summary.
    fn name(&self) -> &'static str;

    /// Choose the next move.
    fn select(&self, ctx: &PolicyContext) -> Direction;

    /// Hard cap on dispatched moves, if this policy wants one.
    fn move_ceiling(&self) -> Option<u32> {
        None
    }

    /// Consecutive non-improving iterations before the stuck counter ticks.
    /// `None` disables stall tracking entirely.
    fn stall_window(&self) -> Option<u32> {
        None
    }

    /// Emit a progress log line every this many moves.
    fn progress_interval(&self) -> u32 {
        100
    }
}

/// Build the policy for a configured strategy.
pub fn policy_for(strategy: Strategy) -> Box<dyn MovePolicy> {
    match strategy {
        Strategy::Pattern => Box::new(pattern::PatternPolicy),
        Strategy::Corner => Box::new(corner::CornerPolicy),
    }
}

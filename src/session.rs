//! Per-run session state and the shared control loop.
//!
//! One loop drives both policies. Each iteration reads a fresh snapshot,
//! updates the running maximum and stall tracking, applies the terminal
//! checks in fixed order, then dispatches the policy's move and paces
//! itself so the page animation settles.
//!
//! ## State machine
//!
//! ```text
//! RUNNING → TARGET_REACHED   max tile ≥ target (checked first, wins over
//!                            a simultaneous game-over flag)
//!         → GAME_OVER        overlay visible
//!         → TIMEOUT          move count over the policy's ceiling
//!         → INTERRUPTED      Ctrl-C flag set (teardown still runs)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::log::{RunEvent, RunLog};
use crate::policy::{MovePolicy, PolicyContext};
use crate::reader::StateReader;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target tile was reached.
    TargetReached,
    /// The page reported game over.
    GameOver,
    /// The policy's move ceiling was exceeded.
    Timeout,
    /// The run was interrupted from outside (Ctrl-C).
    Interrupted,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::TargetReached => "target_reached",
            Outcome::GameOver => "game_over",
            Outcome::Timeout => "timeout",
            Outcome::Interrupted => "interrupted",
        }
    }
}

/// Final report for one play session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub final_score: u32,
    pub best_tile: u32,
    pub move_count: u32,
}

/// Loop parameters that are not policy constants.
pub struct LoopConfig {
    pub target_tile: u32,
    pub move_delay: Duration,
}

/// Result of folding one observed maximum into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The running maximum improved this iteration.
    pub improved: bool,
    /// A full stall window elapsed; the stuck counter ticked once.
    pub stall_tick: bool,
}

/// Mutable per-run state. All counters live here, passed through the loop
/// explicitly — there is no ambient state.
#[derive(Debug, Default)]
pub struct Session {
    /// Keys dispatched so far. Monotonic.
    pub move_count: u32,
    /// Highest tile seen this run. Monotonic non-decreasing.
    pub best_tile: u32,
    /// Coarse stall counter consumed by the corner policy's escape step.
    pub stuck_counter: u32,
    /// Consecutive iterations without improvement. Resets on improvement
    /// and on each stuck-counter tick.
    stall_moves: u32,
    /// Maximum from the previous iteration, for trend comparison only.
    previous_max: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observed maximum into the session counters.
    ///
    /// Stall tracking only runs when the policy configures a window: the
    /// stuck counter ticks once each time the maximum stays flat for more
    /// than `window` consecutive iterations, resetting the local counter.
    pub fn observe(&mut self, max_tile: u32, stall_window: Option<u32>) -> Observation {
        let improved = max_tile > self.best_tile;
        if improved {
            self.best_tile = max_tile;
            self.stuck_counter = 0;
            self.stall_moves = 0;
        }

        let mut stall_tick = false;
        if let Some(window) = stall_window {
            if max_tile == self.previous_max {
                self.stall_moves += 1;
                if self.stall_moves > window {
                    self.stuck_counter += 1;
                    self.stall_moves = 0;
                    stall_tick = true;
                }
            } else {
                self.stall_moves = 0;
            }
        }
        self.previous_max = max_tile;

        Observation {
            improved,
            stall_tick,
        }
    }
}

/// Drive one full play session until a terminal state.
///
/// The caller owns the driver lifecycle: navigation happens before this is
/// called, and teardown (plus the final observation pause) after it returns
/// — unconditionally, whatever the outcome.
pub fn run_loop(
    driver: &mut dyn PageDriver,
    reader: &StateReader,
    policy: &dyn MovePolicy,
    config: &LoopConfig,
    log: &RunLog,
    interrupted: &AtomicBool,
) -> Result<RunReport> {
    let mut session = Session::new();
    let mut last_score = 0;

    let outcome = loop {
        if interrupted.load(Ordering::Relaxed) {
            break Outcome::Interrupted;
        }

        let snapshot = reader
            .read(driver)
            .context("failed to read game state from page")?;
        let max_tile = snapshot.max_tile();
        last_score = snapshot.score;

        let observation = session.observe(max_tile, policy.stall_window());
        if observation.improved {
            info!(
                tile = session.best_tile,
                score = snapshot.score,
                moves = session.move_count,
                "new best tile"
            );
            log.record(RunEvent::TileImproved {
                value: session.best_tile,
                score: snapshot.score,
                move_count: session.move_count,
            })?;
        }
        if observation.stall_tick {
            warn!(
                stuck_counter = session.stuck_counter,
                "no progress for a full stall window"
            );
            log.record(RunEvent::StallDetected {
                stuck_counter: session.stuck_counter,
            })?;
        }

        // Terminal checks in fixed order: target beats game over.
        if max_tile >= config.target_tile {
            break Outcome::TargetReached;
        }
        if snapshot.game_over {
            break Outcome::GameOver;
        }
        if let Some(ceiling) = policy.move_ceiling() {
            if session.move_count > ceiling {
                break Outcome::Timeout;
            }
        }

        let ctx = PolicyContext {
            snapshot: &snapshot,
            move_count: session.move_count,
            stuck_counter: session.stuck_counter,
        };
        let direction = policy.select(&ctx);
        debug!(
            direction = direction.label(),
            move_count = session.move_count,
            "dispatching move"
        );
        driver
            .press_key(direction.key())
            .context("failed to dispatch key press")?;
        session.move_count += 1;

        if session.move_count % policy.progress_interval() == 0 {
            info!(
                moves = session.move_count,
                best_tile = session.best_tile,
                score = snapshot.score,
                "progress"
            );
            log.record(RunEvent::Progress {
                move_count: session.move_count,
                best_tile: session.best_tile,
                score: snapshot.score,
            })?;
        }

        std::thread::sleep(config.move_delay);
    };

    let report = RunReport {
        outcome,
        final_score: last_score,
        best_tile: session.best_tile,
        move_count: session.move_count,
    };

    info!(
        outcome = outcome.label(),
        score = report.final_score,
        best_tile = report.best_tile,
        moves = report.move_count,
        "session ended"
    );
    log.record(RunEvent::SessionEnded {
        outcome: outcome.label().to_string(),
        score: report.final_score,
        best_tile: report.best_tile,
        move_count: report.move_count,
    })?;

    Ok(report)
}

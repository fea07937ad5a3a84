//! Structured run log — JSON lines per session.
//!
//! Every play session writes a `.jsonl` file capturing the run's milestones:
//! session start, new best tiles, stall detections, periodic progress, and
//! the terminal outcome. Each line is a self-contained JSON object with an
//! ISO-8601 timestamp, easy to grep, stream, and post-process.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A structured event in the run log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(flatten)]
    pub event: RunEvent,
}

/// All event types that can appear in the run log.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    /// A session started against a game URL.
    SessionStarted { url: String, strategy: String },
    /// A new best tile was observed.
    TileImproved {
        value: u32,
        score: u32,
        move_count: u32,
    },
    /// Progress stalled for a full window; the stuck counter ticked.
    StallDetected { stuck_counter: u32 },
    /// Periodic progress report.
    Progress {
        move_count: u32,
        best_tile: u32,
        score: u32,
    },
    /// The session reached a terminal state.
    SessionEnded {
        outcome: String,
        score: u32,
        best_tile: u32,
        move_count: u32,
    },
}

/// Writer for JSON lines run logs.
pub struct RunLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl RunLog {
    /// Create a new run log, writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Appends to an existing file.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open run log: {}", path.display()))?;

        debug!(path = %path.display(), "run log opened");
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line and flush immediately, so a killed
    /// run still leaves a complete log.
    pub fn record(&self, event: RunEvent) -> Result<()> {
        let entry = LogEntry {
            timestamp: now_iso8601(),
            event,
        };
        let line = serde_json::to_string(&entry).context("failed to serialize log entry")?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("run log writer poisoned"))?;
        writeln!(writer, "{line}").context("failed to write log entry")?;
        writer.flush().context("failed to flush run log")?;
        Ok(())
    }
}

//! # Game Log
//!
//! Structured record of a finished game and the sinks it can be exported to.
//! The file sink writes one pretty-printed JSON document per game,
//! named `game_log_YYYYMMDD_HHMMSS.json`. An existing file is never
//! overwritten: later logs from the same second get a `_N` suffix.

use crate::config::GameConfig;
use crate::error::{self, Result};
use crate::message::A2aMessage;
use crate::state::{GameState, TurnRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Final outcome as written to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStatus {
    /// ongoing / won / lost / draw
    pub status: String,
    /// Winner's name, null on a draw
    pub winner: Option<String>,
    pub reason: String,
    /// Accepted turns
    pub turns: u32,
}

/// Everything persisted about one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLog {
    pub players: [String; 2],
    pub started_at: DateTime<Utc>,
    pub records: Vec<TurnRecord>,
    /// Agent-to-agent messages in send order
    #[serde(default)]
    pub messages: Vec<A2aMessage>,
    #[serde(rename = "final")]
    pub final_status: FinalStatus,
}

impl GameLog {
    /// Build the log from a (normally finished) game
    pub fn from_state(state: &GameState, config: &GameConfig, started_at: DateTime<Utc>) -> Self {
        let status = state.status();
        Self {
            players: [config.first_player.clone(), config.second_player.clone()],
            started_at,
            records: state.history().to_vec(),
            messages: Vec::new(),
            final_status: FinalStatus {
                status: status.label().to_string(),
                winner: status.winner().map(|seat| config.player_name(seat).to_string()),
                reason: status.describe(config),
                turns: state.turn_counter(),
            },
        }
    }

    /// Attach the message transcript of the game
    pub fn with_messages(mut self, messages: Vec<A2aMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| error::serialization_error(e.to_string()).with_operation("log::to_json"))
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for exported game logs
pub trait LogSink: Send + Sync {
    /// Persist the log and return where it went
    fn write(&mut self, log: &GameLog) -> Result<String>;
}

/// Keeps logs in memory (useful for testing)
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    logs: Vec<GameLog>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[GameLog] {
        &self.logs
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, log: &GameLog) -> Result<String> {
        self.logs.push(log.clone());
        Ok(format!("memory#{}", self.logs.len() - 1))
    }
}

/// Writes each game to its own JSON file in a directory
pub struct FileSink {
    base_path: PathBuf,
}

impl FileSink {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            error::Error::from(e)
                .with_operation("log::create_dir")
                .with_context("path", base_path.display().to_string())
        })?;
        Ok(Self { base_path })
    }

    /// Preferred file name for the log, ignoring files already on disk
    pub fn path_for(&self, log: &GameLog) -> PathBuf {
        self.candidate(log, 0)
    }

    fn candidate(&self, log: &GameLog, attempt: u32) -> PathBuf {
        let stamp = log
            .records
            .last()
            .map(|r| r.timestamp)
            .unwrap_or(log.started_at)
            .format("%Y%m%d_%H%M%S");
        match attempt {
            0 => self.base_path.join(format!("game_log_{}.json", stamp)),
            n => self.base_path.join(format!("game_log_{}_{}.json", stamp, n)),
        }
    }

    /// Create the first candidate file that does not exist yet
    fn create_new(&self, log: &GameLog) -> Result<(PathBuf, std::fs::File)> {
        let mut attempt = 0;
        loop {
            let path = self.candidate(log, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(error::io_error(format!("Failed to create {}: {}", path.display(), e))
                        .with_operation("log::write")
                        .set_source(e))
                }
            }
        }
    }
}

impl LogSink for FileSink {
    fn write(&mut self, log: &GameLog) -> Result<String> {
        let content = log.to_json()?;
        let (path, mut file) = self.create_new(log)?;
        file.write_all(content.as_bytes()).map_err(|e| {
            error::io_error(format!("Failed to write {}: {}", path.display(), e))
                .with_operation("log::write")
                .set_source(e)
        })?;
        info!(path = %path.display(), "game log saved");
        Ok(path.display().to_string())
    }
}

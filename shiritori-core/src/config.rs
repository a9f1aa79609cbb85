//! Game configuration, built once at startup and passed by reference.

use crate::error::{self, Result};
use crate::state::Seat;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of accepted turns before the game is a draw
pub const DEFAULT_MAX_TURNS: u32 = 20;

/// Default time a player gets to produce a word
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(180);

/// Default name of the first mover
pub const DEFAULT_FIRST_PLAYER: &str = "ノエル";

/// Default name of the second mover
pub const DEFAULT_SECOND_PLAYER: &str = "フレア";

/// Settings for one game
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Accepted turns after which the game ends in a draw
    pub max_turns: u32,
    /// Deadline for each word request
    pub turn_timeout: Duration,
    /// Display name of the first mover
    pub first_player: String,
    /// Display name of the second mover
    pub second_player: String,
    /// Export the game log when the game ends
    pub save_log: bool,
    /// Directory the game log is written to
    pub log_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            first_player: DEFAULT_FIRST_PLAYER.to_string(),
            second_player: DEFAULT_SECOND_PLAYER.to_string(),
            save_log: false,
            log_dir: PathBuf::from("."),
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_players(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.first_player = first.into();
        self.second_player = second.into();
        self
    }

    pub fn with_save_log(mut self, save: bool) -> Self {
        self.save_log = save;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Display name of the player in `seat`
    pub fn player_name(&self, seat: Seat) -> &str {
        match seat {
            Seat::First => &self.first_player,
            Seat::Second => &self.second_player,
        }
    }

    /// Reject settings no game can be played with
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(error::config_invalid("max turns must be at least 1")
                .with_context("max_turns", self.max_turns.to_string()));
        }
        if self.turn_timeout.is_zero() {
            return Err(error::config_invalid("turn timeout must be positive"));
        }
        if self.first_player.trim().is_empty() || self.second_player.trim().is_empty() {
            return Err(error::config_invalid("player names must not be empty"));
        }
        if self.first_player == self.second_player {
            return Err(error::config_invalid("player names must differ")
                .with_context("name", self.first_player.clone()));
        }
        Ok(())
    }
}

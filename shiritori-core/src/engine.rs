//! # Turn Engine
//!
//! Validates one submitted word against the rules and advances the game.
//!
//! Validation order, first match wins:
//! 1. missing or empty word      -> loss, no response
//! 2. word already used          -> loss, duplicate word
//! 3. word ends in `ん`          -> loss, forbidden ending
//! 4. word is not kana           -> loss, invalid word
//! 5. word does not chain        -> loss, broken chain
//! 6. otherwise accepted; the game is a draw once `max_turns` words are accepted
//!
//! A losing move only appends its terminating record and sets the status.
//! The counter and the used-word set are left untouched.

use crate::config::GameConfig;
use crate::error::{self, Result};
use crate::state::{GameState, GameStatus, LossReason, Seat, TurnRecord};
use crate::word::Word;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of one `play_turn`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Word accepted, `next` is to move
    Accepted { word: Word, next: Seat },
    /// Word accepted and the turn limit was reached
    Draw { word: Word },
    /// The mover lost
    Lost { loser: Seat, reason: LossReason },
}

impl TurnOutcome {
    pub fn ends_game(&self) -> bool {
        !matches!(self, TurnOutcome::Accepted { .. })
    }
}

/// Applies the rules to a `GameState` using one borrowed `GameConfig`
#[derive(Debug, Clone, Copy)]
pub struct TurnEngine<'a> {
    config: &'a GameConfig,
}

impl<'a> TurnEngine<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        self.config
    }

    /// Play the current player's move.
    ///
    /// `word` is `None` when the player produced nothing (generation failure
    /// or timeout). Fails with `GameFinished` if the game is already over.
    pub fn play_turn(&self, state: &mut GameState, word: Option<&str>) -> Result<TurnOutcome> {
        self.play_timed_turn(state, word, Duration::ZERO)
    }

    /// Same as `play_turn`, recording how long the player took
    pub fn play_timed_turn(
        &self,
        state: &mut GameState,
        word: Option<&str>,
        elapsed: Duration,
    ) -> Result<TurnOutcome> {
        if state.status.is_over() {
            return Err(error::game_finished(state.status.label())
                .with_context("turn", state.turn_counter.to_string()));
        }

        let seat = state.current;
        let submitted = word.and_then(Word::new);

        if let Err(reason) = self.validate(state, submitted.as_ref()) {
            self.record(state, seat, word.map(str::trim), false, Some(reason), elapsed);
            state.status = GameStatus::Lost { loser: seat, reason };
            info!(
                player = %state.player(seat).name(),
                word = word.unwrap_or_default(),
                %reason,
                "move rejected, game over"
            );
            return Ok(TurnOutcome::Lost { loser: seat, reason });
        }

        // validate() only passes with a word present
        let Some(word) = submitted else {
            return Err(error::Error::unexpected("accepted move without a word"));
        };

        state.used.insert(word.clone());
        state.turn_counter += 1;
        self.record(state, seat, Some(word.text()), true, None, elapsed);
        state.last_word = Some(word.clone());

        debug!(
            player = %state.player(seat).name(),
            word = %word,
            turn = state.turn_counter,
            "move accepted"
        );

        if state.turn_counter >= self.config.max_turns {
            state.status = GameStatus::Draw;
            info!(turns = state.turn_counter, "turn limit reached, draw");
            return Ok(TurnOutcome::Draw { word });
        }

        state.current = seat.opponent();
        Ok(TurnOutcome::Accepted {
            word,
            next: state.current,
        })
    }

    /// The current player gives up; the opponent wins
    pub fn concede(&self, state: &mut GameState) -> Result<GameStatus> {
        self.concede_timed(state, Duration::ZERO)
    }

    /// Same as `concede`, recording how long the player took to give up.
    ///
    /// Appends a terminating record with no word and `LossReason::Resigned`.
    pub fn concede_timed(&self, state: &mut GameState, elapsed: Duration) -> Result<GameStatus> {
        if state.status.is_over() {
            return Err(error::Error::game_finished(state.status.label())
                .with_operation("engine::concede"));
        }
        let seat = state.current;
        self.record(state, seat, None, false, Some(LossReason::Resigned), elapsed);
        state.status = GameStatus::Won {
            winner: seat.opponent(),
        };
        info!(player = %state.player(seat).name(), "player conceded");
        Ok(state.status)
    }

    fn validate(&self, state: &GameState, word: Option<&Word>) -> std::result::Result<(), LossReason> {
        let word = word.ok_or(LossReason::NoResponse)?;

        if state.used.contains(word) {
            return Err(LossReason::DuplicateWord);
        }
        if word.ends_in_terminal() {
            return Err(LossReason::ForbiddenEnding);
        }
        if !word.is_kana() {
            return Err(LossReason::InvalidWord);
        }
        if let Some(previous) = &state.last_word {
            if !word.chains_from(previous) {
                return Err(LossReason::BrokenChain);
            }
        }
        Ok(())
    }

    fn record(
        &self,
        state: &mut GameState,
        seat: Seat,
        word: Option<&str>,
        accepted: bool,
        reason: Option<LossReason>,
        elapsed: Duration,
    ) {
        let turn = if accepted {
            state.turn_counter
        } else {
            state.turn_counter + 1
        };
        state.history.push(TurnRecord {
            turn,
            seat,
            player: state.player(seat).name().to_string(),
            word: word.filter(|w| !w.is_empty()).map(str::to_string),
            accepted,
            timestamp: Utc::now(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            reason,
        });
    }
}

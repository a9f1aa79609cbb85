//! # Game State
//!
//! Everything the Turn Engine reads and writes during one game:
//! - the two seated players (immutable once the game starts)
//! - the append-only used-word set
//! - the ordered turn history
//! - the termination status and the accepted-turn counter
//!
//! Only `engine::TurnEngine` mutates a `GameState`; everything else gets
//! read-only access or a `TurnContext` snapshot.

use crate::config::GameConfig;
use crate::word::Word;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How many recent words a `TurnContext` shows by default
pub const RECENT_WORDS: usize = 5;

// ============================================================================
// Players
// ============================================================================

/// Turn order role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// The other seat
    pub fn opponent(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// 0 for the first mover, 1 for the second
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

/// A named participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    name: String,
    seat: Seat,
}

impl Player {
    pub fn new(name: impl Into<String>, seat: Seat) -> Self {
        Self {
            name: name.into(),
            seat,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }
}

// ============================================================================
// Used words
// ============================================================================

/// Append-only set of accepted words, compared by `Word::key`
#[derive(Debug, Clone, Default)]
pub struct UsedWordSet {
    keys: HashSet<String>,
    ordered: Vec<Word>,
}

impl UsedWordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a word. Returns false if an equal word was already present.
    pub fn insert(&mut self, word: Word) -> bool {
        if !self.keys.insert(word.key()) {
            return false;
        }
        self.ordered.push(word);
        true
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.keys.contains(&word.key())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Words in the order they were accepted
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.ordered.iter()
    }

    /// The last `n` accepted words, oldest first
    pub fn recent(&self, n: usize) -> &[Word] {
        let start = self.ordered.len().saturating_sub(n);
        &self.ordered[start..]
    }
}

// ============================================================================
// Status
// ============================================================================

/// Why a move lost the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// Empty word, generation failure, or timeout
    NoResponse,
    /// The word was already used in this game
    DuplicateWord,
    /// The word ends in `ん`
    ForbiddenEnding,
    /// The word is not written in kana
    InvalidWord,
    /// The word does not start with the previous word's final character
    BrokenChain,
    /// The player gave up; recorded on the terminating turn of a `Won` game
    Resigned,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::NoResponse => "no response",
            LossReason::DuplicateWord => "duplicate word",
            LossReason::ForbiddenEnding => "ends in forbidden syllable",
            LossReason::InvalidWord => "invalid word",
            LossReason::BrokenChain => "broken chain",
            LossReason::Resigned => "resigned",
        }
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Termination status. Once it leaves `Ongoing` it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    /// The opponent of `winner` conceded
    Won { winner: Seat },
    /// `loser` broke a rule or failed to respond
    Lost { loser: Seat, reason: LossReason },
    /// The turn limit was reached
    Draw,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    pub fn winner(&self) -> Option<Seat> {
        match self {
            GameStatus::Won { winner } => Some(*winner),
            GameStatus::Lost { loser, .. } => Some(loser.opponent()),
            GameStatus::Ongoing | GameStatus::Draw => None,
        }
    }

    pub fn loser(&self) -> Option<Seat> {
        self.winner().map(Seat::opponent)
    }

    /// Short label: ongoing / won / lost / draw
    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Won { .. } => "won",
            GameStatus::Lost { .. } => "lost",
            GameStatus::Draw => "draw",
        }
    }

    /// Human-readable explanation using the configured player names
    pub fn describe(&self, config: &GameConfig) -> String {
        match self {
            GameStatus::Ongoing => "game in progress".to_string(),
            GameStatus::Won { winner } => format!(
                "{} conceded",
                config.player_name(winner.opponent())
            ),
            GameStatus::Lost { loser, reason } => {
                format!("{} lost: {}", config.player_name(*loser), reason)
            }
            GameStatus::Draw => format!("turn limit ({}) reached", config.max_turns),
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// One submitted move, accepted or terminating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based turn number
    pub turn: u32,
    pub seat: Seat,
    pub player: String,
    /// None when the player produced nothing
    pub word: Option<String>,
    pub accepted: bool,
    pub timestamp: DateTime<Utc>,
    /// Time the player took to answer
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<LossReason>,
}

// ============================================================================
// GameState
// ============================================================================

/// Complete state of one game
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) players: [Player; 2],
    pub(crate) current: Seat,
    pub(crate) history: Vec<TurnRecord>,
    pub(crate) used: UsedWordSet,
    pub(crate) status: GameStatus,
    pub(crate) turn_counter: u32,
    pub(crate) last_word: Option<Word>,
}

impl GameState {
    /// Fresh game: empty history, first mover to play
    pub fn new(config: &GameConfig) -> Self {
        Self {
            players: [
                Player::new(config.first_player.clone(), Seat::First),
                Player::new(config.second_player.clone(), Seat::Second),
            ],
            current: Seat::First,
            history: Vec::new(),
            used: UsedWordSet::new(),
            status: GameStatus::Ongoing,
            turn_counter: 0,
            last_word: None,
        }
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    /// Seat whose turn it is (meaningless once the game is over)
    pub fn current_seat(&self) -> Seat {
        self.current
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.current)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Number of accepted moves
    pub fn turn_counter(&self) -> u32 {
        self.turn_counter
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn used_words(&self) -> &UsedWordSet {
        &self.used
    }

    /// The last accepted word, if any
    pub fn last_word(&self) -> Option<&Word> {
        self.last_word.as_ref()
    }

    /// Snapshot handed to the player whose turn it is
    pub fn context(&self) -> TurnContext {
        TurnContext {
            turn: self.turn_counter + 1,
            player: self.current_player().name().to_string(),
            opponent: self.player(self.current.opponent()).name().to_string(),
            last_word: self.last_word.clone(),
            used_words: self.used.iter().map(|w| w.text().to_string()).collect(),
        }
    }
}

/// What a player needs to know to produce the next word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    /// 1-based number of the turn being played
    pub turn: u32,
    pub player: String,
    pub opponent: String,
    pub last_word: Option<Word>,
    /// Accepted words, oldest first
    pub used_words: Vec<String>,
}

impl TurnContext {
    /// Character the next word has to start with; None on the opening move
    pub fn required_initial(&self) -> Option<char> {
        self.last_word.as_ref().map(Word::final_char)
    }

    pub fn is_opening(&self) -> bool {
        self.last_word.is_none()
    }

    /// The last `n` used words, oldest first
    pub fn recent_words(&self, n: usize) -> &[String] {
        let start = self.used_words.len().saturating_sub(n);
        &self.used_words[start..]
    }

    /// Whether `candidate` was already used, compared the same way the engine does
    pub fn is_used(&self, candidate: &Word) -> bool {
        let key = candidate.key();
        self.used_words
            .iter()
            .filter_map(Word::new)
            .any(|w| w.key() == key)
    }
}

//! # Shiritori Agent
//!
//! Players and the game runner:
//! 1. The runner asks the player to move for a `TurnContext`
//! 2. The player answers with a word (LLM reply or vocabulary lookup)
//! 3. Every answer is bounded by the per-turn timeout; running out is "no response"
//! 4. The turn engine validates the word and advances the state
//! 5. Repeat until a loss, a resignation or the turn limit
//!
//! The provider proposes, the engine decides.

mod dictionary;
mod game;
mod player;

pub use dictionary::DictionaryPlayer;
pub use game::{Game, GameReport, TurnCallback};
pub use player::{build_prompt, LlmPlayer, Player, PlayerMove, DEFAULT_TEMPERATURE};

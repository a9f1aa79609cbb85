//! # Shiritori Core
//!
//! Rules and state for a two-player game of shiritori (しりとり), plus the
//! text-generation providers the players talk to.
//!
//! ## Core Concepts
//! - **Word**: A candidate reply, compared by its normalized kana
//! - **GameState**: Players, history, used words and the current status
//! - **TurnEngine**: Validates one move and advances the state
//! - **GameLog**: The JSON record written when a game ends
//! - **Exchange**: Typed request / response messages between the two agents
//! - **Provider**: Trait-based text generation (Gemini, OpenAI-compatible)

pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod message;
pub mod provider;
pub mod state;
pub mod stats;
pub mod word;

pub use config::GameConfig;
pub use engine::{TurnEngine, TurnOutcome};
pub use error::{Error, ErrorKind, Result};
pub use log::{FileSink, FinalStatus, GameLog, LogSink, MemorySink};
pub use message::{A2aMessage, Exchange, MessageHistory, MessageStatus, MessageType};
pub use provider::{
    AnyProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason,
    GeminiProvider, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType,
    Role, Usage,
};
pub use state::{
    GameState, GameStatus, LossReason, Player, Seat, TurnContext, TurnRecord, UsedWordSet,
};
pub use stats::{GameStats, PlayerStats};
pub use word::Word;

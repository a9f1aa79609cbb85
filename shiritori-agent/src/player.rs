//! Players: anything that can propose the next word for a `TurnContext`

use async_trait::async_trait;
use shiritori_core::state::RECENT_WORDS;
use shiritori_core::word::{clean_reply, TERMINAL_SYLLABLE};
use shiritori_core::{ChatMessage, CompletionRequest, LlmProvider, TurnContext};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a player did with its turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerMove {
    /// A candidate word, not yet validated
    Word(String),
    /// Nothing usable came back
    NoWord,
    /// The player gives up; the opponent wins
    Resign,
}

impl PlayerMove {
    /// Map a cleaned reply to a move; blank text is no word at all
    pub fn from_reply(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        if reply.trim().is_empty() {
            PlayerMove::NoWord
        } else {
            PlayerMove::Word(reply)
        }
    }
}

/// Trait for players that can take a turn.
#[async_trait]
pub trait Player: Send {
    /// Display name, matches the name in `GameConfig`
    fn name(&self) -> &str;

    /// Propose the next word. Must not fail: problems become `NoWord`.
    async fn next_word(&mut self, ctx: &TurnContext) -> PlayerMove;
}

// ============================================================================
// Prompts
// ============================================================================

const SYSTEM_PROMPT: &str = "あなたは日本語のしりとりの対戦相手です。\
ひらがなの一般的な名詞を1つだけ答え、説明や記号は付けません。";

/// Build the messages for the current turn
pub fn build_prompt(ctx: &TurnContext) -> Vec<ChatMessage> {
    let user = match (&ctx.last_word, ctx.required_initial()) {
        (Some(previous), Some(initial)) => {
            let recent = ctx.recent_words(RECENT_WORDS).join("、");
            format!(
                "しりとりの続きです。\n\
                 前の単語: {previous}\n\
                 「{initial}」で始まる単語を1つ、ひらがなで答えてください。\n\n\
                 ルール:\n\
                 - 「{initial}」で始まること\n\
                 - 「{TERMINAL_SYLLABLE}」で終わらないこと\n\
                 - 使用済みの単語は使えません: {recent}\n\
                 - 単語のみを答えてください"
            )
        }
        _ => format!(
            "しりとりを始めます。最初の単語を1つ、ひらがなで答えてください。\n\
             「{TERMINAL_SYLLABLE}」で終わらない一般的な名詞を選び、単語のみを答えてください。"
        ),
    };

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

// ============================================================================
// LlmPlayer
// ============================================================================

/// Default sampling temperature for word generation
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on reply length; a word never needs more
const MAX_REPLY_TOKENS: usize = 64;

/// Player backed by a text-generation provider
pub struct LlmPlayer<P: LlmProvider> {
    name: String,
    provider: Arc<P>,
    model: Option<String>,
    temperature: f32,
}

impl<P: LlmProvider> LlmPlayer<P> {
    pub fn new(name: impl Into<String>, provider: Arc<P>) -> Self {
        Self {
            name: name.into(),
            provider,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Override the provider's default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, ctx: &TurnContext) -> CompletionRequest {
        let request = CompletionRequest::new(build_prompt(ctx))
            .with_temperature(self.temperature)
            .with_max_tokens(MAX_REPLY_TOKENS);
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> Player for LlmPlayer<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_word(&mut self, ctx: &TurnContext) -> PlayerMove {
        let request = self.request(ctx);
        match self.provider.complete(request).await {
            Ok(response) => {
                let raw = response.content.unwrap_or_default();
                // Models sometimes add an explanation on later lines
                let first_line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
                let word = clean_reply(first_line);
                debug!(
                    player = %self.name,
                    provider = self.provider.name(),
                    raw = %raw,
                    word = %word,
                    "reply received"
                );
                PlayerMove::from_reply(word)
            }
            Err(e) => {
                warn!(
                    player = %self.name,
                    provider = self.provider.name(),
                    error = %e.into_error(self.provider.name()),
                    "word generation failed"
                );
                PlayerMove::NoWord
            }
        }
    }
}

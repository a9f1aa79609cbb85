//! # Text-Generation Providers
//!
//! A trait-based abstraction for the external service that proposes words.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface (one prompt in, one reply out)
//! - Implementations for Google Gemini and OpenAI-compatible endpoints
//!   (OpenAI itself, Ollama, vLLM and other local servers)
//! - `AnyProvider` picks an implementation at runtime from a `ProviderConfig`
//! - Transport failures are reported as `ProviderError`; callers in the game
//!   loop turn them into "no response" instead of aborting

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use crate::error::{self, Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// The system message, if one was given
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub model: String,
    /// Reply text, already trimmed; None when the service returned nothing
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Trim a reply, mapping blank text to None
pub(crate) fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Model not found
    ModelNotFound(String),
    /// Authentication failed
    AuthenticationFailed,
    /// The service answered without any text
    EmptyResponse,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::EmptyResponse => write!(f, "No content in response"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Wrap into the workspace error, keeping this error as the source
    pub fn into_error(self, provider: &str) -> Error {
        let message = self.to_string();
        let err = match &self {
            Self::Network(_) => error::network_failed(message),
            Self::Api { status, .. } if *status >= 500 => error::provider_unavailable(message),
            Self::Api { .. } | Self::EmptyResponse | Self::Other(_) => {
                error::inference_failed(message)
            }
            Self::Parse(_) => error::parse_error(message),
            Self::RateLimited { retry_after } => error::rate_limited(*retry_after),
            Self::ModelNotFound(_) => Error::config_invalid(message),
            Self::AuthenticationFailed => error::authentication_failed(provider),
        };
        err.with_operation("provider::complete")
            .with_context("provider", provider)
            .set_source(self)
    }
}

/// The main text-generation provider trait. Returned futures are `Send`.
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini", "openai")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = std::result::Result<CompletionResponse, ProviderError>> + Send;

    /// Simple prompt -> response helper
    fn prompt(&self, prompt: &str) -> impl Future<Output = std::result::Result<String, ProviderError>> + Send {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        async move {
            let response = self.complete(request).await?;
            response.content.ok_or(ProviderError::EmptyResponse)
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
    Local,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
            ProviderType::Local => "local",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("GOOGLE_API_KEY"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Local => None,
        }
    }
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some(gemini::GEMINI_API_BASE.into()),
            default_model: Some(gemini::DEFAULT_MODEL.into()),
            timeout_secs: Some(120),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some(openai::OPENAI_API_BASE.into()),
            default_model: Some("gpt-4o-mini".into()),
            timeout_secs: Some(120),
        }
    }

    /// OpenAI-compatible server without authentication (e.g. Ollama)
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            timeout_secs: Some(300),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Fail fast on settings that can never produce a working client
    pub fn validate(&self) -> Result<()> {
        if let Some(var) = self.provider_type.api_key_var() {
            if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err(error::config_invalid(format!("{} is not set", var))
                    .with_context("provider", self.provider_type.as_str()));
            }
        }
        if self.base_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(error::config_invalid("base URL is empty")
                .with_context("provider", self.provider_type.as_str()));
        }
        Ok(())
    }

    /// HTTP client honoring the configured timeout
    pub(crate) fn build_client(&self, default_timeout: u64) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs.unwrap_or(default_timeout)))
            .build()
            .map_err(|e| {
                error::provider_unavailable("failed to create HTTP client")
                    .with_operation("provider::build_client")
                    .with_context("provider", self.provider_type.as_str())
                    .set_source(e)
            })
    }
}

// ============================================================================
// Runtime selection
// ============================================================================

/// A provider chosen at runtime from configuration
pub enum AnyProvider {
    Gemini(GeminiProvider),
    OpenAI(OpenAIProvider),
}

impl AnyProvider {
    /// Validate the config and build the matching client
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        match config.provider_type {
            ProviderType::Gemini => Ok(Self::Gemini(GeminiProvider::new(config)?)),
            ProviderType::OpenAI | ProviderType::Local => Ok(Self::OpenAI(OpenAIProvider::new(config)?)),
        }
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::OpenAI(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Gemini(p) => p.default_model(),
            Self::OpenAI(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        match self {
            Self::Gemini(p) => p.complete(request).await,
            Self::OpenAI(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are a shiritori player");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are a shiritori player");

        assert_eq!(ChatMessage::user("りんご").role, Role::User);
        assert_eq!(ChatMessage::assistant("ごりら").role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("rules"),
            ChatMessage::user("next word"),
        ])
        .with_model("gemini-2.0-flash")
        .with_temperature(0.7)
        .with_max_tokens(32);

        assert_eq!(request.model, Some("gemini-2.0-flash".into()));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(32));
        assert_eq!(request.system_prompt(), Some("rules"));
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::gemini("key");
        assert_eq!(config.provider_type, ProviderType::Gemini);
        assert_eq!(config.default_model.as_deref(), Some(gemini::DEFAULT_MODEL));
        assert!(config.validate().is_ok());

        let config = ProviderConfig::local("http://localhost:11434/v1", "llama3");
        assert_eq!(config.provider_type.api_key_var(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = ProviderConfig::gemini("").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("GOOGLE_API_KEY"));

        let err = AnyProvider::from_config(ProviderConfig::openai("  ")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_provider_error_kinds() {
        let kind = |e: ProviderError| e.into_error("gemini").kind();
        assert_eq!(kind(ProviderError::AuthenticationFailed), ErrorKind::AuthenticationFailed);
        assert_eq!(
            kind(ProviderError::Api { status: 503, message: String::new() }),
            ErrorKind::ProviderUnavailable
        );
        assert_eq!(
            kind(ProviderError::Api { status: 400, message: String::new() }),
            ErrorKind::InferenceFailed
        );
        assert_eq!(kind(ProviderError::EmptyResponse), ErrorKind::InferenceFailed);
        assert_eq!(kind(ProviderError::Network("refused".into())), ErrorKind::NetworkFailed);
        assert_eq!(kind(ProviderError::Parse("eof".into())), ErrorKind::ParseFailed);
        assert_eq!(kind(ProviderError::ModelNotFound("x".into())), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_into_error_context() {
        let err = ProviderError::RateLimited { retry_after: Some(5) }.into_error("gemini");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.operation(), "provider::complete");
        assert_eq!(
            err.context(),
            [
                ("retry_after_secs", "5".to_string()),
                ("provider", "gemini".to_string())
            ]
        );
        assert!(err.source_ref().is_some());

        let err = ProviderError::AuthenticationFailed.into_error("openai");
        assert_eq!(err.message(), "openai rejected the API key");
        assert_eq!(err.context(), [("provider", "openai".to_string())]);
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(Some("  りんご\n".into())), Some("りんご".into()));
        assert_eq!(trimmed(Some(" \n".into())), None);
        assert_eq!(trimmed(None), None);
    }

    struct Canned(Option<&'static str>);

    impl LlmProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn default_model(&self) -> &str {
            "none"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            assert_eq!(request.messages.last().map(|m| m.role), Some(Role::User));
            Ok(CompletionResponse {
                model: "none".into(),
                content: trimmed(self.0.map(String::from)),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    #[test]
    fn test_prompt_helpers() {
        let reply = tokio_test::block_on(Canned(Some(" ごりら ")).prompt("りんご"));
        assert_eq!(reply.unwrap(), "ごりら");

        let reply = tokio_test::block_on(Canned(None).prompt("りんご"));
        assert!(matches!(reply, Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn test_any_provider_dispatch() {
        let provider = AnyProvider::from_config(ProviderConfig::gemini("key")).unwrap();
        assert_eq!(provider.name(), "gemini");

        let provider =
            AnyProvider::from_config(ProviderConfig::local("http://localhost:11434/v1", "llama3"))
                .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "llama3");
    }
}

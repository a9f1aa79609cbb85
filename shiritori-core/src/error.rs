//! Core error types
//!
//! Re-exports shiritori-error and provides crate-specific conveniences.

pub use shiritori_error::{Error, ErrorKind, Result};

// =============================================================================
// Core error constructors
// =============================================================================

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message).with_operation("config::validate")
}

/// Create a GameFinished error
pub fn game_finished(status: impl Into<String>) -> Error {
    Error::game_finished(status).with_operation("engine::play_turn")
}

/// Create an InferenceFailed error
pub fn inference_failed(reason: impl Into<String>) -> Error {
    Error::inference_failed(reason)
}

/// Create a ProviderUnavailable error
pub fn provider_unavailable(reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::ProviderUnavailable, reason)
}

/// Create an AuthenticationFailed error
pub fn authentication_failed(provider: &str) -> Error {
    Error::new(
        ErrorKind::AuthenticationFailed,
        format!("{} rejected the API key", provider),
    )
}

/// Create a RateLimited error
pub fn rate_limited(retry_after: Option<u64>) -> Error {
    let err = Error::new(ErrorKind::RateLimited, "rate limited by provider");
    match retry_after {
        Some(secs) => err.with_context("retry_after_secs", secs.to_string()),
        None => err,
    }
}

/// Create a NetworkFailed error
pub fn network_failed(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::NetworkFailed, message)
}

/// Create a ParseFailed error
pub fn parse_error(message: impl Into<String>) -> Error {
    Error::parse_failed(message)
}

/// Create a SerializationFailed error
pub fn serialization_error(message: impl Into<String>) -> Error {
    Error::serialization_failed(message)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

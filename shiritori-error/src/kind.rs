//! Error kinds for shiritori operations

use std::fmt;

/// The kind of error that occurred.
///
/// Rule violations during a game are NOT errors: they resolve into the game
/// status. These kinds cover setup, provider and export failures, plus
/// misuse of the engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Game errors
    // =========================================================================
    /// A move was submitted to a game that already ended
    GameFinished,

    // =========================================================================
    // Text generation errors
    // =========================================================================
    /// Text generation failed
    InferenceFailed,

    /// Provider not available
    ProviderUnavailable,

    /// The provider rejected our credentials
    AuthenticationFailed,

    /// Rate limit exceeded
    RateLimited,

    /// An operation did not finish before its deadline
    Timeout,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Serialization errors
    // =========================================================================
    /// Serialization/deserialization failed
    SerializationFailed,

    /// Failed to parse input
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Game
            ErrorKind::GameFinished => "GameFinished",

            // Text generation
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::Timeout => "Timeout",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Serialization
            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::ParseFailed => "ParseFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

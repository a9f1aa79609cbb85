//! # shiritori-error
//!
//! Unified error handling for the shiritori workspace, following OpenDAL's
//! error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ConfigInvalid, InferenceFailed)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! Rule violations inside a game (duplicate word, forbidden ending, timeout)
//! are game outcomes, not errors. Errors are reserved for setup failures,
//! provider failures and log export.
//!
//! ## Usage
//!
//! ```rust
//! use shiritori_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ConfigInvalid, "GOOGLE_API_KEY is not set")
//!         .with_operation("config::validate")
//!         .with_context("provider", "gemini"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, shiritori_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the shiritori Error
pub type Result<T> = std::result::Result<T, Error>;

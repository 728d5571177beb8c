//! Error types for kshell
//!
//! Commands return `Result` values; the shell loop is the single point where
//! errors are translated into user-facing text, so the variants here map onto
//! the kinds of message the loop prints.

use thiserror::Error;

/// Result type alias for kshell operations
pub type Result<T> = std::result::Result<T, ShellError>;

/// Main error type for kshell
#[derive(Debug, Error)]
pub enum ShellError {
    /// Malformed command line: too few tokens, unknown subtype, bad number.
    /// Printed as-is without contacting the broker.
    #[error("{0}")]
    Syntax(String),

    /// A broker request failed; carries the client library's message verbatim
    #[error("{0}")]
    Admin(String),

    /// Profile or connection configuration problem
    #[error("configuration error: {0}")]
    Config(String),

    /// Record formatting failed (bad codec name, undecodable payload)
    #[error("{0}")]
    Format(String),

    /// I/O error on the console or profile file
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The shell was interrupted and should exit cleanly
    #[error("interrupted")]
    Interrupted,
}

impl ShellError {
    /// Shorthand for a syntax error message
    pub fn syntax(msg: impl Into<String>) -> Self {
        ShellError::Syntax(msg.into())
    }

    /// Shorthand for a broker request error message
    pub fn admin(msg: impl std::fmt::Display) -> Self {
        ShellError::Admin(msg.to_string())
    }
}

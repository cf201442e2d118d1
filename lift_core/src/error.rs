//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unrecognized character or malformed numeric in a shorthand expression
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token stream does not match the expression grammar
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Semantic error in user-authored expressions (undefined or duplicate
    /// identifiers, incomplete shorthand)
    #[error("User code error: {0}")]
    UserCode(String),

    /// Shorthand resolution attempted while disabled by the program defaults
    #[error("Shorthand not allowed: {0}")]
    ShorthandNotAllowed(String),

    /// Rendered output cannot be written in the requested format
    #[error("Export error: {0}")]
    Export(String),

    /// Structural mismatch in a program document, or a dangling reference
    #[error("Invalid program: {0}")]
    InvalidProgram(String),
}

impl Error {
    /// Build an [`Error::InvalidProgram`] qualified by a document path
    pub(crate) fn at(path: &str, message: impl std::fmt::Display) -> Self {
        if path.is_empty() {
            Error::InvalidProgram(message.to_string())
        } else {
            Error::InvalidProgram(format!("{} - {}", path, message))
        }
    }

    /// Prefix an expression error with where it occurred, keeping its kind
    pub(crate) fn context(self, location: impl std::fmt::Display) -> Self {
        match self {
            Error::InvalidToken(m) => Error::InvalidToken(format!("{}: {}", location, m)),
            Error::Parsing(m) => Error::Parsing(format!("{}: {}", location, m)),
            Error::UserCode(m) => Error::UserCode(format!("{}: {}", location, m)),
            Error::ShorthandNotAllowed(m) => {
                Error::ShorthandNotAllowed(format!("{}: {}", location, m))
            }
            other => other,
        }
    }
}

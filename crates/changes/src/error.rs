use declmap_declarations::{DeclarationError, MatchError};
use thiserror::Error;

/// Result type for change detection
pub type Result<T> = std::result::Result<T, ChangeError>;

/// Errors that can occur while attributing a patch to declarations
#[derive(Error, Debug)]
pub enum ChangeError {
    /// Parser construction or file parsing failed
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Hunks were fed to a matcher out of order
    #[error("Hunk ordering error: {0}")]
    Match(#[from] MatchError),

    /// The revision source could not provide a file
    #[error("Failed to read {path} at {revision}: {message}")]
    Source {
        path: String,
        revision: String,
        message: String,
    },

    /// A patch lacks the file version its status requires
    #[error("Patch for {path} has no {side} revision")]
    MissingContent { path: String, side: &'static str },

    /// Hunk range whose end lies before its start
    #[error("Invalid hunk range: start={start}, end={end}")]
    InvalidHunk { start: usize, end: usize },

    /// Status character other than A, D, M or R
    #[error("Unsupported file status '{0}'")]
    UnsupportedStatus(char),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be decoded
    #[error("Config parse error: {0}")]
    Config(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChangeError {
    /// Create a revision source error
    pub fn read_failed(
        path: impl Into<String>,
        revision: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Source {
            path: path.into(),
            revision: revision.into(),
            message: message.into(),
        }
    }

    /// Create a missing content error
    pub fn missing_content(path: impl Into<String>, side: &'static str) -> Self {
        Self::MissingContent {
            path: path.into(),
            side,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a config parse error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

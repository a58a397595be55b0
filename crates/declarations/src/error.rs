use thiserror::Error;

/// Result type for declaration parsing and matching
pub type Result<T> = std::result::Result<T, DeclarationError>;

/// Errors surfaced by the declaration layer.
///
/// Malformed source text is never an error: the parser recovers locally and
/// yields a partial tree. What remains are caller mistakes, configuration
/// problems and file IO. Matcher misuse has its own [`MatchError`].
#[derive(Error, Debug)]
pub enum DeclarationError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hand-assembled tree breaks span containment or ordering
    #[error("Malformed declaration tree: {0}")]
    MalformedTree(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DeclarationError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Contract violations of the forward-only position matcher
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// Positions must arrive in non-decreasing order
    #[error("position {requested} queried after position {previous}; matcher positions must be non-decreasing")]
    OutOfOrder { previous: usize, requested: usize },

    /// A range whose end lies before its start
    #[error("invalid range: start={start}, end={end}")]
    InvalidRange { start: usize, end: usize },
}

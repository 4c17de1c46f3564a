use thiserror::Error;

/// Result type alias using the graph engine's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that indicate a malformed call rather than an algorithmic outcome.
///
/// Algorithmic absence (self-loops, unreachable targets, unknown lookup ids,
/// non-converging power iteration) is reported through `Option`, empty
/// collections or flags, never through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation required a pre-existing node that is not in the graph.
    #[error("node '{0}' not found")]
    NodeNotFound(String),

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for the recorder.

use thiserror::Error;

/// Errors surfaced while building a recorder or decoding entry keys.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// An ignore or grouping pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An entry key was not valid JSON.
    #[error("entry key is not valid JSON: {0}")]
    KeyJson(#[from] serde_json::Error),

    /// An entry key parsed but did not have the expected shape.
    #[error("entry key is not a [method, path, via, bag, field, message?] array")]
    KeyShape,
}

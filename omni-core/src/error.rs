//! Error types for omni-core.

use thiserror::Error;

/// Why a group-membership or attribute field could not be read.
///
/// These never abort a run: callers log them as warnings and fall back to an
/// empty value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The embedded text was not valid JSON.
    #[error("could not parse {raw:?} as JSON: {message}")]
    InvalidJson { raw: String, message: String },

    /// The embedded JSON decoded, but not to an array.
    #[error("expected a JSON array, got {raw:?}")]
    NotAList { raw: String },

    /// The embedded JSON decoded, but not to an object.
    #[error("expected a JSON object, got {raw:?}")]
    NotAnObject { raw: String },

    /// The field held neither a string nor a list.
    #[error("unsupported {kind} value for a membership field")]
    UnsupportedShape { kind: &'static str },
}

//! Error types for configuration, encoding and decoding.

use thiserror::Error;

use crate::model::Tag;

/// Error in the adapter configuration.
///
/// Detected once, before any value is visited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("illegal tag {tag}: tags below 100 are reserved")]
    ReservedTag { tag: Tag },

    #[error("tags are not unique: {tag}")]
    DuplicateTag { tag: Tag },

    #[error("adapter {adapter} declares no tags")]
    EmptyTagList { adapter: String },
}

/// Error during dehydration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("adapter {adapter} detected undeclared tag {tag}")]
    UndeclaredTag { adapter: String, tag: Tag },

    #[error("nesting depth exceeds maximum {max}")]
    DepthLimitExceeded { max: usize },

    #[error("root value is not serializable")]
    RootOmitted,

    #[error("adapter {adapter} failed: {message}")]
    Adapter { adapter: String, message: String },
}

/// Error during hydration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("nesting depth exceeds maximum {max}")]
    DepthLimitExceeded { max: usize },

    #[error("unexpected reference: {slot}")]
    UnresolvedReference { slot: u64 },

    #[error("reference slot is not a non-negative integer")]
    MalformedReference,

    #[error("invalid big integer: {text:?}")]
    InvalidBigInt { text: String },

    #[error("malformed tagged value {tag}: {context}")]
    MalformedTaggedValue { tag: u64, context: &'static str },

    #[error("unexpected tag: {tag}")]
    UnknownTag { tag: u64 },

    #[error("adapter {adapter} rejected payload: {context}")]
    InvalidPayload { adapter: String, context: String },
}

impl DecodeError {
    /// Shorthand for adapters reporting a payload they cannot unpack.
    pub fn invalid_payload(adapter: &str, context: impl Into<String>) -> Self {
        DecodeError::InvalidPayload {
            adapter: adapter.to_string(),
            context: context.into(),
        }
    }
}

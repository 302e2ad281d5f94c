use thiserror::Error;

/// Unified error type for the tributary configuration engine.
#[derive(Error, Debug)]
pub enum TributaryError {
    // ── Source errors ──────────────────────────────────────────
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("watch subscription failed: {0}")]
    SubscriptionFailed(String),

    // ── Decode / mapping errors ────────────────────────────────
    #[error("decode error ({format}): {reason}")]
    Decode { format: String, reason: String },

    #[error("no decoder registered for format: {0}")]
    UnknownFormat(String),

    #[error("schema mapping failed: {0}")]
    SchemaMapping(String),

    #[error("merge error: {0}")]
    Merge(String),

    // ── Lifecycle errors ───────────────────────────────────────
    #[error("operation cancelled")]
    Cancelled,

    #[error("stop failed: {0}")]
    Stop(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TributaryError {
    /// Shorthand for a `Decode` error against a named format.
    pub fn decode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TributaryError>;

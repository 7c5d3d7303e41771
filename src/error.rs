use thiserror::Error;

/// Engine-level error taxonomy.
///
/// Per-item hydration failures never surface through this type; they are
/// logged and dropped inside the batch loader so one bad token cannot fail
/// a whole synchronization cycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Retryable network-level failure (ledger RPC or content gateway).
    #[error("transient network error: {0}")]
    Transient(String),

    /// A synchronization cycle failed at the enumeration/batch level.
    /// The previous catalog snapshot stays in place.
    #[error("catalog synchronization failed: {0}")]
    Sync(String),

    /// Missing or malformed collaborator configuration. Fatal, not retried.
    #[error("configuration error: {0}")]
    Terminal(String),
}

impl EngineError {
    pub fn transient(msg: impl std::fmt::Display) -> Self {
        EngineError::Transient(msg.to_string())
    }

    pub fn terminal(msg: impl std::fmt::Display) -> Self {
        EngineError::Terminal(msg.to_string())
    }
}

/// Failure to resolve a content-addressed metadata document.
///
/// Carries the identifier it was asked to resolve; the resolver never
/// synthesizes a partial document in place of an error.
#[derive(Debug, Clone, Error)]
#[error("metadata fetch failed for '{identifier}': {reason}")]
pub struct MetadataFetchError {
    pub identifier: String,
    pub reason: String,
    /// Whether a retry could plausibly succeed (network/5xx vs malformed body).
    pub transient: bool,
}

impl MetadataFetchError {
    pub fn transient(identifier: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            identifier: identifier.into(),
            reason: reason.to_string(),
            transient: true,
        }
    }

    pub fn permanent(identifier: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            identifier: identifier.into(),
            reason: reason.to_string(),
            transient: false,
        }
    }
}

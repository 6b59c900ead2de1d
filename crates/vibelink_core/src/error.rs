use serde::Serialize;
use thiserror::Error;

/// A block field failed validation. Nothing was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty for {0} blocks")]
    EmptyTitle(&'static str),

    #[error("Gated links need a non-empty secret")]
    EmptySecret,

    #[error("Target '{0}' is not a valid absolute URL")]
    InvalidTarget(String),

    #[error("Field '{field}' does not apply to {kind} blocks")]
    FieldNotApplicable {
        field: &'static str,
        kind: &'static str,
    },

    #[error("Unknown block type '{0}'")]
    UnknownKind(String),

    #[error("Unknown block style '{0}'")]
    UnknownStyle(String),

    #[error("Order does not match the owner's blocks: {0}")]
    OrderMismatch(String),
}

/// Unified error type for vibelink operations
#[derive(Debug, Error)]
pub enum VibelinkError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Block '{0}' not found")]
    NotFound(String),

    #[error("Stored block '{id}' is corrupt: {reason}")]
    CorruptRow { id: String, reason: String },

    /// Transport or backend failure. Callers surface this as "sync failed".
    #[error("Data store error: {0}")]
    Store(String),
}

/// Result type alias for vibelink operations
pub type Result<T> = std::result::Result<T, VibelinkError>;

impl VibelinkError {
    /// Whether this is a store/transport failure rather than a caller mistake.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, VibelinkError::Store(_) | VibelinkError::CorruptRow { .. })
    }

    /// Convert to a serializable representation for HTTP bodies
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of VibelinkError for HTTP responses
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&VibelinkError> for SerializableError {
    fn from(err: &VibelinkError) -> Self {
        let kind = match err {
            VibelinkError::Validation(_) => "Validation",
            VibelinkError::NotFound(_) => "NotFound",
            VibelinkError::CorruptRow { .. } => "CorruptRow",
            VibelinkError::Store(_) => "Store",
        }
        .to_string();

        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<VibelinkError> for SerializableError {
    fn from(err: VibelinkError) -> Self {
        SerializableError::from(&err)
    }
}

use std::collections::HashMap;

/// Shared error taxonomy for the store and engine crates.
///
/// Variant names are the conceptual taxonomy callers (and the HTTP edge)
/// switch on; `Internal` is a catch-all for failures that are not the
/// caller's fault and must never leak their message to an external client.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed")]
    Validation(HashMap<String, String>),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient asset")]
    InsufficientAsset,

    #[error("asset not found")]
    AssetNotFound,

    #[error("order cannot be cancelled")]
    CannotCancel,

    #[error("not found")]
    NotFound,

    #[error("store conflict")]
    StoreConflict,

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.into(), message.into());
        EngineError::Validation(errors)
    }

    /// Human-readable reason surfaced verbatim to the caller for
    /// reservation/cancellation failures (never for `Internal`).
    pub fn reason(&self) -> String {
        match self {
            EngineError::InsufficientBalance => "insufficient balance".to_string(),
            EngineError::InsufficientAsset => "insufficient asset".to_string(),
            EngineError::AssetNotFound => "asset not found".to_string(),
            EngineError::CannotCancel => "order is not open".to_string(),
            EngineError::NotFound => "order not found".to_string(),
            EngineError::StoreConflict => "could not complete request, please retry".to_string(),
            EngineError::Arithmetic(msg) => msg.clone(),
            EngineError::Validation(_) => "validation failed".to_string(),
            EngineError::Internal(_) => "internal error".to_string(),
        }
    }
}

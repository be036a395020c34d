//! Settlement error types

use thiserror::Error;
use trading::TradingError;

/// Errors that can occur while composing and confirming a settlement
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    /// Bad apply/confirm input; the session stays usable
    #[error("Validation error: {0}")]
    Validation(String),

    /// One trading method failed to negotiate
    #[error("Negotiation with '{method}' failed: {message}")]
    Negotiation { method: String, message: String },

    /// Persistence failed; confirm may be retried
    #[error("Repository error: {0}")]
    Repository(String),

    /// Business partner lookup failed or found no match
    #[error("Business partner resolution failed: {0}")]
    Resolution(String),

    /// Business partner type is neither customer nor supplier
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Operation not allowed in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A collaborator is missing or belongs to the other side
    #[error("Wiring error: {0}")]
    Wiring(String),

    /// Registry or lookup error from the trading crate
    #[error(transparent)]
    Trading(TradingError),
}

impl From<TradingError> for SettlementError {
    fn from(error: TradingError) -> Self {
        match error {
            TradingError::Negotiation { method, message } => Self::Negotiation { method, message },
            other => Self::Trading(other),
        }
    }
}

impl SettlementError {
    /// Fatal errors end the session before any trading can occur
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SettlementError::Resolution(_) | SettlementError::UnsupportedOperation(_) | SettlementError::Wiring(_)
        )
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SettlementError::Validation(message) | SettlementError::Repository(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;

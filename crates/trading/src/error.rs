//! Trading error types

use common::TradingSide;
use thiserror::Error;

/// Errors raised by trading methods and their registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradingError {
    /// One method's negotiation failed; other methods are unaffected
    #[error("Negotiation with '{method}' failed: {message}")]
    Negotiation { method: String, message: String },

    /// A method with the same id is already registered
    #[error("Trading method already registered: {0}")]
    DuplicateMethod(String),

    /// The method was built for the other registry side
    #[error("Trading method '{method}' is a {method_side} method, registry is {registry_side}")]
    SideMismatch {
        method: String,
        method_side: TradingSide,
        registry_side: TradingSide,
    },

    /// The asset lookup could not be reached
    #[error("Asset lookup unavailable: {0}")]
    LookupUnavailable(String),
}

impl TradingError {
    /// Create a negotiation error for a method
    pub fn negotiation(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Negotiation {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Result type for trading operations
pub type Result<T> = std::result::Result<T, TradingError>;

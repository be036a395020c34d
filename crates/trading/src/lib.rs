//! Trading methods for ReceiptPayment
//!
//! This crate owns everything that offers ways to settle a document.
//!
//! # Features
//!
//! - Trading method trait and descriptors
//! - Per-side method registries
//! - Built-in cash and business partner asset methods
//! - Concurrent negotiation with per-method failure isolation
//!
//! # Feature Flags
//!
//! - `client` - Enable the HTTP asset lookup

pub mod types;
pub mod error;
pub mod method;
pub mod methods;
pub mod clients;
pub mod registry;
pub mod negotiation;

// Re-export commonly used types
pub use types::{NegotiationContext, TradingOption};
pub use error::{Result, TradingError};
pub use method::{ContributionStyle, MethodDescriptor, TradingMethod};
pub use registry::{register_builtin_methods, MethodRegistries, MethodRegistry};
pub use negotiation::{NegotiationOutcome, NegotiationReport, Negotiator};

// Method exports
pub use methods::{
    BusinessPartnerAssetMethod, CashMethod, PAYMENT_CASH_METHOD_ID, RECEIPT_BP_ASSET_METHOD_ID,
    RECEIPT_CASH_METHOD_ID, TRADING_MODE_BP_ASSET, TRADING_MODE_CASH,
};

// Client exports
pub use clients::asset::{AssetLookup, AssetRequest, BusinessPartnerAsset, MockAssetLookup};

#[cfg(feature = "client")]
pub use clients::asset::http::HttpAssetLookup;

//! Settlement for ReceiptPayment
//!
//! This crate turns negotiated trading options into persisted receipts and
//! payments.
//!
//! # Features
//!
//! - Settlement sessions with an explicit state machine
//! - Composition of applied tradings with reconciliation checks
//! - Repository trait with an in-memory implementation
//! - Presentation sinks (recording, channel, tracing)

pub mod types;
pub mod error;
pub mod store;
pub mod sink;
pub mod composer;
pub mod service;

// Re-export commonly used types
pub use types::{
    AppliedTrading, DocumentKind, SessionState, SettlementDocument, SettlementItem, SettlementRequest, UserIntent,
};
pub use error::{Result, SettlementError};
pub use composer::SettlementComposer;
pub use service::{SettlementService, SettlementServiceBuilder, SettlementSession};

// Store exports
pub use store::traits::SettlementRepository;
pub use store::memory::InMemorySettlementRepository;

// Sink exports
pub use sink::{ChannelSink, MessageLevel, PresentationSink, RecordingSink, TracingSink, ViewEvent};

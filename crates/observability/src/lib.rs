//! Observability infrastructure for ReceiptPayment
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics for negotiation and settlement
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("rpx", LogFormat::Pretty)?;
//!
//! // Optional Prometheus exporter
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_from_config, LogFormat};
pub use metrics::{init_metrics, NegotiationOutcomeLabel, SettlementMetrics};

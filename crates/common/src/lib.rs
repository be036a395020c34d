//! Common types and utilities for ReceiptPayment
//!
//! This crate provides shared types used across the trading and
//! settlement crates.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (business partner, target, side, operation result)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

//! Built-in trading methods

pub mod asset;
pub mod cash;

pub use asset::{BusinessPartnerAssetMethod, RECEIPT_BP_ASSET_METHOD_ID, TRADING_MODE_BP_ASSET};
pub use cash::{CashMethod, PAYMENT_CASH_METHOD_ID, RECEIPT_CASH_METHOD_ID, TRADING_MODE_CASH};

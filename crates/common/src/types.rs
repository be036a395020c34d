//! Common types used across ReceiptPayment
//!
//! This module provides the business partner, target document and
//! trading side types shared by the trading and settlement crates.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Business partner type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessPartnerType {
    /// Customer - money is received from them
    Customer,
    /// Supplier - money is paid to them
    Supplier,
}

impl BusinessPartnerType {
    /// Returns the canonical code for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessPartnerType::Customer => "customer",
            BusinessPartnerType::Supplier => "supplier",
        }
    }
}

impl std::fmt::Display for BusinessPartnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusinessPartnerType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "c" => Ok(Self::Customer),
            "supplier" | "s" => Ok(Self::Supplier),
            other => Err(Error::unsupported(format!(
                "business partner type '{}' is neither customer nor supplier",
                other
            ))),
        }
    }
}

/// A resolved business partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessPartner {
    /// Partner type
    #[serde(rename = "type")]
    pub partner_type: BusinessPartnerType,
    /// Partner code
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

impl BusinessPartner {
    pub fn new(partner_type: BusinessPartnerType, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            partner_type,
            code: code.into(),
            name: name.into(),
        }
    }
}

/// The source document a settlement is applied against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTarget {
    /// Document type (e.g. "SalesOrder")
    pub document_type: String,
    /// Document entry number
    pub document_entry: i64,
    /// Document line, when settling a single line
    #[serde(default)]
    pub document_line_id: Option<i64>,
    /// Amount outstanding on the document
    pub total: f64,
    /// Document currency
    pub currency: String,
}

impl SettlementTarget {
    /// True when the target carries a usable document reference and total
    pub fn is_usable(&self) -> bool {
        !self.document_type.trim().is_empty()
            && self.document_entry > 0
            && self.total.is_finite()
            && self.total >= 0.0
    }
}

/// Which side of the ledger a settlement sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingSide {
    /// Money coming in
    Receipt,
    /// Money going out
    Payment,
}

impl TradingSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingSide::Receipt => "receipt",
            TradingSide::Payment => "payment",
        }
    }
}

impl std::fmt::Display for TradingSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradingSide {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receipt" => Ok(Self::Receipt),
            "payment" => Ok(Self::Payment),
            other => Err(Error::invalid_input(format!("unknown trading side: {}", other))),
        }
    }
}

/// Result envelope returned by remote repositories
///
/// A `result_code` of 0 means success; anything else is a failure and
/// `message` carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub result_code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Vec::new")]
    pub result_objects: Vec<T>,
}

impl<T> OperationResult<T> {
    /// Successful result carrying the given objects
    pub fn success(result_objects: Vec<T>) -> Self {
        Self {
            result_code: 0,
            message: String::new(),
            result_objects,
        }
    }

    /// Failed result with code -1
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result_code: -1,
            message: message.into(),
            result_objects: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// First result object, if any
    pub fn first(&self) -> Option<&T> {
        self.result_objects.first()
    }

    /// Convert into the result objects, or the failure message
    pub fn into_result(self) -> std::result::Result<Vec<T>, String> {
        if self.is_success() {
            Ok(self.result_objects)
        } else if self.message.is_empty() {
            Err(format!("operation failed with result code {}", self.result_code))
        } else {
            Err(self.message)
        }
    }
}

impl<T> Default for OperationResult<T> {
    fn default() -> Self {
        Self::success(Vec::new())
    }
}

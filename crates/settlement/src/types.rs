//! Settlement domain types
//!
//! This module defines the incoming request, the working entries a user
//! applies, and the persisted receipt/payment document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{BusinessPartner, BusinessPartnerType, SettlementTarget, TradingSide};
use trading::TradingOption;

/// A request to settle a document against a business partner
///
/// The partner type is carried as received so that an unsupported type can
/// be reported rather than rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    #[serde(default)]
    pub business_partner_type: Option<String>,
    #[serde(default)]
    pub business_partner_code: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub document_entry: i64,
    #[serde(default)]
    pub document_line_id: Option<i64>,
    #[serde(default)]
    pub document_total: f64,
    #[serde(default)]
    pub document_currency: String,
}

impl SettlementRequest {
    /// Request for a typed partner and a target document
    pub fn new(partner_type: BusinessPartnerType, partner_code: impl Into<String>, target: SettlementTarget) -> Self {
        Self {
            business_partner_type: Some(partner_type.as_str().to_string()),
            business_partner_code: partner_code.into(),
            document_type: target.document_type,
            document_entry: target.document_entry,
            document_line_id: target.document_line_id,
            document_total: target.total,
            document_currency: target.currency,
        }
    }

    /// The target document described by this request
    pub fn target(&self) -> SettlementTarget {
        SettlementTarget {
            document_type: self.document_type.clone(),
            document_entry: self.document_entry,
            document_line_id: self.document_line_id,
            total: self.document_total,
            currency: self.document_currency.clone(),
        }
    }

    /// True when the request names a target document and a partner
    pub fn has_work(&self) -> bool {
        let has_partner_type = self
            .business_partner_type
            .as_deref()
            .map(|partner_type| !partner_type.trim().is_empty())
            .unwrap_or(false);

        has_partner_type && !self.business_partner_code.trim().is_empty() && self.target().is_usable()
    }
}

/// A trading option the user applied with a chosen amount
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTrading {
    /// Identity used for removal
    pub entry_id: Uuid,
    pub option: TradingOption,
    pub amount: f64,
    pub currency: String,
}

impl AppliedTrading {
    pub fn new(option: TradingOption, amount: f64, currency: impl Into<String>) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            option,
            amount,
            currency: currency.into(),
        }
    }
}

/// Kind of persisted settlement document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Receipt,
    Payment,
}

impl From<TradingSide> for DocumentKind {
    fn from(side: TradingSide) -> Self {
        match side {
            TradingSide::Receipt => DocumentKind::Receipt,
            TradingSide::Payment => DocumentKind::Payment,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Receipt => write!(f, "receipt"),
            DocumentKind::Payment => write!(f, "payment"),
        }
    }
}

/// One line of a settlement document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementItem {
    /// 1-based, in application order
    pub line_id: u32,
    pub base_document_type: String,
    pub base_document_entry: i64,
    #[serde(default)]
    pub base_document_line_id: Option<i64>,
    /// Name of the trading method (e.g. `TM_CASH`)
    pub mode: String,
    /// Id of the trading option; empty for cash
    pub trade_id: String,
    pub amount: f64,
    pub currency: String,
}

/// Persisted receipt or payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDocument {
    pub kind: DocumentKind,
    /// Assigned by the repository on save
    #[serde(default)]
    pub doc_entry: Option<i64>,
    pub business_partner_type: BusinessPartnerType,
    pub business_partner_code: String,
    #[serde(default)]
    pub business_partner_name: String,
    #[serde(default)]
    pub items: Vec<SettlementItem>,
    pub created_at: DateTime<Utc>,
}

impl SettlementDocument {
    /// Create an empty, unsaved document for a partner
    pub fn new(kind: DocumentKind, partner: &BusinessPartner) -> Self {
        Self {
            kind,
            doc_entry: None,
            business_partner_type: partner.partner_type,
            business_partner_code: partner.code.clone(),
            business_partner_name: partner.name.clone(),
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a line for an applied trading against the target
    pub fn add_item(&mut self, target: &SettlementTarget, applied: &AppliedTrading) -> &SettlementItem {
        let line_id = self.items.len() as u32 + 1;
        self.items.push(SettlementItem {
            line_id,
            base_document_type: target.document_type.clone(),
            base_document_entry: target.document_entry,
            base_document_line_id: target.document_line_id,
            mode: applied.option.mode().to_string(),
            trade_id: applied.option.id.clone(),
            amount: applied.amount,
            currency: applied.currency.clone(),
        });
        &self.items[self.items.len() - 1]
    }

    /// Sum of all line amounts
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }

    pub fn is_saved(&self) -> bool {
        self.doc_entry.is_some()
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Resolving the business partner
    Init,
    /// Negotiation issued; entries may be applied and removed
    Ready,
    /// Saving the document
    Confirming,
    /// Terminal
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Init => write!(f, "init"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Confirming => write!(f, "confirming"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Intents forwarded by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum UserIntent {
    /// Apply an option; `None` when the user picked nothing
    Apply {
        option: Option<TradingOption>,
        amount: f64,
    },
    Remove { entry_id: Uuid },
    Confirm,
}

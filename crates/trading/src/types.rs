//! Negotiation context and trading options

use common::{BusinessPartner, BusinessPartnerType, SettlementTarget};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::method::MethodDescriptor;

/// Everything a method needs to know to offer options
///
/// Built once per session and shared read-only with every method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationContext {
    pub business_partner_type: BusinessPartnerType,
    pub business_partner_code: String,
    pub document_type: String,
    pub document_entry: i64,
    #[serde(default)]
    pub document_line_id: Option<i64>,
    pub document_total: f64,
    pub document_currency: String,
}

impl NegotiationContext {
    pub fn new(partner: &BusinessPartner, target: &SettlementTarget) -> Self {
        Self {
            business_partner_type: partner.partner_type,
            business_partner_code: partner.code.clone(),
            document_type: target.document_type.clone(),
            document_entry: target.document_entry,
            document_line_id: target.document_line_id,
            document_total: target.total,
            document_currency: target.currency.clone(),
        }
    }
}

/// One selectable way to settle part of a target amount
#[derive(Debug, Clone, PartialEq)]
pub struct TradingOption {
    method: Arc<MethodDescriptor>,
    /// Trade id persisted on the settlement item; empty for cash
    pub id: String,
    pub description: String,
    /// Ceiling or suggested value, absent when the method has none
    pub amount: Option<f64>,
    pub discount: Option<f64>,
    pub icon: Option<String>,
}

impl TradingOption {
    pub fn new(method: Arc<MethodDescriptor>, id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            method,
            id: id.into(),
            description: description.into(),
            amount: None,
            discount: None,
            icon: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// The method that produced this option
    pub fn method(&self) -> &Arc<MethodDescriptor> {
        &self.method
    }

    /// Mode name of the owning method
    pub fn mode(&self) -> &str {
        &self.method.name
    }

    /// True when both options come from the same method and trade id
    pub fn same_trade(&self, other: &TradingOption) -> bool {
        self.method.id == other.method.id && self.id == other.id
    }
}

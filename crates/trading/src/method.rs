//! Trading method trait and metadata

use async_trait::async_trait;
use common::TradingSide;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{NegotiationContext, TradingOption};

/// How a method contributes trading options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStyle {
    /// Exactly one implicit option, no remote call (cash)
    Simple,
    /// Remote lookup; zero-to-many options whose amounts are suggestions
    NegotiatedLookup,
    /// Remote lookup of stored value; option amounts are live balances
    /// that cap what may be applied
    AssetBacked,
}

impl ContributionStyle {
    /// True when negotiation needs a remote call
    pub fn performs_lookup(&self) -> bool {
        !matches!(self, ContributionStyle::Simple)
    }

    /// True when an option's amount caps the total applied against it
    pub fn caps_applied_amount(&self) -> bool {
        matches!(self, ContributionStyle::AssetBacked)
    }
}

/// Immutable identity and metadata of a trading method
///
/// Trading options keep an `Arc` to this so they can point back at their
/// method without owning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Unique id within a registry
    pub id: String,
    /// Mode name, persisted on settlement items (e.g. `TM_CASH`)
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub side: TradingSide,
    pub enabled: bool,
    pub style: ContributionStyle,
}

impl MethodDescriptor {
    /// Create an enabled descriptor; description defaults to the name
    pub fn new(
        side: TradingSide,
        id: impl Into<String>,
        name: impl Into<String>,
        style: ContributionStyle,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            description: name.clone(),
            name,
            icon: None,
            side,
            enabled: true,
            style,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A pluggable provider of trading options
///
/// Implementations are registered once at startup and negotiated
/// concurrently, so `negotiate` must not assume any ordering relative to
/// other methods.
#[async_trait]
pub trait TradingMethod: Send + Sync {
    /// Identity and metadata of this method
    fn descriptor(&self) -> &Arc<MethodDescriptor>;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn side(&self) -> TradingSide {
        self.descriptor().side
    }

    fn is_enabled(&self) -> bool {
        self.descriptor().enabled
    }

    /// Ask the method which options it currently offers
    ///
    /// Returning an empty list is legitimate. A failure is scoped to this
    /// method and never affects other methods' results.
    async fn negotiate(&self, context: &NegotiationContext) -> Result<Vec<TradingOption>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_style() {
        assert!(!ContributionStyle::Simple.performs_lookup());
        assert!(ContributionStyle::NegotiatedLookup.performs_lookup());
        assert!(ContributionStyle::AssetBacked.performs_lookup());
        assert!(ContributionStyle::AssetBacked.caps_applied_amount());
        assert!(!ContributionStyle::NegotiatedLookup.caps_applied_amount());
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = MethodDescriptor::new(
            TradingSide::Receipt,
            "rp.receipt.voucher",
            "TM_VOUCHER",
            ContributionStyle::NegotiatedLookup,
        )
        .with_description("Gift voucher")
        .with_icon("voucher")
        .with_enabled(false);

        assert_eq!(descriptor.name, "TM_VOUCHER");
        assert_eq!(descriptor.description, "Gift voucher");
        assert_eq!(descriptor.icon.as_deref(), Some("voucher"));
        assert!(!descriptor.enabled);
    }
}

//! Business partner asset trading method

use async_trait::async_trait;
use common::TradingSide;
use config::TradingConfig;
use std::sync::Arc;
use tracing::debug;

use crate::clients::asset::{AssetLookup, AssetRequest};
use crate::error::{Result, TradingError};
use crate::method::{ContributionStyle, MethodDescriptor, TradingMethod};
use crate::types::{NegotiationContext, TradingOption};

/// Mode name of the business partner asset method
pub const TRADING_MODE_BP_ASSET: &str = "TM_BPAS";
/// Id of the receipt-side asset method
pub const RECEIPT_BP_ASSET_METHOD_ID: &str = "rp.receipt.bp-asset";

const BP_ASSET_DESCRIPTION: &str = "Business partner asset";
const BP_ASSET_ICON: &str = "icon://wallet";

/// Settles against assets the partner already holds (credit, vouchers)
///
/// Every negotiation queries the lookup, so options reflect live balances.
pub struct BusinessPartnerAssetMethod {
    descriptor: Arc<MethodDescriptor>,
    lookup: Arc<dyn AssetLookup>,
}

impl BusinessPartnerAssetMethod {
    /// Receipt-side asset method
    pub fn new(lookup: Arc<dyn AssetLookup>, enabled: bool) -> Self {
        let descriptor = MethodDescriptor::new(
            TradingSide::Receipt,
            RECEIPT_BP_ASSET_METHOD_ID,
            TRADING_MODE_BP_ASSET,
            ContributionStyle::AssetBacked,
        )
        .with_description(BP_ASSET_DESCRIPTION)
        .with_icon(BP_ASSET_ICON)
        .with_enabled(enabled);

        Self {
            descriptor: Arc::new(descriptor),
            lookup,
        }
    }

    /// Asset method whose enabled flag comes from configuration
    pub fn from_config(lookup: Arc<dyn AssetLookup>, config: &TradingConfig) -> Self {
        Self::new(lookup, config.is_mode_enabled(TRADING_MODE_BP_ASSET))
    }
}

#[async_trait]
impl TradingMethod for BusinessPartnerAssetMethod {
    fn descriptor(&self) -> &Arc<MethodDescriptor> {
        &self.descriptor
    }

    async fn negotiate(&self, context: &NegotiationContext) -> Result<Vec<TradingOption>> {
        let request = AssetRequest::from(context);

        let assets = self
            .lookup
            .fetch_assets(&request)
            .await
            .map_err(|e| TradingError::negotiation(self.name(), e.to_string()))?
            .into_result()
            .map_err(|message| TradingError::negotiation(self.name(), message))?;

        debug!(
            partner = %request.business_partner,
            assets = assets.len(),
            "Business partner assets fetched"
        );

        let options = assets
            .into_iter()
            .map(|asset| {
                let icon = asset
                    .picture
                    .filter(|picture| !picture.trim().is_empty())
                    .or_else(|| self.descriptor.icon.clone());

                let mut option = TradingOption::new(Arc::clone(&self.descriptor), asset.code, asset.name)
                    .with_amount(asset.amount);
                option.discount = asset.discount;
                option.icon = icon;
                option
            })
            .collect();

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::asset::{BusinessPartnerAsset, MockAssetLookup};
    use assert_matches::assert_matches;
    use common::BusinessPartnerType;

    fn context(partner: &str) -> NegotiationContext {
        NegotiationContext {
            business_partner_type: BusinessPartnerType::Customer,
            business_partner_code: partner.to_string(),
            document_type: "SalesOrder".to_string(),
            document_entry: 100,
            document_line_id: None,
            document_total: 200.0,
            document_currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_assets_become_options() {
        let mut voucher = BusinessPartnerAsset::new("VOUCHER7", "Gift voucher", 25.0);
        voucher.discount = Some(0.1);
        voucher.picture = Some("icon://gift".to_string());

        let lookup = Arc::new(MockAssetLookup::new().with_assets(
            "C001",
            vec![BusinessPartnerAsset::new("ASSET01", "Store credit", 80.0), voucher],
        ));
        let method = BusinessPartnerAssetMethod::new(lookup, true);

        let options = method.negotiate(&context("C001")).await.unwrap();
        assert_eq!(options.len(), 2);

        assert_eq!(options[0].id, "ASSET01");
        assert_eq!(options[0].description, "Store credit");
        assert_eq!(options[0].amount, Some(80.0));
        assert_eq!(options[0].icon.as_deref(), Some(BP_ASSET_ICON));

        assert_eq!(options[1].discount, Some(0.1));
        assert_eq!(options[1].icon.as_deref(), Some("icon://gift"));
        assert_eq!(options[1].mode(), TRADING_MODE_BP_ASSET);
    }

    #[tokio::test]
    async fn test_options_follow_live_balance() {
        let lookup = Arc::new(
            MockAssetLookup::new().with_assets("C001", vec![BusinessPartnerAsset::new("ASSET01", "Store credit", 80.0)]),
        );
        let method = BusinessPartnerAssetMethod::new(lookup.clone(), true);
        assert_eq!(method.negotiate(&context("C001")).await.unwrap()[0].amount, Some(80.0));

        lookup.set_assets("C001", vec![BusinessPartnerAsset::new("ASSET01", "Store credit", 35.0)]);
        let options = method.negotiate(&context("C001")).await.unwrap();
        assert_eq!(options[0].amount, Some(35.0));
        assert_eq!(lookup.call_count(), 2);

        lookup.set_assets("C001", Vec::new());
        assert!(method.negotiate(&context("C001")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_assets_is_not_an_error() {
        let method = BusinessPartnerAssetMethod::new(Arc::new(MockAssetLookup::new()), true);
        assert!(method.negotiate(&context("C404")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_scoped_to_method() {
        let method = BusinessPartnerAssetMethod::new(
            Arc::new(MockAssetLookup::new().with_failure("ledger locked")),
            true,
        );
        assert_matches!(
            method.negotiate(&context("C001")).await,
            Err(TradingError::Negotiation { method, message }) if method == TRADING_MODE_BP_ASSET && message == "ledger locked"
        );

        let offline = BusinessPartnerAssetMethod::new(Arc::new(MockAssetLookup::new().with_unavailable()), true);
        assert_matches!(
            offline.negotiate(&context("C001")).await,
            Err(TradingError::Negotiation { .. })
        );
    }
}

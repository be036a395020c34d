//! Cash trading method

use async_trait::async_trait;
use common::TradingSide;
use config::TradingConfig;
use std::sync::Arc;

use crate::error::Result;
use crate::method::{ContributionStyle, MethodDescriptor, TradingMethod};
use crate::types::{NegotiationContext, TradingOption};

/// Mode name of the cash method
pub const TRADING_MODE_CASH: &str = "TM_CASH";
/// Id of the receipt-side cash method
pub const RECEIPT_CASH_METHOD_ID: &str = "rp.receipt.cash";
/// Id of the payment-side cash method
pub const PAYMENT_CASH_METHOD_ID: &str = "rp.payment.cash";

const CASH_DESCRIPTION: &str = "Cash";
const CASH_ICON: &str = "icon://money-bills";

/// Cash: always offers exactly one option, no remote call
pub struct CashMethod {
    descriptor: Arc<MethodDescriptor>,
}

impl CashMethod {
    /// Cash method for the given side
    pub fn new(side: TradingSide, enabled: bool) -> Self {
        let id = match side {
            TradingSide::Receipt => RECEIPT_CASH_METHOD_ID,
            TradingSide::Payment => PAYMENT_CASH_METHOD_ID,
        };
        let descriptor = MethodDescriptor::new(side, id, TRADING_MODE_CASH, ContributionStyle::Simple)
            .with_description(CASH_DESCRIPTION)
            .with_icon(CASH_ICON)
            .with_enabled(enabled);

        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    /// Cash method whose enabled flag comes from configuration
    pub fn from_config(side: TradingSide, config: &TradingConfig) -> Self {
        Self::new(side, config.is_mode_enabled(TRADING_MODE_CASH))
    }
}

#[async_trait]
impl TradingMethod for CashMethod {
    fn descriptor(&self) -> &Arc<MethodDescriptor> {
        &self.descriptor
    }

    async fn negotiate(&self, _context: &NegotiationContext) -> Result<Vec<TradingOption>> {
        let mut option = TradingOption::new(
            Arc::clone(&self.descriptor),
            "",
            self.descriptor.description.clone(),
        );
        option.icon = self.descriptor.icon.clone();

        Ok(vec![option])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BusinessPartnerType;

    fn context() -> NegotiationContext {
        NegotiationContext {
            business_partner_type: BusinessPartnerType::Customer,
            business_partner_code: "C001".to_string(),
            document_type: "SalesOrder".to_string(),
            document_entry: 100,
            document_line_id: None,
            document_total: 200.0,
            document_currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cash_offers_single_implicit_option() {
        let cash = CashMethod::new(TradingSide::Receipt, true);
        let options = cash.negotiate(&context()).await.unwrap();

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "");
        assert_eq!(options[0].amount, None);
        assert_eq!(options[0].mode(), TRADING_MODE_CASH);
        assert_eq!(options[0].icon.as_deref(), Some(CASH_ICON));
    }

    #[test]
    fn test_sides_have_distinct_ids() {
        let receipt = CashMethod::new(TradingSide::Receipt, true);
        let payment = CashMethod::new(TradingSide::Payment, true);
        assert_ne!(receipt.id(), payment.id());
        assert_eq!(receipt.name(), payment.name());
        assert_eq!(payment.side(), TradingSide::Payment);
    }

    #[test]
    fn test_enabled_from_config() {
        let config = TradingConfig {
            disabled_modes: vec![TRADING_MODE_CASH.to_string()],
            ..Default::default()
        };
        assert!(!CashMethod::from_config(TradingSide::Receipt, &config).is_enabled());
        assert!(CashMethod::from_config(TradingSide::Receipt, &TradingConfig::default()).is_enabled());
    }
}

//! Business partner asset lookup - trait and implementations

use async_trait::async_trait;
use common::{BusinessPartnerType, OperationResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Result, TradingError};
use crate::types::NegotiationContext;

/// Query for the stored assets a business partner can settle with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub business_partner_type: BusinessPartnerType,
    pub business_partner: String,
    pub document_type: String,
    pub document_entry: i64,
    #[serde(default)]
    pub document_line_id: Option<i64>,
    pub total: f64,
    pub currency: String,
}

impl From<&NegotiationContext> for AssetRequest {
    fn from(context: &NegotiationContext) -> Self {
        Self {
            business_partner_type: context.business_partner_type,
            business_partner: context.business_partner_code.clone(),
            document_type: context.document_type.clone(),
            document_entry: context.document_entry,
            document_line_id: context.document_line_id,
            total: context.document_total,
            currency: context.document_currency.clone(),
        }
    }
}

/// A stored asset (credit, voucher, prepaid balance) held by a partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessPartnerAsset {
    pub code: String,
    pub name: String,
    /// Usable balance
    pub amount: f64,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl BusinessPartnerAsset {
    pub fn new(code: impl Into<String>, name: impl Into<String>, amount: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            amount,
            discount: None,
            picture: None,
        }
    }
}

/// Client trait for the asset lookup - protocol agnostic
#[async_trait]
pub trait AssetLookup: Send + Sync {
    /// Fetch the assets usable for the request
    ///
    /// A transport failure is an `Err`; a remote rejection comes back as an
    /// `OperationResult` with a non-zero result code.
    async fn fetch_assets(&self, request: &AssetRequest) -> Result<OperationResult<BusinessPartnerAsset>>;
}

// ==================== Mock Implementation ====================

/// Mock asset lookup for testing and local runs
pub struct MockAssetLookup {
    assets: Mutex<HashMap<String, Vec<BusinessPartnerAsset>>>,
    failure: Option<String>,
    unavailable: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockAssetLookup {
    /// Create a lookup that knows no assets
    pub fn new() -> Self {
        Self {
            assets: Mutex::new(HashMap::new()),
            failure: None,
            unavailable: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Give a partner some assets
    pub fn with_assets(self, partner: impl Into<String>, assets: Vec<BusinessPartnerAsset>) -> Self {
        self.assets.lock().insert(partner.into(), assets);
        self
    }

    /// Answer every request with a non-zero result code
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Fail every request at the transport level
    pub fn with_unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Delay every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace a partner's assets at runtime
    pub fn set_assets(&self, partner: impl Into<String>, assets: Vec<BusinessPartnerAsset>) {
        self.assets.lock().insert(partner.into(), assets);
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAssetLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetLookup for MockAssetLookup {
    async fn fetch_assets(&self, request: &AssetRequest) -> Result<OperationResult<BusinessPartnerAsset>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.unavailable {
            return Err(TradingError::LookupUnavailable("mock lookup is offline".to_string()));
        }

        if let Some(ref message) = self.failure {
            return Ok(OperationResult::failure(message.clone()));
        }

        let assets = self
            .assets
            .lock()
            .get(&request.business_partner)
            .cloned()
            .unwrap_or_default();

        Ok(OperationResult::success(assets))
    }
}

// ==================== HTTP Implementation ====================

#[cfg(feature = "client")]
pub mod http {
    use async_trait::async_trait;
    use common::OperationResult;
    use reqwest::Client;

    use super::{AssetLookup, AssetRequest, BusinessPartnerAsset};
    use crate::error::{Result, TradingError};

    /// HTTP-based asset lookup
    pub struct HttpAssetLookup {
        client: Client,
        base_url: String,
    }

    impl HttpAssetLookup {
        /// Create a new HTTP asset lookup
        pub fn new(base_url: &str) -> Self {
            Self {
                client: Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }
        }
    }

    #[async_trait]
    impl AssetLookup for HttpAssetLookup {
        async fn fetch_assets(&self, request: &AssetRequest) -> Result<OperationResult<BusinessPartnerAsset>> {
            let url = format!("{}/api/v1/business-partners/assets", self.base_url);

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| TradingError::LookupUnavailable(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Ok(OperationResult::failure(format!("{}: {}", status, error_text)));
            }

            response
                .json::<OperationResult<BusinessPartnerAsset>>()
                .await
                .map_err(|e| TradingError::LookupUnavailable(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(partner: &str) -> AssetRequest {
        AssetRequest {
            business_partner_type: BusinessPartnerType::Customer,
            business_partner: partner.to_string(),
            document_type: "SalesOrder".to_string(),
            document_entry: 1,
            document_line_id: None,
            total: 10.0,
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_partner_assets() {
        let lookup = MockAssetLookup::new()
            .with_assets("C001", vec![BusinessPartnerAsset::new("ASSET01", "Store credit", 80.0)]);

        let found = lookup.fetch_assets(&request("C001")).await.unwrap();
        assert!(found.is_success());
        assert_eq!(found.result_objects.len(), 1);

        let none = lookup.fetch_assets(&request("C999")).await.unwrap();
        assert!(none.result_objects.is_empty());
        assert_eq!(lookup.call_count(), 2);
    }

    #[test]
    fn test_remote_result_wire_format() {
        let body = r#"{
            "result_code": 0,
            "result_objects": [
                {"code": "ASSET01", "name": "Store credit", "amount": 80.0},
                {"code": "VOUCHER7", "name": "Gift voucher", "amount": 25.0, "discount": 0.1, "picture": "icon://gift"}
            ]
        }"#;
        let result: OperationResult<BusinessPartnerAsset> = serde_json::from_str(body).unwrap();
        assert!(result.is_success());
        assert_eq!(result.result_objects[0].picture, None);
        assert_eq!(result.result_objects[1].discount, Some(0.1));

        let json = serde_json::to_value(request("C001")).unwrap();
        assert_eq!(json["business_partner_type"], "customer");
        assert!(json["document_line_id"].is_null());
    }

    #[tokio::test]
    async fn test_mock_failure_modes() {
        let failing = MockAssetLookup::new().with_failure("ledger locked");
        let result = failing.fetch_assets(&request("C001")).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(result.message, "ledger locked");

        let offline = MockAssetLookup::new().with_unavailable();
        assert!(matches!(
            offline.fetch_assets(&request("C001")).await,
            Err(TradingError::LookupUnavailable(_))
        ));
    }
}

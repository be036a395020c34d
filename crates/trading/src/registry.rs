//! Method registry - the ordered set of trading methods for one side
//!
//! Providers register their methods once at startup. The registry is
//! handed to the settlement service explicitly; there is no global lookup.

use common::TradingSide;
use config::TradingConfig;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::clients::asset::AssetLookup;
use crate::error::{Result, TradingError};
use crate::method::{MethodDescriptor, TradingMethod};
use crate::methods::{BusinessPartnerAssetMethod, CashMethod};

/// Registered trading methods for one side, in registration order
pub struct MethodRegistry {
    side: TradingSide,
    methods: RwLock<Vec<Arc<dyn TradingMethod>>>,
}

impl MethodRegistry {
    /// Create an empty registry for a side
    pub fn new(side: TradingSide) -> Arc<Self> {
        Arc::new(Self {
            side,
            methods: RwLock::new(Vec::new()),
        })
    }

    pub fn side(&self) -> TradingSide {
        self.side
    }

    /// Register a method
    ///
    /// Rejects a method built for the other side and a method whose id is
    /// already registered; the first registration stays in place.
    pub fn register(&self, method: Arc<dyn TradingMethod>) -> Result<()> {
        if method.side() != self.side {
            return Err(TradingError::SideMismatch {
                method: method.name().to_string(),
                method_side: method.side(),
                registry_side: self.side,
            });
        }

        let mut methods = self.methods.write();
        if methods.iter().any(|existing| existing.id() == method.id()) {
            return Err(TradingError::DuplicateMethod(method.id().to_string()));
        }

        info!(
            side = %self.side,
            method = %method.name(),
            id = %method.id(),
            enabled = method.is_enabled(),
            "Trading method registered"
        );
        methods.push(method);
        Ok(())
    }

    /// All methods in registration order
    pub fn methods(&self) -> Vec<Arc<dyn TradingMethod>> {
        self.methods.read().clone()
    }

    /// Enabled methods in registration order
    pub fn enabled_methods(&self) -> Vec<Arc<dyn TradingMethod>> {
        self.methods
            .read()
            .iter()
            .filter(|method| method.is_enabled())
            .cloned()
            .collect()
    }

    /// Descriptors of all methods, for presentation
    pub fn descriptors(&self) -> Vec<Arc<MethodDescriptor>> {
        self.methods
            .read()
            .iter()
            .map(|method| Arc::clone(method.descriptor()))
            .collect()
    }

    /// Look up a method by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn TradingMethod>> {
        self.methods.read().iter().find(|method| method.id() == id).cloned()
    }

    /// True when the descriptor belongs to a registered, enabled method
    pub fn is_enabled(&self, descriptor: &MethodDescriptor) -> bool {
        self.methods
            .read()
            .iter()
            .any(|method| method.id() == descriptor.id && method.is_enabled())
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }
}

/// The receipt-side and payment-side registries
#[derive(Clone)]
pub struct MethodRegistries {
    pub receipt: Arc<MethodRegistry>,
    pub payment: Arc<MethodRegistry>,
}

impl MethodRegistries {
    pub fn new() -> Self {
        Self {
            receipt: MethodRegistry::new(TradingSide::Receipt),
            payment: MethodRegistry::new(TradingSide::Payment),
        }
    }

    /// The registry for a side
    pub fn for_side(&self, side: TradingSide) -> &Arc<MethodRegistry> {
        match side {
            TradingSide::Receipt => &self.receipt,
            TradingSide::Payment => &self.payment,
        }
    }

    /// Register a method with the registry of its own side
    pub fn register(&self, method: Arc<dyn TradingMethod>) -> Result<()> {
        self.for_side(method.side()).register(method)
    }
}

impl Default for MethodRegistries {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the built-in providers
///
/// Cash on both sides, business partner assets on the receipt side.
pub fn register_builtin_methods(
    registries: &MethodRegistries,
    config: &TradingConfig,
    lookup: Arc<dyn AssetLookup>,
) -> Result<()> {
    registries.register(Arc::new(CashMethod::from_config(TradingSide::Receipt, config)))?;
    registries.register(Arc::new(BusinessPartnerAssetMethod::from_config(lookup, config)))?;
    registries.register(Arc::new(CashMethod::from_config(TradingSide::Payment, config)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::asset::MockAssetLookup;
    use crate::methods::{TRADING_MODE_BP_ASSET, TRADING_MODE_CASH};
    use assert_matches::assert_matches;

    #[test]
    fn test_register_keeps_order() {
        let registry = MethodRegistry::new(TradingSide::Receipt);
        registry
            .register(Arc::new(CashMethod::new(TradingSide::Receipt, true)))
            .unwrap();
        registry
            .register(Arc::new(BusinessPartnerAssetMethod::new(
                Arc::new(MockAssetLookup::new()),
                true,
            )))
            .unwrap();

        let names: Vec<_> = registry.methods().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec![TRADING_MODE_CASH, TRADING_MODE_BP_ASSET]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = MethodRegistry::new(TradingSide::Receipt);
        registry
            .register(Arc::new(CashMethod::new(TradingSide::Receipt, true)))
            .unwrap();

        let result = registry.register(Arc::new(CashMethod::new(TradingSide::Receipt, false)));
        assert_matches!(result, Err(TradingError::DuplicateMethod(_)));
        assert_eq!(registry.len(), 1);
        assert!(registry.methods()[0].is_enabled());
    }

    #[test]
    fn test_side_mismatch_rejected() {
        let registry = MethodRegistry::new(TradingSide::Payment);
        let result = registry.register(Arc::new(CashMethod::new(TradingSide::Receipt, true)));
        assert_matches!(result, Err(TradingError::SideMismatch { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_enabled_methods_filters_disabled() {
        let registries = MethodRegistries::new();
        let config = TradingConfig {
            disabled_modes: vec![TRADING_MODE_BP_ASSET.to_string()],
            ..Default::default()
        };
        register_builtin_methods(&registries, &config, Arc::new(MockAssetLookup::new())).unwrap();

        assert_eq!(registries.receipt.len(), 2);
        assert_eq!(registries.receipt.enabled_methods().len(), 1);
        assert_eq!(registries.payment.len(), 1);

        let asset = registries.receipt.descriptors()[1].clone();
        assert!(!registries.receipt.is_enabled(&asset));
        assert!(registries.receipt.get(asset.id.as_str()).is_some());
    }

    #[test]
    fn test_builtin_registration_twice_fails() {
        let registries = MethodRegistries::new();
        let lookup: Arc<dyn AssetLookup> = Arc::new(MockAssetLookup::new());
        register_builtin_methods(&registries, &TradingConfig::default(), lookup.clone()).unwrap();
        assert!(register_builtin_methods(&registries, &TradingConfig::default(), lookup).is_err());
    }
}

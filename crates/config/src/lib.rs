use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub asset_lookup: AssetLookupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// pretty | json | compact
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Prometheus exporter port; metrics stay off when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingConfig {
    /// Names of trading modes switched off (e.g. `TM_BPAS`)
    #[serde(default)]
    pub disabled_modes: Vec<String>,
    #[serde(default)]
    pub reconciliation: ReconciliationPolicy,
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: f64,
}

impl TradingConfig {
    /// Whether the trading mode with this name is enabled
    pub fn is_mode_enabled(&self, name: &str) -> bool {
        !self
            .disabled_modes
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(name))
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            disabled_modes: Vec::new(),
            reconciliation: ReconciliationPolicy::default(),
            amount_tolerance: default_amount_tolerance(),
        }
    }
}

/// How the applied total must relate to the target total before confirming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// Applied total must equal the target total
    Exact,
    /// Applied total may fall short of the target total but not exceed it
    #[default]
    Partial,
    /// No check; overpayment allowed
    Unrestricted,
}

impl ReconciliationPolicy {
    /// Check an applied total against the target total
    ///
    /// Returns a human-readable reason when the totals violate the policy.
    pub fn check(&self, applied: f64, target: f64, tolerance: f64) -> Result<(), String> {
        if !applied.is_finite() || !target.is_finite() {
            return Err(format!(
                "applied total {} and document total {} must be finite numbers",
                applied, target
            ));
        }

        match self {
            ReconciliationPolicy::Exact if (applied - target).abs() > tolerance => Err(format!(
                "applied total {:.2} must equal the document total {:.2}",
                applied, target
            )),
            ReconciliationPolicy::Partial if applied - target > tolerance => Err(format!(
                "applied total {:.2} exceeds the document total {:.2}",
                applied, target
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssetLookupConfig {
    /// Base URL of the remote asset lookup; in-memory lookup when unset
    #[serde(default)]
    pub endpoint: Option<String>,
}

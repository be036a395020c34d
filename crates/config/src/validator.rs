use crate::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("amount_tolerance must be a non-negative number, got: {0}")]
    InvalidAmountTolerance(f64),

    #[error("Disabled trading mode names must not be empty")]
    EmptyModeName,

    #[error("Trading mode '{0}' is listed as disabled more than once")]
    DuplicateDisabledMode(String),

    #[error("Asset lookup endpoint '{0}' must start with http:// or https://")]
    InvalidEndpoint(String),

    #[error("Environment variable placeholder left unresolved in {field}")]
    UnresolvedEnvVar { field: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(&config.service, &mut report);
    validate_trading(&config.trading, &mut report);
    validate_asset_lookup(&config.asset_lookup, &mut report);

    report
}

fn validate_service(service: &ServiceConfig, report: &mut ValidationReport) {
    if service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }

    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&service.log_format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(service.log_format.clone()));
    }
}

fn validate_trading(trading: &TradingConfig, report: &mut ValidationReport) {
    if !trading.amount_tolerance.is_finite() || trading.amount_tolerance < 0.0 {
        report.add_error(ValidationError::InvalidAmountTolerance(trading.amount_tolerance));
    }

    let mut seen = HashSet::new();
    for mode in &trading.disabled_modes {
        if mode.trim().is_empty() {
            report.add_error(ValidationError::EmptyModeName);
            continue;
        }
        if has_unresolved_env_vars(mode) {
            report.add_error(ValidationError::UnresolvedEnvVar {
                field: "trading.disabled_modes".to_string(),
            });
        }
        if !seen.insert(mode.to_uppercase()) {
            report.add_error(ValidationError::DuplicateDisabledMode(mode.clone()));
        }
    }

    if trading.reconciliation == ReconciliationPolicy::Unrestricted {
        report.add_warning(
            "trading.reconciliation",
            "Unrestricted reconciliation allows settlements above the document total",
        );
    }
}

fn validate_asset_lookup(lookup: &AssetLookupConfig, report: &mut ValidationReport) {
    let Some(endpoint) = &lookup.endpoint else {
        report.add_warning(
            "asset_lookup.endpoint",
            "No asset lookup endpoint configured, business partner assets come from the in-memory lookup",
        );
        return;
    };

    if has_unresolved_env_vars(endpoint) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: "asset_lookup.endpoint".to_string(),
        });
    } else if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        report.add_error(ValidationError::InvalidEndpoint(endpoint.clone()));
    }
}

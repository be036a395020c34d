use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    parse_config(&content)
}

/// Parse configuration from YAML text, substituting `${VAR}` placeholders first
pub fn parse_config(content: &str) -> Result<MasterConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: MasterConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> MasterConfig {
    MasterConfig {
        service: ServiceConfig::default(),
        observability: ObservabilityConfig::default(),
        trading: TradingConfig::default(),
        asset_lookup: AssetLookupConfig::default(),
    }
}

pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let config = generate_default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = parse_config(&yaml).unwrap();
        assert_eq!(parsed.service.name, config.service.name);
        assert_eq!(parsed.trading.reconciliation, ReconciliationPolicy::Partial);
    }

    #[test]
    fn test_parse_disabled_modes() {
        let yaml = r#"
service:
  name: pos-receipts
  log_format: json
trading:
  disabled_modes: [TM_BPAS]
  reconciliation: unrestricted
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.service.log_format, "json");
        assert!(!config.trading.is_mode_enabled("TM_BPAS"));
        assert_eq!(config.trading.reconciliation, ReconciliationPolicy::Unrestricted);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load_config("/nonexistent/receiptpayment.yaml").is_err());
    }
}

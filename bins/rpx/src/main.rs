//! ReceiptPayment CLI Binary
//!
//! This is the main entry point for the ReceiptPayment application.
//! It provides commands for initializing and validating configuration and
//! for running a settlement session end to end.

use anyhow::{Context, Result};
use cli::{ApplyArg, Cli, Commands, SettleArgs, SideArg};
use common::TradingSide;
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use observability::{init_logging, init_logging_from_config, init_metrics, LogFormat};
use settlement::{
    InMemorySettlementRepository, SettlementRequest, SettlementService, TracingSink, UserIntent,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use trading::{
    register_builtin_methods, AssetLookup, BusinessPartnerAsset, HttpAssetLookup, MethodRegistries,
    MockAssetLookup, TradingOption,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Init { output } => {
            init_logging("rpx", LogFormat::Pretty)?;
            debug!(?output, "Executing 'init' command");
            init_command(output).await
        }
        Commands::Validate { config } => {
            init_logging("rpx", LogFormat::Pretty)?;
            debug!(?config, "Executing 'validate' command");
            validate_command(config).await
        }
        Commands::Settle(args) => settle_command(args).await,
    }
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("Reconciliation: {:?}", config.trading.reconciliation);
    if config.trading.disabled_modes.is_empty() {
        println!("Disabled trading modes: none");
    } else {
        println!("Disabled trading modes: {}", config.trading.disabled_modes.join(", "));
    }
    println!(
        "Asset lookup: {}",
        config.asset_lookup.endpoint.as_deref().unwrap_or("in-memory")
    );

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit trading.disabled_modes and trading.reconciliation as needed");
    println!("  2. Set asset_lookup.endpoint to use a remote asset lookup");
    println!("  3. Run 'rpx validate --config {:?}' to check configuration", output_path);

    Ok(())
}

async fn settle_command(args: SettleArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => generate_default_config(),
    };

    init_logging_from_config(&config.service.name, &config.service.log_format)?;

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message);
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot settle due to configuration errors");
    }

    if let Some(port) = config.observability.metrics_port {
        init_metrics(port)?;
    }

    let side = match args.side {
        SideArg::Receipt => TradingSide::Receipt,
        SideArg::Payment => TradingSide::Payment,
    };

    let registries = MethodRegistries::new();
    register_builtin_methods(&registries, &config.trading, asset_lookup(&config, &args))
        .context("Failed to register trading methods")?;

    let service = SettlementService::builder(side)
        .registry(registries.for_side(side).clone())
        .repository(Arc::new(InMemorySettlementRepository::with_sample_partners()))
        .sink(Arc::new(TracingSink))
        .config(config.trading.clone())
        .build()?;

    let request = SettlementRequest {
        business_partner_type: Some(args.partner_type.clone()),
        business_partner_code: args.partner.clone(),
        document_type: args.document_type.clone(),
        document_entry: args.document_entry,
        document_line_id: args.document_line_id,
        document_total: args.total,
        document_currency: args.currency.clone(),
    };

    let Some(mut session) = service.open(request).await? else {
        println!("Nothing to settle for {}", args.side.as_str());
        return Ok(());
    };

    let negotiation = session.wait_for_negotiation().await;
    info!(
        succeeded = negotiation.succeeded.len(),
        failed = negotiation.failed.len(),
        options = negotiation.option_count,
        "Negotiation finished"
    );

    let options = session.available_options();
    for apply in &args.apply {
        let option = find_option(&options, apply)?;
        session
            .handle(UserIntent::Apply {
                option: Some(option),
                amount: apply.amount,
            })
            .await?;
    }

    let document = session.confirm().await?;
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}

/// Remote lookup when an endpoint is configured, otherwise the assets given on the command line
fn asset_lookup(config: &MasterConfig, args: &SettleArgs) -> Arc<dyn AssetLookup> {
    if let Some(endpoint) = &config.asset_lookup.endpoint {
        if !args.assets.is_empty() {
            warn!(%endpoint, "--asset ignored, using remote asset lookup");
        }
        return Arc::new(HttpAssetLookup::new(endpoint));
    }

    let assets = args
        .assets
        .iter()
        .map(|asset| BusinessPartnerAsset::new(asset.code.clone(), asset.code.clone(), asset.amount))
        .collect();
    Arc::new(MockAssetLookup::new().with_assets(args.partner.clone(), assets))
}

fn find_option(options: &[TradingOption], apply: &ApplyArg) -> Result<TradingOption> {
    options
        .iter()
        .find(|option| option.mode().eq_ignore_ascii_case(&apply.mode) && option.id == apply.trade_id)
        .cloned()
        .with_context(|| {
            let offered: Vec<_> = options
                .iter()
                .map(|option| format!("{}:{}", option.mode(), option.id))
                .collect();
            format!(
                "No {} option with trade id '{}' (offered: {})",
                apply.mode,
                apply.trade_id,
                offered.join(", ")
            )
        })
}

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "rpx")]
#[command(about = "ReceiptPayment - settle documents with pluggable trading methods")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "receiptpayment.yaml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "receiptpayment.yaml")]
        config: PathBuf,
    },

    /// Run one settlement session against in-memory collaborators
    Settle(SettleArgs),
}

#[derive(clap::Args, Debug)]
pub struct SettleArgs {
    /// Path to the configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Receipt or payment
    #[arg(long, value_enum, default_value = "receipt")]
    pub side: SideArg,

    /// Business partner type (customer or supplier)
    #[arg(long = "partner-type", default_value = "customer")]
    pub partner_type: String,

    /// Business partner code
    #[arg(long)]
    pub partner: String,

    /// Type of the document being settled
    #[arg(long = "document-type")]
    pub document_type: String,

    /// Entry of the document being settled
    #[arg(long = "document-entry")]
    pub document_entry: i64,

    /// Line of the document, when settling a single line
    #[arg(long = "document-line")]
    pub document_line_id: Option<i64>,

    /// Amount outstanding on the document
    #[arg(long)]
    pub total: f64,

    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Asset held by the partner, as CODE=AMOUNT (repeatable)
    #[arg(long = "asset", value_name = "CODE=AMOUNT")]
    pub assets: Vec<AssetArg>,

    /// Trading to apply, as MODE[:TRADE_ID]=AMOUNT (repeatable)
    #[arg(long = "apply", value_name = "MODE[:TRADE_ID]=AMOUNT")]
    pub apply: Vec<ApplyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideArg {
    /// Money coming in from a customer
    Receipt,

    /// Money going out to a supplier
    Payment,
}

impl SideArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideArg::Receipt => "receipt",
            SideArg::Payment => "payment",
        }
    }
}

/// `MODE[:TRADE_ID]=AMOUNT`
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyArg {
    pub mode: String,
    /// Empty when not given (cash)
    pub trade_id: String,
    pub amount: f64,
}

impl FromStr for ApplyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (selector, amount) = s
            .split_once('=')
            .ok_or_else(|| format!("expected MODE[:TRADE_ID]=AMOUNT, got '{}'", s))?;
        let (mode, trade_id) = match selector.split_once(':') {
            Some((mode, trade_id)) => (mode, trade_id),
            None => (selector, ""),
        };
        if mode.trim().is_empty() {
            return Err(format!("missing trading mode in '{}'", s));
        }

        Ok(Self {
            mode: mode.trim().to_string(),
            trade_id: trade_id.trim().to_string(),
            amount: parse_amount(amount)?,
        })
    }
}

/// `CODE=AMOUNT`
#[derive(Debug, Clone, PartialEq)]
pub struct AssetArg {
    pub code: String,
    pub amount: f64,
}

impl FromStr for AssetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, amount) = s
            .split_once('=')
            .ok_or_else(|| format!("expected CODE=AMOUNT, got '{}'", s))?;
        if code.trim().is_empty() {
            return Err(format!("missing asset code in '{}'", s));
        }

        Ok(Self {
            code: code.trim().to_string(),
            amount: parse_amount(amount)?,
        })
    }
}

fn parse_amount(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{}': {}", raw, e))
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_arg() {
        assert_eq!(
            "TM_CASH=120".parse::<ApplyArg>().unwrap(),
            ApplyArg {
                mode: "TM_CASH".to_string(),
                trade_id: String::new(),
                amount: 120.0
            }
        );

        let asset: ApplyArg = "TM_BPAS:ASSET01=80.5".parse().unwrap();
        assert_eq!(asset.trade_id, "ASSET01");
        assert_eq!(asset.amount, 80.5);

        assert!("TM_CASH".parse::<ApplyArg>().is_err());
        assert!("=5".parse::<ApplyArg>().is_err());
        assert!("TM_CASH=lots".parse::<ApplyArg>().is_err());
    }

    #[test]
    fn test_asset_arg() {
        let asset: AssetArg = "ASSET01=80".parse().unwrap();
        assert_eq!(asset.code, "ASSET01");
        assert!("ASSET01".parse::<AssetArg>().is_err());
    }

    #[test]
    fn test_settle_command() {
        let cli = Cli::try_parse_from([
            "rpx",
            "settle",
            "--partner",
            "C001",
            "--document-type",
            "SalesOrder",
            "--document-entry",
            "100",
            "--total",
            "200",
            "--asset",
            "ASSET01=80",
            "--apply",
            "TM_CASH=120",
            "--apply",
            "TM_BPAS:ASSET01=80",
        ])
        .unwrap();

        match cli.command {
            Commands::Settle(args) => {
                assert_eq!(args.side, SideArg::Receipt);
                assert_eq!(args.partner_type, "customer");
                assert_eq!(args.currency, "USD");
                assert_eq!(args.apply.len(), 2);
                assert_eq!(args.assets.len(), 1);
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

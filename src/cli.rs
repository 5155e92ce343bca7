use anyhow::Context;
use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::Config;
use crate::domain::split::validate_percentage;
use crate::domain::{calculate_split, ImpactSplit};
use crate::ledger::{Ledger, LedgerStats, TransactionFilter};

#[derive(Parser)]
#[command(name = "impact-ledger")]
#[command(about = "Impact Ledger - payout split tracking service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Configuration validation
    Config,

    /// Preview how an amount would be split
    Split {
        /// Gross amount, e.g. 100.00
        #[arg(short, long)]
        amount: String,

        /// Impact percentage (defaults to IMPACT_SPLIT_PERCENTAGE)
        #[arg(short, long)]
        percentage: Option<u32>,
    },

    /// Check a ledger export file and print its totals
    Verify {
        /// Path to a JSON export
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Ledger Environment: {}", config.ledger_environment);
    println!("  Impact Split: {}%", config.split_percentage);
    println!("  PayPal Mode: {}", config.paypal.mode);
    println!("  PayPal URL: {}", config.paypal.base_url());
    println!(
        "  PayPal Client ID: {}",
        config.paypal.client_id.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  PayPal Client Secret: {}",
        config.paypal.client_secret.as_deref().map(mask_secret).unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Ledger Admin Endpoints: {}", config.ledger_admin_enabled);

    if config.paypal.credentials().is_none() {
        tracing::warn!("PayPal credentials missing; payout endpoints will be disabled");
    }

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

pub fn split_amount(amount: &str, percentage: Option<u32>, default_percentage: u8) -> anyhow::Result<ImpactSplit> {
    let amount = BigDecimal::from_str(amount.trim())
        .with_context(|| format!("'{}' is not a valid amount", amount))?;
    let percentage = match percentage {
        Some(value) => validate_percentage(value)?,
        None => default_percentage,
    };
    Ok(calculate_split(&amount, percentage)?)
}

pub fn handle_split(config: &Config, amount: &str, percentage: Option<u32>) -> anyhow::Result<()> {
    let split = split_amount(amount, percentage, config.split_percentage)?;

    println!("Split at {}%:", split.percentage);
    println!("  Original:  {}", split.original_amount);
    println!("  Impact:    {}", split.impact_amount);
    println!("  Recipient: {}", split.recipient_amount);

    Ok(())
}

/// Loads an export into a scratch ledger. Nothing is kept afterwards.
pub fn verify_export_file(path: &Path, config: &Config) -> anyhow::Result<LedgerStats> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut ledger = Ledger::new(config.ledger_environment, config.split_percentage);
    ledger.import_transactions(&data)?;

    let transactions = ledger.get_transactions(&TransactionFilter::default());
    let inconsistent = transactions.iter().filter(|t| !t.split_is_consistent()).count();
    if inconsistent > 0 {
        tracing::warn!(inconsistent, "Export contains splits that do not add up");
    }

    Ok(ledger.compute_stats(&transactions))
}

pub fn handle_verify(config: &Config, path: &Path) -> anyhow::Result<()> {
    let stats = verify_export_file(path, config)?;

    println!("✓ {} is a valid ledger export", path.display());
    println!("  Transactions: {}", stats.total_transactions);
    println!("  Original:     {} {}", stats.total_original_amount, stats.currency);
    println!("  Impact:       {} {}", stats.total_impact_amount, stats.currency);
    println!("  Recipient:    {} {}", stats.total_recipient_amount, stats.currency);

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

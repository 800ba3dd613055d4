//! List command - show saved receipts.

use std::path::PathBuf;

use clap::Args;
use console::style;

use rcpt_core::report::{filter_by_vendor, total_spend};
use rcpt_core::{ReceiptStore, StoredReceipt};

use super::{open_store, OutputFormat};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Receipt database (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only receipts whose vendor contains this text
    #[arg(long)]
    vendor: Option<String>,
}

pub fn run(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = open_store(args.db.as_deref(), &config)?;

    let receipts = store.list_recent()?;
    let receipts: Vec<StoredReceipt> = match &args.vendor {
        Some(needle) => filter_by_vendor(&receipts, needle)
            .into_iter()
            .cloned()
            .collect(),
        None => receipts,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipts)?),
        OutputFormat::Csv => print!("{}", format_csv(&receipts)?),
        OutputFormat::Text => print_table(&receipts),
    }

    Ok(())
}

fn format_csv(receipts: &[StoredReceipt]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "vendor",
        "transaction_date",
        "amount",
        "currency",
        "category",
        "language",
        "created_at",
    ])?;

    for receipt in receipts {
        wtr.write_record([
            receipt.id.to_string(),
            receipt.vendor.clone(),
            receipt.transaction_date.to_string(),
            receipt.amount.to_string(),
            receipt.currency.clone(),
            receipt.category.clone(),
            receipt.language.clone().unwrap_or_default(),
            receipt.created_at.to_rfc3339(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn print_table(receipts: &[StoredReceipt]) {
    if receipts.is_empty() {
        println!("No receipts saved yet.");
        return;
    }

    println!(
        "{}",
        style(format!(
            "{:>5}  {:<10}  {:<30}  {:>12}",
            "ID", "Date", "Vendor", "Amount"
        ))
        .bold()
    );

    for receipt in receipts {
        println!(
            "{:>5}  {:<10}  {:<30}  {:>12}",
            receipt.id,
            receipt.transaction_date,
            truncate(&receipt.vendor, 30),
            format!("{} {}", receipt.amount, receipt.currency)
        );
    }

    println!();
    println!(
        "{} receipts, total {}",
        receipts.len(),
        style(total_spend(receipts)).green()
    );
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max - 1).collect();
        short.push('…');
        short
    }
}

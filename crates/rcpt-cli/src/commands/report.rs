//! Report command - spending by vendor and by month.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;

use rcpt_core::report::{monthly_spend, spend_by_vendor, total_spend, MonthlySpend, VendorSpend};
use rcpt_core::ReceiptStore;

use super::open_store;

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Receipt database (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct SpendReport {
    receipts: usize,
    total: Decimal,
    by_vendor: Vec<VendorSpend>,
    by_month: Vec<MonthlySpend>,
}

pub fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = open_store(args.db.as_deref(), &config)?;
    let receipts = store.list_recent()?;

    let report = SpendReport {
        receipts: receipts.len(),
        total: total_spend(&receipts),
        by_vendor: spend_by_vendor(&receipts),
        by_month: monthly_spend(&receipts),
    };

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &SpendReport) {
    if report.receipts == 0 {
        println!("No receipts saved yet.");
        return;
    }

    println!("{}", style("Spending by vendor").bold());
    for vendor in &report.by_vendor {
        println!(
            "  {:<30} {:>12}  ({} receipts)",
            vendor.vendor, vendor.total, vendor.receipts
        );
    }

    println!();
    println!("{}", style("Monthly spending").bold());
    for month in &report.by_month {
        println!(
            "  {:<30} {:>12}  ({} receipts)",
            month.month, month.total, month.receipts
        );
    }

    println!();
    println!(
        "Total: {} over {} receipts",
        style(report.total).green(),
        report.receipts
    );
}

//! Spending summaries over stored receipts.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::receipt::StoredReceipt;

/// Total spend at one vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSpend {
    pub vendor: String,
    pub total: Decimal,
    pub receipts: usize,
}

/// Total spend in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpend {
    /// `YYYY-MM` of the transaction date.
    pub month: String,
    pub total: Decimal,
    pub receipts: usize,
}

/// Sum spend per vendor, sorted by vendor name.
pub fn spend_by_vendor(receipts: &[StoredReceipt]) -> Vec<VendorSpend> {
    let mut groups: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for receipt in receipts {
        let entry = groups.entry(receipt.vendor.as_str()).or_default();
        entry.0 += receipt.amount;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(vendor, (total, count))| VendorSpend {
            vendor: vendor.to_string(),
            total: two_places(total),
            receipts: count,
        })
        .collect()
}

/// Sum spend per transaction month, oldest month first.
pub fn monthly_spend(receipts: &[StoredReceipt]) -> Vec<MonthlySpend> {
    let mut groups: BTreeMap<(i32, u32), (Decimal, usize)> = BTreeMap::new();
    for receipt in receipts {
        let date = receipt.transaction_date;
        let entry = groups.entry((date.year(), date.month())).or_default();
        entry.0 += receipt.amount;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((year, month), (total, count))| MonthlySpend {
            month: format!("{:04}-{:02}", year, month),
            total: two_places(total),
            receipts: count,
        })
        .collect()
}

/// Receipts whose vendor contains `needle`, ignoring case.
pub fn filter_by_vendor<'a>(receipts: &'a [StoredReceipt], needle: &str) -> Vec<&'a StoredReceipt> {
    let needle = needle.to_lowercase();
    receipts
        .iter()
        .filter(|r| r.vendor.to_lowercase().contains(&needle))
        .collect()
}

/// Sum of all amounts.
pub fn total_spend(receipts: &[StoredReceipt]) -> Decimal {
    two_places(receipts.iter().map(|r| r.amount).sum())
}

fn two_places(mut value: Decimal) -> Decimal {
    value.rescale(2);
    value
}

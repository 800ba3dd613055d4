//! Receipt data models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Vendor name used when nothing in the text identifies the store.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Fields extracted from a single receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Store or vendor name.
    pub vendor: String,

    /// Date of the purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,

    /// Total amount paid, two decimal places.
    pub amount: Decimal,

    /// Currency code.
    pub currency: String,

    /// Spending category.
    pub category: String,

    /// Detected language of the text (ISO 639-3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Full OCR output.
    pub raw_text: String,
}

impl ReceiptRecord {
    /// Check the fields required to save this receipt.
    ///
    /// A receipt needs a vendor, a positive amount and a transaction date.
    /// An amount of zero is what the extractor produces when no total was
    /// found, so it counts as missing.
    pub fn validate(&self) -> Result<ValidatedReceipt, ValidationError> {
        let mut missing = Vec::new();

        let vendor = self.vendor.trim();
        if vendor.is_empty() {
            missing.push("vendor");
        }
        if self.amount <= Decimal::ZERO {
            missing.push("amount");
        }
        if self.transaction_date.is_none() {
            missing.push("transaction_date");
        }

        match self.transaction_date {
            Some(transaction_date) if missing.is_empty() => {
                let mut amount = self.amount;
                amount.rescale(2);
                Ok(ValidatedReceipt {
                    vendor: vendor.to_string(),
                    amount,
                    transaction_date,
                    currency: self.currency.clone(),
                    category: self.category.clone(),
                    language: self.language.clone(),
                    raw_text: self.raw_text.clone(),
                })
            }
            _ => Err(ValidationError { missing }),
        }
    }
}

/// A receipt that carries every field required by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedReceipt {
    pub vendor: String,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub currency: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub raw_text: String,
}

/// A receipt read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReceipt {
    /// Row identifier.
    pub id: i64,

    pub vendor: String,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub currency: String,
    pub category: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip)]
    pub raw_text: String,

    /// When the receipt was saved.
    pub created_at: DateTime<Utc>,
}

/// Where the OCR text of a receipt came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Direct image upload.
    Image,
    /// PDF pages run through OCR.
    ScannedPdf,
    /// PDF embedded text layer.
    TextPdf,
    /// Unknown source.
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> ReceiptRecord {
        ReceiptRecord {
            vendor: "  Big Mart ".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            amount: Decimal::new(12345, 2),
            currency: "INR".to_string(),
            category: "Groceries".to_string(),
            language: Some("eng".to_string()),
            raw_text: "Store: Big Mart".to_string(),
        }
    }

    #[test]
    fn test_validate_complete_record() {
        let validated = record().validate().unwrap();
        assert_eq!(validated.vendor, "Big Mart");
        assert_eq!(validated.amount, Decimal::new(12345, 2));
        assert_eq!(
            validated.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let mut r = record();
        r.vendor = "   ".to_string();
        r.amount = Decimal::ZERO;
        r.transaction_date = None;

        let err = r.validate().unwrap_err();
        assert_eq!(err.missing, vec!["vendor", "amount", "transaction_date"]);
        assert_eq!(
            err.to_string(),
            "missing or invalid vendor, amount, transaction_date"
        );
    }

    #[test]
    fn test_validate_zero_amount_is_missing() {
        let mut r = record();
        r.amount = Decimal::ZERO;
        assert_eq!(r.validate().unwrap_err().missing, vec!["amount"]);
    }

    #[test]
    fn test_validate_rescales_amount() {
        let mut r = record();
        r.amount = Decimal::new(7, 0);
        assert_eq!(r.validate().unwrap().amount.to_string(), "7.00");
    }
}

//! Rule-based receipt parser combining the per-field extractors.

use std::time::Instant;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::config::{AmountPolicy, DateFallback, ExtractionConfig};
use crate::models::receipt::{ReceiptRecord, SourceType, UNKNOWN_VENDOR};

use super::rules::{
    first_line_vendor, AmountExtractor, DateExtractor, FieldExtractor, LanguageDetector,
    VendorExtractor,
};

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted receipt fields.
    pub record: ReceiptRecord,
    /// Where the text came from.
    pub source_type: SourceType,
    /// Fields that fell back to a default, and why.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for receipt parsing.
///
/// Parsing never fails: every field that cannot be recovered degrades to its
/// default and is reported in [`ExtractionResult::warnings`].
pub trait ReceiptParser {
    /// Parse receipt fields from OCR text.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Receipt parser driven by regex rule tables.
pub struct RuleBasedReceiptParser {
    amounts: AmountExtractor,
    date_fallback: DateFallback,
    currency: String,
    category: String,
    vendor_max_len: usize,
    detect_language: bool,
}

impl RuleBasedReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            amounts: AmountExtractor::new(config.amount_policy),
            date_fallback: config.date_fallback,
            currency: config.currency.clone(),
            category: config.category.clone(),
            vendor_max_len: config.vendor_max_len,
            detect_language: config.detect_language,
        }
    }

    /// Set the amount matching policy.
    pub fn with_amount_policy(mut self, policy: AmountPolicy) -> Self {
        self.amounts = AmountExtractor::new(policy);
        self
    }

    /// Set what an unparseable date becomes.
    pub fn with_date_fallback(mut self, fallback: DateFallback) -> Self {
        self.date_fallback = fallback;
        self
    }

    /// Enable or disable language identification.
    pub fn with_language_detection(mut self, enabled: bool) -> Self {
        self.detect_language = enabled;
        self
    }

    /// Parse text, using `today` as the fallback transaction date.
    pub fn parse_on(&self, text: &str, today: NaiveDate) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing receipt from {} characters of text", text.len());

        let vendor = self.extract_vendor(text, &mut warnings);
        let amount = self.extract_amount(text, &mut warnings);
        let transaction_date = self.extract_date(text, today, &mut warnings);

        let language = if self.detect_language {
            let detected = LanguageDetector::new().extract(text);
            if let Some(ref m) = detected {
                debug!("Detected language {} ({:.2})", m.value, m.confidence);
            }
            detected.map(|m| m.value)
        } else {
            None
        };

        let record = ReceiptRecord {
            vendor,
            transaction_date,
            amount,
            currency: self.currency.clone(),
            category: self.category.clone(),
            language,
            raw_text: text.to_string(),
        };

        debug!(
            "Extracted receipt: vendor={:?} amount={} date={:?} ({} warnings)",
            record.vendor,
            record.amount,
            record.transaction_date,
            warnings.len()
        );

        ExtractionResult {
            record,
            source_type: SourceType::Unknown,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn extract_vendor(&self, text: &str, warnings: &mut Vec<String>) -> String {
        if let Some(m) = VendorExtractor::new().extract(text) {
            return m.value;
        }

        if let Some(m) = first_line_vendor(text, self.vendor_max_len) {
            warnings.push("No vendor label found, using first line".to_string());
            return m.value;
        }

        warnings.push(format!("Could not extract vendor, using {:?}", UNKNOWN_VENDOR));
        UNKNOWN_VENDOR.to_string()
    }

    fn extract_amount(&self, text: &str, warnings: &mut Vec<String>) -> Decimal {
        match self.amounts.extract(text) {
            Some(m) => m.value,
            None => {
                warnings.push("Could not extract amount, using 0.00".to_string());
                Decimal::new(0, 2)
            }
        }
    }

    fn extract_date(
        &self,
        text: &str,
        today: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> Option<NaiveDate> {
        if let Some(m) = DateExtractor::new().extract(text) {
            return Some(m.value);
        }

        match self.date_fallback {
            DateFallback::Today => {
                warnings.push(format!("Could not extract transaction date, using {}", today));
                Some(today)
            }
            DateFallback::Unset => {
                warnings.push("Could not extract transaction date".to_string());
                None
            }
        }
    }
}

impl Default for RuleBasedReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for RuleBasedReceiptParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        self.parse_on(text, Local::now().date_naive())
    }
}

//! Vendor name extraction.

use super::patterns::VENDOR_LABEL;
use super::{ExtractionMatch, FieldExtractor};

/// Extracts a vendor from a `Store:` / `Vendor:` / `Shop:` label.
pub struct VendorExtractor;

impl VendorExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VendorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        VENDOR_LABEL
            .captures_iter(text)
            .filter_map(|caps| {
                let name = caps.get(1)?;
                let trimmed = name.as_str().trim();
                if trimmed.is_empty() {
                    return None;
                }
                let full_match = caps.get(0)?;
                Some(
                    ExtractionMatch::new(trimmed.to_string(), 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }
}

/// Use the first line of the text as the vendor.
///
/// Receipts usually print the store name at the top. The line is trimmed and
/// cut to `max_len` characters; an empty first line yields `None`.
pub fn first_line_vendor(text: &str, max_len: usize) -> Option<ExtractionMatch<String>> {
    let line = text.lines().next()?;
    let name: String = line.trim().chars().take(max_len).collect();
    let name = name.trim_end();

    if name.is_empty() {
        return None;
    }

    Some(ExtractionMatch::new(name.to_string(), 0.5, line).with_position(0, line.len()))
}

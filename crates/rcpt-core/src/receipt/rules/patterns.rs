//! Common regex patterns for receipt field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Vendor label followed by the store name on the same run of text
    pub static ref VENDOR_LABEL: Regex = Regex::new(
        r"(?i)\b(?:store|vendor|shop)\b[:\s]*([A-Za-z0-9 &]+)"
    ).unwrap();

    // "Total" / "Total Amount" with exactly two decimals. The integer part
    // may use western (1,234,567) or Indian (12,34,567) digit grouping.
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)\btotal(?:\s+amount)?[:\s$₹]*(?:(?:rs\.?|inr)\s*)?(\d{1,3}(?:,\d{3})+|\d{1,2}(?:,\d{2})+,\d{3}|\d+)\.(\d{2})\b"
    ).unwrap();

    // Any currency-shaped number: optional glyph, one or two decimals
    pub static ref BARE_AMOUNT: Regex = Regex::new(
        r"(?:[₹$]\s?)?\b(\d{1,3}(?:,\d{3})+|\d{1,2}(?:,\d{2})+,\d{3}|\d+)\.(\d{1,2})\b"
    ).unwrap();

    // DD/MM/YYYY, DD-MM-YY and friends
    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{4}|\d{2})\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_label_requires_whole_word() {
        assert!(VENDOR_LABEL.is_match("Store: Big Mart"));
        assert!(VENDOR_LABEL.is_match("VENDOR Fresh & Co"));
        assert!(!VENDOR_LABEL.is_match("Shopping list"));
        assert!(!VENDOR_LABEL.is_match("Restore point"));
    }

    #[test]
    fn test_total_amount_ignores_subtotal() {
        assert!(!TOTAL_AMOUNT.is_match("Subtotal: 10.00"));
        assert!(TOTAL_AMOUNT.is_match("TOTAL ₹ 1,250.00"));
        assert!(TOTAL_AMOUNT.is_match("Total Amount: Rs. 99.50"));
        assert!(!TOTAL_AMOUNT.is_match("Total: 12.5"));
        assert!(!TOTAL_AMOUNT.is_match("Total: 12.505"));
    }

    #[test]
    fn test_amount_digit_grouping() {
        let caps = TOTAL_AMOUNT.captures("Total: 1,23,456.00").unwrap();
        assert_eq!(&caps[1], "1,23,456");

        let caps = BARE_AMOUNT.captures("₹12,34,567.50").unwrap();
        assert_eq!(&caps[1], "12,34,567");

        let caps = BARE_AMOUNT.captures("$1,234,567.50").unwrap();
        assert_eq!(&caps[1], "1,234,567");
    }

    #[test]
    fn test_date_token_shapes() {
        assert!(DATE_TOKEN.is_match("15/03/2024"));
        assert!(DATE_TOKEN.is_match("5-3-24"));
        assert!(!DATE_TOKEN.is_match("2024-03-15"));
        assert!(!DATE_TOKEN.is_match("15/03/202"));
    }
}

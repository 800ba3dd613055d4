//! Amount extraction for receipts.

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::{BARE_AMOUNT, TOTAL_AMOUNT};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::AmountPolicy;

/// One entry of the amount rule table.
pub struct AmountRule {
    /// Rule name, for logging.
    pub name: &'static str,
    /// Pattern with the integer part in group 1 and decimals in group 2.
    pub pattern: &'static Regex,
    /// Confidence assigned to values found by this rule.
    pub confidence: f32,
}

impl AmountRule {
    /// `Total` label followed by a two-decimal number.
    pub fn labeled_total() -> Self {
        Self {
            name: "labeled_total",
            pattern: &TOTAL_AMOUNT,
            confidence: 0.95,
        }
    }

    /// Any number with one or two decimals, optional currency glyph.
    pub fn bare_amount() -> Self {
        Self {
            name: "bare_amount",
            pattern: &BARE_AMOUNT,
            confidence: 0.6,
        }
    }

    fn parse(&self, text: &str, caps: &Captures<'_>) -> Option<ExtractionMatch<Decimal>> {
        let full_match = caps.get(0)?;
        // "15.03" out of a dotted date such as 15.03.2024
        if is_dotted_continuation(&text[full_match.end()..]) {
            trace!("Rule {} skipped dotted token {:?}", self.name, full_match.as_str());
            return None;
        }

        let amount = parse_amount(caps.get(1)?.as_str(), caps.get(2)?.as_str())?;
        Some(
            ExtractionMatch::new(amount, self.confidence, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

/// Amount field extractor driven by an ordered rule table.
pub struct AmountExtractor {
    rules: Vec<AmountRule>,
}

impl AmountExtractor {
    /// Build the rule table for a policy.
    pub fn new(policy: AmountPolicy) -> Self {
        let rules = match policy {
            AmountPolicy::LabeledTotal => vec![AmountRule::labeled_total()],
            AmountPolicy::AnyCurrency => {
                vec![AmountRule::labeled_total(), AmountRule::bare_amount()]
            }
        };
        Self { rules }
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new(AmountPolicy::default())
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    /// First match of the first rule that matches at all.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.rules.iter().find_map(|rule| {
            let found = rule
                .pattern
                .captures_iter(text)
                .find_map(|caps| rule.parse(text, &caps));
            if let Some(m) = &found {
                trace!("Amount {} matched by rule {}", m.value, rule.name);
            }
            found
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.rules
            .iter()
            .flat_map(|rule| {
                rule.pattern
                    .captures_iter(text)
                    .filter_map(|caps| rule.parse(text, &caps))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

fn is_dotted_continuation(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Parse an amount from its integer part (possibly with `,` thousands
/// separators) and decimal digits. The result always has two decimal places.
pub fn parse_amount(integer_part: &str, decimal_part: &str) -> Option<Decimal> {
    let integer: String = integer_part.chars().filter(|c| *c != ',').collect();
    let mut amount = Decimal::from_str(&format!("{}.{}", integer, decimal_part)).ok()?;
    amount.rescale(2);
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234", "56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12", "5").unwrap().to_string(), "12.50");
        assert_eq!(parse_amount("0", "00").unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_labeled_total() {
        let extractor = AmountExtractor::new(AmountPolicy::LabeledTotal);
        let result = extractor.extract("Milk 2.50\nTotal: 123.45\nCash 200.00").unwrap();
        assert_eq!(result.value, dec("123.45"));
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_labeled_total_with_separators_and_glyph() {
        let extractor = AmountExtractor::new(AmountPolicy::LabeledTotal);
        let result = extractor.extract("TOTAL AMOUNT ₹1,250.00").unwrap();
        assert_eq!(result.value, dec("1250.00"));
    }

    #[test]
    fn test_strict_policy_ignores_bare_numbers() {
        let extractor = AmountExtractor::new(AmountPolicy::LabeledTotal);
        assert!(extractor.extract("Milk $2.50\nBread $3.00").is_none());
    }

    #[test]
    fn test_loose_policy_prefers_total() {
        let extractor = AmountExtractor::new(AmountPolicy::AnyCurrency);
        let result = extractor.extract("Milk $2.50\nTotal: $5.50").unwrap();
        assert_eq!(result.value, dec("5.50"));
    }

    #[test]
    fn test_loose_policy_takes_first_bare_amount() {
        let extractor = AmountExtractor::new(AmountPolicy::AnyCurrency);
        let result = extractor.extract("Milk $2.5\nBread $3.00").unwrap();
        assert_eq!(result.value, dec("2.50"));
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_indian_grouped_total() {
        let extractor = AmountExtractor::new(AmountPolicy::LabeledTotal);
        let result = extractor.extract("Net Total: 1,23,456.00").unwrap();
        assert_eq!(result.value, dec("123456.00"));
    }

    #[test]
    fn test_loose_policy_skips_dotted_dates() {
        let extractor = AmountExtractor::new(AmountPolicy::AnyCurrency);
        assert!(extractor.extract("15.03.2024").is_none());

        let result = extractor.extract("Date 15.03.2024\nCash 12.50").unwrap();
        assert_eq!(result.value, dec("12.50"));
    }

    #[test]
    fn test_extract_all_follows_rule_order() {
        let extractor = AmountExtractor::new(AmountPolicy::AnyCurrency);
        let results = extractor.extract_all("Milk 2.50\nTotal 7.25");

        let values: Vec<Decimal> = results.into_iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("7.25"), dec("2.50"), dec("7.25")]);
    }
}

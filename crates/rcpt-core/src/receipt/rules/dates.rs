//! Transaction date extraction.

use chrono::NaiveDate;
use tracing::trace;

use super::patterns::DATE_TOKEN;
use super::{ExtractionMatch, FieldExtractor};

/// A `chrono` format tried against a date token.
#[derive(Debug, Clone, Copy)]
pub struct DateFormat {
    pub format: &'static str,
    /// `%Y` formats read a two-digit year literally, so they only apply to
    /// four-digit years.
    pub four_digit_year: bool,
}

/// Candidate formats, tried in order until one parses.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat { format: "%d/%m/%Y", four_digit_year: true },
    DateFormat { format: "%d-%m-%Y", four_digit_year: true },
    DateFormat { format: "%d/%m/%y", four_digit_year: false },
    DateFormat { format: "%d-%m-%y", four_digit_year: false },
];

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    /// Parse the first date-shaped token. A first token that does not parse
    /// yields `None` even if a later token would.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = DATE_TOKEN.captures(text)?;
        let token = caps.get(0)?;
        let date = parse_date_token(token.as_str(), caps[3].len() == 4)?;
        Some(
            ExtractionMatch::new(date, 0.9, token.as_str())
                .with_position(token.start(), token.end()),
        )
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_TOKEN
            .captures_iter(text)
            .filter_map(|caps| {
                let token = caps.get(0)?;
                let date = parse_date_token(token.as_str(), caps[3].len() == 4)?;
                Some(
                    ExtractionMatch::new(date, 0.9, token.as_str())
                        .with_position(token.start(), token.end()),
                )
            })
            .collect()
    }
}

/// Try each candidate format in order.
pub fn parse_date_token(token: &str, four_digit_year: bool) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .filter(|f| f.four_digit_year == four_digit_year)
        .find_map(|f| match NaiveDate::parse_from_str(token, f.format) {
            Ok(date) => Some(date),
            Err(e) => {
                trace!("Date token {:?} does not match {}: {}", token, f.format, e);
                None
            }
        })
}

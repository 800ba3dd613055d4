//! Language identification over OCR text.

use super::{ExtractionMatch, FieldExtractor};

/// Best-effort language detector backed by `whatlang`.
///
/// The detector's best guess is returned whatever its confidence; short or
/// noisy receipts routinely produce wrong answers.
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LanguageDetector {
    /// ISO 639-3 code.
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let info = whatlang::detect(text)?;
        Some(ExtractionMatch::new(
            info.lang().code().to_string(),
            info.confidence() as f32,
            info.lang().eng_name(),
        ))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract(text).into_iter().collect()
    }
}

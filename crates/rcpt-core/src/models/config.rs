//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Receipt field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Receipt store configuration.
    pub storage: StorageConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,

    /// Maximum image dimension (longer side) handed to the engine.
    pub max_image_size: u32,

    /// Vertical distance in pixels within which text boxes share a line.
    pub line_merge_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            max_image_size: 2048,
            line_merge_tolerance: 20.0,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Use a page's embedded text layer when it has no decodable image.
    pub text_layer_fallback: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            text_layer_fallback: true,
        }
    }
}

/// Which amounts the extractor is allowed to accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    /// Only a `Total` / `Total Amount` label followed by a two-decimal number.
    #[default]
    LabeledTotal,
    /// Prefer a labeled total, otherwise take the first currency-shaped number.
    AnyCurrency,
}

/// What the transaction date becomes when no date can be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFallback {
    /// Use the date the receipt was scanned.
    #[default]
    Today,
    /// Leave the date empty; the receipt cannot be saved until it is set.
    Unset,
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Amount matching policy.
    pub amount_policy: AmountPolicy,

    /// Date used when no date token parses.
    pub date_fallback: DateFallback,

    /// Currency code stamped on every receipt.
    pub currency: String,

    /// Category label stamped on every receipt.
    pub category: String,

    /// Maximum length (characters) of a vendor taken from the first line.
    pub vendor_max_len: usize,

    /// Run language identification over the OCR text.
    pub detect_language: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            amount_policy: AmountPolicy::default(),
            date_fallback: DateFallback::default(),
            currency: "INR".to_string(),
            category: "Groceries".to_string(),
            vendor_max_len: 100,
            detect_language: true,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

/// Receipt store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("receipts.db"),
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "extraction": { "amount_policy": "any_currency", "currency": "USD" } }"#;
        let config: RcptConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.extraction.amount_policy, AmountPolicy::AnyCurrency);
        assert_eq!(config.extraction.currency, "USD");
        assert_eq!(config.extraction.category, "Groceries");
        assert_eq!(config.extraction.date_fallback, DateFallback::Today);
        assert_eq!(config.ocr.max_image_size, 2048);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.extraction.date_fallback = DateFallback::Unset;
        config.storage.database_path = PathBuf::from("/tmp/r.db");
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.date_fallback, DateFallback::Unset);
        assert_eq!(loaded.storage.database_path, PathBuf::from("/tmp/r.db"));
    }
}

//! Core library for grocery receipt analysis.
//!
//! This crate provides:
//! - OCR seam and a native engine for receipt images
//! - PDF page images and text layer
//! - Rule-based extraction of vendor, total, date and language
//! - Receipt storage in SQLite
//! - Spending reports

pub mod error;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;
pub mod report;
pub mod storage;

pub use error::{RcptError, Result};
pub use ingest::{MediaType, ReceiptScanner, ScanOutcome, Upload};
pub use models::config::RcptConfig;
pub use models::receipt::{ReceiptRecord, SourceType, StoredReceipt, ValidatedReceipt};
pub use ocr::{OcrEngine, OcrResult, TextBox};
#[cfg(feature = "native")]
pub use ocr::{create_engine_from_dir, PureOcrEngine};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use receipt::{ExtractionResult, ReceiptParser, RuleBasedReceiptParser};
pub use storage::{ReceiptStore, SqliteReceiptStore};

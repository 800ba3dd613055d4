//! PDF page source for receipt OCR.

mod extractor;

pub use extractor::PdfExtractor;

use std::path::Path;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Open a PDF file on disk.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Raster images making up a page (1-indexed), in content order.
    ///
    /// A scanned receipt page normally carries exactly one image; a page with
    /// no decodable image yields an empty list.
    fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// Embedded text layer of a single page (1-indexed).
    fn page_text(&self, page: u32) -> Result<String>;
}

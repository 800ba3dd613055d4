//! Receipt ingestion: uploaded file in, extracted receipt out.

mod staging;

pub use staging::StagedUpload;

use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use tracing::{debug, info, trace, warn};

use crate::error::{PdfError, RcptError, Result};
use crate::models::config::{OcrConfig, PdfConfig, RcptConfig};
use crate::models::receipt::SourceType;
use crate::ocr::OcrEngine;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::receipt::{ExtractionResult, RuleBasedReceiptParser};

/// Kinds of file a receipt can arrive as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
    Pdf,
}

impl MediaType {
    /// Map a declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Canonical MIME type.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }
}

/// An uploaded file: bytes plus the MIME type the uploader declared.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let media = MediaType::from_path(path)
            .ok_or_else(|| RcptError::UnsupportedMedia(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(file_name, media.mime(), bytes))
    }
}

/// Outcome of scanning one upload.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// OCR produced text and fields were extracted from it.
    Extracted(ExtractionResult),
    /// No record was produced.
    Failed { reason: String },
}

impl ScanOutcome {
    /// The extraction, if the scan succeeded.
    pub fn extraction(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Extracted(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// Runs uploads through OCR and the field extractor.
pub struct ReceiptScanner<E: OcrEngine> {
    engine: E,
    parser: RuleBasedReceiptParser,
    ocr: OcrConfig,
    pdf: PdfConfig,
}

impl<E: OcrEngine> ReceiptScanner<E> {
    /// Create a scanner around an OCR engine.
    pub fn new(engine: E, config: &RcptConfig) -> Self {
        Self {
            engine,
            parser: RuleBasedReceiptParser::from_config(&config.extraction),
            ocr: config.ocr.clone(),
            pdf: config.pdf.clone(),
        }
    }

    /// The wrapped OCR engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Scan an upload, falling back to today's date.
    pub fn scan(&self, upload: &Upload) -> ScanOutcome {
        self.scan_on(upload, Local::now().date_naive())
    }

    /// Scan an upload with an explicit fallback date.
    pub fn scan_on(&self, upload: &Upload, today: NaiveDate) -> ScanOutcome {
        let start = Instant::now();

        let (text, source_type) = match self.read_text(upload) {
            Ok(read) => read,
            Err(e) => {
                warn!("Extraction failed for {}: {}", upload.file_name, e);
                return ScanOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if text.trim().is_empty() {
            warn!("Extraction failed for {}: no text detected", upload.file_name);
            return ScanOutcome::Failed {
                reason: "no text detected".to_string(),
            };
        }

        let mut result = self.parser.parse_on(&text, today);
        result.source_type = source_type;
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scanned {} in {}ms ({} warnings)",
            upload.file_name,
            result.processing_time_ms,
            result.warnings.len()
        );

        ScanOutcome::Extracted(result)
    }

    /// Stage the upload and read its text from the staged file.
    ///
    /// The staging directory lives until this function returns.
    pub fn read_text(&self, upload: &Upload) -> Result<(String, SourceType)> {
        let media = MediaType::from_mime(&upload.mime_type)
            .ok_or_else(|| RcptError::UnsupportedMedia(upload.mime_type.clone()))?;

        let staged = StagedUpload::write(&upload.file_name, &upload.bytes)?;

        match media {
            MediaType::Pdf => self.read_pdf(&mut PdfExtractor::new(), staged.path()),
            MediaType::Png | MediaType::Jpeg => {
                let image = ImageReader::open(staged.path())?
                    .with_guessed_format()?
                    .decode()?;
                Ok((self.ocr_image(&image)?, SourceType::Image))
            }
        }
    }

    /// Read every page of a PDF in order.
    ///
    /// A page with images is OCR'd as one raster; a page without one
    /// contributes its embedded text layer. A page with neither fails the
    /// whole document.
    pub fn read_pdf<P: PdfProcessor>(
        &self,
        processor: &mut P,
        path: &Path,
    ) -> Result<(String, SourceType)> {
        processor.open(path)?;

        let mut page_count = processor.page_count();
        if self.pdf.max_pages > 0 {
            page_count = page_count.min(self.pdf.max_pages as u32);
        }

        let mut text = String::new();
        let mut scanned = false;

        for page in 1..=page_count {
            if let Some(raster) = compose_page(processor.page_images(page)?) {
                let page_text = self.ocr_image(&raster)?;
                debug!("Page {}: {} characters from OCR", page, page_text.len());
                text.push_str(&page_text);
                scanned = true;
                continue;
            }

            if !self.pdf.text_layer_fallback {
                return Err(RcptError::Config(format!(
                    "page {} has no decodable image and text layer fallback is disabled",
                    page
                )));
            }

            let layer = processor.page_text(page)?;
            if layer.trim().is_empty() {
                return Err(PdfError::UnreadablePage(page).into());
            }
            debug!("Page {}: {} characters from text layer", page, layer.len());
            text.push_str(&layer);
        }

        let source = if scanned {
            SourceType::ScannedPdf
        } else {
            SourceType::TextPdf
        };
        Ok((text, source))
    }

    fn ocr_image(&self, image: &DynamicImage) -> Result<String> {
        let prepared = prepare_image(image, self.ocr.max_image_size);
        Ok(self.engine.extract_text(&prepared)?)
    }
}

/// Stack a page's images top to bottom into one raster.
fn compose_page(mut images: Vec<DynamicImage>) -> Option<DynamicImage> {
    if images.len() <= 1 {
        return images.pop();
    }

    let width = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let height = images.iter().map(|i| i.height()).sum::<u32>();
    trace!("Composing {} images into {}x{}", images.len(), width, height);

    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut top = 0i64;
    for image in &images {
        imageops::overlay(&mut canvas, &image.to_rgb8(), 0, top);
        top += i64::from(image.height());
    }
    Some(DynamicImage::ImageRgb8(canvas))
}

/// Downscale so the longer side is at most `max_size` pixels.
pub fn prepare_image(image: &DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if max_size == 0 || width.max(height) <= max_size {
        return image.clone();
    }
    debug!("Downscaling {}x{} to fit {}", width, height, max_size);
    image.resize(max_size, max_size, FilterType::Triangle)
}

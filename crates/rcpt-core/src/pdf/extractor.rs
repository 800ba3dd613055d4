//! PDF page images and text using lopdf and pdf-extract.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF page source backed by lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    source: PathBuf,
    /// Per-page text from pdf-extract, filled on first use.
    page_texts: OnceCell<Vec<String>>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            source: PathBuf::new(),
            page_texts: OnceCell::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn decode_image_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    trace!("Decoding JPEG page image");
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    debug!("Skipping page image with unsupported filter");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        raw_to_image(&data, width, height, color_space, bits)
    }

    /// Resources of a page, following `Parent` links for inherited ones.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(doc, *parent_id),
            _ => None,
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn open(&mut self, path: &Path) -> Result<()> {
        let mut doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            // Receipts exported by some POS systems use an empty user password
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Opened {} with {} pages", path.display(), page_count);
        self.document = Some(doc);
        self.source = path.to_path_buf();
        self.page_texts = OnceCell::new();
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.decode_image_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Page {}: {} images", page, images.len());
        Ok(images)
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }

        // pdf-extract stops at the first page it cannot lay out, so the
        // list may be shorter than the document.
        let texts = self.page_texts.get_or_init(|| {
            pdf_extract::extract_text_by_pages(&self.source).unwrap_or_else(|e| {
                debug!("pdf-extract failed on {}: {}", self.source.display(), e);
                Vec::new()
            })
        });

        if let Some(text) = texts.get(page as usize - 1) {
            if !text.trim().is_empty() {
                return Ok(text.clone());
            }
        }

        trace!("Page {}: falling back to lopdf text extraction", page);
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// Build an image from uncompressed 8-bit RGB or grayscale samples.
fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;

    match color_space {
        b"DeviceRGB" | b"RGB" => {
            let len = pixels.checked_mul(3)?;
            let samples = data.get(..len)?.to_vec();
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" => {
            let samples = data.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        other => {
            trace!(
                "Unsupported color space {:?}",
                String::from_utf8_lossy(other)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn content_stream(operations: Vec<Operation>) -> Stream {
        Stream::new(dictionary! {}, Content { operations }.encode().unwrap())
    }

    fn text_line(y: i32, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// Three pages: a raw grayscale scan drawing inherited resources, a
    /// text-only page, and a JPEG scan with its own resources.
    fn receipt_pdf(dir: &TempDir) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let gray_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 20,
                "Height" => 10,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![200u8; 20 * 10],
        ));
        let jpeg_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 16,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes(16, 8),
        ));

        let draw = |name: &str, width: i32, height: i32| {
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![name.into()]),
                Operation::new("Q", vec![]),
            ]
        };

        let scan_contents = doc.add_object(content_stream(draw("Im1", 200, 100)));
        let scan_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => scan_contents,
        });

        let mut lines = text_line(700, "Store: Fresh Basket");
        lines.extend(text_line(680, "Total: 9.99"));
        let text_contents = doc.add_object(content_stream(lines));
        let text_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => text_contents,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let jpeg_contents = doc.add_object(content_stream(draw("Im2", 160, 80)));
        let jpeg_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => jpeg_contents,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im2" => jpeg_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![
                    Object::Reference(scan_page),
                    Object::Reference(text_page),
                    Object::Reference(jpeg_page),
                ],
                "Count" => 3,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im1" => gray_id },
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.path().join("receipt.pdf");
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.page_images(1).is_err());
        assert!(extractor.page_text(1).is_err());
    }

    #[test]
    fn test_open_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        fs::write(&path, b"definitely not a pdf").unwrap();

        let mut extractor = PdfExtractor::new();
        let err = extractor.open(&path).unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_page_images_from_real_document() {
        let dir = TempDir::new().unwrap();
        let mut extractor = PdfExtractor::new();
        extractor.open(&receipt_pdf(&dir)).unwrap();

        assert_eq!(extractor.page_count(), 3);

        let scan = extractor.page_images(1).unwrap();
        assert_eq!(scan.len(), 1);
        assert_eq!((scan[0].width(), scan[0].height()), (20, 10));
        assert!(matches!(scan[0], DynamicImage::ImageLuma8(_)));

        // Own resources replace the inherited ones
        assert!(extractor.page_images(2).unwrap().is_empty());

        let jpeg = extractor.page_images(3).unwrap();
        assert_eq!(jpeg.len(), 1);
        assert_eq!((jpeg[0].width(), jpeg[0].height()), (16, 8));

        assert!(matches!(
            extractor.page_images(4),
            Err(PdfError::InvalidPage(4))
        ));
    }

    #[test]
    fn test_page_text_from_real_document() {
        let dir = TempDir::new().unwrap();
        let mut extractor = PdfExtractor::new();
        extractor.open(&receipt_pdf(&dir)).unwrap();

        let text = extractor.page_text(2).unwrap();
        assert!(text.contains("Store: Fresh Basket"), "got {:?}", text);
        assert!(text.contains("Total: 9.99"), "got {:?}", text);

        assert!(extractor.page_text(1).unwrap().trim().is_empty());
        assert!(matches!(
            extractor.page_text(9),
            Err(PdfError::InvalidPage(9))
        ));
    }

    #[test]
    fn test_raw_rgb_to_image() {
        let data = vec![255u8; 2 * 3 * 3];
        let img = raw_to_image(&data, 2, 3, b"DeviceRGB", 8).unwrap();
        assert_eq!((img.width(), img.height()), (2, 3));
    }

    #[test]
    fn test_raw_gray_short_buffer() {
        assert!(raw_to_image(&[0u8; 3], 2, 2, b"DeviceGray", 8).is_none());
        assert!(raw_to_image(&[0u8; 4], 2, 2, b"DeviceGray", 8).is_some());
    }

    #[test]
    fn test_raw_unsupported_depth() {
        assert!(raw_to_image(&[0u8; 4], 2, 2, b"DeviceGray", 1).is_none());
    }
}

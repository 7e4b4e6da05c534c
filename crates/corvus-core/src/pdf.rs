//! PDF text extraction via `pdfium-render`, with a per-page OCR fallback
//! when the embedded text layer is too thin.
//!
//! Grounded on `original_source/app/extractors/content_extractors.py`'s
//! `extract_text_from_pdf_bytes`/`_ocr_pdf_page`: walk pages in order, and
//! for any page whose extracted text falls under `OCR_LOW_TEXT_THRESHOLD`,
//! render it to a bitmap and run it through the injected [`TextExtractor`],
//! keeping whichever of the two text candidates is longer.

use pdfium_render::prelude::*;

use corvus_types::{CorvusError, CorvusResult};

use crate::text_extract::TextExtractor;

const OCR_LOW_TEXT_THRESHOLD: usize = 50;
const OCR_RENDER_WIDTH: i32 = 1600;

/// Owns the `Pdfium` library binding; expensive to set up, so callers
/// should build one per process and share it, not one per request.
pub struct PdfExtractor {
    pdfium: Pdfium,
}

impl PdfExtractor {
    pub fn new() -> CorvusResult<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| CorvusError::parse(format!("failed to bind pdfium library: {e}")))?;
        Ok(Self { pdfium: Pdfium::new(bindings) })
    }

    /// Extracts and concatenates every page's text, OCR-backfilling pages
    /// whose text layer is too sparse to be useful. Returns `None` (not an
    /// error) for an empty or unreadable result, matching the source's
    /// "nothing extractable" outcome.
    pub fn extract_text(
        &self,
        pdf_bytes: &[u8],
        ocr: &dyn TextExtractor,
    ) -> CorvusResult<Option<String>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| CorvusError::parse(format!("failed to open pdf: {e}")))?;

        let mut pages_text = Vec::new();
        for page in document.pages().iter() {
            let mut page_text = page.text().map(|t| t.all()).unwrap_or_default();

            if page_text.trim().chars().count() < OCR_LOW_TEXT_THRESHOLD {
                match self.ocr_page(&page, ocr) {
                    Ok(ocr_text) if ocr_text.trim().chars().count() > page_text.trim().chars().count() => {
                        page_text = ocr_text;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "pdf page ocr failed"),
                }
            }

            pages_text.push(page_text);
        }

        let full_text = pages_text.join("\n").trim().to_string();
        Ok(if full_text.is_empty() { None } else { Some(full_text) })
    }

    fn ocr_page(&self, page: &PdfPage, ocr: &dyn TextExtractor) -> CorvusResult<String> {
        let config = PdfRenderConfig::new().set_target_width(OCR_RENDER_WIDTH);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CorvusError::parse(format!("failed to render pdf page: {e}")))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();

        Ok(ocr.extract_text(&rgba, width, height)?.unwrap_or_default())
    }
}

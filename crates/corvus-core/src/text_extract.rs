//! The OCR port. `original_source/app/extractors/content_extractors.py`
//! calls `pytesseract` directly; here that dependency is an injected trait
//! so the orchestrator and the PDF extractor don't hard-code a particular
//! OCR engine. The default implementation does nothing, matching the
//! source's behavior when `pytesseract`/`Pillow` aren't installed.

use corvus_types::CorvusResult;

/// Extracts visible text from a raster image given as tightly-packed RGBA8
/// pixels plus its dimensions — the shape both a decoded image file and a
/// pdfium page-render bitmap reduce to, so neither caller needs to pick a
/// container format. Implementations are expected to return `Ok(None)` (not
/// an error) when there's nothing readable in the image, reserving `Err`
/// for genuine extractor failures.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, rgba: &[u8], width: u32, height: u32) -> CorvusResult<Option<String>>;
}

/// No-op extractor used when no OCR engine is configured. Every call
/// returns `Ok(None)`, the same outcome `extract_text_from_image_bytes`
/// produces when `OCR_AVAILABLE` is `false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTextExtractor;

impl TextExtractor for NullTextExtractor {
    fn extract_text(&self, _rgba: &[u8], _width: u32, _height: u32) -> CorvusResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_extractor_always_returns_none() {
        let extractor = NullTextExtractor;
        assert_eq!(extractor.extract_text(&[0, 0, 0, 255], 1, 1).unwrap(), None);
    }
}

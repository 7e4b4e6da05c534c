//! Text extraction for the non-HTML, non-PDF, non-image content types:
//! JSON gets pretty-printed, XML gets its tags stripped, everything else
//! (markdown, plain text) is trimmed as-is.
//!
//! Grounded on `original_source/app/extractors/content_extractors.py`'s
//! `extract_text_content`/`format_json_content`/`extract_xml_text`.

use once_cell::sync::Lazy;
use regex::Regex;

use corvus_types::ContentType;

static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Dispatches on content type; returns `None` when there's nothing left
/// after trimming, mirroring the source's falsy-string check.
pub fn extract_text_content(body: &str, content_type: ContentType) -> Option<String> {
    let text = match content_type {
        ContentType::Json => format_json_content(body),
        ContentType::Xml => extract_xml_text(body),
        _ => body.trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pretty-prints JSON with two-space indentation; falls back to the raw
/// trimmed body if it doesn't parse, rather than failing the scrape.
fn format_json_content(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}

/// Strips XML/HTML-style tags and collapses runs of whitespace to single
/// spaces, producing a plain-text approximation of the document's content.
fn extract_xml_text(body: &str) -> String {
    let untagged = XML_TAG.replace_all(body, " ");
    WHITESPACE_RUN.replace_all(untagged.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_gets_pretty_printed() {
        let result = extract_text_content(r#"{"a":1}"#, ContentType::Json).unwrap();
        assert_eq!(result, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn invalid_json_falls_back_to_raw_trimmed_body() {
        let result = extract_text_content("  not json  ", ContentType::Json).unwrap();
        assert_eq!(result, "not json");
    }

    #[test]
    fn xml_tags_are_stripped_and_whitespace_collapsed() {
        let result = extract_text_content("<root>  <a>hello</a>\n\n<b>world</b>  </root>", ContentType::Xml).unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn plain_text_is_just_trimmed() {
        let result = extract_text_content("  hello  \n", ContentType::PlainText).unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn blank_body_yields_none() {
        assert!(extract_text_content("   ", ContentType::PlainText).is_none());
    }
}

//! Inline-run rendering: collapses a subtree of inline elements into plain
//! text plus a markdown-formatted sibling string.
//!
//! The source's `HTMLFlattener` does this as a DOM rewrite pass before
//! extraction (wrapping runs of inline siblings in
//! `<span class="flattened-text" fmt-txt="...">`). Since `scraper`'s tree
//! is read-only, this renders the same markdown directly whenever the
//! extractor reaches an inline-only leaf, and the extractor stores the
//! result in `metadata.attributes["fmt-txt"]` exactly where the wrapper
//! would have put it.

use corvus_utils::urls::{is_data_url, join_url};
use corvus_utils::DomainFilter;
use scraper::{ElementRef, Node};

pub const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "em", "i", "ins", "del", "kbd", "mark", "q",
    "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr", "br", "data",
    "dfn",
];

pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dt", "dd", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "ul", "video", "picture", "audio",
];

pub const MEDIA_ELEMENTS: &[&str] = &["img", "video", "audio", "figure", "picture", "embed"];

pub fn is_inline(tag: &str) -> bool {
    INLINE_ELEMENTS.contains(&tag)
}

pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

pub fn is_media(tag: &str) -> bool {
    MEDIA_ELEMENTS.contains(&tag)
}

/// `javascript:`/`data:` are never readable; http/https/ftp/ftps/tel/mailto
/// always are.
fn is_readable_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    if lower.starts_with("tel:") || lower.starts_with("mailto:") {
        return true;
    }
    if lower.starts_with("javascript:") || lower.starts_with("data:") {
        return false;
    }
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("ftp://")
        || lower.starts_with("ftps://")
}

/// True if a subtree contains only inline elements and text (no block
/// children) — the condition under which a container should be flattened
/// rather than renamed to `div`.
pub fn is_purely_inline(element: &ElementRef) -> bool {
    for child in element.children() {
        match child.value() {
            Node::Text(_) => {}
            Node::Element(el) => {
                if is_block(&el.name) {
                    return false;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    if !is_purely_inline(&child_ref) {
                        return false;
                    }
                }
            }
            _ => {}
        }
    }
    true
}

/// Renders an inline subtree to `(plain_text, markdown_text)`. The two
/// strings are equal unless an anchor or inline-formatting tag produced
/// markdown syntax.
pub fn render_inline(
    element: &ElementRef,
    base_url: Option<&str>,
    domain_filter: &DomainFilter,
) -> (String, String) {
    let mut plain = String::new();
    let mut markdown = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let joined = normalize_ws(text);
                plain.push_str(&joined);
                markdown.push_str(&joined);
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    let (p, m) = render_inline_element(&child_ref, base_url, domain_filter);
                    plain.push_str(&p);
                    markdown.push_str(&m);
                }
            }
            _ => {}
        }
    }
    (plain.trim().to_string(), markdown.trim().to_string())
}

fn normalize_ws(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.starts_with(char::is_whitespace) || text.is_empty() {
        format!(" {joined}")
    } else {
        joined
    }
}

fn render_inline_element(
    element: &ElementRef,
    base_url: Option<&str>,
    domain_filter: &DomainFilter,
) -> (String, String) {
    let tag = element.value().name();
    if tag == "br" {
        return ("\n".to_string(), "\n".to_string());
    }

    let (inner_plain, inner_markdown) = render_inline(element, base_url, domain_filter);

    match tag {
        "a" => {
            let href = element.value().attr("href").unwrap_or("");
            let joined = join_url(base_url, Some(href));
            let (is_data, _) = is_data_url(joined.as_deref());
            let readable = joined.as_deref().map(is_readable_url).unwrap_or(false);
            let not_blocked = joined
                .as_deref()
                .map(|u| !domain_filter.should_block(u))
                .unwrap_or(true);

            if !inner_plain.is_empty() && !href.is_empty() && !is_data && readable && not_blocked {
                let target = joined.unwrap_or_else(|| href.to_string());
                (inner_plain.clone(), format!("[{inner_plain}]({target})"))
            } else {
                (inner_plain.clone(), inner_plain)
            }
        }
        "b" | "strong" => (inner_plain.clone(), format!("**{inner_markdown}**")),
        "i" | "em" => (inner_plain.clone(), format!("*{inner_markdown}*")),
        "code" => (inner_plain.clone(), format!("`{inner_markdown}`")),
        "s" | "del" => (inner_plain.clone(), format!("~~{inner_markdown}~~"),),
        _ => (inner_plain, inner_markdown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn parse_div(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn anchor_renders_markdown_link() {
        let doc = parse_div(r#"<div>see <a href="https://example.com">here</a></div>"#);
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let filter = DomainFilter::empty();
        let (plain, md) = render_inline(&el, None, &filter);
        assert_eq!(plain, "see here");
        assert!(md.contains("[here](https://example.com)"));
    }

    #[test]
    fn javascript_href_stays_plain() {
        let doc = parse_div(r#"<div><a href="javascript:void(0)">click</a></div>"#);
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let filter = DomainFilter::empty();
        let (plain, md) = render_inline(&el, None, &filter);
        assert_eq!(plain, md);
        assert_eq!(plain, "click");
    }

    #[test]
    fn purely_inline_detects_block_children() {
        let doc = parse_div(r#"<div><span>a</span><p>b</p></div>"#);
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert!(!is_purely_inline(&el));
    }
}

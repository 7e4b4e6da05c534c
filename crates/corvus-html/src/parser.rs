//! The parser façade: turns raw HTML bytes into a [`ParseResult`].
//!
//! Ties together the modules the rest of this crate exposes in the order
//! `original_source/app/core/parser/parser.py`'s `HTMLParser.parse` runs
//! them: drop non-content tags, narrow to a domain's configured main
//! content region (if any), mark-filter with the merged rule set, extract
//! to a flat node sequence, project through a named rule set, then render
//! to the output shapes the caller asked for.

use std::collections::HashMap;

use corvus_types::{CorvusResult, OutputMode, Overview, ParseResult, ScrapeOptions};
use corvus_utils::urls::{extract_domain, join_url};
use corvus_utils::DomainFilter;
use scraper::{ElementRef, Html, Selector};

use crate::extractor::{extract_element, ExtractContext};
use crate::filter::{select_main_content, FilterRule, FilterRuleSet};
use crate::project::{find_rule, project_content, ProjectOptions};
use crate::render::{count_kinds, render_text};

/// A parsed document's DOM handle, kept around so a caller can run several
/// named-rule projections against the same parse without re-parsing HTML.
pub struct ParsedDocument {
    html: Html,
    url: String,
}

impl ParsedDocument {
    /// Parses `html` as a full document. `script`, `head`, `link`, `style`,
    /// `svg`, and `noscript` are left in the tree (scraper's tree is
    /// read-only) but the extractor drops them structurally during the walk.
    pub fn new(html: &str, url: impl Into<String>) -> Self {
        Self { html: Html::parse_document(html), url: url.into() }
    }

    fn body(&self) -> Option<ElementRef> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next()
    }
}

/// Merged per-domain overrides the façade needs: a domain's content-filter
/// additions and its main-content selector, both already resolved from
/// `corvus-config`'s raw override rows into this crate's `FilterRule` shape.
#[derive(Debug, Clone, Default)]
pub struct DomainOverrides {
    pub content_filter: Vec<FilterRule>,
    pub main_content: Vec<FilterRule>,
}

/// Runs the full pipeline and returns a [`ParseResult`] populated per
/// `opts`'s `get_*` flags and `opts.output_mode`.
pub fn parse_document(
    doc: &ParsedDocument,
    domain_filter: &DomainFilter,
    overrides: &DomainOverrides,
    opts: &ScrapeOptions,
) -> CorvusResult<ParseResult> {
    let base_rules = FilterRuleSet::base_config().merged_with(overrides.content_filter.clone());

    let Some(body) = doc.body() else {
        return Ok(ParseResult::default());
    };

    let content_roots = select_main_content(&body, &overrides.main_content);
    let roots: Vec<ElementRef> = if content_roots.is_empty() { vec![body] } else { content_roots };

    let ctx = ExtractContext {
        base_url: Some(doc.url.clone()),
        domain_filter,
        filter_rules: &base_rules,
        include_media: opts.include_media,
        include_anchors: opts.include_anchors,
        anchor_size: opts.anchor_size,
    };

    let mut flat = Vec::new();
    for root in &roots {
        flat.extend(extract_element(root, &ctx, false));
    }

    let removal_details = collect_removal_details(&flat);

    if matches!(opts.output_mode, OutputMode::Research) {
        let rule = find_rule("full");
        let research_opts = ProjectOptions {
            remove_formatting: true,
            remove_anchors: true,
            remove_filtered: true,
            organize_content_by_headers: true,
        };
        let tree = project_content(flat, rule, &research_opts);
        let ai_research_content = render_text(&tree);
        return Ok(ParseResult {
            ai_research_content: Some(ai_research_content),
            content_filter_removal_details: if opts.get_content_filter_removal_details {
                Some(removal_details)
            } else {
                None
            },
            ..ParseResult::default()
        });
    }

    let rule = find_rule("full");
    let rich_opts = ProjectOptions {
        remove_formatting: false,
        remove_anchors: false,
        remove_filtered: true,
        organize_content_by_headers: true,
    };
    let organized = project_content(flat.clone(), rule, &rich_opts);

    let text_data = if opts.get_text_data { Some(render_text(&organized)) } else { None };

    // `ai_research_content` is one of the fixed fields `rich` mode always
    // returns (spec.md §4.8), projected through the narrower rule the
    // glossary names: headers/text/quotes/lists/tables, plain formatting.
    let ai_research_rule = find_rule("ai_research");
    let ai_research_opts = ProjectOptions {
        remove_formatting: true,
        remove_anchors: true,
        remove_filtered: true,
        organize_content_by_headers: true,
    };
    let ai_research_tree = project_content(flat, ai_research_rule, &ai_research_opts);
    let ai_research_content = Some(render_text(&ai_research_tree));

    let title = extract_title(&doc.html);
    let main_image = if opts.get_main_image {
        extract_main_image(&doc.html, &doc.url)
    } else {
        None
    };
    let links = if opts.get_links { extract_links(&roots, &doc.url) } else { Vec::new() };

    let overview = if opts.get_overview {
        let (table_count, list_count, code_block_count) = count_kinds(&organized.children);
        let rendered = text_data.clone().unwrap_or_else(|| render_text(&organized));
        Some(Overview {
            site: extract_domain(&doc.url),
            page_title: title.clone(),
            char_count: rendered.chars().count(),
            table_count,
            list_count,
            code_block_count,
            has_structured_content: table_count + list_count + code_block_count > 0,
        })
    } else {
        None
    };

    let mut hashes = HashMap::new();
    if let Some(text) = &text_data {
        hashes.insert("content".to_string(), content_hash(text));
    }

    let organized_data = if opts.get_organized_data || opts.get_structured_data {
        Some(organized)
    } else {
        None
    };

    Ok(ParseResult {
        overview,
        organized_data,
        text_data,
        ai_research_content,
        main_image,
        hashes,
        links,
        content_filter_removal_details: if opts.get_content_filter_removal_details {
            Some(removal_details)
        } else {
            None
        },
    })
}

fn collect_removal_details(nodes: &[corvus_types::ContentNode]) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    walk_removal_details(nodes, &mut out);
    out
}

fn walk_removal_details(nodes: &[corvus_types::ContentNode], out: &mut Vec<serde_json::Value>) {
    for node in nodes {
        let meta = node.metadata();
        if meta.filtered {
            out.push(serde_json::json!({
                "tag": meta.tag,
                "type": node.type_name(),
                "details": meta.filter_details,
            }));
        }
        if let corvus_types::ContentNode::Header { children, .. } = node {
            walk_removal_details(children, out);
        }
    }
}

fn content_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn extract_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    html.select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
        .filter(|t| !t.is_empty())
}

const MAIN_IMAGE_META: &[(&str, &str)] = &[
    ("property", "og:image"),
    ("property", "og:image:url"),
    ("name", "twitter:image"),
    ("name", "twitter:image:src"),
];

fn extract_main_image(html: &Html, base_url: &str) -> Option<String> {
    let selector = Selector::parse("meta").ok()?;
    for el in html.select(&selector) {
        for (attr, value) in MAIN_IMAGE_META {
            if el.value().attr(attr) == Some(*value) {
                if let Some(content) = el.value().attr("content") {
                    if let Some(resolved) = join_url(Some(base_url), Some(content)) {
                        return Some(resolved);
                    }
                }
            }
        }
    }
    None
}

fn extract_links(roots: &[ElementRef], base_url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for root in roots {
        for el in root.select(&selector) {
            let Some(href) = el.value().attr("href") else { continue };
            let Some(resolved) = join_url(Some(base_url), Some(href)) else { continue };
            if resolved.starts_with("data:") {
                continue;
            }
            if seen.insert(resolved.clone()) {
                out.push(resolved);
            }
        }
    }
    out
}

/// Converts resolved [`corvus_config`]-shaped override rows into this
/// crate's [`FilterRule`]; kept here (not in `corvus-config`) since
/// `corvus-config` sits downstream of `corvus-html` in the dependency
/// order and must not be depended on by it.
pub fn filter_rule_from_parts(
    selector_type: &str,
    match_type: corvus_types::MatchType,
    values: Vec<String>,
) -> FilterRule {
    let mut rule = FilterRule { attribute: selector_type.to_string(), ..Default::default() };
    match match_type {
        corvus_types::MatchType::Exact => rule.exact = values,
        corvus_types::MatchType::Partial => rule.partial = values,
        corvus_types::MatchType::Regex => rule.regex = values,
    }
    rule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain_filter() -> DomainFilter {
        DomainFilter::empty()
    }

    #[test]
    fn parses_simple_article() {
        let html = r#"
            <html><head><title>Hi</title></head>
            <body>
                <h1>Welcome</h1>
                <p>Hello <b>world</b>.</p>
                <nav>skip me</nav>
            </body></html>
        "#;
        let doc = ParsedDocument::new(html, "https://example.com/a");
        let overrides = DomainOverrides::default();
        let df = domain_filter();
        let mut opts = ScrapeOptions::default();
        opts.get_overview = true;
        let result = parse_document(&doc, &df, &overrides, &opts).unwrap();
        let text = result.text_data.unwrap();
        assert!(text.contains("Welcome"));
        assert!(text.contains("world"));
        assert!(!text.contains("skip me"));
        let overview = result.overview.unwrap();
        assert_eq!(overview.page_title.as_deref(), Some("Hi"));
    }

    #[test]
    fn research_mode_only_fills_ai_research_content() {
        let html = "<html><body><h1>T</h1><p>body text</p></body></html>";
        let doc = ParsedDocument::new(html, "https://example.com/");
        let overrides = DomainOverrides::default();
        let df = domain_filter();
        let opts = ScrapeOptions::for_research();
        let result = parse_document(&doc, &df, &overrides, &opts).unwrap();
        assert!(result.ai_research_content.is_some());
        assert!(result.text_data.is_none());
        assert!(result.links.is_empty());
    }

    #[test]
    fn main_content_override_narrows_extraction() {
        let html = r#"
            <html><body>
                <div class="ad">promo text</div>
                <main id="real"><p>actual content</p></main>
            </body></html>
        "#;
        let doc = ParsedDocument::new(html, "https://example.com/");
        let overrides = DomainOverrides {
            content_filter: vec![],
            main_content: vec![FilterRule { attribute: "tag".into(), exact: vec!["main".into()], ..Default::default() }],
        };
        let df = domain_filter();
        let opts = ScrapeOptions::default();
        let result = parse_document(&doc, &df, &overrides, &opts).unwrap();
        let text = result.text_data.unwrap();
        assert!(text.contains("actual content"));
        assert!(!text.contains("promo text"));
    }
}

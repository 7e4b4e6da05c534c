//! Projects the extractor's flat content sequence into the shape the caller
//! asked for: nesting under headers, dropping filtered/disallowed node
//! kinds, and stripping markdown formatting when the caller wants plain
//! text only.
//!
//! Grounded on the source's named extraction rule fixtures (one rule per
//! content archetype — article, docs page, product listing, ...), each
//! constraining which node kinds survive projection.

use std::collections::VecDeque;

use corvus_types::{ContentNode, OrganizedData};

#[derive(Debug, Clone)]
pub struct StandardRule {
    pub name: &'static str,
    pub allowed_kinds: &'static [&'static str],
}

/// The standard named rule set, one entry per content archetype the
/// original's rule fixtures distinguished.
pub const STANDARD_RULES: &[StandardRule] = &[
    StandardRule { name: "full", allowed_kinds: &["header", "text", "code", "quote", "list", "table", "image", "audio", "video"] },
    StandardRule { name: "article", allowed_kinds: &["header", "text", "code", "quote", "list", "table", "image"] },
    StandardRule { name: "documentation", allowed_kinds: &["header", "text", "code", "quote", "list", "table"] },
    StandardRule { name: "product", allowed_kinds: &["header", "text", "list", "table", "image"] },
    StandardRule { name: "forum_thread", allowed_kinds: &["header", "text", "quote", "list", "image"] },
    StandardRule { name: "news", allowed_kinds: &["header", "text", "quote", "image", "video"] },
    StandardRule { name: "blog_post", allowed_kinds: &["header", "text", "code", "quote", "list", "image", "video"] },
    StandardRule { name: "reference", allowed_kinds: &["header", "text", "code", "table"] },
    StandardRule { name: "faq", allowed_kinds: &["header", "text", "list"] },
    StandardRule { name: "changelog", allowed_kinds: &["header", "text", "list", "code"] },
    StandardRule { name: "press_release", allowed_kinds: &["header", "text", "quote", "image"] },
    StandardRule { name: "listing", allowed_kinds: &["header", "text", "list", "table", "image"] },
    StandardRule { name: "minimal", allowed_kinds: &["header", "text"] },
    StandardRule { name: "ai_research", allowed_kinds: &["header", "text", "quote", "list", "table"] },
];

pub fn find_rule(name: &str) -> &'static StandardRule {
    STANDARD_RULES
        .iter()
        .find(|r| r.name == name)
        .unwrap_or(&STANDARD_RULES[0])
}

#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    pub remove_formatting: bool,
    pub remove_anchors: bool,
    pub remove_filtered: bool,
    pub organize_content_by_headers: bool,
}

/// Applies `rule` and `opts` to a flat content sequence, returning the
/// final `OrganizedData` tree.
pub fn project_content(
    nodes: Vec<ContentNode>,
    rule: &StandardRule,
    opts: &ProjectOptions,
) -> OrganizedData {
    let filtered = drop_disallowed(nodes, rule, opts);
    let stripped = if opts.remove_formatting || opts.remove_anchors {
        strip_formatting(filtered, opts)
    } else {
        filtered
    };
    let children = if opts.organize_content_by_headers {
        organize_by_headers(stripped)
    } else {
        stripped
    };
    OrganizedData { children }
}

/// Accepts the original's `"paragraph"`/`"header_text"` aliases for
/// `"text"`/`"header"` in hand-authored `allowed_children` lists
/// (`original_source/app/core/parser/data_types.py`'s `ExtractionSettings`).
fn kind_matches(allowed: &str, type_name: &str) -> bool {
    let normalized = match allowed {
        "paragraph" => "text",
        "header_text" => "header",
        other => other,
    };
    normalized == type_name
}

fn kind_allowed(node: &ContentNode, rule: &StandardRule) -> bool {
    rule.allowed_kinds.iter().any(|k| kind_matches(k, node.type_name()))
}

fn drop_disallowed(nodes: Vec<ContentNode>, rule: &StandardRule, opts: &ProjectOptions) -> Vec<ContentNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            if opts.remove_filtered && node.metadata().filtered {
                return None;
            }
            if !kind_allowed(&node, rule) {
                return None;
            }
            if let ContentNode::Header { children, .. } = &mut node {
                let taken = std::mem::take(children);
                *children = drop_disallowed(taken, rule, opts);
            }
            Some(node)
        })
        .collect()
}

fn strip_formatting(nodes: Vec<ContentNode>, opts: &ProjectOptions) -> Vec<ContentNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            {
                let meta = node.metadata_mut();
                if opts.remove_formatting {
                    meta.attributes.remove("fmt-txt");
                } else if opts.remove_anchors {
                    let strip = meta
                        .attributes
                        .get("fmt-txt")
                        .and_then(|v| v.as_str())
                        .map(|s| s.contains("]("))
                        .unwrap_or(false);
                    if strip {
                        meta.attributes.remove("fmt-txt");
                    }
                }
            }
            if let ContentNode::Header { children, .. } = &mut node {
                let taken = std::mem::take(children);
                *children = strip_formatting(taken, opts);
            }
            node
        })
        .collect()
}

/// Header-stack nesting: a header absorbs every following sibling (and any
/// deeper header) into its `children`, until a header at its own level or
/// shallower appears.
fn organize_by_headers(nodes: Vec<ContentNode>) -> Vec<ContentNode> {
    let mut queue: VecDeque<ContentNode> = nodes.into_iter().collect();
    nest(&mut queue, 0)
}

fn nest(queue: &mut VecDeque<ContentNode>, min_level: u8) -> Vec<ContentNode> {
    let mut out = Vec::new();
    while let Some(front) = queue.front() {
        if let ContentNode::Header { level, .. } = front {
            if *level < min_level {
                break;
            }
            let mut header = queue.pop_front().unwrap();
            if let ContentNode::Header { level, children, .. } = &mut header {
                let child_min = level.saturating_add(1);
                *children = nest(queue, child_min);
            }
            out.push(header);
        } else {
            out.push(queue.pop_front().unwrap());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvus_types::ElementMetadata;

    fn header(level: u8, text: &str) -> ContentNode {
        ContentNode::Header {
            level,
            text: text.to_string(),
            children: Vec::new(),
            metadata: ElementMetadata::new(""),
        }
    }

    fn text(content: &str) -> ContentNode {
        ContentNode::Text {
            content: content.to_string(),
            metadata: ElementMetadata::new(""),
        }
    }

    #[test]
    fn nests_headers_by_level() {
        let flat = vec![
            header(1, "Intro"),
            text("hello"),
            header(2, "Sub"),
            text("nested"),
            header(1, "Next"),
            text("world"),
        ];
        let nested = organize_by_headers(flat);
        assert_eq!(nested.len(), 2);
        if let ContentNode::Header { children, .. } = &nested[0] {
            assert_eq!(children.len(), 2);
            assert!(matches!(children[1], ContentNode::Header { .. }));
        } else {
            panic!("expected header");
        }
    }

    #[test]
    fn minimal_rule_drops_tables() {
        let rule = find_rule("minimal");
        let nodes = vec![
            header(1, "T"),
            ContentNode::Table {
                rows: vec![],
                metadata: ElementMetadata::new(""),
            },
        ];
        let opts = ProjectOptions::default();
        let result = project_content(nodes, rule, &opts);
        assert_eq!(result.children.len(), 1);
    }

    #[test]
    fn remove_formatting_strips_fmt_txt() {
        let mut meta = ElementMetadata::new("");
        meta.attributes.insert("fmt-txt".into(), serde_json::json!("**bold**"));
        let node = ContentNode::Text {
            content: "bold".into(),
            metadata: meta,
        };
        let opts = ProjectOptions {
            remove_formatting: true,
            ..Default::default()
        };
        let result = project_content(vec![node], find_rule("full"), &opts);
        assert!(result.children[0].metadata().fmt_text().is_none());
    }
}

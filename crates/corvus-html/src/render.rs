//! Renders a projected [`OrganizedData`] tree into the two public output
//! shapes spec.md §4.7 names: `content` (a single markdown-ish string) and
//! `data` (a flat list of typed records).
//!
//! Grounded on `original_source/app/core/parser/data_types.py`'s
//! `to_content`/`to_data` dispatch per node type — here expressed as a
//! match over [`ContentNode`] instead of per-class methods.

use corvus_types::{ContentNode, ListItem, OrganizedData, TableRow};
use serde_json::{json, Value};

/// Renders the tree to the `content` output shape: a single newline-joined
/// string, headers as `#`*level prefixes, lists as `- item`, tables as a
/// simple pipe-delimited grid, code in fenced blocks, images as markdown.
pub fn render_text(data: &OrganizedData) -> String {
    let mut out = Vec::new();
    render_nodes(&data.children, &mut out);
    out.join("\n\n")
}

fn render_nodes(nodes: &[ContentNode], out: &mut Vec<String>) {
    for node in nodes {
        if let Some(rendered) = render_node(node) {
            out.push(rendered);
        }
    }
}

fn render_node(node: &ContentNode) -> Option<String> {
    match node {
        ContentNode::Header { level, text, children, .. } => {
            let prefix = if *level == 0 {
                String::new()
            } else {
                format!("{} ", "#".repeat((*level).min(6) as usize))
            };
            let mut block = vec![format!("{prefix}{text}")];
            let mut nested = Vec::new();
            render_nodes(children, &mut nested);
            block.extend(nested);
            Some(block.join("\n\n"))
        }
        ContentNode::Text { content, metadata } => {
            let text = metadata.fmt_text().unwrap_or(content.as_str());
            if text.trim().is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        ContentNode::Code { content, .. } => Some(format!("```\n{content}\n```")),
        ContentNode::Quote { content, .. } => Some(
            content
                .lines()
                .map(|l| format!("> {l}"))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        ContentNode::List { items, .. } => Some(render_list(items, 0)),
        ContentNode::Table { rows, .. } => render_table(rows),
        ContentNode::Image { src, alt, caption, .. } => {
            let alt_text = alt.clone().unwrap_or_default();
            Some(match caption {
                Some(c) if !c.is_empty() => format!("![{alt_text}]({src} \"{c}\")"),
                _ => format!("![{alt_text}]({src})"),
            })
        }
        ContentNode::Audio { src, .. } => src.as_ref().map(|s| format!("[audio]({s})")),
        ContentNode::Video { src, .. } => src.as_ref().map(|s| format!("[video]({s})")),
    }
}

fn render_list(items: &[ListItem], depth: usize) -> String {
    let indent = "  ".repeat(depth);
    items
        .iter()
        .filter_map(|item| match item {
            ListItem::Node(node) => render_node(node).map(|text| {
                let first_line_joined = text.replace('\n', "\n  ");
                format!("{indent}- {first_line_joined}")
            }),
            ListItem::Nested(nested) => {
                let rendered = render_list(nested, depth + 1);
                if rendered.is_empty() {
                    None
                } else {
                    Some(rendered)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a table to a pipe-delimited grid. Columns come from the union of
/// row keys in first-seen (stored) order; shorter rows are left-aligned with
/// empty cells, matching spec.md §4.6's "missing cells filled with empty
/// strings".
fn render_table(rows: &[TableRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for (key, _) in row {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", columns.join(" | ")));
    lines.push(format!(
        "| {} |",
        columns.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| {
                row.iter()
                    .find(|(key, _)| key == col)
                    .map(|(_, nodes)| {
                        nodes
                            .iter()
                            .filter_map(render_node)
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .unwrap_or_default()
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    Some(lines.join("\n"))
}

/// Renders the tree to the `data` output shape: a flat list of
/// `{type, ...}` records, headers and media carrying their own fields,
/// lists carrying a flattened content array per spec.md §4.7.
pub fn render_data(data: &OrganizedData) -> Vec<Value> {
    let mut out = Vec::new();
    data_nodes(&data.children, &mut out);
    out
}

fn data_nodes(nodes: &[ContentNode], out: &mut Vec<Value>) {
    for node in nodes {
        out.push(data_node(node));
    }
}

fn data_node(node: &ContentNode) -> Value {
    match node {
        ContentNode::Header { level, text, children, .. } => {
            let mut child_records = Vec::new();
            data_nodes(children, &mut child_records);
            json!({"type": "header", "level": level, "content": text, "children": child_records})
        }
        ContentNode::Text { content, metadata } => {
            json!({"type": "text", "content": metadata.fmt_text().unwrap_or(content)})
        }
        ContentNode::Code { content, .. } => json!({"type": "code", "content": content}),
        ContentNode::Quote { content, .. } => json!({"type": "quote", "content": content}),
        ContentNode::List { items, .. } => json!({"type": "list", "content": list_to_value(items)}),
        ContentNode::Table { rows, .. } => {
            let table_rows: Vec<Value> = rows
                .iter()
                .map(|row| {
                    // `serde_json::Map`'s default representation
                    // (`preserve_order` feature, which this workspace
                    // enables) keeps insertion order, so this preserves the
                    // original column order instead of a `HashMap`'s.
                    let mut record = serde_json::Map::new();
                    for (col, nodes) in row {
                        let mut rendered = Vec::new();
                        data_nodes(nodes, &mut rendered);
                        record.insert(col.clone(), Value::Array(rendered));
                    }
                    Value::Object(record)
                })
                .collect();
            json!({"type": "table", "rows": table_rows})
        }
        ContentNode::Image {
            src, alt, width, height, title, caption, all_sources, is_data_url, ..
        } => json!({
            "type": "image",
            "src": src,
            "alt": alt,
            "width": width,
            "height": height,
            "title": title,
            "caption": caption,
            "all_sources": all_sources,
            "is_data_url": is_data_url,
        }),
        ContentNode::Audio { src, controls, autoplay, is_loop, muted, sources, tracks, .. } => json!({
            "type": "audio",
            "src": src,
            "controls": controls,
            "autoplay": autoplay,
            "loop": is_loop,
            "muted": muted,
            "sources": sources,
            "tracks": tracks,
        }),
        ContentNode::Video {
            src, poster, width, height, controls, autoplay, is_loop, muted, playsinline,
            sources, tracks, provider, ..
        } => json!({
            "type": "video",
            "src": src,
            "poster": poster,
            "width": width,
            "height": height,
            "controls": controls,
            "autoplay": autoplay,
            "loop": is_loop,
            "muted": muted,
            "playsinline": playsinline,
            "sources": sources,
            "tracks": tracks,
            "provider": provider,
        }),
    }
}

fn list_to_value(items: &[ListItem]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| match item {
                ListItem::Node(node) => data_node(node),
                ListItem::Nested(nested) => list_to_value(nested),
            })
            .collect(),
    )
}

/// Counts used to populate `Overview`'s `table_count`/`list_count`/
/// `code_block_count`; exposed here since it walks the same tree shape as
/// rendering.
pub fn count_kinds(nodes: &[ContentNode]) -> (usize, usize, usize) {
    let mut tables = 0;
    let mut lists = 0;
    let mut code_blocks = 0;
    walk_counts(nodes, &mut tables, &mut lists, &mut code_blocks);
    (tables, lists, code_blocks)
}

fn walk_counts(nodes: &[ContentNode], tables: &mut usize, lists: &mut usize, code_blocks: &mut usize) {
    for node in nodes {
        match node {
            ContentNode::Table { .. } => *tables += 1,
            ContentNode::List { .. } => *lists += 1,
            ContentNode::Code { .. } => *code_blocks += 1,
            ContentNode::Header { children, .. } => walk_counts(children, tables, lists, code_blocks),
            _ => {}
        }
    }
}

/// Reconstructs a flat `ElementMetadata`-free plain-text body, used for the
/// fetcher's `low_text_content` probe when the caller only has a document
/// tree (not the raw HTML) on hand, e.g. in tests.
pub fn plain_char_count(data: &OrganizedData) -> usize {
    render_text(data).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvus_types::ElementMetadata;

    fn text(content: &str) -> ContentNode {
        ContentNode::Text {
            content: content.to_string(),
            metadata: ElementMetadata::new("p"),
        }
    }

    #[test]
    fn renders_header_and_text() {
        let tree = OrganizedData {
            children: vec![ContentNode::Header {
                level: 1,
                text: "T".to_string(),
                children: vec![text("hi")],
                metadata: ElementMetadata::new("h1"),
            }],
        };
        let rendered = render_text(&tree);
        assert!(rendered.contains("# T"));
        assert!(rendered.contains("hi"));
    }

    #[test]
    fn renders_table_with_missing_cells_as_empty() {
        let row_a: TableRow = vec![
            ("col1".to_string(), vec![text("x")]),
            ("col2".to_string(), vec![text("y")]),
        ];
        let row_b: TableRow = vec![("col1".to_string(), vec![text("z")])];

        let tree = OrganizedData {
            children: vec![ContentNode::Table {
                rows: vec![row_a, row_b],
                metadata: ElementMetadata::new("table"),
            }],
        };
        let rendered = render_text(&tree);
        assert!(rendered.contains("col1"));
        assert!(rendered.contains("col2"));
    }

    #[test]
    fn table_columns_preserve_source_order() {
        let row: TableRow = vec![
            ("zeta".to_string(), vec![text("1")]),
            ("alpha".to_string(), vec![text("2")]),
        ];
        let tree = OrganizedData {
            children: vec![ContentNode::Table {
                rows: vec![row],
                metadata: ElementMetadata::new("table"),
            }],
        };
        let rendered = render_text(&tree);
        assert!(rendered.find("zeta").unwrap() < rendered.find("alpha").unwrap());
    }

    #[test]
    fn data_shape_tags_node_type() {
        let tree = OrganizedData { children: vec![text("hi")] };
        let records = render_data(&tree);
        assert_eq!(records[0]["type"], "text");
    }
}

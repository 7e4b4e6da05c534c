//! The typed document tree produced by the element extractor and walked by
//! the extraction projector.
//!
//! The source models content nodes as a dynamically-typed polymorphic tree
//! (a `BaseContent` subclass hierarchy with a shared `get`/`to_content`/
//! `to_data` dispatch). Here it's a single tagged enum: the projector
//! matches on `ContentNode` instead of doing attribute-based dispatch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata carried by every node in the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementMetadata {
    pub tag: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default)]
    pub filtered: bool,
    pub filter_details: Option<Value>,
}

impl ElementMetadata {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    /// `fmt-txt` is where the flattener stashes a node's markdown rendering.
    pub fn fmt_text(&self) -> Option<&str> {
        self.attributes.get("fmt-txt").and_then(Value::as_str)
    }
}

/// A media `<source>`/`<track>` candidate, kept as a loose string map the
/// way the source keeps them (`sources: list[dict[str, str]]`).
pub type MediaRef = HashMap<String, String>;

/// One row of a `Table`: an ordered `column → cell nodes` sequence.
/// spec.md §3 models this as a Python dict, which preserves insertion
/// order — a plain `HashMap` would permute columns relative to the
/// source `<td>` order, so this keeps the column list as a `Vec` of
/// pairs instead.
pub type TableRow = Vec<(String, Vec<ContentNode>)>;

/// One node of the extracted document tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    Header {
        level: u8,
        text: String,
        children: Vec<ContentNode>,
        metadata: ElementMetadata,
    },
    Text {
        content: String,
        metadata: ElementMetadata,
    },
    Code {
        content: String,
        metadata: ElementMetadata,
    },
    Quote {
        content: String,
        metadata: ElementMetadata,
    },
    List {
        items: Vec<ListItem>,
        metadata: ElementMetadata,
    },
    Table {
        rows: Vec<TableRow>,
        metadata: ElementMetadata,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        all_sources: Vec<String>,
        #[serde(default)]
        is_data_url: bool,
        metadata: ElementMetadata,
    },
    Audio {
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        controls: bool,
        #[serde(default)]
        autoplay: bool,
        #[serde(default, rename = "loop")]
        is_loop: bool,
        #[serde(default)]
        muted: bool,
        #[serde(default)]
        sources: Vec<MediaRef>,
        #[serde(default)]
        tracks: Vec<MediaRef>,
        metadata: ElementMetadata,
    },
    Video {
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        poster: Option<String>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        controls: bool,
        #[serde(default)]
        autoplay: bool,
        #[serde(default, rename = "loop")]
        is_loop: bool,
        #[serde(default)]
        muted: bool,
        #[serde(default)]
        playsinline: bool,
        #[serde(default)]
        sources: Vec<MediaRef>,
        #[serde(default)]
        tracks: Vec<MediaRef>,
        #[serde(default)]
        provider: Option<String>,
        metadata: ElementMetadata,
    },
}

impl ContentNode {
    /// The variant's name as used in `allowed_children` rule sets and in
    /// `data` projections' `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentNode::Header { .. } => "header",
            ContentNode::Text { .. } => "text",
            ContentNode::Code { .. } => "code",
            ContentNode::Quote { .. } => "quote",
            ContentNode::List { .. } => "list",
            ContentNode::Table { .. } => "table",
            ContentNode::Image { .. } => "image",
            ContentNode::Audio { .. } => "audio",
            ContentNode::Video { .. } => "video",
        }
    }

    pub fn metadata(&self) -> &ElementMetadata {
        match self {
            ContentNode::Header { metadata, .. }
            | ContentNode::Text { metadata, .. }
            | ContentNode::Code { metadata, .. }
            | ContentNode::Quote { metadata, .. }
            | ContentNode::List { metadata, .. }
            | ContentNode::Table { metadata, .. }
            | ContentNode::Image { metadata, .. }
            | ContentNode::Audio { metadata, .. }
            | ContentNode::Video { metadata, .. } => metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ElementMetadata {
        match self {
            ContentNode::Header { metadata, .. }
            | ContentNode::Text { metadata, .. }
            | ContentNode::Code { metadata, .. }
            | ContentNode::Quote { metadata, .. }
            | ContentNode::List { metadata, .. }
            | ContentNode::Table { metadata, .. }
            | ContentNode::Image { metadata, .. }
            | ContentNode::Audio { metadata, .. }
            | ContentNode::Video { metadata, .. } => metadata,
        }
    }
}

/// A list entry: either a leaf node or a nested sub-list, mirroring the
/// source's untyped `content: list[Any]` that can hold either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ListItem {
    Node(Box<ContentNode>),
    Nested(Vec<ListItem>),
}

/// The root of one parsed document: a synthetic level-0 header plus
/// whatever real headers/content follow it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrganizedData {
    pub children: Vec<ContentNode>,
}

impl OrganizedData {
    pub fn new() -> Self {
        Self::default()
    }
}

//! Core DOM tree walk: turns a parsed document body into a flat sequence of
//! `ContentNode`s. Headers stay flat here — `project::organize_content_by_headers`
//! nests them afterward using the header-stack algorithm, which only needs a
//! flat sequence to work from.
//!
//! Folds in what the source splits across two passes (`HTMLTransformer` then
//! `ElementExtractor`) because `scraper`'s tree can't be rewritten in place:
//! orphan `<li>` runs are collected into a synthetic list inline, a known
//! video-embed `<iframe>` becomes a `Video` node directly, a `<header>` tag
//! is classified content-vs-nav on the spot instead of being renamed before
//! extraction, and a `bsp-carousel` is rewritten into a titled list of slide
//! descriptions plus preserved media on the spot rather than as a separate
//! DOM-rewrite pass.

use corvus_types::{ContentNode, ElementMetadata, ListItem};
use corvus_utils::urls::{is_data_url, join_url};
use corvus_utils::DomainFilter;
use scraper::{ElementRef, Node};
use serde_json::json;

use crate::filter::FilterRuleSet;
use crate::flatten::{is_purely_inline, render_inline};

/// Tags dropped unconditionally regardless of site filter config — these
/// never carry visible content and have already been stripped once in
/// `parser`'s pre-pass, but the extractor defends against the same tags
/// appearing inside a fragment handed to it directly (e.g. in tests).
const STRUCTURAL_DROP: &[&str] = &["script", "style", "head", "link", "noscript", "template"];

const VIDEO_IFRAME_HOSTS: &[(&str, &str)] = &[
    ("youtube.com", "youtube"),
    ("youtube-nocookie.com", "youtube"),
    ("youtu.be", "youtube"),
    ("vimeo.com", "vimeo"),
    ("player.vimeo.com", "vimeo"),
    ("dailymotion.com", "dailymotion"),
    ("wistia.com", "wistia"),
    ("wistia.net", "wistia"),
];

pub struct ExtractContext<'a> {
    pub base_url: Option<String>,
    pub domain_filter: &'a DomainFilter,
    pub filter_rules: &'a FilterRuleSet,
    pub include_media: bool,
    pub include_anchors: bool,
    pub anchor_size: usize,
}

/// Walks `element`'s children and returns the flat content sequence.
/// `filtered_ancestor` is true once a filter match has been seen on a
/// parent, so the flag (and not a second lookup) propagates to descendants.
pub fn extract_element(
    element: &ElementRef,
    ctx: &ExtractContext,
    filtered_ancestor: bool,
) -> Vec<ContentNode> {
    let mut out = Vec::new();
    let mut pending_orphans: Vec<ElementRef> = Vec::new();

    macro_rules! flush_orphans {
        () => {
            if !pending_orphans.is_empty() {
                if let Some(list) = build_list_from_items(&pending_orphans, ctx, filtered_ancestor)
                {
                    out.push(list);
                }
                pending_orphans.clear();
            }
        };
    }

    for child in element.children() {
        let Node::Element(el) = child.value() else {
            continue;
        };
        let tag = el.name.local.as_ref();
        if STRUCTURAL_DROP.contains(&tag) {
            continue;
        }
        let Some(child_ref) = ElementRef::wrap(child) else {
            continue;
        };

        if tag == "li" {
            pending_orphans.push(child_ref);
            continue;
        }
        flush_orphans!();

        let filtered_here = if filtered_ancestor {
            true
        } else {
            match ctx.filter_rules.first_match(&child_ref) {
                Some(_) => true,
                None => false,
            }
        };

        if let Some(node) = dispatch(&child_ref, tag, ctx, filtered_here) {
            out.push(node);
        }
    }
    flush_orphans!();
    out
}

fn dispatch(
    element: &ElementRef,
    tag: &str,
    ctx: &ExtractContext,
    filtered: bool,
) -> Option<ContentNode> {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: u8 = tag[1..].parse().unwrap_or(1);
            let (text, _md) = render_inline(element, ctx.base_url.as_deref(), ctx.domain_filter);
            if text.is_empty() {
                return None;
            }
            Some(ContentNode::Header {
                level,
                text,
                children: Vec::new(),
                metadata: meta(element, filtered, None),
            })
        }
        "pre" => {
            let content: String = element.text().collect::<Vec<_>>().join("");
            if content.trim().is_empty() {
                return None;
            }
            Some(ContentNode::Code {
                content,
                metadata: meta(element, filtered, None),
            })
        }
        "blockquote" => {
            let (text, _md) = render_inline(element, ctx.base_url.as_deref(), ctx.domain_filter);
            if text.is_empty() {
                return block_container(element, ctx, filtered);
            }
            Some(ContentNode::Quote {
                content: text,
                metadata: meta(element, filtered, None),
            })
        }
        "ul" | "ol" => build_list(element, ctx, filtered),
        "table" => build_table(element, ctx, filtered),
        "img" => build_image(element, ctx, filtered),
        "picture" => build_picture(element, ctx, filtered),
        "figure" => build_figure(element, ctx, filtered),
        "audio" => build_audio(element, ctx, filtered),
        "video" => build_video(element, ctx, filtered),
        "iframe" => build_iframe(element, ctx, filtered),
        "header" => classify_header(element, ctx, filtered),
        "nav" | "footer" | "aside" => {
            if filtered {
                None
            } else {
                block_container(element, ctx, filtered)
            }
        }
        "br" | "hr" | "svg" => None,
        _ => {
            if has_class(element, "bsp-carousel") {
                return build_carousel(element, ctx, filtered);
            }
            if is_purely_inline(element) {
                let (text, md) =
                    render_inline(element, ctx.base_url.as_deref(), ctx.domain_filter);
                if text.is_empty() {
                    return None;
                }
                let fmt = if md != text { Some(md) } else { None };
                Some(ContentNode::Text {
                    content: text,
                    metadata: meta(element, filtered, fmt),
                })
            } else {
                block_container(element, ctx, filtered)
            }
        }
    }
}

fn has_class(element: &ElementRef, name: &str) -> bool {
    element
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().any(|tok| tok == name))
        .unwrap_or(false)
}

/// A `bsp-carousel` becomes a titled list of slide descriptions with each
/// slide's `<picture>` preserved alongside it, per spec.md §4.4. Slides are
/// any direct-or-nested element carrying a `slide` class; the description is
/// taken from the first element with a `caption`/`description` class (or,
/// failing that, the slide's own rendered text).
fn build_carousel(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    let slide_selector = scraper::Selector::parse("[class~=slide]").ok()?;
    let picture_selector = scraper::Selector::parse("picture, img").ok()?;
    let caption_selector =
        scraper::Selector::parse("[class*=caption], [class*=description]").ok()?;

    let mut out_items = vec![ListItem::Node(Box::new(ContentNode::Text {
        content: "Carousel".to_string(),
        metadata: meta(element, filtered, None),
    }))];

    for slide in element.select(&slide_selector) {
        let description = if let Some(cap) = slide.select(&caption_selector).next() {
            render_inline(&cap, ctx.base_url.as_deref(), ctx.domain_filter).0
        } else {
            render_inline(&slide, ctx.base_url.as_deref(), ctx.domain_filter).0
        };
        if !description.is_empty() {
            out_items.push(ListItem::Node(Box::new(ContentNode::Text {
                content: description,
                metadata: meta(&slide, filtered, None),
            })));
        }
        if let Some(media) = slide.select(&picture_selector).next() {
            let image = if media.value().name() == "picture" {
                build_picture(&media, ctx, filtered)
            } else {
                build_image(&media, ctx, filtered)
            };
            if let Some(image) = image {
                out_items.push(ListItem::Node(Box::new(image)));
            }
        }
    }

    if out_items.len() == 1 {
        return None;
    }
    Some(ContentNode::List {
        items: out_items,
        metadata: meta(element, filtered, None),
    })
}

/// For transparent containers (`div`, `p`, `section`, ...): recurse and let
/// the caller splice the children in flat, rather than emitting a node for
/// the container itself. Wrapped in a synthetic block so callers can treat
/// it uniformly; `dispatch` callers that need the flat list unwrap it via
/// `extract_element` directly instead when possible.
fn block_container(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    let children = extract_element(element, ctx, filtered);
    if children.is_empty() {
        return None;
    }
    if children.len() == 1 {
        return children.into_iter().next();
    }
    // Multiple block children inside one inline dispatch slot: fall back to
    // a Quote-less wrapper isn't available, so splice by returning the
    // sequence as a synthetic list is wrong too. The extractor's top-level
    // caller always flattens via `extract_element`, so in practice this
    // path is only hit for truly transparent containers and the caller
    // (the `for child in element.children()` loop) expects one node per
    // child slot; represent the remainder as a quote-free text merge.
    Some(ContentNode::Text {
        content: children
            .iter()
            .filter_map(node_plain_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
        metadata: meta(element, filtered, None),
    })
}

fn node_plain_text(node: &ContentNode) -> Option<String> {
    match node {
        ContentNode::Text { content, .. }
        | ContentNode::Code { content, .. }
        | ContentNode::Quote { content, .. } => Some(content.clone()),
        ContentNode::Header { text, .. } => Some(text.clone()),
        _ => None,
    }
}

fn meta(element: &ElementRef, filtered: bool, fmt_txt: Option<String>) -> ElementMetadata {
    let mut m = ElementMetadata::new(element.value().name());
    m.filtered = filtered;
    if filtered {
        m.filter_details = Some(json!({"tag": element.value().name()}));
    }
    if let Some(fmt) = fmt_txt {
        m.attributes.insert("fmt-txt".to_string(), json!(fmt));
    }
    m
}

// ---------------------------------------------------------------- lists

fn build_list(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    let items: Vec<ElementRef> = element
        .children()
        .filter_map(|c| ElementRef::wrap(c))
        .filter(|e| e.value().name() == "li")
        .collect();
    build_list_from_items(&items, ctx, filtered)
}

fn build_list_from_items(
    items: &[ElementRef],
    ctx: &ExtractContext,
    filtered: bool,
) -> Option<ContentNode> {
    if items.is_empty() {
        return None;
    }
    let mut out_items = Vec::new();
    for li in items {
        let nested_lists: Vec<ElementRef> = li
            .children()
            .filter_map(|c| ElementRef::wrap(c))
            .filter(|e| matches!(e.value().name(), "ul" | "ol"))
            .collect();

        let (text, md) = render_inline(li, ctx.base_url.as_deref(), ctx.domain_filter);
        if !text.is_empty() {
            let fmt = if md != text { Some(md) } else { None };
            out_items.push(ListItem::Node(Box::new(ContentNode::Text {
                content: text,
                metadata: meta(li, filtered, fmt),
            })));
        }
        for nested in &nested_lists {
            if let Some(ContentNode::List { items: nested_items, .. }) =
                build_list(nested, ctx, filtered)
            {
                out_items.push(ListItem::Nested(nested_items));
            }
        }
        if text.is_empty() && nested_lists.is_empty() {
            let children = extract_element(li, ctx, filtered);
            for child in children {
                out_items.push(ListItem::Node(Box::new(child)));
            }
        }
    }
    if out_items.is_empty() {
        return None;
    }
    Some(ContentNode::List {
        items: out_items,
        metadata: meta(items[0], filtered, None),
    })
}

// ---------------------------------------------------------------- tables

/// Six indicators from the source's `_is_data_table`: header cells/`thead`,
/// a `<caption>`, a `summary` attribute, and consistent multi-column rows
/// push toward "data"; `role="presentation"`/`"none"`, nested tables, and
/// old-school layout attributes (`cellspacing`/`cellpadding` with
/// `border="0"`) push toward "layout".
fn is_data_table(table: &ElementRef) -> bool {
    let mut score = 0i32;

    let has_th = table
        .select(&scraper::Selector::parse("th").unwrap())
        .next()
        .is_some();
    let has_thead = table
        .select(&scraper::Selector::parse("thead").unwrap())
        .next()
        .is_some();
    if has_th || has_thead {
        score += 2;
    }
    if table
        .select(&scraper::Selector::parse("caption").unwrap())
        .next()
        .is_some()
    {
        score += 1;
    }
    if table.value().attr("summary").is_some() {
        score += 1;
    }

    let row_selector = scraper::Selector::parse("tr").unwrap();
    let cell_selector = scraper::Selector::parse("td, th").unwrap();
    let rows: Vec<_> = table.select(&row_selector).collect();
    let col_counts: Vec<usize> = rows
        .iter()
        .map(|r| r.select(&cell_selector).count())
        .filter(|c| *c > 0)
        .collect();
    if col_counts.len() > 1 && col_counts.iter().all(|c| *c == col_counts[0]) && col_counts[0] > 1
    {
        score += 2;
    }
    if rows.len() <= 1 || col_counts.iter().max().copied().unwrap_or(0) <= 1 {
        score -= 1;
    }

    match table.value().attr("role") {
        Some("presentation") | Some("none") => score -= 3,
        _ => {}
    }
    if table
        .select(&scraper::Selector::parse("table").unwrap())
        .next()
        .is_some()
    {
        score -= 2;
    }
    let layout_attrs = table.value().attr("cellspacing").is_some()
        || table.value().attr("cellpadding").is_some();
    if layout_attrs && table.value().attr("border") == Some("0") {
        score -= 2;
    }

    score > 0
}

fn build_table(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !is_data_table(element) {
        return block_container(element, ctx, filtered);
    }

    let row_selector = scraper::Selector::parse("tr").unwrap();
    let header_cell_selector = scraper::Selector::parse("th").unwrap();
    let body_cell_selector = scraper::Selector::parse("td, th").unwrap();

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for (idx, tr) in element.select(&row_selector).enumerate() {
        let header_cells: Vec<_> = tr.select(&header_cell_selector).collect();
        if idx == 0 && !header_cells.is_empty() {
            headers = header_cells
                .iter()
                .map(|c| render_inline(c, ctx.base_url.as_deref(), ctx.domain_filter).0)
                .collect();
            continue;
        }

        let cells: Vec<_> = tr.select(&body_cell_selector).collect();
        if cells.is_empty() {
            continue;
        }
        let mut row: corvus_types::TableRow = Vec::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            let key = headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("col{}", i + 1));
            let content = extract_element(cell, ctx, filtered);
            let content = if content.is_empty() {
                let (text, _) = render_inline(cell, ctx.base_url.as_deref(), ctx.domain_filter);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ContentNode::Text {
                        content: text,
                        metadata: meta(cell, filtered, None),
                    }]
                }
            } else {
                content
            };
            row.push((key, content));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return None;
    }
    Some(ContentNode::Table {
        rows,
        metadata: meta(element, filtered, None),
    })
}

// ---------------------------------------------------------------- images

const TRACKING_PIXEL_HINTS: &[&str] = &["pixel", "spacer", "beacon", "blank.gif", "1x1", "track"];

/// Known base64 payload of a 1x1 transparent GIF tracking pixel, the way
/// ad networks commonly inline one directly as a data URL.
const TRACKING_PIXEL_BASE64_SIGNATURES: &[&str] = &[
    "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBTAA7",
    "R0lGODlhAQABAAAAACH5BAEKAAEALAAAAAABAAEAAAICTAEAOw==",
];

/// Ranked by spec.md §4.6: `src` first, then the lazy-load/CDN attribute
/// variants seen in the wild, `srcset` last (handled separately since it
/// needs its own parsing).
const IMAGE_CANDIDATE_ATTRS: &[&str] = &[
    "src",
    "data-src",
    "data-lazy",
    "data-original",
    "data-lazy-src",
    "data-original-src",
    "data-url",
    "data-hi-res-src",
    "data-full-src",
    "lazy-src",
    "nitro-lazy-src",
];

fn is_tracking_pixel(element: &ElementRef, url: &str) -> bool {
    let w = element.value().attr("width").unwrap_or("");
    let h = element.value().attr("height").unwrap_or("");
    if (w == "1" && h == "1") || (w == "0" && h == "0") {
        return true;
    }
    let lower = url.to_lowercase();
    if TRACKING_PIXEL_HINTS.iter().any(|hint| lower.contains(hint)) {
        return true;
    }
    if let Some(data) = url.strip_prefix("data:").and_then(|rest| rest.split(',').nth(1)) {
        if TRACKING_PIXEL_BASE64_SIGNATURES
            .iter()
            .any(|sig| data.starts_with(sig))
        {
            return true;
        }
    }
    false
}

fn best_srcset_candidate(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            let mut pieces = part.split_whitespace();
            let url = pieces.next()?;
            let width = pieces
                .next()
                .and_then(|d| d.trim_end_matches('w').parse::<u32>().ok())
                .unwrap_or(0);
            Some((url.to_string(), width))
        })
        .max_by_key(|(_, w)| *w)
        .map(|(url, _)| url)
}

/// Ranks candidate `src`-like attributes, preferring the first non-pixel,
/// non-data-URL candidate; falls back to a data URL only when nothing else
/// is available.
fn pick_image_source(element: &ElementRef, ctx: &ExtractContext) -> (Option<String>, Vec<String>) {
    let mut candidates = Vec::new();
    for attr in IMAGE_CANDIDATE_ATTRS {
        if let Some(v) = element.value().attr(attr) {
            if !v.is_empty() {
                candidates.push(v.to_string());
            }
        }
    }
    if let Some(srcset) = element.value().attr("data-srcset").or(element.value().attr("srcset")) {
        if let Some(best) = best_srcset_candidate(srcset) {
            candidates.push(best);
        }
    }

    let resolved: Vec<String> = candidates
        .iter()
        .filter_map(|c| join_url(ctx.base_url.as_deref(), Some(c)))
        .collect();

    let non_pixel_non_data: Vec<&String> = resolved
        .iter()
        .filter(|u| {
            !is_tracking_pixel(element, u)
                && !is_data_url(Some(u)).0
                && !ctx.domain_filter.should_block(u)
        })
        .collect();

    let chosen = non_pixel_non_data
        .first()
        .map(|s| s.to_string())
        .or_else(|| resolved.first().cloned());

    (chosen, resolved)
}

fn parse_dim(element: &ElementRef, attr: &str) -> Option<u32> {
    element.value().attr(attr).and_then(|v| v.trim_end_matches("px").parse().ok())
}

fn build_image(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !ctx.include_media {
        return None;
    }
    let (src, all_sources) = pick_image_source(element, ctx);
    let Some(src) = src else { return None };
    if is_tracking_pixel(element, &src) {
        return None;
    }
    let (is_data, _) = is_data_url(Some(&src));
    Some(ContentNode::Image {
        src,
        alt: element.value().attr("alt").map(String::from),
        width: parse_dim(element, "width"),
        height: parse_dim(element, "height"),
        title: element.value().attr("title").map(String::from),
        caption: None,
        all_sources,
        is_data_url: is_data,
        metadata: meta(element, filtered, None),
    })
}

fn build_picture(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !ctx.include_media {
        return None;
    }
    let img_selector = scraper::Selector::parse("img").unwrap();
    if let Some(img) = element.select(&img_selector).next() {
        return build_image(&img, ctx, filtered);
    }
    let source_selector = scraper::Selector::parse("source").unwrap();
    let srcset = element
        .select(&source_selector)
        .find_map(|s| s.value().attr("srcset"))?;
    let best = best_srcset_candidate(srcset)?;
    let resolved = join_url(ctx.base_url.as_deref(), Some(&best))?;
    let (is_data, _) = is_data_url(Some(&resolved));
    Some(ContentNode::Image {
        src: resolved.clone(),
        alt: None,
        width: None,
        height: None,
        title: None,
        caption: None,
        all_sources: vec![resolved],
        is_data_url: is_data,
        metadata: meta(element, filtered, None),
    })
}

fn build_figure(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    let figcaption_selector = scraper::Selector::parse("figcaption").unwrap();
    let caption = element
        .select(&figcaption_selector)
        .next()
        .map(|c| render_inline(&c, ctx.base_url.as_deref(), ctx.domain_filter).0)
        .filter(|s| !s.is_empty());

    let img_selector = scraper::Selector::parse("img").unwrap();
    let picture_selector = scraper::Selector::parse("picture").unwrap();
    let video_selector = scraper::Selector::parse("video").unwrap();

    let node = if let Some(video) = element.select(&video_selector).next() {
        build_video(&video, ctx, filtered)
    } else if let Some(picture) = element.select(&picture_selector).next() {
        build_picture(&picture, ctx, filtered)
    } else if let Some(img) = element.select(&img_selector).next() {
        build_image(&img, ctx, filtered)
    } else {
        None
    };

    match node {
        Some(ContentNode::Image {
            src,
            alt,
            width,
            height,
            title,
            all_sources,
            is_data_url,
            metadata,
            ..
        }) => Some(ContentNode::Image {
            src,
            alt,
            width,
            height,
            title,
            caption,
            all_sources,
            is_data_url,
            metadata,
        }),
        other => other,
    }
}

// ---------------------------------------------------------------- audio/video

fn collect_media_refs(element: &ElementRef, selector: &str) -> Vec<corvus_types::MediaRef> {
    let sel = scraper::Selector::parse(selector).unwrap();
    element
        .select(&sel)
        .map(|e| {
            e.value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}

fn has_flag(element: &ElementRef, attr: &str) -> bool {
    element.value().attr(attr).is_some()
}

fn build_audio(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !ctx.include_media {
        return None;
    }
    let src = element
        .value()
        .attr("src")
        .and_then(|s| join_url(ctx.base_url.as_deref(), Some(s)));
    let sources = collect_media_refs(element, "source");
    let tracks = collect_media_refs(element, "track");
    if src.is_none() && sources.is_empty() {
        return None;
    }
    Some(ContentNode::Audio {
        src,
        controls: has_flag(element, "controls"),
        autoplay: has_flag(element, "autoplay"),
        is_loop: has_flag(element, "loop"),
        muted: has_flag(element, "muted"),
        sources,
        tracks,
        metadata: meta(element, filtered, None),
    })
}

fn build_video(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !ctx.include_media {
        return None;
    }
    let src = element
        .value()
        .attr("src")
        .and_then(|s| join_url(ctx.base_url.as_deref(), Some(s)));
    let sources = collect_media_refs(element, "source");
    let tracks = collect_media_refs(element, "track");
    if src.is_none() && sources.is_empty() {
        return None;
    }
    Some(ContentNode::Video {
        src,
        poster: element
            .value()
            .attr("poster")
            .and_then(|s| join_url(ctx.base_url.as_deref(), Some(s))),
        width: parse_dim(element, "width"),
        height: parse_dim(element, "height"),
        controls: has_flag(element, "controls"),
        autoplay: has_flag(element, "autoplay"),
        is_loop: has_flag(element, "loop"),
        muted: has_flag(element, "muted"),
        playsinline: has_flag(element, "playsinline"),
        sources,
        tracks,
        provider: None,
        metadata: meta(element, filtered, None),
    })
}

/// An `<iframe>` embedding a known video provider becomes a `Video` node
/// directly; anything else is dropped (the source's content filter strips
/// bare iframes via the `tag` rule, which this mirrors for iframes that
/// slipped through with no matching filter config).
fn build_iframe(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    if !ctx.include_media || filtered {
        return None;
    }
    let raw_src = element.value().attr("src")?;
    let resolved = join_url(ctx.base_url.as_deref(), Some(raw_src))?;
    let parsed = url::Url::parse(&resolved).ok()?;
    let host = parsed.host_str()?;
    let provider = VIDEO_IFRAME_HOSTS
        .iter()
        .find(|(h, _)| host == *h || host.ends_with(&format!(".{h}")))
        .map(|(_, p)| p.to_string())?;

    Some(ContentNode::Video {
        src: Some(resolved),
        poster: None,
        width: parse_dim(element, "width"),
        height: parse_dim(element, "height"),
        controls: true,
        autoplay: false,
        is_loop: false,
        muted: false,
        playsinline: false,
        sources: Vec::new(),
        tracks: Vec::new(),
        provider: Some(provider),
        metadata: meta(element, filtered, None),
    })
}

/// A `<header>` tag is content (page/article heading block) if it contains
/// a heading or paragraph text; otherwise it's boilerplate chrome (site
/// banner/nav wrapper) and is treated the same as a filtered match.
fn classify_header(element: &ElementRef, ctx: &ExtractContext, filtered: bool) -> Option<ContentNode> {
    let heading_selector = scraper::Selector::parse("h1, h2, h3, h4, h5, h6, time").unwrap();
    if element.select(&heading_selector).next().is_some() {
        block_container(element, ctx, filtered)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvus_utils::DomainFilter;
    use scraper::Html;

    fn ctx(filter: &FilterRuleSet, domain_filter: &DomainFilter) -> ExtractContext {
        ExtractContext {
            base_url: Some("https://example.com/page".to_string()),
            domain_filter,
            filter_rules: filter,
            include_media: true,
            include_anchors: true,
            anchor_size: 100,
        }
    }

    #[test]
    fn header_becomes_flat_node() {
        let doc = Html::parse_fragment("<div><h1>Title</h1><p>Body text</p></div>");
        let root = doc.root_element();
        let filter = FilterRuleSet::default();
        let df = DomainFilter::empty();
        let nodes = extract_element(&root, &ctx(&filter, &df), false);
        assert!(matches!(nodes[0], ContentNode::Header { .. }));
    }

    #[test]
    fn orphan_li_collected_into_list() {
        let doc = Html::parse_fragment("<div><li>one</li><li>two</li></div>");
        let root = doc.root_element();
        let filter = FilterRuleSet::default();
        let df = DomainFilter::empty();
        let nodes = extract_element(&root, &ctx(&filter, &df), false);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(nodes[0], ContentNode::List { .. }));
    }

    #[test]
    fn data_table_detected_with_headers() {
        let doc = Html::parse_fragment(
            "<table><tr><th>Name</th><th>Age</th></tr><tr><td>A</td><td>1</td></tr></table>",
        );
        let root = doc.root_element();
        let table = root
            .select(&scraper::Selector::parse("table").unwrap())
            .next()
            .unwrap();
        assert!(is_data_table(&table));
    }

    #[test]
    fn presentation_role_table_is_layout() {
        let doc = Html::parse_fragment(r#"<table role="presentation"><tr><td>x</td></tr></table>"#);
        let root = doc.root_element();
        let table = root
            .select(&scraper::Selector::parse("table").unwrap())
            .next()
            .unwrap();
        assert!(!is_data_table(&table));
    }

    #[test]
    fn tracking_pixel_image_dropped() {
        let doc = Html::parse_fragment(r#"<img src="https://ex.com/pixel.gif" width="1" height="1">"#);
        let root = doc.root_element();
        let filter = FilterRuleSet::default();
        let df = DomainFilter::empty();
        let nodes = extract_element(&root, &ctx(&filter, &df), false);
        assert!(nodes.is_empty());
    }

    #[test]
    fn youtube_iframe_becomes_video() {
        let doc = Html::parse_fragment(
            r#"<iframe src="https://www.youtube.com/embed/abc123"></iframe>"#,
        );
        let root = doc.root_element();
        let filter = FilterRuleSet::default();
        let df = DomainFilter::empty();
        let nodes = extract_element(&root, &ctx(&filter, &df), false);
        assert!(matches!(nodes[0], ContentNode::Video { .. }));
    }

    #[test]
    fn carousel_becomes_titled_list_with_media() {
        let doc = Html::parse_fragment(
            r#"<div class="bsp-carousel">
                <div class="slide">
                    <picture><img src="/a.jpg"></picture>
                    <div class="slide-description">First slide</div>
                </div>
                <div class="slide">
                    <picture><img src="/b.jpg"></picture>
                    <div class="slide-description">Second slide</div>
                </div>
            </div>"#,
        );
        let root = doc.root_element();
        let filter = FilterRuleSet::default();
        let df = DomainFilter::empty();
        let nodes = extract_element(&root, &ctx(&filter, &df), false);
        assert_eq!(nodes.len(), 1);
        let ContentNode::List { items, .. } = &nodes[0] else {
            panic!("expected a list node");
        };
        assert!(items.len() >= 5);
        match &items[0] {
            ListItem::Node(node) => {
                assert!(matches!(**node, ContentNode::Text { ref content, .. } if content == "Carousel"));
            }
            _ => panic!("expected title node"),
        }
    }
}

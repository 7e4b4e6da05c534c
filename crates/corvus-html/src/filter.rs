//! Content-filter rule matching.
//!
//! `scraper`'s DOM is read-only, so unlike the source (which wraps matched
//! elements in a synthetic `<ContentFilter>` tag) this computes the match
//! decision during the same walk the extractor already does: a match at an
//! element sets `filtered=true` on that node and every descendant's
//! metadata, which is exactly what the wrapper achieves without a second
//! tree-rewrite pass. In `remove` mode a match stops the walk from
//! descending into that element at all.

use std::collections::HashMap;

use regex::Regex;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Partial,
    Regex,
}

/// One filter rule: match `attribute` against any of `exact`/`partial`/
/// `regex` value lists, tried in that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRule {
    pub attribute: String,
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub partial: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

pub struct FilterMatch {
    pub attribute: String,
    pub match_kind: MatchKind,
    pub trigger_item: String,
}

fn check_string(text: &str, value: &str, kind: MatchKind) -> bool {
    match kind {
        MatchKind::Exact => text == value,
        MatchKind::Partial => text.contains(value),
        MatchKind::Regex => Regex::new(value).map(|r| r.is_match(text)).unwrap_or(false),
    }
}

fn parse_style(style_attr: &str) -> HashMap<String, String> {
    style_attr
        .to_lowercase()
        .trim()
        .split(';')
        .filter_map(|s| s.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn check_class(element: &ElementRef, value: &str, kind: MatchKind) -> bool {
    let Some(class_attr) = element.value().attr("class") else {
        return false;
    };
    let classes: Vec<&str> = class_attr.split_whitespace().collect();
    if value.contains(' ') {
        return value.split_whitespace().all(|v| classes.contains(&v));
    }
    classes.iter().any(|c| check_string(c, value, kind))
}

fn check_style(element: &ElementRef, value: &str, kind: MatchKind) -> bool {
    let Some(style_attr) = element.value().attr("style") else {
        return false;
    };
    if style_attr.trim().is_empty() {
        return false;
    }
    let styles = parse_style(style_attr);
    if let Some((prop, val)) = value.split_once(':') {
        styles
            .get(prop.trim())
            .map(|v| check_string(v, val.trim(), kind))
            .unwrap_or(false)
    } else {
        styles.contains_key(value)
    }
}

/// Checks `element` against one attribute's value list, trying `exact`,
/// `partial`, then `regex` in that order. Returns the first match.
pub fn check_element(element: &ElementRef, rule: &FilterRule) -> Option<FilterMatch> {
    let passes = |values: &[String], kind: MatchKind| -> Option<String> {
        values
            .iter()
            .find(|v| match rule.attribute.as_str() {
                "tag" => check_string(element.value().name(), v, kind),
                "text" => {
                    let text: String = element.text().collect::<Vec<_>>().join("").trim().to_string();
                    !text.is_empty() && check_string(&text, v, kind)
                }
                "class" => check_class(element, v, kind),
                "style" => check_style(element, v, kind),
                attr => element
                    .value()
                    .attr(attr)
                    .map(|av| check_string(av, v, kind))
                    .unwrap_or(false),
            })
            .cloned()
    };

    if let Some(trigger) = passes(&rule.exact, MatchKind::Exact) {
        return Some(FilterMatch {
            attribute: rule.attribute.clone(),
            match_kind: MatchKind::Exact,
            trigger_item: trigger,
        });
    }
    if let Some(trigger) = passes(&rule.partial, MatchKind::Partial) {
        return Some(FilterMatch {
            attribute: rule.attribute.clone(),
            match_kind: MatchKind::Partial,
            trigger_item: trigger,
        });
    }
    if let Some(trigger) = passes(&rule.regex, MatchKind::Regex) {
        return Some(FilterMatch {
            attribute: rule.attribute.clone(),
            match_kind: MatchKind::Regex,
            trigger_item: trigger,
        });
    }
    None
}

/// An ordered set of rules, checked until the first match (mirrors the
/// source's `break` on first matching filter config).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRuleSet {
    pub rules: Vec<FilterRule>,
}

impl FilterRuleSet {
    pub fn first_match(&self, element: &ElementRef) -> Option<FilterMatch> {
        self.rules.iter().find_map(|rule| check_element(element, rule))
    }

    /// The site's built-in fallback rule set (nav/ads/boilerplate), used
    /// when a domain has no override content-filter rules of its own.
    pub fn base_config() -> Self {
        FilterRuleSet {
            rules: vec![
                FilterRule {
                    attribute: "role".into(),
                    exact: vec![
                        "navigation", "banner", "complementary", "menu", "dialog", "menuitem",
                        "figure", "icon", "picture", "toolbar", "menubar",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    partial: vec!["tooltip".into()],
                    regex: vec![],
                },
                FilterRule {
                    attribute: "class".into(),
                    exact: vec![
                        "ui-consent-roadblock",
                        "w3-sidebar",
                        "breadcrumb",
                        "hidden-xs",
                        "visually-hidden",
                        "sr-only",
                        "header",
                        "footer",
                        "sidebar",
                        "ad",
                        "menu",
                        "popup",
                        "modal",
                        "share",
                        "social",
                        "advert",
                        "promo",
                        "overlay",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    partial: vec![
                        "text-muted", "share", "social", "advert", "promo", "overlay", "modal",
                        "popup", "cookie", "privacy", "disclaimer", "sidebar-section",
                        "recommendations",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    regex: vec![],
                },
                FilterRule {
                    attribute: "tag".into(),
                    exact: vec![
                        "label", "iframe", "header", "script", "style", "svg", "head", "nav",
                        "footer", "select", "button", "fieldset", "noscript", "link",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    partial: vec![],
                    regex: vec![],
                },
                FilterRule {
                    attribute: "style".into(),
                    exact: vec!["display:none".into(), "visibility:hidden".into()],
                    partial: vec![],
                    regex: vec![],
                },
                FilterRule {
                    attribute: "aria-hidden".into(),
                    exact: vec!["true".into()],
                    partial: vec![],
                    regex: vec![],
                },
            ],
        }
    }
}

impl FilterRuleSet {
    /// Prepends `overrides` (typically a domain's path-level content-filter
    /// overrides) ahead of `self`'s rules, so a domain-specific rule wins
    /// over the built-in default when both match the same element.
    pub fn merged_with(&self, mut overrides: Vec<FilterRule>) -> FilterRuleSet {
        overrides.extend(self.rules.iter().cloned());
        FilterRuleSet { rules: overrides }
    }
}

/// Selects the elements under `root` that a domain's `main_content`
/// overrides designate as the page's real content, stopping descent at the
/// first match so a parent and its children aren't both returned.
pub fn select_main_content<'a>(root: &ElementRef<'a>, rules: &[FilterRule]) -> Vec<ElementRef<'a>> {
    let mut matches = Vec::new();
    if rules.is_empty() {
        return matches;
    }
    walk_main_content(root, rules, &mut matches);
    matches
}

fn walk_main_content<'a>(element: &ElementRef<'a>, rules: &[FilterRule], out: &mut Vec<ElementRef<'a>>) {
    if rules.iter().any(|rule| check_element(element, rule).is_some()) {
        out.push(*element);
        return;
    }
    for child in element.children() {
        if let Some(child_ref) = ElementRef::wrap(child) {
            walk_main_content(&child_ref, rules, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first(html: &str, selector: &str) -> Html {
        let _ = Selector::parse(selector);
        Html::parse_fragment(html)
    }

    #[test]
    fn class_rule_matches_exact() {
        let doc = first(r#"<div class="ad">x</div>"#, "div");
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let rule = FilterRule {
            attribute: "class".into(),
            exact: vec!["ad".into()],
            partial: vec![],
            regex: vec![],
        };
        assert!(check_element(&el, &rule).is_some());
    }

    #[test]
    fn class_rule_space_separated_requires_all_tokens() {
        let doc = first(r#"<div class="a b c">x</div>"#, "div");
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let rule = FilterRule {
            attribute: "class".into(),
            exact: vec!["a b".into()],
            partial: vec![],
            regex: vec![],
        };
        assert!(check_element(&el, &rule).is_some());
        let rule_missing = FilterRule {
            attribute: "class".into(),
            exact: vec!["a z".into()],
            partial: vec![],
            regex: vec![],
        };
        assert!(check_element(&el, &rule_missing).is_none());
    }

    #[test]
    fn style_rule_matches_prop_value() {
        let doc = first(r#"<div style="display:none">x</div>"#, "div");
        let sel = Selector::parse("div").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let rule = FilterRule {
            attribute: "style".into(),
            exact: vec!["display:none".into()],
            partial: vec![],
            regex: vec![],
        };
        assert!(check_element(&el, &rule).is_some());
    }

    #[test]
    fn tag_rule_matches() {
        let doc = first("<nav>x</nav>", "nav");
        let sel = Selector::parse("nav").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let rule = FilterRule {
            attribute: "tag".into(),
            exact: vec!["nav".into()],
            partial: vec![],
            regex: vec![],
        };
        assert!(check_element(&el, &rule).is_some());
    }
}

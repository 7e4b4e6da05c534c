pub mod extractor;
pub mod filter;
pub mod flatten;
pub mod parser;
pub mod project;
pub mod render;

pub use extractor::{extract_element, ExtractContext};
pub use filter::{select_main_content, FilterMatch, FilterRule, FilterRuleSet, MatchKind};
pub use parser::{filter_rule_from_parts, parse_document, DomainOverrides, ParsedDocument};
pub use project::{find_rule, project_content, ProjectOptions, StandardRule};
pub use render::{render_data, render_text};

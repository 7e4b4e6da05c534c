//! Pure post-processing over a batch of search results: a single text
//! digest for the LLM-research pipeline, and a deduplicated URL list for
//! the fan-out that follows.
//!
//! Grounded on `original_source/app/core/search.py`'s
//! `generate_search_text_summary`/`extract_urls_from_search_results`.

use std::collections::HashSet;

use crate::types::{BraveSearchResponse, ExtractedUrl};

/// One query's searched results, paired for summarization/extraction.
pub type QueryResult = (String, Option<BraveSearchResponse>);

/// Builds a research digest: a top-line "Searched: ..." summary, one
/// section per query with its deduplicated (across the whole batch) hits,
/// and a closing metrics footer.
pub fn generate_search_text_summary(results: &[QueryResult]) -> String {
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut query_counts: Vec<(String, usize)> = Vec::with_capacity(results.len());
    let mut body_parts: Vec<String> = Vec::with_capacity(results.len());
    let mut total_result_count = 0usize;

    for (query, result) in results {
        let Some(result) = result else {
            query_counts.push((query.clone(), 0));
            body_parts.push(format!(
                "---\n## \"{query}\" (0 results)\n\n(No results for this query)\n\n"
            ));
            continue;
        };

        let mut query_result_count = 0usize;
        let mut section_lines = String::new();
        for item in result.all_results() {
            if !seen_urls.insert(item.url.as_str()) {
                continue;
            }
            query_result_count += 1;
            total_result_count += 1;

            let title = item.title.as_deref().unwrap_or("N/A");
            let description = item.description.as_deref().unwrap_or("N/A");
            let age_text = item
                .display_age()
                .map(|age| format!(" ({age})"))
                .unwrap_or_default();

            section_lines.push_str(&format!(
                "Title: {title}{age_text}\nURL: {}\nDescription: {description}\n",
                item.url
            ));
            if !item.extra_snippets.is_empty() {
                section_lines.push_str(&format!(
                    "Extra Snippets: {}\n",
                    item.extra_snippets.join(" ")
                ));
            }
            section_lines.push('\n');
        }

        query_counts.push((query.clone(), query_result_count));
        let header = format!("---\n## \"{query}\" ({query_result_count} results)\n\n");
        if query_result_count == 0 {
            body_parts.push(format!("{header}(No unique results for this query)\n\n"));
        } else {
            body_parts.push(format!("{header}{section_lines}"));
        }
    }

    let top_summary = format!(
        "Searched: {}\n\n",
        query_counts
            .iter()
            .map(|(q, c)| format!("\"{q}\" ({c})"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let body: String = body_parts.concat();
    let content_length = top_summary.chars().count() + body.chars().count();
    let metrics = [
        format!("Query count: {}", results.len()),
        format!("Results count: {total_result_count}"),
        format!("Total character count: {content_length}"),
    ];
    let bottom = format!("\n---\n## Search Summary Metrics:\n\n{}", metrics.join("\n"));

    format!("{top_summary}{body}{bottom}")
}

/// Flattens every query's `web` results into a deduplicated URL list,
/// keeping only the first occurrence of a URL across the whole batch.
pub fn extract_urls_from_search_results(results: &[QueryResult]) -> Vec<ExtractedUrl> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for (_, result) in results {
        let Some(result) = result else { continue };
        let Some(web) = &result.web else { continue };
        for item in &web.results {
            if seen.insert(item.url.clone()) {
                urls.push(ExtractedUrl {
                    url: item.url.clone(),
                    title: item.title.clone().unwrap_or_default(),
                    description: item.description.clone().unwrap_or_default(),
                });
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BraveResult, ResultsBlock};

    fn hit(url: &str, title: &str) -> BraveResult {
        BraveResult {
            url: url.to_string(),
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            extra_snippets: vec![],
            age: None,
            page_age: None,
        }
    }

    #[test]
    fn summary_dedupes_urls_across_the_batch() {
        let response = BraveSearchResponse {
            web: Some(ResultsBlock { results: vec![hit("https://a.com", "A")] }),
            news: None,
            videos: None,
        };
        let results = vec![
            ("first".to_string(), Some(response.clone())),
            ("second".to_string(), Some(response)),
        ];
        let summary = generate_search_text_summary(&results);
        assert!(summary.contains("Results count: 1"));
        assert!(summary.contains("\"second\" (0 results)"));
    }

    #[test]
    fn extract_urls_only_pulls_from_web_block() {
        let response = BraveSearchResponse {
            web: Some(ResultsBlock { results: vec![hit("https://a.com", "A")] }),
            news: Some(ResultsBlock { results: vec![hit("https://b.com", "B")] }),
            videos: None,
        };
        let results = vec![("q".to_string(), Some(response))];
        let urls = extract_urls_from_search_results(&results);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].url, "https://a.com");
    }

    #[test]
    fn failed_query_contributes_no_results() {
        let results: Vec<QueryResult> = vec![("q".to_string(), None)];
        let summary = generate_search_text_summary(&results);
        assert!(summary.contains("(No results for this query)"));
        let urls = extract_urls_from_search_results(&results);
        assert!(urls.is_empty());
    }
}

use log::debug;
use select::document::Document;
use select::predicate::{Class, Name, Predicate};
use serde::Serialize;
use url::Url;

use crate::context::ScrapeContext;
use crate::error::ScrapeError;
use crate::fetch;
use crate::stopwords::STOPWORDS;
use crate::tokens::{most_common, tokenize_with_bigrams};

pub const DEFAULT_TOP_N: usize = 20;

/// The html endpoint serves a fully rendered, JavaScript-free version of the
/// SERP, so the plain HTTP path is all this source ever needs. The `us-en`
/// locale keeps results stable.
fn serp_url(term: &str) -> String {
    Url::parse_with_params(
        "https://html.duckduckgo.com/html/",
        &[("q", term), ("kl", "us-en")],
    )
    .expect("static url is valid")
    .to_string()
}

/// A single search result block, populated best-effort.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub url: Option<String>,
    /// Short source label derived from the result host.
    pub source: Option<String>,
}

/// Structured output of a DuckDuckGo SERP.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
    pub links: Vec<String>,
    pub tokens: Vec<String>,
}

/// Return raw DuckDuckGo SERP HTML.
///
/// The browser stage is skipped entirely by design: this endpoint rarely
/// blocks and rendering offers no benefit, so `ctx.use_browser` is ignored.
pub async fn fetch_serp_html(term: &str, ctx: &ScrapeContext) -> Result<String, ScrapeError> {
    fetch::fetch_text(&serp_url(term), ctx).await
}

/// Return the most frequent tokens/bigrams on a DuckDuckGo SERP.
pub async fn top_words(term: &str, ctx: &ScrapeContext, top_n: usize) -> Vec<String> {
    match fetch_serp_html(term, ctx).await {
        Ok(html) => parse_serp(&html, top_n),
        Err(err) => {
            debug!(target: "schlagwort::duckduckgo", "fetch failed term={} error={}", term, err);
            Vec::new()
        }
    }
}

/// Structured search with per-result metadata, links and raw tokens.
pub async fn search(term: &str, ctx: &ScrapeContext, top_n: usize) -> SearchResults {
    match fetch_serp_html(term, ctx).await {
        Ok(html) => parse_results(&html, top_n),
        Err(err) => {
            debug!(target: "schlagwort::duckduckgo", "fetch failed term={} error={}", term, err);
            SearchResults::default()
        }
    }
}

pub(crate) fn parse_serp(html: &str, top_n: usize) -> Vec<String> {
    let doc = Document::from(html);

    // Each result is <a class="result__a">Title</a>.
    let titles: Vec<String> = doc
        .find(Name("a").and(Class("result__a")))
        .map(|node| node.text())
        .collect();

    // Snippets live in <a class="result__snippet"> or <div class="result__snippet">.
    let snippets: Vec<String> = doc
        .find((Name("a").or(Name("div"))).and(Class("result__snippet")))
        .map(|node| node.text())
        .collect();

    let combined = format!("{} {}", titles.join(" "), snippets.join(" "));
    most_common(&tokenize_with_bigrams(&combined), &STOPWORDS, top_n)
}

pub(crate) fn parse_results(html: &str, top_n: usize) -> SearchResults {
    let doc = Document::from(html);
    let mut results = Vec::new();
    let mut links = Vec::new();
    let mut raw_tokens: Vec<String> = Vec::new();

    for block in doc.find(Name("div").and(Class("result"))) {
        let title_node = block.find(Name("a").and(Class("result__a"))).next();
        let snippet = block
            .find((Name("a").or(Name("div"))).and(Class("result__snippet")))
            .next()
            .map(|node| node.text().trim().to_string());
        let title = title_node.map(|node| node.text().trim().to_string());
        let url = title_node.and_then(|node| node.attr("href")).map(str::to_string);

        if let Some(url) = &url {
            links.push(url.clone());
        }
        if title.is_none() && snippet.is_none() && url.is_none() {
            continue;
        }

        if let Some(title) = &title {
            raw_tokens.extend(title.split_whitespace().map(str::to_string));
        }
        if let Some(snippet) = &snippet {
            raw_tokens.extend(snippet.split_whitespace().map(str::to_string));
        }

        results.push(SearchResult {
            source: url.as_deref().and_then(crate::article::source_label),
            title,
            snippet,
            url,
        });
        if results.len() >= top_n {
            break;
        }
    }

    // Deduplicate tokens, keeping first-seen order.
    let mut seen = fnv::FnvHashSet::default();
    let mut tokens = Vec::new();
    for token in raw_tokens {
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
        if tokens.len() >= top_n {
            break;
        }
    }

    links.truncate(top_n);
    SearchResults {
        results,
        links,
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_finds_bitcoin() {
        let html = "<div class='result'><a class='result__a'>Bitcoin hits new high</a></div>";
        let words = parse_serp(html, 5);
        assert!(words.len() <= 5);
        assert!(words.contains(&"bitcoin".to_string()));
    }

    #[test]
    fn empty_html_yields_empty_list() {
        assert!(parse_serp("", 10).is_empty());
        let parsed = parse_results("", 10);
        assert!(parsed.results.is_empty());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn structured_results_capture_fields() {
        let html = r#"<div class="result">
                <a class="result__a" href="https://www.example.com/story">Bitcoin hits new high</a>
                <a class="result__snippet">The oldest cryptocurrency rallied again.</a>
            </div>
            <div class="result">
                <a class="result__a" href="https://news.test/other">Second result</a>
            </div>"#;
        let parsed = parse_results(html, 10);
        assert_eq!(parsed.results.len(), 2);
        let first = &parsed.results[0];
        assert_eq!(first.title.as_deref(), Some("Bitcoin hits new high"));
        assert_eq!(first.url.as_deref(), Some("https://www.example.com/story"));
        assert_eq!(first.source.as_deref(), Some("EXAMPLE"));
        assert!(first.snippet.as_deref().unwrap().contains("rallied"));
        assert_eq!(parsed.links.len(), 2);
        assert_eq!(parsed.tokens[0], "Bitcoin");
    }

    #[test]
    fn results_are_capped_at_top_n() {
        let html: String = (0..8)
            .map(|i| {
                format!(
                    "<div class='result'><a class='result__a' href='https://e{}.com/'>Title {}</a></div>",
                    i, i
                )
            })
            .collect();
        let parsed = parse_results(&html, 3);
        assert_eq!(parsed.results.len(), 3);
        assert!(parsed.links.len() <= 3);
        assert!(parsed.tokens.len() <= 3);
    }
}

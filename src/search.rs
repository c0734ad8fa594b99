use select::document::Document;
use select::predicate::Name;
use serde::Serialize;

use crate::context::ScrapeContext;
use crate::duckduckgo;
use crate::google;

/// Links and raw tokens of an engine-agnostic search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SerpSummary {
    pub links: Vec<String>,
    pub tokens: Vec<String>,
}

/// Fetch SERP HTML, DuckDuckGo first and Google as fallback.
///
/// DuckDuckGo is far less likely to throttle or captcha; the Google stage
/// obeys the browser rules of [`google::fetch_serp_html`].
pub async fn fetch_serp_html(term: &str, ctx: &ScrapeContext) -> String {
    if let Ok(html) = duckduckgo::fetch_serp_html(term, ctx).await {
        if !html.is_empty() {
            return html;
        }
    }
    google::fetch_serp_html(term, ctx).await
}

/// Search both engines and return outbound links plus leading page tokens.
pub async fn search_and_parse(term: &str, ctx: &ScrapeContext, top_n: usize) -> SerpSummary {
    let html = fetch_serp_html(term, ctx).await;
    parse_summary(&html, top_n)
}

pub(crate) fn parse_summary(html: &str, top_n: usize) -> SerpSummary {
    let doc = Document::from(html);
    let links: Vec<String> = doc
        .find(Name("a"))
        .filter_map(|node| node.attr("href"))
        .map(str::to_string)
        .take(top_n)
        .collect();
    let body = doc
        .find(Name("body"))
        .next()
        .map(|body| body.text())
        .unwrap_or_default();
    let tokens: Vec<String> = body
        .split_whitespace()
        .take(top_n)
        .map(str::to_string)
        .collect();
    SerpSummary { links, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_collects_links_and_tokens() {
        let html = r#"<body><a href="https://one.test/">First result</a>
            <a href="https://two.test/">Second</a></body>"#;
        let summary = parse_summary(html, 1);
        assert_eq!(summary.links, vec!["https://one.test/"]);
        assert_eq!(summary.tokens, vec!["First"]);
    }

    #[test]
    fn empty_html_yields_empty_summary() {
        let summary = parse_summary("", 5);
        assert!(summary.links.is_empty());
        assert!(summary.tokens.is_empty());
    }
}

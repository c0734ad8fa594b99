use bytes::Bytes;
use log::debug;
use reqwest::header::HeaderMap;
use select::document::Document;
use select::predicate::{Attr, Name, Predicate};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::article;
use crate::context::ScrapeContext;
use crate::error::ScrapeError;
use crate::fetch;
use crate::stopwords::STOPWORDS;
use crate::tokens::{most_common, tokenize};

pub const DEFAULT_TOP_N: usize = 100;

fn page_url(term: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", term.replace(' ', "_"))
}

/// Structured view of a Wikipedia article.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WikipediaPage {
    pub title: String,
    pub content: String,
    /// Link texts of internal `/wiki/` references, capped at `top_n`.
    pub links: Vec<String>,
    pub top_words: Vec<String>,
}

/// Return raw HTML of the Wikipedia page for `term`.
pub async fn raw_html(term: &str, ctx: &ScrapeContext) -> Result<String, ScrapeError> {
    fetch::fetch_text(&page_url(term), ctx).await
}

/// Return the `top_n` most common words of the Wikipedia article for `term`.
///
/// Cascade: blocking legacy extraction → async HTML scrape → the public
/// extracts API. All stages exhausted yields an empty list, never an error.
pub async fn top_words(term: &str, ctx: &ScrapeContext, top_n: usize) -> Vec<String> {
    // Legacy article-extraction path, off the async scheduler.
    let legacy_term = term.to_string();
    let headers = ctx.merged_headers();
    let timeout = ctx.timeout();
    match tokio::task::spawn_blocking(move || {
        top_words_blocking(&legacy_term, &headers, timeout, top_n)
    })
    .await
    {
        Ok(Ok(words)) if !words.is_empty() => {
            if ctx.debug() {
                debug!(target: "schlagwort::wikipedia", "legacy stage term={} words={}", term, words.len());
            }
            return words;
        }
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            debug!(target: "schlagwort::wikipedia", "legacy stage failed term={} error={}", term, err)
        }
        Err(err) => {
            debug!(target: "schlagwort::wikipedia", "legacy stage panicked term={} error={}", term, err)
        }
    }

    // Async HTML scrape.
    let words = match fetch::fetch_text(&page_url(term), ctx).await {
        Ok(html) => parse_top_words(&html, top_n),
        Err(err) => {
            debug!(target: "schlagwort::wikipedia", "http stage failed term={} error={}", term, err);
            Vec::new()
        }
    };
    if !words.is_empty() {
        return words;
    }

    // Documented public extract API as the final stage.
    match api_top_words(term, ctx, top_n).await {
        Ok(words) => words,
        Err(err) => {
            debug!(target: "schlagwort::wikipedia", "api stage failed term={} error={}", term, err);
            Vec::new()
        }
    }
}

/// Structured Wikipedia data with title, content, links and top words.
pub async fn page(term: &str, ctx: &ScrapeContext, top_n: usize) -> WikipediaPage {
    match fetch::fetch_text(&page_url(term), ctx).await {
        Ok(html) => parse_page(&html, term, top_n),
        Err(err) => {
            debug!(target: "schlagwort::wikipedia", "fetch failed term={} error={}", term, err);
            WikipediaPage {
                title: term.to_string(),
                ..Default::default()
            }
        }
    }
}

/// Blocking single-attempt variant running the generic article text
/// extraction over the page, used as the first fallback stage.
fn top_words_blocking(
    term: &str,
    headers: &HeaderMap,
    timeout: std::time::Duration,
    top_n: usize,
) -> Result<Vec<String>, ScrapeError> {
    let html = fetch::fetch_text_blocking(&page_url(term), headers, timeout)?;
    let doc = Document::from(html.as_str());
    let text = article::extract_text(&doc);
    Ok(most_common(&tokenize(&text), &STOPWORDS, top_n))
}

fn content_text(doc: &Document) -> Option<String> {
    doc.find(Attr("id", "mw-content-text"))
        .next()
        .or_else(|| doc.find(Name("main").and(Attr("id", "content"))).next())
        .map(|node| node.text())
}

pub(crate) fn parse_top_words(html: &str, top_n: usize) -> Vec<String> {
    let doc = Document::from(html);
    match content_text(&doc) {
        Some(text) => most_common(&tokenize(&text), &STOPWORDS, top_n),
        None => Vec::new(),
    }
}

pub(crate) fn parse_page(html: &str, term: &str, top_n: usize) -> WikipediaPage {
    let doc = Document::from(html);

    let title = doc
        .find(Attr("id", "firstHeading"))
        .next()
        .or_else(|| doc.find(Name("title")).next())
        .map(|node| node.text().trim().to_string())
        .unwrap_or_else(|| term.to_string());

    let content_node = doc
        .find(Attr("id", "mw-content-text"))
        .next()
        .or_else(|| doc.find(Name("main").and(Attr("id", "content"))).next());
    let content_node = match content_node {
        Some(node) => node,
        None => {
            return WikipediaPage {
                title,
                ..Default::default()
            }
        }
    };

    let content = content_node
        .text()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut links = Vec::new();
    for anchor in content_node.find(Name("a")) {
        let href = match anchor.attr("href") {
            Some(href) => href,
            None => continue,
        };
        if !href.starts_with("/wiki/")
            || href.starts_with("/wiki/Special:")
            || href.starts_with("/wiki/File:")
        {
            continue;
        }
        let text = anchor.text().trim().to_string();
        if !text.is_empty() {
            links.push(text);
        }
    }
    links.truncate(top_n);

    let top_words = most_common(&tokenize(&content), &STOPWORDS, top_n);

    WikipediaPage {
        title,
        content,
        links,
        top_words,
    }
}

/// MediaWiki Extracts API fallback when HTML scraping yields nothing.
async fn api_top_words(
    term: &str,
    ctx: &ScrapeContext,
    top_n: usize,
) -> Result<Vec<String>, ScrapeError> {
    let url = Url::parse_with_params(
        "https://en.wikipedia.org/w/api.php",
        &[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "true"),
            ("titles", term),
            ("format", "json"),
        ],
    )
    .expect("static url is valid");
    if ctx.debug() {
        debug!(target: "schlagwort::wikipedia", "GET {}", url);
    }

    let body = fetch::fetch_text(url.as_str(), ctx).await?;
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => {
            return Err(ScrapeError::ReadDocumentError {
                body: Bytes::from(body),
            })
        }
    };

    let extract = value["query"]["pages"]
        .as_object()
        .map(|pages| {
            pages
                .values()
                .filter_map(|page| page["extract"].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Ok(most_common(&tokenize(&extract), &STOPWORDS, top_n))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIKI_HTML: &str = r#"<html><body>
        <h1 id="firstHeading">Bitcoin</h1>
        <div id="mw-content-text">
            <p>Bitcoin is a decentralized digital currency. Nodes verify
            transactions through cryptography and record them in a public
            ledger called a blockchain.</p>
            <a href="/wiki/Blockchain">Blockchain</a>
            <a href="/wiki/Special:Random">Random</a>
            <a href="/wiki/File:Logo.svg">Logo</a>
            <a href="https://example.com/">External</a>
        </div>
    </body></html>"#;

    #[test]
    fn parses_content_words() {
        let words = parse_top_words(WIKI_HTML, 10);
        assert!(words.contains(&"bitcoin".to_string()));
        assert!(words.contains(&"blockchain".to_string()));
    }

    #[test]
    fn empty_html_yields_empty_list() {
        assert!(parse_top_words("", 10).is_empty());
    }

    #[test]
    fn structured_page_filters_special_links() {
        let page = parse_page(WIKI_HTML, "bitcoin", 10);
        assert_eq!(page.title, "Bitcoin");
        assert_eq!(page.links, vec!["Blockchain"]);
        assert!(page.content.contains("decentralized digital currency"));
        assert!(!page.top_words.is_empty());
    }

    #[test]
    fn missing_content_falls_back_to_term() {
        let page = parse_page("<html><body><p>nothing</p></body></html>", "bitcoin", 10);
        assert_eq!(page.title, "bitcoin");
        assert!(page.content.is_empty());
        assert!(page.top_words.is_empty());
    }

    #[test]
    fn page_url_replaces_spaces() {
        assert_eq!(
            page_url("satoshi nakamoto"),
            "https://en.wikipedia.org/wiki/satoshi_nakamoto"
        );
    }
}

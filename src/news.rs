use bytes::Bytes;
use log::debug;
use reqwest::header::HeaderMap;
use rss::Channel;
use select::document::Document;
use select::predicate::{Descendant, Name};
use url::Url;

use crate::context::ScrapeContext;
use crate::error::ScrapeError;
use crate::fetch;
use crate::stopwords::STOPWORDS;
use crate::tokens::{most_common, tokenize};

pub const DEFAULT_TOP_N: usize = 20;

fn rss_url(term: &str) -> String {
    Url::parse_with_params(
        "https://news.google.com/rss/search",
        &[("q", term), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .expect("static url is valid")
    .to_string()
}

fn search_url(term: &str) -> String {
    Url::parse_with_params(
        "https://news.google.com/search",
        &[("q", term), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .expect("static url is valid")
    .to_string()
}

/// Return the most common words from Google News headlines for `term`.
///
/// Cascade: blocking legacy stage (RSS feed, then the HTML shell page) →
/// async RSS via the retry fetcher. Empty on total failure.
pub async fn top_words(term: &str, ctx: &ScrapeContext, top_n: usize) -> Vec<String> {
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
                debug!(target: "schlagwort::news", "legacy stage term={} words={}", term, words.len());
            }
            return words;
        }
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            debug!(target: "schlagwort::news", "legacy stage failed term={} error={}", term, err)
        }
        Err(err) => {
            debug!(target: "schlagwort::news", "legacy stage panicked term={} error={}", term, err)
        }
    }

    match fetch::fetch_text(&rss_url(term), ctx).await {
        Ok(xml) => parse_rss(&xml, top_n).unwrap_or_default(),
        Err(err) => {
            debug!(target: "schlagwort::news", "rss stage failed term={} error={}", term, err);
            Vec::new()
        }
    }
}

/// Blocking helper: RSS feed first (robust, JS-free), HTML shell page as a
/// last resort. Single attempt per request, no retry loop.
fn top_words_blocking(
    term: &str,
    headers: &HeaderMap,
    timeout: std::time::Duration,
    top_n: usize,
) -> Result<Vec<String>, ScrapeError> {
    if let Ok(xml) = fetch::fetch_text_blocking(&rss_url(term), headers, timeout) {
        if let Ok(words) = parse_rss(&xml, top_n) {
            if !words.is_empty() {
                return Ok(words);
            }
        }
    }

    let html = fetch::fetch_text_blocking(&search_url(term), headers, timeout)?;
    Ok(parse_headlines(&html, top_n))
}

pub(crate) fn parse_rss(xml: &str, top_n: usize) -> Result<Vec<String>, ScrapeError> {
    let channel = Channel::read_from(xml.as_bytes()).map_err(|_| ScrapeError::ReadDocumentError {
        body: Bytes::copy_from_slice(xml.as_bytes()),
    })?;
    let mut tokens = Vec::new();
    for item in channel.items() {
        if let Some(title) = item.title() {
            tokens.extend(tokenize(title));
        }
    }
    Ok(most_common(&tokens, &STOPWORDS, top_n))
}

pub(crate) fn parse_headlines(html: &str, top_n: usize) -> Vec<String> {
    let doc = Document::from(html);
    let mut tokens = Vec::new();
    for node in doc.find(Descendant(
        Name("article"),
        Descendant(Name("h3"), Name("a")),
    )) {
        tokens.extend(tokenize(&node.text()));
    }
    most_common(&tokens, &STOPWORDS, top_n)
}

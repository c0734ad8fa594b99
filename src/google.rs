use log::{debug, warn};
use select::document::Document;
use select::predicate::{Child, Class, Name, Predicate};
use url::Url;

use crate::browser;
use crate::context::ScrapeContext;
use crate::outcome::StageOutcome;
use crate::stopwords::STOPWORDS;
use crate::tokens::{most_common, tokenize_with_bigrams};

pub const DEFAULT_TOP_N: usize = 20;

/// Build the SERP url. The basic-HTML switch (`gbv=1`) is dropped for
/// backends that render JavaScript, where Google's standard markup is richer
/// and less likely to serve an "enable javascript" interstitial.
fn serp_url(term: &str, renders_javascript: bool) -> String {
    let mut params = vec![
        ("q", term),
        ("hl", "en"),
        ("gl", "us"),
        ("num", "100"),
        ("safe", "off"),
        ("start", "0"),
    ];
    if !renders_javascript {
        params.push(("gbv", "1"));
    }
    Url::parse_with_params("https://www.google.com/search", &params)
        .expect("static url is valid")
        .to_string()
}

/// Whether the body is a CAPTCHA or unusual-traffic interstitial.
fn looks_like_captcha(html: &str) -> bool {
    let lowered = html.to_lowercase();
    lowered.contains("detected unusual traffic") || lowered.contains("captcha-form")
}

/// Return raw Google SERP HTML, or an empty string when nothing was rendered.
pub async fn fetch_serp_html(term: &str, ctx: &ScrapeContext) -> String {
    fetch_stage(term, ctx).await.into_html().unwrap_or_default()
}

/// Return the most frequent words/bigrams on a Google SERP.
///
/// Never fails; an empty list means no data, whether because the browser was
/// disabled, the render failed, or Google served an interstitial.
pub async fn top_words(term: &str, ctx: &ScrapeContext, top_n: usize) -> Vec<String> {
    match fetch_stage(term, ctx).await {
        StageOutcome::Html(html) => parse_serp(&html, top_n),
        StageOutcome::Blocked => {
            warn!(target: "schlagwort::google", "blocked by captcha term={}", term);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Plain HTTP against this source is empirically unreliable enough that it is
/// not worth the attempt: without a browser the stage is skipped outright.
async fn fetch_stage(term: &str, ctx: &ScrapeContext) -> StageOutcome {
    if !ctx.use_browser() {
        warn!(
            target: "schlagwort::google",
            "plain HTTP scraping for Google is disabled; build the context with use_browser(true)"
        );
        return StageOutcome::Unavailable;
    }

    let backend = ctx.browser_backend();
    if ctx.debug() {
        debug!(target: "schlagwort::google", "browser_fast_path backend={} term={}", backend.name(), term);
    }

    let html = browser::fetch_html(term, |t| serp_url(t, backend.renders_javascript()), ctx).await;
    if html.is_empty() {
        return StageOutcome::Empty;
    }
    if looks_like_captcha(&html) {
        return StageOutcome::Blocked;
    }
    StageOutcome::Html(html)
}

pub(crate) fn parse_serp(html: &str, top_n: usize) -> Vec<String> {
    let doc = Document::from(html);

    // Desktop markup first, then any h3 for the gbv=1 layout.
    let mut titles: Vec<String> = doc
        .find(Child(Child(Class("yuRUbf"), Name("a")), Name("h3")))
        .map(|node| node.text())
        .collect();
    if titles.is_empty() {
        titles = doc.find(Name("h3")).map(|node| node.text()).collect();
    }

    let snippet_pred = Class("IsZvec")
        .or(Class("aCOpRe"))
        .or(Class("VwiC3b"))
        .or(Class("BNeawe").and(Class("s3v9rd")))
        .or(Class("bVj5Zb"))
        .or(Class("GI74Re"));
    let snippets: Vec<String> = doc.find(snippet_pred).map(|node| node.text()).collect();

    let combined = format!("{} {}", titles.join(" "), snippets.join(" "));
    let ranked = most_common(&tokenize_with_bigrams(&combined), &STOPWORDS, top_n);
    if !ranked.is_empty() {
        return ranked;
    }

    // Selector drift: fall back to tokenising the whole visible page.
    let body = doc
        .find(Name("body"))
        .next()
        .map(|body| body.text())
        .unwrap_or_default();
    most_common(&tokenize_with_bigrams(&body), &STOPWORDS, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serp_url_variants() {
        let plain = serp_url("rust language", false);
        assert!(plain.contains("gbv=1"));
        assert!(plain.contains("q=rust+language"));
        let rich = serp_url("rust language", true);
        assert!(!rich.contains("gbv=1"));
    }

    #[test]
    fn captcha_detection() {
        assert!(looks_like_captcha(
            "<html>Our systems have detected unusual traffic from your network</html>"
        ));
        assert!(looks_like_captcha(r#"<form id="captcha-form"></form>"#));
        assert!(!looks_like_captcha("<html><h3>Results</h3></html>"));
    }

    #[test]
    fn parses_gbv_markup() {
        let html = r#"<html><body>
            <h3>Bitcoin surges past record levels</h3>
            <div class="BNeawe s3v9rd">The cryptocurrency rallied sharply on Tuesday.</div>
        </body></html>"#;
        let words = parse_serp(html, 10);
        assert!(words.contains(&"bitcoin".to_string()));
        assert!(words.contains(&"cryptocurrency".to_string()));
    }

    #[test]
    fn empty_html_yields_empty_list() {
        assert!(parse_serp("", 10).is_empty());
    }

    #[tokio::test]
    async fn browser_disabled_returns_empty_without_network() {
        let ctx = ScrapeContext::builder().use_browser(false).build();
        let words = top_words("bitcoin", &ctx, 5).await;
        assert!(words.is_empty());
        assert_eq!(fetch_serp_html("bitcoin", &ctx).await, "");
    }
}

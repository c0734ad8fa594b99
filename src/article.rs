use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Attr, Class, Name, Predicate};
use serde::Serialize;
use url::Url;

use crate::browser;
use crate::context::ScrapeContext;
use crate::date::{ArticleDate, DateExtractor};
use crate::fetch;
use crate::stopwords::STOPWORDS;
use crate::tokens::{most_common, tokenize};

/// Minimum number of chars for an extraction to count as a real article body.
const MIN_ARTICLE_LEN: usize = 200;

pub const DEFAULT_TOP_N: usize = 20;

lazy_static! {
    pub static ref RE_BAD_NODES: Regex = Regex::new(
        r"(?mi)^side$|combx|retweet|menucontainer|navbar|comment|breadcrumbs?|foot(er|note)?|sub(scribe|scription)|newsletter|sponsor|advert|^ad(s|-)|related|recommended|social|share-buttons|sidebar|byline|author-(bio|info)|caption|legende|pagetools|popup|tools|tags|widget|promo"
    )
    .unwrap();
}

/// Elements that never contain article text.
const BAD_NODE_NAMES: [&str; 7] = [
    "nav", "header", "footer", "aside", "script", "style", "noscript",
];

const ATTR_TO_CHECK: [&str; 3] = ["id", "class", "name"];

/// Class names that commonly wrap the main article body, tried in order.
const CONTENT_CLASSES: [&str; 8] = [
    "ArticleBody-articleBody",
    "article-body",
    "story-body",
    "article-content",
    "post-content",
    "entry-content",
    "main-content",
    "content",
];

pub trait DocumentCleaner {
    /// Ignore nodes that usually do not contain content for the article.
    fn is_bad_node(node: &Node) -> bool {
        if let Some(name) = node.name() {
            if BAD_NODE_NAMES.contains(&name) {
                return true;
            }
        }
        for attr in ATTR_TO_CHECK.iter() {
            if let Some(id) = node.attr(attr) {
                if RE_BAD_NODES.is_match(id) {
                    return true;
                }
            }
        }
        false
    }

    /// Extract all textual content from the node, but ignore those nodes that
    /// do not contain parts of the article.
    fn clean_node_text(node: &Node) -> String {
        fn recur_text<T: DocumentCleaner + ?Sized>(node: &Node, string: &mut String) {
            if T::is_bad_node(node) {
                return;
            }
            if let Some(text) = node.as_text() {
                for word in text.split_whitespace() {
                    string.push_str(word);
                    string.push(' ');
                }
            }
            for child in node.children() {
                recur_text::<T>(&child, string)
            }
        }

        let mut txt = String::new();
        recur_text::<Self>(node, &mut txt);
        txt.trim_end().to_string()
    }
}

/// A standard implementation of a cleaner that only extracts good textual
/// content from the node's descendants.
pub struct DefaultDocumentCleaner;

impl DocumentCleaner for DefaultDocumentCleaner {}

/// Best-effort metadata and text of a single article.
///
/// Any field may be `None` when extraction fails; callers should treat the
/// struct as a partial view, never as a guarantee.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArticleContent {
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<ArticleDate>,
    /// Short source label derived from the url host, e.g. `BLOOMBERG`.
    pub source: Option<String>,
    pub text: Option<String>,
}

/// Download `url` and extract article text plus metadata.
///
/// Never fails: on total fetch failure the returned content carries the url
/// and source label only.
pub async fn extract(url: &str, ctx: &ScrapeContext) -> ArticleContent {
    let html = fetch_article_html(url, ctx).await;
    if html.is_empty() {
        return ArticleContent {
            url: Some(url.to_string()),
            source: source_label(url),
            ..Default::default()
        };
    }
    parse_article(&html, url)
}

/// Return the visible article text of `url`, empty on failure.
///
/// This is the paywall helper: a quick HTTP attempt first, then a full
/// browser render when the body came back too short and `ctx` allows it.
pub async fn article_text(url: &str, ctx: &ScrapeContext) -> String {
    let html = fetch_article_html(url, ctx).await;
    if html.is_empty() {
        return String::new();
    }
    extract_text(&Document::from(html.as_str()))
}

/// The most frequent tokens of the article text behind `url`.
pub async fn top_words(url: &str, ctx: &ScrapeContext, top_n: usize) -> Vec<String> {
    let text = article_text(url, ctx).await;
    most_common(&tokenize(&text), &STOPWORDS, top_n)
}

async fn fetch_article_html(url: &str, ctx: &ScrapeContext) -> String {
    let html = match fetch::fetch_text(url, ctx).await {
        Ok(html) => html,
        Err(err) => {
            debug!(target: "schlagwort::article", "http stage failed url={} error={}", url, err);
            String::new()
        }
    };

    let body_is_enough = !html.is_empty()
        && extract_text(&Document::from(html.as_str())).len() > MIN_ARTICLE_LEN;
    if body_is_enough || !ctx.use_browser() {
        return html;
    }

    // Paywalled/JS-shell pages often serve the real body only to a browser.
    let rendered = browser::fetch_html(url, |u| u.to_string(), ctx).await;
    if rendered.is_empty() {
        html
    } else {
        rendered
    }
}

pub(crate) fn parse_article(html: &str, url: &str) -> ArticleContent {
    let doc = Document::from(html);
    let text = extract_text(&doc);
    ArticleContent {
        url: Some(url.to_string()),
        title: extract_title(&doc),
        author: extract_author(&doc),
        date: extract_date(&doc, html),
        source: source_label(url),
        text: if text.is_empty() { None } else { Some(text) },
    }
}

/// Visible article text, preferring dedicated body containers and falling
/// back to the cleaned full body text.
pub(crate) fn extract_text(doc: &Document) -> String {
    let mut candidates = Vec::new();
    if let Some(node) = doc.find(Name("article")).next() {
        candidates.push(DefaultDocumentCleaner::clean_node_text(&node));
    }
    if let Some(node) = doc.find(Name("main")).next() {
        candidates.push(DefaultDocumentCleaner::clean_node_text(&node));
    }
    for class in CONTENT_CLASSES.iter() {
        if let Some(node) = doc.find(Class(*class)).next() {
            candidates.push(DefaultDocumentCleaner::clean_node_text(&node));
        }
    }
    if let Some(node) = doc.find(Attr("id", "content")).next() {
        candidates.push(DefaultDocumentCleaner::clean_node_text(&node));
    }

    for text in &candidates {
        if text.len() > MIN_ARTICLE_LEN {
            return text.clone();
        }
    }

    doc.find(Name("body"))
        .next()
        .map(|body| DefaultDocumentCleaner::clean_node_text(&body))
        .or_else(|| candidates.into_iter().max_by_key(String::len))
        .unwrap_or_default()
}

fn extract_title(doc: &Document) -> Option<String> {
    let mut candidates = Vec::new();
    if let Some(node) = doc.find(Name("h1")).next() {
        candidates.push(node.text());
    }
    candidates.extend(meta_content(doc, Attr("property", "og:title")));
    candidates.extend(meta_content(doc, Attr("name", "twitter:title")));
    if let Some(node) = doc.find(Name("title")).next() {
        candidates.push(node.text());
    }
    candidates
        .into_iter()
        .map(|title| title.trim().to_string())
        .find(|title| title.len() > 10)
}

fn extract_author(doc: &Document) -> Option<String> {
    let mut candidates = Vec::new();
    candidates.extend(meta_content(doc, Attr("name", "author")));
    candidates.extend(meta_content(doc, Attr("property", "article:author")));
    for class in ["byline", "author-name", "author"].iter() {
        if let Some(node) = doc.find(Class(*class)).next() {
            candidates.push(node.text());
        }
    }
    candidates
        .into_iter()
        .map(|author| author.trim().to_string())
        .find(|author| author.len() > 2)
}

fn extract_date(doc: &Document, raw_html: &str) -> Option<ArticleDate> {
    if let Some(date) = DateExtractor::extract_from_doc(doc, raw_html) {
        return Some(date);
    }
    if let Some(datetime) = doc
        .find(Name("time"))
        .filter_map(|node| node.attr("datetime"))
        .next()
    {
        if let Some(date) = DateExtractor::extract_from_str(datetime) {
            return Some(date);
        }
    }
    for class in ["publish-date", "article-date", "date"].iter() {
        if let Some(node) = doc.find(Class(*class)).next() {
            if let Some(date) = DateExtractor::extract_from_str(&node.text()) {
                return Some(date);
            }
        }
    }
    None
}

fn meta_content<P: Predicate>(doc: &Document, pred: P) -> Option<String> {
    doc.find(Name("meta").and(pred))
        .filter_map(|node| node.attr("content"))
        .map(str::to_string)
        .next()
}

/// Short upper-case source label derived from the url host, e.g.
/// `https://www.cnbc.com/...` becomes `CNBC`.
pub(crate) fn source_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.trim_start_matches("www.");
    host.split('.').next().map(str::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"<html>
    <head>
        <title>Markets wobble as rates rise - Example News</title>
        <meta name="author" content="Jane Doe"/>
        <meta property="article:published_time" content="2024-02-18T09:30:00Z"/>
    </head>
    <body>
        <nav class="navbar"><a href="/home">Home</a></nav>
        <h1>Markets wobble as central banks raise rates</h1>
        <article>
            <p>Stocks slid on Monday as traders weighed the odds of further rate
            increases. Bond yields climbed to their highest level in a decade,
            dragging rate sensitive sectors lower across the board.</p>
            <p>Analysts said the move reflected a broad repricing of risk, with
            equities, credit and currencies all caught in the crossfire of a
            hawkish policy outlook heading into the second half of the year.</p>
            <div class="newsletter">Subscribe to our newsletter!</div>
        </article>
        <footer>Copyright Example News</footer>
    </body>
</html>"#;

    #[test]
    fn parses_article_fields() {
        let content = parse_article(ARTICLE_HTML, "https://www.example.com/markets");
        assert_eq!(
            content.title.as_deref(),
            Some("Markets wobble as central banks raise rates")
        );
        assert_eq!(content.author.as_deref(), Some("Jane Doe"));
        assert!(content.date.is_some());
        assert_eq!(content.source.as_deref(), Some("EXAMPLE"));
        let text = content.text.unwrap();
        assert!(text.contains("Stocks slid on Monday"));
        assert!(!text.contains("Subscribe to our newsletter"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn empty_html_yields_empty_content() {
        let content = parse_article("", "https://www.example.com/markets");
        assert!(content.text.is_none());
        assert!(content.title.is_none());
    }

    #[test]
    fn cleaner_skips_script_and_nav() {
        let html = r#"<body><script>var x = 1;</script><nav>menu</nav><p>real text</p></body>"#;
        let doc = Document::from(html);
        let text = extract_text(&doc);
        assert_eq!(text, "real text");
    }

    #[test]
    fn source_label_strips_www() {
        assert_eq!(
            source_label("https://www.bloomberg.com/news/some-piece"),
            Some("BLOOMBERG".to_string())
        );
        assert_eq!(source_label("not a url"), None);
    }
}

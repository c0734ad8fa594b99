use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use select::document::Document;
use select::predicate::{Attr, Name, Predicate};
use serde::Serialize;

/// A `<meta>`-style node that carries a date in one of its attributes.
pub(crate) struct NodeValueQuery<'a> {
    pub name: Name<&'a str>,
    pub attr: Attr<&'a str, &'a str>,
    /// Name of the attribute that holds the value.
    pub content_name: &'a str,
}

impl<'a> NodeValueQuery<'a> {
    pub fn new(
        name: Name<&'a str>,
        attr: Attr<&'a str, &'a str>,
        content_name: &'a str,
    ) -> Self {
        Self {
            name,
            attr,
            content_name,
        }
    }
}

lazy_static! {
    pub(crate) static ref RE_KEY_VALUE_PUBLISH_DATE: Regex = Regex::new(r#"(?mi)"\s*(([^"]|\w)*)?(date[-_\s]?(Published|created)|Pub(lish|lication)?[-_\s]?Date)\s*"\s*[:=]\s*"\s*(?P<date>[^"]*)\s*""#).unwrap();

    /// Common nodes that hold the article's publishing date.
    pub(crate) static ref PUBLISH_DATE_NODES: Vec<NodeValueQuery<'static>> = {
        let mut nodes = Vec::with_capacity(12);
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("property", "rnews:datePublished"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("property", "article:published_time"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "OriginalPublicationDate"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("itemprop", "datePublished"), "datetime"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("property", "og:published_time"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "article_date_original"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "publication_date"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "sailthru.date"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "PublishDate"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "pubdate"), "content"));
        nodes.push(NodeValueQuery::new(Name("meta"), Attr("name", "publish_date"), "content"));
        nodes
    };
}

#[derive(Debug, Clone, Serialize)]
pub enum Date {
    /// The ISO 8601 date, a pair of year, month and day of the year.
    Date(NaiveDate),
    /// ISO 8601 combined date and time without timezone
    DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDate {
    /// When the article was first published.
    pub published: Date,
}

pub struct DateExtractor;

impl DateExtractor {
    /// Extract the publishing date from the document using several options:
    ///
    /// 1. Look in the common `<meta>` nodes.
    /// 2. Regex the raw html for a `"datePublished": "..."` style key.
    pub fn extract_from_doc(doc: &Document, raw_html: &str) -> Option<ArticleDate> {
        for query in PUBLISH_DATE_NODES.iter() {
            let value = doc
                .find(query.name.and(query.attr))
                .filter_map(|node| node.attr(query.content_name))
                .next();
            if let Some(content) = value {
                if let Some(date) = DateExtractor::fuzzy_dtparse(content) {
                    return Some(ArticleDate {
                        published: Date::DateTime(date),
                    });
                }
            }
        }

        RE_KEY_VALUE_PUBLISH_DATE
            .captures(raw_html)
            .and_then(|caps| caps.name("date"))
            .and_then(|m| DateExtractor::fuzzy_dtparse(m.as_str()))
            .map(|date| ArticleDate {
                published: Date::DateTime(date),
            })
    }

    /// Extract the publishing timestamp from plain text using fuzzy searching
    /// with `dtparse`.
    pub fn extract_from_str(s: &str) -> Option<ArticleDate> {
        DateExtractor::fuzzy_dtparse(s).map(|published| ArticleDate {
            published: Date::DateTime(published),
        })
    }

    fn fuzzy_dtparse(s: &str) -> Option<NaiveDateTime> {
        let mut tzinfod = HashMap::new();
        tzinfod.insert("ET".to_string(), 14400);
        let parser = dtparse::Parser::default();
        parser
            .parse(
                s, None, None, true, /* turns on fuzzy mode */
                true, /* gives us the tokens that weren't recognized */
                None, false, &tzinfod,
            )
            .map(|(date, _, _)| date)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_date_key_value() {
        let caps = RE_KEY_VALUE_PUBLISH_DATE
            .captures(r#""datePublished":"2019-12-05T15:34:34+0100""#)
            .unwrap();
        assert_eq!(
            caps.name("date").unwrap().as_str(),
            "2019-12-05T15:34:34+0100"
        )
    }

    #[test]
    fn meta_publish_date() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="2024-02-18T09:30:00Z"/>
        </head><body></body></html>"#;
        let doc = Document::from(html);
        let date = DateExtractor::extract_from_doc(&doc, html).unwrap();
        match date.published {
            Date::DateTime(dt) => assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 2, 18).unwrap()),
            Date::Date(_) => panic!("expected a full datetime"),
        }
    }

    #[test]
    fn fuzzy_plain_text() {
        assert!(DateExtractor::extract_from_str("Published on March 3, 2023").is_some());
        assert!(DateExtractor::extract_from_str("no date here at all").is_none());
    }
}

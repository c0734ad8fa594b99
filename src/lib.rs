//! Scrapers for search engines, news headlines, wiki articles and paywalled
//! pages, with shared keyword extraction.
//!
//! Every source follows the same cascade: cheap plain HTTP first, a blocking
//! legacy path second, a headless browser render last, short-circuiting on
//! the first stage that yields content. The public `top_words` functions
//! never fail; an empty list is the "no data" signal.

pub use crate::article::ArticleContent;
pub use crate::browser::BrowserBackend;
pub use crate::context::{ScrapeContext, ScrapeContextBuilder, DEFAULT_USER_AGENTS};
pub use crate::duckduckgo::{SearchResult, SearchResults};
pub use crate::error::ScrapeError;
pub use crate::outcome::StageOutcome;
pub use crate::runner::{gather_scrapers, run_scraper, DEFAULT_PARALLELISM};
pub use crate::stopwords::StopWords;
pub use crate::wikipedia::WikipediaPage;

pub mod article;
pub mod browser;
pub mod context;
pub mod date;
pub mod duckduckgo;
mod error;
pub mod fetch;
pub mod google;
pub mod news;
pub mod outcome;
pub mod output;
pub mod runner;
pub mod search;
pub mod stopwords;
pub mod tokens;
pub mod wikipedia;

/// Reexported to implement custom parsers.
pub use select;

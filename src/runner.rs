use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;

use crate::context::ScrapeContext;
use crate::error::ScrapeError;

/// Default number of terms scraped concurrently by [`gather_scrapers`].
pub const DEFAULT_PARALLELISM: usize = 5;

/// End-to-end run for a single term: `fetch(term) -> raw`, then
/// `parse(raw, term) -> data`.
pub async fn run_scraper<F, Fut, P, T>(
    term: String,
    fetch: &F,
    parse: &P,
    ctx: &ScrapeContext,
) -> Result<T, ScrapeError>
where
    F: Fn(String, ScrapeContext) -> Fut,
    Fut: Future<Output = Result<String, ScrapeError>>,
    P: Fn(String, String, ScrapeContext) -> T,
{
    let raw = fetch(term.clone(), ctx.clone()).await?;
    Ok(parse(raw, term, ctx.clone()))
}

/// Fan a `(fetch, parse)` pair out over many terms.
///
/// One task per term, bounded by a counting semaphore of size `parallelism`.
/// The returned results match the input order regardless of completion order.
/// A failure in any single term fails the whole gather; there is no
/// partial-failure isolation.
pub async fn gather_scrapers<F, Fut, P, T>(
    terms: &[String],
    fetch: F,
    parse: P,
    ctx: &ScrapeContext,
    parallelism: usize,
) -> Result<Vec<T>, ScrapeError>
where
    F: Fn(String, ScrapeContext) -> Fut,
    Fut: Future<Output = Result<String, ScrapeError>>,
    P: Fn(String, String, ScrapeContext) -> T,
{
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let fetch = &fetch;
    let parse = &parse;

    let tasks = terms.iter().map(|term| {
        let semaphore = Arc::clone(&semaphore);
        let term = term.clone();
        async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore closed");
            run_scraper(term, fetch, parse, ctx).await
        }
    });

    try_join_all(tasks).await
}

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy};

use crate::context::ScrapeContext;
use crate::error::ScrapeError;

/// Base delay for the linear backoff between attempts.
pub(crate) const BACKOFF_BASE_MS: u64 = 300;

/// Fetch `url` and return the response body with retry/backoff.
///
/// Performs up to `ctx.retries() + 1` attempts. Transport errors and non-2xx
/// statuses are retried identically; between attempts the task sleeps
/// `BACKOFF_BASE_MS * (attempt + 1)`, and the last error is propagated when
/// the budget is exhausted. A random user agent from the pool is injected
/// unless the caller headers already carry one.
pub async fn fetch_text(url: &str, ctx: &ScrapeContext) -> Result<String, ScrapeError> {
    let client = build_client(ctx)?;

    let mut attempt = 0;
    loop {
        if ctx.debug() {
            debug!(target: "schlagwort::fetch", "GET {} attempt={}", url, attempt);
        }
        match send(&client, url, ctx).await {
            Ok(body) => return Ok(body),
            Err(err) => {
                warn!(target: "schlagwort::fetch", "fetch_error url={} attempt={} error={}", url, attempt, err);
                if attempt >= ctx.retries() {
                    return Err(err);
                }
                tokio::time::sleep(Duration::from_millis(BACKOFF_BASE_MS * (attempt as u64 + 1)))
                    .await;
                attempt += 1;
            }
        }
    }
}

fn build_client(ctx: &ScrapeContext) -> Result<Client, ScrapeError> {
    let mut builder = Client::builder()
        .timeout(ctx.timeout())
        .default_headers(ctx.merged_headers());
    if let Some(proxy) = ctx.proxy() {
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

async fn send(client: &Client, url: &str, ctx: &ScrapeContext) -> Result<String, ScrapeError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::NoHttpSuccessResponse { status });
    }
    let body = resp.bytes().await?;
    if ctx.debug() {
        debug!(target: "schlagwort::fetch", "response status={} url={} bytes={}", status.as_u16(), url, body.len());
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Single-attempt blocking GET for the legacy scraper stages.
///
/// Runs on a worker thread via `spawn_blocking`; there is deliberately no
/// retry loop here, the caller falls through to the next stage instead.
pub fn fetch_text_blocking(
    url: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .default_headers(headers.clone())
        .build()?;
    let resp = client.get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::NoHttpSuccessResponse { status });
    }
    let body = resp.bytes()?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

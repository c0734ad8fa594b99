use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::{stream, StreamExt};
use serde_json::json;
use structopt::StructOpt;
use url::Url;

use schlagwort::{article, duckduckgo, google, news, output, wikipedia};
use schlagwort::{BrowserBackend, ScrapeContext};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "schlagwort",
    about = "Search, news and wiki scraping with keyword extraction."
)]
enum App {
    #[structopt(name = "search", about = "Top words for a term on a search engine.")]
    Search {
        #[structopt(name = "term", help = "The search term.")]
        term: String,
        #[structopt(
            long = "engine",
            default_value = "ddg",
            help = "Search engine to scrape: ddg | google."
        )]
        engine: String,
        #[structopt(flatten)]
        opts: Opts,
    },
    #[structopt(name = "wiki", about = "Top words of the Wikipedia article for a term.")]
    Wiki {
        #[structopt(name = "term", help = "The article slug or term.")]
        term: String,
        #[structopt(flatten)]
        opts: Opts,
    },
    #[structopt(name = "news", about = "Top words from Google News headlines.")]
    News {
        #[structopt(name = "term", help = "The search term.")]
        term: String,
        #[structopt(flatten)]
        opts: Opts,
    },
    #[structopt(name = "article", about = "Extract articles from the given urls.")]
    Article {
        #[structopt(name = "urls", help = "The urls of the articles to download.")]
        urls: Vec<Url>,
        #[structopt(flatten)]
        opts: Opts,
    },
}

impl App {
    async fn run(self) -> Result<()> {
        let (out, value) = match self {
            App::Search { term, engine, opts } => {
                let ctx = opts.as_context()?;
                let words = match engine.as_str() {
                    "ddg" | "duckduckgo" => duckduckgo::top_words(&term, &ctx, opts.top).await,
                    "google" => google::top_words(&term, &ctx, opts.top).await,
                    other => return Err(anyhow!("unknown engine {:?}", other)),
                };
                (opts.output, json!({ "term": term, "words": words }))
            }
            App::Wiki { term, opts } => {
                let ctx = opts.as_context()?;
                let words = wikipedia::top_words(&term, &ctx, opts.top).await;
                (opts.output, json!({ "term": term, "words": words }))
            }
            App::News { term, opts } => {
                let ctx = opts.as_context()?;
                let words = news::top_words(&term, &ctx, opts.top).await;
                (opts.output, json!({ "term": term, "words": words }))
            }
            App::Article { urls, opts } => {
                let ctx = opts.as_context()?;
                let articles = stream::iter(
                    urls.iter().map(|url| article::extract(url.as_str(), &ctx)),
                )
                .buffered(4)
                .collect::<Vec<_>>()
                .await;
                (opts.output, serde_json::to_value(&articles)?)
            }
        };
        Self::write(out, &value)
    }

    /// Writes the result as json to the configured file, or to std::out.
    fn write(out: Option<PathBuf>, value: &serde_json::Value) -> Result<()> {
        if let Some(out) = out {
            output::to_json(value, out, false)
        } else {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}

#[derive(Debug, Clone, StructOpt)]
struct Opts {
    #[structopt(
        long = "top",
        default_value = "20",
        help = "Number of tokens to return."
    )]
    top: usize,
    #[structopt(long = "timeout", help = "Request timeout in seconds.")]
    timeout: Option<u64>,
    #[structopt(long = "retries", help = "Retries after a failed request.")]
    retries: Option<usize>,
    #[structopt(long = "proxy", help = "Proxy url for all requests.")]
    proxy: Option<String>,
    #[structopt(long = "browser", help = "Allow a headless browser as last resort.")]
    browser: bool,
    #[structopt(
        long = "backend",
        default_value = "webdriver",
        help = "Browser backend: webdriver | chromium | chromium-stealth."
    )]
    backend: String,
    #[structopt(long = "debug", help = "Log every request and response.")]
    debug: bool,
    #[structopt(
        long = "output",
        short = "o",
        help = "The file to store the results as json.",
        parse(from_os_str)
    )]
    output: Option<PathBuf>,
}

impl Opts {
    fn as_context(&self) -> Result<ScrapeContext> {
        let backend = match self.backend.as_str() {
            "webdriver" => BrowserBackend::Webdriver,
            "chromium" => BrowserBackend::Chromium,
            "chromium-stealth" => BrowserBackend::ChromiumStealth,
            other => return Err(anyhow!("unknown browser backend {:?}", other)),
        };

        let mut ctx = ScrapeContext::builder()
            .use_browser(self.browser)
            .browser_backend(backend)
            .debug(self.debug);
        if let Some(timeout) = self.timeout {
            ctx = ctx.timeout(Duration::from_secs(timeout));
        }
        if let Some(retries) = self.retries {
            ctx = ctx.retries(retries);
        }
        if let Some(proxy) = &self.proxy {
            ctx = ctx.proxy(proxy);
        }
        Ok(ctx.build())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    App::from_args().run().await
}

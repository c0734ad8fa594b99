use crate::context::ScrapeContext;

/// Upper bound for waiting on the rendered page, regardless of `ctx.timeout()`.
#[cfg(any(feature = "webdriver", feature = "chromium"))]
const BODY_WAIT_CAP: std::time::Duration = std::time::Duration::from_secs(10);

/// The available headless browser backends.
///
/// Selection happens by exhaustive match; a backend whose cargo feature is
/// disabled renders nothing instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserBackend {
    /// Classic WebDriver session against an external chromedriver/geckodriver.
    Webdriver,
    /// Chromium automated over the devtools protocol.
    Chromium,
    /// Chromium with an anti-detection script injected before navigation.
    ChromiumStealth,
}

impl BrowserBackend {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserBackend::Webdriver => "webdriver",
            BrowserBackend::Chromium => "chromium",
            BrowserBackend::ChromiumStealth => "chromium-stealth",
        }
    }

    /// Whether this backend renders the full JavaScript page, i.e. whether
    /// url builders may drop basic-HTML switches like Google's `gbv=1`.
    pub fn renders_javascript(&self) -> bool {
        match self {
            BrowserBackend::Webdriver => false,
            BrowserBackend::Chromium | BrowserBackend::ChromiumStealth => true,
        }
    }
}

impl Default for BrowserBackend {
    fn default() -> Self {
        BrowserBackend::Webdriver
    }
}

/// Return rendered HTML via the backend configured in `ctx`.
///
/// A fresh browser session is created and torn down per call. Every failure
/// path, including an unavailable backend, yields an empty string so callers
/// can move on to other fallbacks without exception handling.
pub async fn fetch_html<F>(term: &str, build_url: F, ctx: &ScrapeContext) -> String
where
    F: Fn(&str) -> String,
{
    let url = build_url(term);
    match ctx.browser_backend() {
        BrowserBackend::Webdriver => webdriver::render(&url, ctx).await,
        BrowserBackend::Chromium => chromium::render(&url, ctx, false).await,
        BrowserBackend::ChromiumStealth => chromium::render(&url, ctx, true).await,
    }
}

#[cfg(any(feature = "webdriver", feature = "chromium"))]
fn render_wait(ctx: &ScrapeContext) -> std::time::Duration {
    std::cmp::min(BODY_WAIT_CAP, ctx.timeout())
}

/// Overrides the automation flag and fakes plugin/language lists so that the
/// rendered page matches what a regular browser would serve.
#[cfg(feature = "chromium")]
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
"#;

#[cfg(feature = "webdriver")]
mod webdriver {
    use log::debug;
    use thirtyfour::{
        By, CapabilitiesHelper, ChromiumLikeCapabilities, DesiredCapabilities, Proxy, WebDriver,
    };

    use super::render_wait;
    use crate::context::ScrapeContext;

    pub(super) async fn render(url: &str, ctx: &ScrapeContext) -> String {
        let mut caps = DesiredCapabilities::chrome();
        if caps.set_headless().is_err() {
            return String::new();
        }
        let _ = caps.add_arg(&format!("--user-agent={}", ctx.choose_user_agent()));
        if let Some(proxy) = ctx.proxy() {
            let proxy = Proxy::Manual {
                ftp_proxy: None,
                http_proxy: Some(proxy.to_string()),
                ssl_proxy: Some(proxy.to_string()),
                socks_proxy: None,
                socks_version: None,
                socks_username: None,
                socks_password: None,
                no_proxy: None,
            };
            let _ = caps.set_proxy(proxy);
        }

        let driver = match WebDriver::new(ctx.webdriver_url(), caps).await {
            Ok(driver) => driver,
            Err(err) => {
                debug!(target: "schlagwort::browser", "webdriver session failed: {}", err);
                return String::new();
            }
        };

        let html = match page_source(&driver, url, ctx).await {
            Ok(html) => html,
            Err(err) => {
                debug!(target: "schlagwort::browser", "webdriver render failed: {}", err);
                String::new()
            }
        };

        // The driver handle is released on every exit path.
        if let Err(err) = driver.quit().await {
            debug!(target: "schlagwort::browser", "webdriver quit failed: {}", err);
        }

        html
    }

    async fn page_source(
        driver: &WebDriver,
        url: &str,
        ctx: &ScrapeContext,
    ) -> thirtyfour::error::WebDriverResult<String> {
        driver.set_page_load_timeout(ctx.timeout()).await?;
        if ctx.debug() {
            debug!(target: "schlagwort::browser", "GET {} backend=webdriver", url);
        }
        driver.goto(url).await?;

        let deadline = tokio::time::Instant::now() + render_wait(ctx);
        while driver.find(By::Tag("body")).await.is_err() {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }

        driver.source().await
    }
}

#[cfg(not(feature = "webdriver"))]
mod webdriver {
    use log::debug;

    use crate::context::ScrapeContext;

    pub(super) async fn render(_url: &str, _ctx: &ScrapeContext) -> String {
        debug!(target: "schlagwort::browser", "webdriver backend not compiled in, skipping");
        String::new()
    }
}

#[cfg(feature = "chromium")]
mod chromium {
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
    use futures::StreamExt;
    use log::debug;

    use super::{render_wait, STEALTH_SCRIPT};
    use crate::context::ScrapeContext;

    pub(super) async fn render(url: &str, ctx: &ScrapeContext, stealth: bool) -> String {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(1280, 800);
        if let Some(proxy) = ctx.proxy() {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        let config = match builder.build() {
            Ok(config) => config,
            Err(err) => {
                debug!(target: "schlagwort::browser", "chromium config failed: {}", err);
                return String::new();
            }
        };

        let (mut browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(err) => {
                debug!(target: "schlagwort::browser", "chromium launch failed: {}", err);
                return String::new();
            }
        };

        // The handler drives the devtools connection and must be polled for
        // the lifetime of the session.
        let driver_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let html = match page_source(&browser, url, ctx, stealth).await {
            Ok(html) => html,
            Err(err) => {
                debug!(target: "schlagwort::browser", "chromium render failed: {}", err);
                String::new()
            }
        };

        // Session teardown happens on every exit path.
        let _ = browser.close().await;
        driver_loop.abort();

        html
    }

    async fn page_source(
        browser: &Browser,
        url: &str,
        ctx: &ScrapeContext,
        stealth: bool,
    ) -> Result<String, chromiumoxide::error::CdpError> {
        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(ctx.choose_user_agent()).await?;
        if stealth {
            // Must be registered before the first navigation.
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await?;
        }
        if ctx.debug() {
            debug!(target: "schlagwort::browser", "GET {} backend=chromium stealth={}", url, stealth);
        }

        let navigate = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            page.content().await
        };
        match tokio::time::timeout(render_wait(ctx), navigate).await {
            Ok(html) => html,
            // Bounded wait elapsed; hand back whatever has rendered so far.
            Err(_) => Ok(page.content().await.unwrap_or_default()),
        }
    }
}

#[cfg(not(feature = "chromium"))]
mod chromium {
    use log::debug;

    use crate::context::ScrapeContext;

    pub(super) async fn render(_url: &str, _ctx: &ScrapeContext, _stealth: bool) -> String {
        debug!(target: "schlagwort::browser", "chromium backend not compiled in, skipping");
        String::new()
    }
}

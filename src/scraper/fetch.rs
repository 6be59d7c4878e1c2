use std::ffi::OsString;
use std::fmt::Display;
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};
use headless_chrome::protocol::cdp::Page::AddScriptToEvaluateOnNewDocument;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use url::Url;

use crate::utils::config::ScraperConfig;

const MASK_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined })";

/// Extra settle time when the site bounced us to another host (login walls,
/// consent pages, regional mirrors).
const REDIRECT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Browser,
    Http,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub html: String,
    pub final_url: String,
    pub method: FetchMethod,
}

pub struct PageFetcher {
    config: ScraperConfig,
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .wrap_err("invalid scraper.accept_language")?,
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Rendered markup of `url`. The browser is tried first when enabled and
    /// any failure there falls back to a plain GET. Only when both fail is
    /// an error returned.
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        let target = Url::parse(url).wrap_err_with(|| format!("invalid job URL: {}", url))?;

        if self.config.browser {
            match self.fetch_with_browser(&target).await {
                Ok(page) => return Ok(page),
                Err(e) => warn!("browser fetch failed for {}, falling back to HTTP: {}", url, e),
            }
        }

        self.fetch_with_http(&target)
            .await
            .wrap_err_with(|| format!("could not fetch {}", url))
    }

    async fn fetch_with_browser(&self, url: &Url) -> Result<Page> {
        info!("rendering {} in headless browser", url);

        let config = self.config.clone();
        let url = url.clone();
        tokio::task::spawn_blocking(move || render(&config, &url)).await?
    }

    async fn fetch_with_http(&self, url: &Url) -> Result<Page> {
        info!("fetching {} over HTTP", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("server answered {}", status));
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("received {} bytes from {}", html.len(), final_url);

        Ok(Page {
            html,
            final_url,
            method: FetchMethod::Http,
        })
    }
}

fn chrome(e: impl Display) -> eyre::Report {
    eyre!("browser: {}", e)
}

/// One browser session per call; it is torn down when `browser` drops.
fn render(config: &ScraperConfig, url: &Url) -> Result<Page> {
    let flags: Vec<OsString> = vec![
        format!("--user-agent={}", config.user_agent).into(),
        format!("--lang={}", primary_language(&config.accept_language)).into(),
        "--disable-blink-features=AutomationControlled".into(),
        "--disable-dev-shm-usage".into(),
        "--no-first-run".into(),
    ];

    let browser = Browser::new(LaunchOptions {
        headless: config.headless,
        sandbox: false,
        window_size: Some((1920, 1080)),
        args: flags.iter().map(OsString::as_os_str).collect(),
        idle_browser_timeout: Duration::from_secs(config.timeout_secs + config.wait_secs + 30),
        ..Default::default()
    })
    .map_err(chrome)?;

    let tab = browser.new_tab().map_err(chrome)?;
    tab.set_default_timeout(Duration::from_secs(config.timeout_secs));

    // must be registered before the page's own scripts run
    if let Err(e) = tab.call_method(mask_webdriver()) {
        debug!("could not mask navigator.webdriver: {}", e);
    }

    tab.navigate_to(url.as_str()).map_err(chrome)?;
    tab.wait_until_navigated().map_err(chrome)?;
    std::thread::sleep(Duration::from_secs(config.wait_secs));

    let final_url = tab.get_url();
    if redirected_elsewhere(url, &final_url) {
        info!("redirected from {} to {}, waiting for it to settle", url, final_url);
        std::thread::sleep(REDIRECT_GRACE);
    }

    let html = tab.get_content().map_err(chrome)?;
    debug!("rendered {} bytes from {}", html.len(), final_url);

    Ok(Page {
        html,
        final_url,
        method: FetchMethod::Browser,
    })
}

fn mask_webdriver() -> AddScriptToEvaluateOnNewDocument {
    AddScriptToEvaluateOnNewDocument {
        source: MASK_WEBDRIVER.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    }
}

fn redirected_elsewhere(requested: &Url, final_url: &str) -> bool {
    match Url::parse(final_url) {
        Ok(landed) => landed.host_str() != requested.host_str(),
        Err(_) => false,
    }
}

/// `en-CA,en;q=0.9` -> `en-CA`
fn primary_language(accept_language: &str) -> &str {
    accept_language
        .split([',', ';'])
        .next()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en-US")
}

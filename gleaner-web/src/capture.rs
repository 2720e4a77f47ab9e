use anyhow::Result;
use async_trait::async_trait;
use gleaner_config::{AssetSettings, BrowserSettings};
use gleaner_drivers::BrowserSession;
use gleaner_http::HttpClient;
use tracing::{info, warn};
use url::Url;

use crate::parser::StaticParser;

/// A page as rendered by a browser.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub url: Url,
    pub html: String,
    pub screenshot_png: Option<Vec<u8>>,
    /// blake3 hex digest of `html`.
    pub html_checksum: String,
}

impl PageCapture {
    pub fn new(url: Url, html: String, screenshot_png: Option<Vec<u8>>) -> Self {
        let html_checksum = blake3::hash(html.as_bytes()).to_hex().to_string();
        Self {
            url,
            html,
            screenshot_png,
            html_checksum,
        }
    }

    /// Load the rendered markup into `parser`, with the capture URL as base.
    pub fn load_into(&self, parser: &mut StaticParser) -> Result<()> {
        parser.set_soup(Some(&self.html))?;
        parser.set_base_url(self.url.clone());
        Ok(())
    }
}

#[async_trait]
pub trait PageCapturer: Send + Sync {
    async fn capture(&self, url: &Url) -> Result<PageCapture>;
}

/// Renders pages through a fresh [`BrowserSession`] per capture.
pub struct WebDriverCapturer {
    settings: BrowserSettings,
    http: HttpClient,
    assets: AssetSettings,
    full_page: bool,
    screenshot: bool,
}

impl WebDriverCapturer {
    pub fn new(settings: BrowserSettings, http: HttpClient, assets: AssetSettings) -> Self {
        Self {
            settings,
            http,
            assets,
            full_page: false,
            screenshot: false,
        }
    }

    /// Also capture a PNG; `full_page` grows the window to the document first.
    pub fn with_screenshot(mut self, full_page: bool) -> Self {
        self.screenshot = true;
        self.full_page = full_page;
        self
    }

    async fn render(&self, session: &mut BrowserSession, url: &Url) -> Result<PageCapture> {
        session.set_url(url.as_str()).await?;
        let html = session.get_source().await?;
        let screenshot_png = match (self.screenshot, self.full_page) {
            (false, _) => None,
            (true, false) => Some(session.screenshot_png().await?),
            (true, true) => Some(session.full_page_png().await?),
        };
        let final_url = session.current_url().await.unwrap_or_else(|_| url.clone());
        Ok(PageCapture::new(final_url, html, screenshot_png))
    }
}

#[async_trait]
impl PageCapturer for WebDriverCapturer {
    async fn capture(&self, url: &Url) -> Result<PageCapture> {
        let mut session =
            BrowserSession::connect(&self.settings, self.http.clone(), self.assets.clone()).await?;
        let result = self.render(&mut session, url).await;

        // Always close the session, whatever the capture did.
        if let Err(e) = session.quit().await {
            warn!(target: "browser", error = %e, "failed to close browser session");
        }

        if let Ok(capture) = &result {
            info!(
                target: "browser",
                url = %capture.url,
                bytes = capture.html.len(),
                checksum = %capture.html_checksum,
                "page captured"
            );
        }
        result
    }
}

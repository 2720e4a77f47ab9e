use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder};
use gleaner_common::files;
use gleaner_config::{AssetSettings, BrowserSettings};
use gleaner_http::assets::{ImageDownloader, ImageNaming};
use gleaner_http::HttpClient;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::element::{Location, PageElement, Size};
use crate::browser::options::chrome_capabilities;
use crate::browser::selector::{By, VISIBLE_TEXT_XPATH};

/// Reports the full scroll size of the document as `[width, height]`.
const DOCUMENT_SIZE_SCRIPT: &str = r#"
    const doc = document.documentElement;
    const body = document.body || doc;
    return [
        Math.ceil(Math.max(doc.scrollWidth, body.scrollWidth, doc.clientWidth)),
        Math.ceil(Math.max(doc.scrollHeight, body.scrollHeight, doc.clientHeight)),
    ];
"#;

/// Outer size of the browser window in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSize {
    pub width: u64,
    pub height: u64,
}

/// Visible text of one element with its position on the page.
#[derive(Debug, Clone, Serialize)]
pub struct TextBox {
    pub text: String,
    pub location: Location,
    pub size: Size,
}

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// Every lookup is a one-line delegation to the driver with the selector
/// built by [`By`]. Single-element lookups fail when nothing matches;
/// plural lookups return an empty list instead.
pub struct BrowserSession {
    client: Client,
    url: Option<String>,
    find_timeout: Duration,
    http: HttpClient,
    assets: AssetSettings,
}

impl BrowserSession {
    /// Create a new session on the WebDriver service named in `settings`.
    ///
    /// Default: connects to `http://localhost:9515` (Chromedriver) with a
    /// headless, maximized window.
    pub async fn connect(
        settings: &BrowserSettings,
        http: HttpClient,
        assets: AssetSettings,
    ) -> Result<Self> {
        let caps = chrome_capabilities(settings);
        debug!(target: "browser", ?caps, "requesting session");

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("connecting to WebDriver at {}", settings.webdriver_url))?;

        info!(
            target: "browser",
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            "browser session started"
        );

        Ok(Self {
            client,
            url: None,
            find_timeout: settings.find_timeout(),
            http,
            assets,
        })
    }

    /// Navigate to `url` and remember it.
    pub async fn set_url(&mut self, url: &str) -> Result<()> {
        info!(target: "browser", %url, "navigating");
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        self.url = Some(url.to_string());
        Ok(())
    }

    /// URL last passed to [`set_url`](Self::set_url).
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Return the URL the browser is currently showing.
    pub async fn current_url(&self) -> Result<Url> {
        self.client.current_url().await.map_err(anyhow::Error::from)
    }

    /// Find a single element, waiting up to the configured find timeout.
    pub async fn find_element(&self, by: &By) -> Result<PageElement> {
        let query = by.query();
        let found = if self.find_timeout.is_zero() {
            self.client.find(query.locator()).await
        } else {
            self.client
                .wait()
                .at_most(self.find_timeout)
                .for_element(query.locator())
                .await
        };
        let element = found.with_context(|| format!("no element matches {by}"))?;
        Ok(PageElement::new(element, &self.client))
    }

    /// Find zero or more elements.
    pub async fn find_elements(&self, by: &By) -> Result<Vec<PageElement>> {
        let query = by.query();
        let elements = self
            .client
            .find_all(query.locator())
            .await
            .with_context(|| format!("looking up elements by {by}"))?;
        Ok(elements
            .into_iter()
            .map(|element| PageElement::new(element, &self.client))
            .collect())
    }

    pub async fn get_element_by_id(&self, id: &str) -> Result<PageElement> {
        self.find_element(&By::Id(id.into())).await
    }

    pub async fn get_elements_by_id(&self, id: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::Id(id.into())).await
    }

    pub async fn get_element_by_name(&self, name: &str) -> Result<PageElement> {
        self.find_element(&By::Name(name.into())).await
    }

    pub async fn get_elements_by_name(&self, name: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::Name(name.into())).await
    }

    pub async fn get_element_by_class(&self, class: &str) -> Result<PageElement> {
        self.find_element(&By::ClassName(class.into())).await
    }

    pub async fn get_elements_by_class(&self, class: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::ClassName(class.into())).await
    }

    pub async fn get_element_by_tag(&self, tag: &str) -> Result<PageElement> {
        self.find_element(&By::TagName(tag.into())).await
    }

    pub async fn get_elements_by_tag(&self, tag: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::TagName(tag.into())).await
    }

    pub async fn get_element_by_xpath(&self, xpath: &str) -> Result<PageElement> {
        self.find_element(&By::XPath(xpath.into())).await
    }

    pub async fn get_elements_by_xpath(&self, xpath: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::XPath(xpath.into())).await
    }

    pub async fn get_element_by_xpath_with_relative_tag_attribute(
        &self,
        relative_tag: &str,
        attr_name: &str,
        attr_value: &str,
    ) -> Result<PageElement> {
        self.find_element(&By::relative_tag_attribute(relative_tag, attr_name, attr_value))
            .await
    }

    pub async fn get_elements_by_xpath_with_relative_tag_attribute(
        &self,
        relative_tag: &str,
        attr_name: &str,
        attr_value: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::relative_tag_attribute(relative_tag, attr_name, attr_value))
            .await
    }

    pub async fn get_element_by_xpath_with_relative_tag_contains_attribute(
        &self,
        relative_tag: &str,
        attr_name: &str,
        attr_value: &str,
    ) -> Result<PageElement> {
        self.find_element(&By::relative_tag_contains_attribute(
            relative_tag,
            attr_name,
            attr_value,
        ))
        .await
    }

    pub async fn get_elements_by_xpath_with_relative_tag_contains_attribute(
        &self,
        relative_tag: &str,
        attr_name: &str,
        attr_value: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::relative_tag_contains_attribute(
            relative_tag,
            attr_name,
            attr_value,
        ))
        .await
    }

    pub async fn get_element_by_xpath_with_relative_tag_text(
        &self,
        relative_tag: &str,
        text: &str,
    ) -> Result<PageElement> {
        self.find_element(&By::relative_tag_text(relative_tag, text)).await
    }

    pub async fn get_elements_by_xpath_with_relative_tag_text(
        &self,
        relative_tag: &str,
        text: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::relative_tag_text(relative_tag, text)).await
    }

    pub async fn get_element_by_xpath_with_relative_tag_contains_text(
        &self,
        relative_tag: &str,
        text: &str,
    ) -> Result<PageElement> {
        self.find_element(&By::relative_tag_contains_text(relative_tag, text))
            .await
    }

    pub async fn get_elements_by_xpath_with_relative_tag_contains_text(
        &self,
        relative_tag: &str,
        text: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::relative_tag_contains_text(relative_tag, text))
            .await
    }

    /// `position` is an operator and number, e.g. `"=2"` or `">1"`.
    pub async fn get_element_by_xpath_with_relative_tag_position(
        &self,
        relative_tag: &str,
        position: &str,
    ) -> Result<PageElement> {
        self.find_element(&By::relative_tag_position(relative_tag, position))
            .await
    }

    pub async fn get_elements_by_xpath_with_relative_tag_position(
        &self,
        relative_tag: &str,
        position: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::relative_tag_position(relative_tag, position))
            .await
    }

    pub async fn get_element_by_xpath_except_tag(&self, tag: &str) -> Result<PageElement> {
        self.find_element(&By::except_tag(tag)).await
    }

    pub async fn get_elements_by_xpath_except_tag(&self, tag: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::except_tag(tag)).await
    }

    pub async fn get_element_by_css(&self, css: &str) -> Result<PageElement> {
        self.find_element(&By::Css(css.into())).await
    }

    pub async fn get_elements_by_css(&self, css: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::Css(css.into())).await
    }

    pub async fn get_element_by_link(&self, link: &str) -> Result<PageElement> {
        self.find_element(&By::LinkText(link.into())).await
    }

    pub async fn get_elements_by_link(&self, link: &str) -> Result<Vec<PageElement>> {
        self.find_elements(&By::LinkText(link.into())).await
    }

    pub async fn get_element_by_partial_link(&self, partial_link: &str) -> Result<PageElement> {
        self.find_element(&By::PartialLinkText(partial_link.into()))
            .await
    }

    pub async fn get_elements_by_partial_link(
        &self,
        partial_link: &str,
    ) -> Result<Vec<PageElement>> {
        self.find_elements(&By::PartialLinkText(partial_link.into()))
            .await
    }

    /// Return the page title.
    pub async fn get_title(&self) -> Result<String> {
        self.client.title().await.map_err(anyhow::Error::from)
    }

    /// Return the full page HTML source.
    pub async fn get_source(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    /// Visible text of the whole `body`.
    pub async fn get_all_texts(&self) -> Result<String> {
        self.get_element_by_tag("body").await?.get_text().await
    }

    /// Every element outside `script`/`style` that renders text, with its box.
    pub async fn get_all_texts_locations_sizes(&self) -> Result<Vec<TextBox>> {
        let elements = self.get_elements_by_xpath(VISIBLE_TEXT_XPATH).await?;
        let mut contents = Vec::new();
        for element in elements {
            let text = element.get_text().await?;
            if text.is_empty() {
                continue;
            }
            let location = element.get_location().await?;
            let size = element.get_size().await?;
            contents.push(TextBox {
                text,
                location,
                size,
            });
        }
        Ok(contents)
    }

    pub fn cutout_filename(&self, path: &str) -> String {
        files::cutout_filename(path)
    }

    pub fn cutout_filename_replace_appendix(&self, path: &str, appendix: &str) -> String {
        files::cutout_filename_replace_appendix(path, appendix)
    }

    /// Absolute `src` of every `img` on the page, in document order.
    pub async fn get_all_image_urls(&self) -> Result<Vec<Url>> {
        let mut urls = Vec::new();
        for element in self.get_elements_by_tag("img").await? {
            let Some(src) = element.get_property("src").await? else {
                continue;
            };
            match Url::parse(&src) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => urls.push(url),
                _ => debug!(target: "browser", %src, "skipping non-http image"),
            }
        }
        Ok(urls)
    }

    /// Download every image into the assets directory under its own name.
    pub async fn save_all_images(&self) -> Result<Vec<PathBuf>> {
        let urls = self.get_all_image_urls().await?;
        let saved = ImageDownloader::new(&self.http, &self.assets.dir, ImageNaming::KeepName)
            .with_concurrency(self.assets.concurrency)
            .download_all(&urls)
            .await?;
        info!(target: "browser", count = saved.len(), dir = %self.assets.dir.display(), "images saved");
        Ok(saved)
    }

    pub async fn get_window_size(&self) -> Result<WindowSize> {
        let (width, height) = self
            .client
            .get_window_size()
            .await
            .context("reading window size")?;
        Ok(WindowSize { width, height })
    }

    /// PNG bytes of the current viewport.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await.context("taking screenshot")
    }

    /// Save a PNG of the current viewport.
    pub async fn get_screenshot(&self, filename: impl AsRef<Path>) -> Result<()> {
        let png = self.screenshot_png().await?;
        write_png(filename.as_ref(), &png).await
    }

    /// PNG bytes of the whole document, including content below the fold.
    ///
    /// The window is grown to the document's scroll size for the capture and
    /// restored afterwards, even when the capture fails.
    pub async fn full_page_png(&self) -> Result<Vec<u8>> {
        let original = self.get_window_size().await?;
        let dims = self
            .client
            .execute(DOCUMENT_SIZE_SCRIPT, vec![])
            .await
            .context("measuring document")?;
        let (width, height): (u32, u32) = serde_json::from_value(dims)
            .map_err(|e| anyhow!("unexpected document size: {e}"))?;

        debug!(target: "browser", width, height, "resizing window for full-page capture");
        self.client
            .set_window_size(width, height)
            .await
            .context("resizing window")?;

        let captured = self.client.screenshot().await;
        let restored = self
            .client
            .set_window_size(original.width as u32, original.height as u32)
            .await;

        settle_full_page_capture(captured, restored)
    }

    /// Save a PNG of the whole document. See [`Self::full_page_png`].
    pub async fn get_screenshot_beyond_viewport(&self, filename: impl AsRef<Path>) -> Result<()> {
        let png = self.full_page_png().await?;
        write_png(filename.as_ref(), &png).await
    }

    /// Close the underlying browser session.
    pub async fn quit(self) -> Result<()> {
        self.client.close().await?;
        info!(target: "browser", "browser session closed");
        Ok(())
    }
}

/// A successful capture survives a failed window restore; the restore
/// failure is only logged.
fn settle_full_page_capture<E>(captured: Result<Vec<u8>, E>, restored: Result<(), E>) -> Result<Vec<u8>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match (captured, restored) {
        (Ok(png), Ok(())) => Ok(png),
        (Ok(png), Err(e)) => {
            warn!(target: "browser", error = %e, "could not restore window size");
            Ok(png)
        }
        (Err(e), Ok(())) => Err(anyhow::Error::from(e).context("taking full-page screenshot")),
        (Err(e), Err(restore)) => Err(anyhow::Error::from(e)
            .context(format!("window size not restored: {restore}"))
            .context("taking full-page screenshot")),
    }
}

async fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, png)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    info!(target: "browser", path = %path.display(), bytes = png.len(), "screenshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn failure(msg: &str) -> io::Error {
        io::Error::other(msg.to_string())
    }

    #[test]
    fn capture_is_kept_when_restore_fails() {
        let png = settle_full_page_capture(Ok(vec![1, 2, 3]), Err(failure("window gone"))).unwrap();
        assert_eq!(png, vec![1, 2, 3]);
    }

    #[test]
    fn capture_failure_mentions_restore_failure() {
        let err = settle_full_page_capture(Err(failure("no screenshot")), Err(failure("window gone")))
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.starts_with("taking full-page screenshot"));
        assert!(chain.contains("window gone"));
        assert!(chain.contains("no screenshot"));

        let err = settle_full_page_capture(Err(failure("no screenshot")), Ok(())).unwrap_err();
        assert!(!format!("{err:#}").contains("window"));
    }

    #[test]
    fn write_png_creates_parent_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("shots/nested/page.png");
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(write_png(&path, b"png"))
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }
}

//! Static HTML parsing over `scraper`.
//!
//! [`StaticParser`] keeps one parsed document at a time. Lookups hand out
//! [`ElementRef`]s borrowed from it, so reloading the page needs `&mut self`
//! and cannot happen while elements are still held.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use gleaner_common::css::{escape_identifier, quote_string};
use gleaner_common::files;
use gleaner_common::text::clean_lines;
use gleaner_config::AssetSettings;
use gleaner_http::assets::{ImageDownloader, ImageNaming};
use gleaner_http::{HttpClient, HttpError, RequestOpts};
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Tags whose text never counts as page text.
const SKIPPED_TEXT_TAGS: &[&str] = &["script", "style"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("no page has been loaded")]
    NoDocument,

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// A fetched page plus the CSS lookups over it.
pub struct StaticParser {
    url: Option<Url>,
    raw: Option<String>,
    document: Html,
    http: HttpClient,
    assets: AssetSettings,
}

impl StaticParser {
    pub fn new(http: HttpClient, assets: AssetSettings) -> Self {
        Self {
            url: None,
            raw: None,
            document: Html::new_document(),
            http,
            assets,
        }
    }

    /// Fetch `url` and parse the response body.
    pub async fn set_url(&mut self, url: &str) -> Result<(), ParseError> {
        let parsed = Url::parse(url)?;
        info!(target: "parser", url = %parsed, "fetching page");
        let body = self.http.get_text(parsed.as_str(), RequestOpts::default()).await?;
        debug!(target: "parser", bytes = body.len(), "page fetched");
        self.url = Some(parsed);
        self.load(body);
        Ok(())
    }

    /// Reparse the document.
    ///
    /// `None` parses the last loaded body again, `Some(html)` replaces it.
    pub fn set_soup(&mut self, html: Option<&str>) -> Result<(), ParseError> {
        let body = match html {
            Some(html) => html.to_string(),
            None => self.raw.clone().ok_or(ParseError::NoDocument)?,
        };
        self.load(body);
        Ok(())
    }

    /// Use `url` as the page address without fetching it; relative image
    /// sources resolve against it.
    pub fn set_base_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    fn load(&mut self, body: String) {
        self.document = Html::parse_document(&body);
        if !self.document.errors.is_empty() {
            debug!(target: "parser", errors = self.document.errors.len(), "markup recovered by parser");
        }
        self.raw = Some(body);
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Raw markup of the current document.
    pub fn html(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    fn select_all(&self, css: &str) -> Result<Vec<ElementRef<'_>>, ParseError> {
        let selector = parse_selector(css)?;
        Ok(self.document.select(&selector).collect())
    }

    fn select_first(&self, css: &str) -> Result<Option<ElementRef<'_>>, ParseError> {
        let selector = parse_selector(css)?;
        Ok(self.document.select(&selector).next())
    }

    pub fn get_element_by_tag(&self, tag: &str) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(tag)
    }

    pub fn get_elements_by_tag(&self, tag: &str) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(tag)
    }

    pub fn get_element_by_id(&self, id: &str) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(&format!("#{}", escape_identifier(id)))
    }

    pub fn get_elements_by_id(&self, id: &str) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(&format!("#{}", escape_identifier(id)))
    }

    pub fn get_element_by_css(&self, css: &str) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(css)
    }

    pub fn get_elements_by_css(&self, css: &str) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(css)
    }

    pub fn get_element_by_css_class(
        &self,
        class: &str,
    ) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(&format!(".{}", escape_identifier(class)))
    }

    pub fn get_elements_by_css_class(&self, class: &str) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(&format!(".{}", escape_identifier(class)))
    }

    /// `tag[attr]`
    pub fn get_element_by_tag_and_attribute(
        &self,
        tag: &str,
        attr: &str,
    ) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(&format!("{tag}[{attr}]"))
    }

    pub fn get_elements_by_tag_and_attribute(
        &self,
        tag: &str,
        attr: &str,
    ) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(&format!("{tag}[{attr}]"))
    }

    /// `tag[attr="value"]`
    pub fn get_element_by_tag_and_attribute_value(
        &self,
        tag: &str,
        attr: &str,
        value: &str,
    ) -> Result<Option<ElementRef<'_>>, ParseError> {
        self.select_first(&attribute_value_selector(tag, attr, value))
    }

    pub fn get_elements_by_tag_and_attribute_value(
        &self,
        tag: &str,
        attr: &str,
        value: &str,
    ) -> Result<Vec<ElementRef<'_>>, ParseError> {
        self.select_all(&attribute_value_selector(tag, attr, value))
    }

    pub fn get_element_by_adjacent_text(
        &self,
        adj_tag: &str,
        text: &str,
        tag: &str,
    ) -> Result<Option<ElementRef<'_>>, ParseError> {
        Ok(self
            .get_elements_by_adjacent_text(adj_tag, text, tag)?
            .into_iter()
            .next())
    }

    /// Elements matching `tag` that follow, as siblings, an `adj_tag` element
    /// whose text contains `text`. Document order, no duplicates.
    ///
    /// ```
    /// # use gleaner_config::AssetSettings;
    /// # use gleaner_http::HttpClient;
    /// # use gleaner_web::StaticParser;
    /// let mut parser = StaticParser::new(HttpClient::new()?, AssetSettings::default());
    /// parser.set_soup(Some("<dl><dt>Price</dt><dd>100</dd><dt>Stock</dt><dd>3</dd></dl>"))?;
    ///
    /// let price = parser.get_element_by_adjacent_text("dt", "Price", "dd")?.unwrap();
    /// assert_eq!(parser.get_content_from_element(&price, true), "100");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn get_elements_by_adjacent_text(
        &self,
        adj_tag: &str,
        text: &str,
        tag: &str,
    ) -> Result<Vec<ElementRef<'_>>, ParseError> {
        let anchors = parse_selector(adj_tag)?;
        let targets = parse_selector(tag)?;

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for anchor in self.document.select(&anchors) {
            if !anchor.text().collect::<String>().contains(text) {
                continue;
            }
            for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
                if targets.matches(&sibling) && seen.insert((*sibling).id()) {
                    found.push(sibling);
                }
            }
        }

        // Anchors nested at different depths can emit siblings out of order.
        if found.len() > 1 {
            let order: HashMap<_, usize> = self
                .document
                .tree
                .root()
                .descendants()
                .enumerate()
                .map(|(idx, node)| (node.id(), idx))
                .collect();
            found.sort_by_key(|el| order.get(&(**el).id()).copied().unwrap_or(usize::MAX));
        }
        Ok(found)
    }

    /// Text of `element`. With `strip`, each text node is trimmed and empty
    /// ones are dropped before joining.
    pub fn get_content_from_element(&self, element: &ElementRef<'_>, strip: bool) -> String {
        if strip {
            element
                .text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            element.text().collect()
        }
    }

    pub fn get_contents_from_elements(&self, elements: &[ElementRef<'_>], strip: bool) -> Vec<String> {
        elements
            .iter()
            .map(|el| self.get_content_from_element(el, strip))
            .collect()
    }

    pub fn get_attribute_from_element(&self, element: &ElementRef<'_>, name: &str) -> Option<String> {
        element.value().attr(name).map(str::to_string)
    }

    pub fn get_attributes_from_elements(
        &self,
        elements: &[ElementRef<'_>],
        name: &str,
    ) -> Vec<Option<String>> {
        elements
            .iter()
            .map(|el| self.get_attribute_from_element(el, name))
            .collect()
    }

    /// Every text node outside `script`/`style`, one per line, blank lines
    /// removed.
    pub fn get_all_texts(&self) -> String {
        let mut pieces: Vec<&str> = Vec::new();
        for node in self.document.tree.root().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                matches!(ancestor.value(), Node::Element(el) if SKIPPED_TEXT_TAGS.contains(&el.name()))
            });
            if !hidden {
                pieces.push(&**text);
            }
        }
        clean_lines(&pieces.join("\n"))
    }

    pub fn cutout_filename_without_appendix(&self, path: &str) -> String {
        files::cutout_filename_without_appendix(path)
    }

    /// `src` of every `img`, resolved against the page URL. Sources that do
    /// not resolve to an http(s) URL are skipped.
    pub fn get_all_image_urls(&self) -> Result<Vec<Url>, ParseError> {
        let mut urls = Vec::new();
        for img in self.select_all("img")? {
            let Some(src) = img.value().attr("src").map(str::trim) else {
                continue;
            };
            let resolved = match &self.url {
                Some(base) => base.join(src),
                None => Url::parse(src),
            };
            match resolved {
                Ok(url) if matches!(url.scheme(), "http" | "https") => urls.push(url),
                Ok(url) => debug!(target: "parser", scheme = url.scheme(), "skipping image"),
                Err(e) => debug!(target: "parser", %src, error = %e, "unresolvable image source"),
            }
        }
        Ok(urls)
    }

    /// Download every image into the assets directory as `{stem}.{appendix}`.
    pub async fn get_all_images(&self, appendix: &str) -> Result<Vec<PathBuf>, ParseError> {
        let urls = self.get_all_image_urls()?;
        let saved = ImageDownloader::new(
            &self.http,
            &self.assets.dir,
            ImageNaming::ReplaceAppendix(appendix.to_string()),
        )
        .with_concurrency(self.assets.concurrency)
        .download_all(&urls)
        .await?;
        info!(target: "parser", count = saved.len(), dir = %self.assets.dir.display(), "images saved");
        Ok(saved)
    }
}

fn parse_selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn attribute_value_selector(tag: &str, attr: &str, value: &str) -> String {
    format!("{tag}[{attr}={}]", quote_string(value))
}

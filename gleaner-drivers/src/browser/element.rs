use anyhow::{anyhow, Context, Result};
use fantoccini::{elements::Element, Client};
use serde::Serialize;

use crate::browser::selector::By;

/// Top-left corner of an element, in CSS pixels relative to the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// Rendered width and height of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Submits the element's form, or the element itself when it is a form.
const SUBMIT_SCRIPT: &str = r#"
    const el = arguments[0];
    const form = el.tagName === 'FORM' ? el : el.form;
    if (!form) { throw new Error('element is not inside a form'); }
    if (typeof form.requestSubmit === 'function') { form.requestSubmit(); } else { form.submit(); }
"#;

#[derive(Clone)]
/// Wrapper for DOM elements found through a [`BrowserSession`](crate::browser::session::BrowserSession).
pub struct PageElement {
    pub element: Element,
    client: Client,
}

impl PageElement {
    pub fn new(element: Element, client: &Client) -> Self {
        Self {
            element,
            client: client.clone(),
        }
    }

    /// Return the element's visible text.
    pub async fn get_text(&self) -> Result<String> {
        self.element.text().await.context("reading element text")
    }

    /// Return the lower-case tag name.
    pub async fn get_tag(&self) -> Result<String> {
        self.element.tag_name().await.context("reading tag name")
    }

    /// Read an attribute value as written in the markup.
    pub async fn get_attribute(&self, attribute: &str) -> Result<Option<String>> {
        self.element
            .attr(attribute)
            .await
            .with_context(|| format!("reading attribute `{attribute}`"))
    }

    /// Read a DOM property; `src`/`href` come back as absolute URLs.
    pub async fn get_property(&self, property: &str) -> Result<Option<String>> {
        self.element
            .prop(property)
            .await
            .with_context(|| format!("reading property `{property}`"))
    }

    /// Return the element's inner HTML.
    pub async fn get_inner_html(&self) -> Result<String> {
        self.element.html(true).await.map_err(anyhow::Error::from)
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        self.element.is_displayed().await.context("checking visibility")
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.element.is_enabled().await.context("checking enabled state")
    }

    pub async fn get_location(&self) -> Result<Location> {
        let (x, y, _, _) = self.rectangle().await?;
        Ok(Location { x, y })
    }

    pub async fn get_size(&self) -> Result<Size> {
        let (_, _, width, height) = self.rectangle().await?;
        Ok(Size { width, height })
    }

    async fn rectangle(&self) -> Result<(f64, f64, f64, f64)> {
        self.element.rectangle().await.context("reading element rect")
    }

    /// Clear a text input or textarea.
    pub async fn clear(&self) -> Result<()> {
        self.element.clear().await.context("clearing element")
    }

    pub async fn click(&self) -> Result<()> {
        self.element.click().await.context("clicking element")
    }

    /// Submit the form this element belongs to.
    pub async fn submit(&self) -> Result<()> {
        let arg = serde_json::to_value(&self.element)?;
        self.client
            .execute(SUBMIT_SCRIPT, vec![arg])
            .await
            .map_err(|e| anyhow!("submitting form: {e}"))?;
        Ok(())
    }

    /// Type `value` into the element.
    pub async fn fill_value(&self, value: &str) -> Result<()> {
        self.element
            .send_keys(value)
            .await
            .context("sending keys to element")
    }

    /// Find a descendant element.
    pub async fn find_element(&self, by: &By) -> Result<PageElement> {
        let query = by.query();
        let element = self
            .element
            .find(query.locator())
            .await
            .with_context(|| format!("no child element matches {by}"))?;
        Ok(PageElement::new(element, &self.client))
    }

    /// Find zero or more descendant elements.
    pub async fn find_elements(&self, by: &By) -> Result<Vec<PageElement>> {
        let query = by.query();
        let elements = self
            .element
            .find_all(query.locator())
            .await
            .with_context(|| format!("looking up children by {by}"))?;
        Ok(elements
            .into_iter()
            .map(|element| PageElement::new(element, &self.client))
            .collect())
    }
}

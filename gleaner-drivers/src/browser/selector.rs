//! Selector strategies and the XPath templates built on top of them.
//!
//! WebDriver natively understands CSS, link text and XPath. The remaining
//! strategies (`name`, class, tag, partial link text) are rewritten into one
//! of those before they reach the driver.

use std::fmt;

use fantoccini::Locator;
use gleaner_common::css::{escape_identifier, quote_string};

/// XPath matching every element that is neither `script` nor `style`.
pub const VISIBLE_TEXT_XPATH: &str = "//*[not(self::script) and not(self::style)]";

/// A named way of locating an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    Id(String),
    Name(String),
    ClassName(String),
    TagName(String),
    XPath(String),
    Css(String),
    LinkText(String),
    PartialLinkText(String),
}

/// A [`By`] rewritten into a strategy WebDriver understands directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    Id(String),
    XPath(String),
    LinkText(String),
}

impl Query {
    pub fn locator(&self) -> Locator<'_> {
        match self {
            Query::Css(s) => Locator::Css(s),
            Query::Id(s) => Locator::Id(s),
            Query::XPath(s) => Locator::XPath(s),
            Query::LinkText(s) => Locator::LinkText(s),
        }
    }
}

impl By {
    pub fn query(&self) -> Query {
        match self {
            By::Id(id) => Query::Id(id.clone()),
            By::Name(name) => Query::Css(format!("[name={}]", quote_string(name))),
            By::ClassName(class) => Query::Css(format!(".{}", escape_identifier(class))),
            By::TagName(tag) => Query::Css(tag.clone()),
            By::XPath(xpath) => Query::XPath(xpath.clone()),
            By::Css(css) => Query::Css(css.clone()),
            By::LinkText(text) => Query::LinkText(text.clone()),
            By::PartialLinkText(text) => {
                Query::XPath(format!("//a[contains(., {})]", xpath_literal(text)))
            }
        }
    }

    /// `//tag[@attr="value"]`
    pub fn relative_tag_attribute(tag: &str, attr: &str, value: &str) -> Self {
        By::XPath(format!("//{tag}[@{attr}={}]", xpath_literal(value)))
    }

    /// `//tag[contains(@attr,"value")]`
    pub fn relative_tag_contains_attribute(tag: &str, attr: &str, value: &str) -> Self {
        By::XPath(format!("//{tag}[contains(@{attr},{})]", xpath_literal(value)))
    }

    /// `//tag[text()="text"]`
    pub fn relative_tag_text(tag: &str, text: &str) -> Self {
        By::XPath(format!("//{tag}[text()={}]", xpath_literal(text)))
    }

    /// `//tag[contains(text(),"text")]`
    pub fn relative_tag_contains_text(tag: &str, text: &str) -> Self {
        By::XPath(format!("//{tag}[contains(text(),{})]", xpath_literal(text)))
    }

    /// `//tag[position()<op><n>]`, e.g. `position` = `"=2"` or `"<3"`.
    pub fn relative_tag_position(tag: &str, position: &str) -> Self {
        By::XPath(format!("//{tag}[position(){position}]"))
    }

    /// `//*[not(expr)]`; `expr` is spliced in as is (`self::script`).
    pub fn except_tag(expr: &str) -> Self {
        By::XPath(format!("//*[not({expr})]"))
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, value) = match self {
            By::Id(v) => ("id", v),
            By::Name(v) => ("name", v),
            By::ClassName(v) => ("class name", v),
            By::TagName(v) => ("tag name", v),
            By::XPath(v) => ("xpath", v),
            By::Css(v) => ("css selector", v),
            By::LinkText(v) => ("link text", v),
            By::PartialLinkText(v) => ("partial link text", v),
        };
        write!(f, "{kind} `{value}`")
    }
}

/// Quote `s` as an XPath 1.0 string literal.
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    let parts: Vec<String> = s
        .split('"')
        .map(|part| format!("\"{part}\""))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

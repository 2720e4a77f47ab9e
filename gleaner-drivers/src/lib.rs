//! Driver layer for browser automation.
//!
//! This crate exposes a WebDriver session and element helpers used to fetch
//! and interact with rendered pages. Lookups, interactions and captures are
//! delegated to `fantoccini`; nothing here speaks the WebDriver protocol
//! directly.
//!
//! - [`browser::session::BrowserSession`]: WebDriver client wrapper
//! - [`browser::element::PageElement`]: element features and actions
//! - [`browser::selector::By`]: selector strategies and XPath templates
//! - [`browser::options`]: Chrome launch arguments and capabilities
pub mod browser;

pub use browser::element::{Location, PageElement, Size};
pub use browser::selector::By;
pub use browser::session::{BrowserSession, TextBox, WindowSize};

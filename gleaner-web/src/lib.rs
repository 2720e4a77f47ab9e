//! Static page extraction and the browser-to-parser bridge.
//!
//! - [`parser::StaticParser`]: fetch a page over HTTP and select from it
//!   with CSS selectors
//! - [`capture`]: render a page through a WebDriver session and hand the
//!   resulting HTML to a [`parser::StaticParser`]

pub mod capture;
pub mod parser;

pub use capture::{PageCapture, PageCapturer, WebDriverCapturer};
pub use parser::{ParseError, StaticParser};

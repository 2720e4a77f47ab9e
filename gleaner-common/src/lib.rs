//! Common types and utilities shared across Gleaner crates.
//!
//! This crate holds the pieces both extraction facades lean on: the shared
//! error type, logging initialisation, text cosmetics for scraped strings and
//! filename helpers for downloaded assets. It stays dependency-light so that
//! every other crate can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`text`]: Literal and regex cleanup of extracted text
//! - [`css`]: Escaping values spliced into CSS selectors
//! - [`files`]: Deriving local file names from image paths and URLs
//! - [`GleanerError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use gleaner_common::text::{remove_void_texts, text_cosmetics, DEFAULT_IMPURITIES};
//!
//! let cleaned = text_cosmetics("Price:\n\t100", DEFAULT_IMPURITIES, "");
//! assert_eq!(cleaned, "Price:100");
//!
//! let kept = remove_void_texts(vec!["a".into(), String::new(), "b".into()]);
//! assert_eq!(kept, vec!["a", "b"]);
//! ```

pub mod css;
pub mod files;
pub mod observability;
pub mod text;

/// Error types used across the Gleaner workspace.
#[derive(thiserror::Error, Debug)]
pub enum GleanerError {
    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cleanup pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`GleanerError`].
pub type Result<T> = std::result::Result<T, GleanerError>;

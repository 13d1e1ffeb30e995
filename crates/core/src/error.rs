//! Error types for Tankobon operations.
//!
//! This module defines the main error type [`TankobonError`] which represents
//! every failure an adapter can surface to its caller: transport failures,
//! unresolvable paths, registry misses and data that stayed absent after all
//! extraction strategies were exhausted.
//!
//! An extraction strategy that finds nothing is *not* an error. Strategies
//! return empty collections and the adapter moves on to the next one.
//!
//! # Example
//!
//! ```rust
//! use tankobon_core::{Result, TankobonError};
//!
//! fn first_page(pages: Vec<String>) -> Result<String> {
//!     pages
//!         .into_iter()
//!         .next()
//!         .ok_or_else(|| TankobonError::NotFound("chapter has no pages".to_string()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for adapter operations.
///
/// # Example
///
/// ```rust
/// use tankobon_core::{SourceRegistry, TankobonError};
///
/// let registry = SourceRegistry::new().unwrap();
/// match registry.get("nope") {
///     Ok(source) => println!("found {}", source.info().name),
///     Err(TankobonError::UnknownSource { id, available }) => {
///         println!("{} is not one of {}", id, available);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum TankobonError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues
    /// and body decoding problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Non-success response status.
    ///
    /// Carries the fully resolved URL so callers can tell which of several
    /// requests behind one operation failed. Never retried internally.
    #[error("Failed to fetch {url}: {status}")]
    Status { url: String, status: u16 },

    /// Invalid URL or a path that cannot be resolved against the base origin.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid CSS selector or text pattern.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A JSON endpoint answered with a body that does not match the expected shape.
    #[error("Invalid payload: {0}")]
    PayloadError(String),

    /// No adapter is registered under the requested id.
    #[error("Source \"{id}\" not found. Available sources: {available}")]
    UnknownSource { id: String, available: String },

    /// Required data is still absent after every strategy was tried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// File not found.
    ///
    /// Returned when reading a saved page for offline parsing.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File or stdin read errors.
    #[error("Failed to read input: {0}")]
    ReadError(#[from] std::io::Error),

    /// Settings file errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for TankobonError.
pub type Result<T> = std::result::Result<T, TankobonError>;

//! HTML parsing and element selection.
//!
//! This module provides the [`Document`] and [`Element`] types that structural
//! queries run on: CSS selection, trimmed text content and attribute reads with
//! fallbacks for lazy-loaded images.
//!
//! # Example
//!
//! ```rust
//! use tankobon_core::parse::Document;
//!
//! let html = r#"
//!     <div class="item"><a href="/series/solo">Solo</a><img data-src="/c.webp"></div>
//! "#;
//!
//! let doc = Document::parse(html);
//! let item = doc.select_first("div.item").unwrap().unwrap();
//! assert_eq!(item.text_trimmed(), "Solo");
//! assert_eq!(item.select_first("img").unwrap().unwrap().attr_any(&["src", "data-src"]), Some("/c.webp"));
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{Result, TankobonError};

/// Compiles a CSS selector, mapping failures to [`TankobonError::HtmlParseError`].
fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| TankobonError::HtmlParseError(format!("Invalid selector {}: {}", selector, e)))
}

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup still produces a tree.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`TankobonError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tankobon_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = self::selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = self::selector(selector)?;
        Ok(self.html.select(&sel).next().map(Element::new))
    }

    /// Trimmed text of the first element matching the selector, empty when none matches.
    pub fn first_text(&self, selector: &str) -> Result<String> {
        Ok(self.select_first(selector)?.map(|el| el.text_trimmed()).unwrap_or_default())
    }

    /// First non-empty value among `attrs` on the first element matching the selector.
    pub fn first_attr(&self, selector: &str, attrs: &[&str]) -> Result<String> {
        Ok(self
            .select_first(selector)?
            .and_then(|el| el.attr_any(attrs).map(str::to_string))
            .unwrap_or_default())
    }

    /// Bodies of every `<script>` element, in document order.
    pub fn scripts(&self) -> Vec<String> {
        let Ok(sel) = Selector::parse("script") else {
            return Vec::new();
        };

        self.html.select(&sel).map(|el| el.text().collect()).collect()
    }
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use tankobon_core::parse::Document;
///
/// let html = r#"<a href="https://example.com"> Link text </a>"#;
/// let doc = Document::parse(html);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text_trimmed(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Text content with surrounding whitespace removed.
    pub fn text_trimmed(&self) -> String {
        self.text().trim().to_string()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// First attribute among `names` that is present and not blank.
    ///
    /// Lazy-loading pages often leave `src` empty or pointing at a spinner and
    /// put the real image in `data-src`, so callers list both.
    pub fn attr_any(&self, names: &[&str]) -> Option<&'a str> {
        names
            .iter()
            .filter_map(|name| self.attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Whether this element is an `<tag>`.
    pub fn is(&self, tag: &str) -> bool {
        self.element.value().name().eq_ignore_ascii_case(tag)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`TankobonError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = self::selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }

    /// Selects the first descendant matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = self::selector(selector)?;
        Ok(self.element.select(&sel).next().map(Element::new))
    }

    /// Whether any descendant matches the selector.
    pub fn has(&self, selector: &str) -> Result<bool> {
        Ok(self.select_first(selector)?.is_some())
    }
}

//! Pattern scans over raw markup text.
//!
//! Some sites emit markup that html5ever repairs into a tree that no longer
//! resembles the source (unclosed wrappers, template leftovers). The same
//! markup is still regular enough to match as text: find a block by a class
//! substring, then lazily capture the attributes that follow it up to the
//! block's closing tag.
//!
//! Block scans cut the text at every block opening first and match each slice
//! on its own. A block missing an attribute is dropped instead of borrowing
//! the value from the block after it.
//!
//! Every scan walks a fresh `captures_iter`, so a compiled [`PatternScan`] can
//! be shared and reused without one call's position leaking into the next.

use regex::{Captures, Regex};
use tracing::debug;

use super::fallback::{dedup_ordered, first_non_empty};
use super::structural::RawEntry;
use crate::{Result, TankobonError};

/// Builds a block pattern for `<tag class="... class ...">` followed by `attrs`.
///
/// Each attribute value becomes one capture group, in the order given. The
/// pattern runs in dot-matches-newline mode with lazy gaps, and ends at the
/// first closing `</tag>` after the last attribute.
///
/// ```rust
/// use regex::Regex;
/// use tankobon_core::strategy::block_pattern;
///
/// let re = Regex::new(&block_pattern("div", "col-6", &["href", "title"])).unwrap();
/// let caps = re.captures(r#"<div class="col-6 x"><a href="/a" title="A"></a></div>"#).unwrap();
/// assert_eq!(&caps[1], "/a");
/// assert_eq!(&caps[2], "A");
/// ```
pub fn block_pattern(tag: &str, class: &str, attrs: &[&str]) -> String {
    let mut pattern = block_opener(tag, class);

    for attr in attrs {
        pattern.push_str(&format!(r#".*?\s{}=["']([^"']+)["']"#, regex::escape(attr)));
    }

    pattern.push_str(&format!(r".*?</{}>", regex::escape(tag)));
    pattern
}

/// The opening tag alone, as matched at the start of [`block_pattern`].
fn block_opener(tag: &str, class: &str) -> String {
    format!(
        r#"(?s)<{tag}\b[^>]*class=["'][^"']*\b{class}\b[^"']*["'][^>]*>"#,
        tag = regex::escape(tag),
        class = regex::escape(class)
    )
}

/// Which capture group feeds which field of a [`RawEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMap {
    pub link: usize,
    pub title: usize,
    pub image: Option<usize>,
}

impl Default for GroupMap {
    fn default() -> Self {
        Self { link: 1, title: 2, image: Some(3) }
    }
}

/// A compiled text pattern plus its capture-group mapping.
#[derive(Debug, Clone)]
pub struct PatternScan {
    regex: Regex,
    /// Block opening tag; when set, each block is matched within its own slice.
    opener: Option<Regex>,
    groups: GroupMap,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TankobonError::HtmlParseError(format!("Invalid pattern {}: {}", pattern, e)))
}

impl PatternScan {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`TankobonError::HtmlParseError`] for an invalid pattern.
    pub fn new(pattern: &str, groups: GroupMap) -> Result<Self> {
        Ok(Self { regex: compile(pattern)?, opener: None, groups })
    }

    /// Compiles a [`block_pattern`] for `<tag>` blocks carrying `class`.
    pub fn block(tag: &str, class: &str, attrs: &[&str], groups: GroupMap) -> Result<Self> {
        Ok(Self {
            regex: compile(&block_pattern(tag, class, attrs))?,
            opener: Some(compile(&block_opener(tag, class))?),
            groups,
        })
    }

    /// All matches in `text`, at most one per block for block scans.
    fn matches<'t>(&self, text: &'t str) -> Vec<Captures<'t>> {
        let Some(opener) = &self.opener else {
            return self.regex.captures_iter(text).collect();
        };

        let starts: Vec<usize> = opener.find_iter(text).map(|m| m.start()).collect();
        starts
            .iter()
            .enumerate()
            .filter_map(|(index, &start)| {
                let end = starts.get(index + 1).copied().unwrap_or(text.len());
                self.regex.captures(&text[start..end])
            })
            .collect()
    }

    /// Maps every match onto an entry, skipping matches with an empty link or title.
    pub fn scan(&self, text: &str) -> Vec<RawEntry> {
        self.matches(text)
            .iter()
            .filter_map(|caps| {
                let group = |index: usize| caps.get(index).map(|m| m.as_str()).unwrap_or_default();
                let image = self.groups.image.map(group).unwrap_or_default();
                RawEntry::new(group(self.groups.link), group(self.groups.title), image)
            })
            .collect()
    }

    /// Values of one capture group across all matches, trimmed, empties dropped.
    pub fn capture_all(&self, text: &str, group: usize) -> Vec<String> {
        self.matches(text)
            .iter()
            .filter_map(|caps| caps.get(group))
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// One candidate shape for image URLs in raw markup.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    /// Short label for logs.
    pub name: &'static str,
    pub regex: Regex,
    /// Capture group holding the URL; `0` for the whole match.
    pub group: usize,
}

impl UrlPattern {
    pub fn new(name: &'static str, pattern: &str, group: usize) -> Result<Self> {
        Ok(Self { name, regex: compile(pattern)?, group })
    }

    fn urls(&self, text: &str) -> Vec<String> {
        dedup_ordered(
            self.regex
                .captures_iter(text)
                .filter_map(|caps| caps.get(self.group))
                .map(|m| m.as_str().to_string()),
        )
    }
}

/// Tries `patterns` in order and returns the deduplicated URLs of the first one that matches.
///
/// Duplicates are removed by exact string equality, keeping first-seen order.
pub fn first_matching_urls(text: &str, patterns: &[UrlPattern]) -> Vec<String> {
    let strategies: Vec<_> = patterns
        .iter()
        .map(|pattern| (pattern.name, move || pattern.urls(text)))
        .collect();

    let urls = first_non_empty(&strategies);
    debug!(count = urls.len(), "url pattern scan finished");
    urls
}

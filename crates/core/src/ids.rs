//! Identifier normalization, URL resolution and chapter-number recovery.
//!
//! Public ids are site-relative paths that start with exactly one `/` and never
//! carry the site's collection segment (`/series/solo` is exposed as `/solo`).
//! [`IdScheme`] owns both directions of that mapping so callers never rebuild
//! site paths themselves.

use std::sync::LazyLock;

use regex::Regex;

static CHAPTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chapter[\s/_-]*(\d+(?:\.\d+)?)").expect("chapter number pattern"));

static CHAPTER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:chapter|ch|episode|ep)(?:[-_]?\d.*)?$").expect("chapter segment pattern"));

/// How one site spells its internal paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdScheme {
    /// Leading path segment the site requires but public ids drop, e.g. `series`.
    pub collection: Option<&'static str>,
    /// Leading segments that live outside the collection and pass through untouched.
    pub exempt: &'static [&'static str],
}

impl IdScheme {
    pub const fn new(collection: &'static str) -> Self {
        Self { collection: Some(collection), exempt: &[] }
    }

    pub const fn with_exempt(mut self, exempt: &'static [&'static str]) -> Self {
        self.exempt = exempt;
        self
    }

    /// Turns a link found in markup into a public id.
    ///
    /// Absolute URLs are reduced to their path (plus query), the collection
    /// segment is dropped and the result gets a single leading slash.
    ///
    /// ```rust
    /// use tankobon_core::ids::IdScheme;
    ///
    /// let scheme = IdScheme::new("series");
    /// assert_eq!(scheme.to_public("series/solo-leveling"), "/solo-leveling");
    /// assert_eq!(scheme.to_public("https://asuracomic.net/series/solo/chapter/3"), "/solo/chapter/3");
    /// ```
    pub fn to_public(&self, link: &str) -> String {
        let path = leading_slash(strip_origin(link.trim()));

        match self.collection {
            Some(collection) => {
                let rest = &path[1..];
                match rest.strip_prefix(collection) {
                    Some("") => "/".to_string(),
                    Some(tail) if tail.starts_with('/') => leading_slash(tail),
                    _ => path,
                }
            }
            None => path,
        }
    }

    /// Rebuilds the path the site expects from a public id.
    ///
    /// Ids that already carry the collection segment, or start with an exempt
    /// segment, are only slash-normalized.
    ///
    /// ```rust
    /// use tankobon_core::ids::IdScheme;
    ///
    /// let scheme = IdScheme::new("series");
    /// assert_eq!(scheme.to_site("/solo-leveling"), "/series/solo-leveling");
    /// assert_eq!(scheme.to_site("/series/solo-leveling"), "/series/solo-leveling");
    /// ```
    pub fn to_site(&self, id: &str) -> String {
        let path = leading_slash(strip_origin(id.trim()));

        let Some(collection) = self.collection else {
            return path;
        };

        let first = path[1..].split('/').next().unwrap_or_default();
        if first == collection || self.exempt.contains(&first) {
            path
        } else {
            format!("/{}{}", collection, path)
        }
    }
}

/// Drops scheme and host from an absolute or protocol-relative URL.
fn strip_origin(link: &str) -> &str {
    let rest = if let Some(pos) = link.find("://") {
        &link[pos + 3..]
    } else if let Some(rest) = link.strip_prefix("//") {
        rest
    } else {
        return link;
    };

    match rest.find('/') {
        Some(pos) => &rest[pos..],
        None => "/",
    }
}

/// Collapses any run of leading slashes into exactly one.
pub fn leading_slash(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Makes an image or page URL absolute against an origin.
///
/// Absolute URLs pass through, protocol-relative ones get `https:`, and
/// anything else is appended to `origin`. Empty input stays empty.
///
/// ```rust
/// use tankobon_core::ids::absolute_url;
///
/// assert_eq!(absolute_url("https://gg.asuracomic.net", "/a.webp"), "https://gg.asuracomic.net/a.webp");
/// assert_eq!(absolute_url("https://gg.asuracomic.net", "b.webp"), "https://gg.asuracomic.net/b.webp");
/// assert_eq!(absolute_url("https://x", "//cdn.y/c.jpg"), "https://cdn.y/c.jpg");
/// ```
pub fn absolute_url(origin: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    let origin = origin.trim_end_matches('/');
    if url.starts_with('/') { format!("{}{}", origin, url) } else { format!("{}/{}", origin, url) }
}

/// What a chapter gets when neither its title nor its URL carries a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFallback {
    /// 1-based position in the site's list.
    Position,
    /// Always `0`.
    Zero,
}

impl NumberFallback {
    fn value(self, index: usize) -> f64 {
        match self {
            Self::Position => (index + 1) as f64,
            Self::Zero => 0.0,
        }
    }
}

/// Finds the first `chapter <number>` token in `text`, case-insensitively.
pub fn find_chapter_number(text: &str) -> Option<f64> {
    CHAPTER_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Recovers a chapter number from its title, then its URL, then the fallback.
///
/// `index` is the chapter's 0-based position in the source list.
///
/// ```rust
/// use tankobon_core::ids::{NumberFallback, chapter_number};
///
/// assert_eq!(chapter_number("Chapter 12.5", "", 0, NumberFallback::Zero), 12.5);
/// assert_eq!(chapter_number("Finale", "/solo/chapter-7", 0, NumberFallback::Zero), 7.0);
/// assert_eq!(chapter_number("Finale", "/solo/end", 4, NumberFallback::Position), 5.0);
/// ```
pub fn chapter_number(title: &str, url: &str, index: usize, fallback: NumberFallback) -> f64 {
    find_chapter_number(title)
        .or_else(|| find_chapter_number(url))
        .unwrap_or_else(|| fallback.value(index))
}

/// Derives the owning manga id from a chapter id.
///
/// Everything from the last chapter-marker segment (`chapter`, `ch-5`,
/// `episode_9`, ...) onwards is dropped. Ids without such a segment are
/// returned as they are.
///
/// ```rust
/// use tankobon_core::ids::manga_id_from_chapter;
///
/// assert_eq!(manga_id_from_chapter("/solo-leveling/chapter/12"), "/solo-leveling");
/// assert_eq!(manga_id_from_chapter("/tower/Chapter-3/"), "/tower");
/// assert_eq!(manga_id_from_chapter("/chapter-zero-reborn/chapter/3"), "/chapter-zero-reborn");
/// ```
pub fn manga_id_from_chapter(chapter_id: &str) -> String {
    let segments: Vec<&str> = chapter_id.trim_matches('/').split('/').collect();

    match segments.iter().rposition(|segment| CHAPTER_SEGMENT.is_match(segment)) {
        Some(index) => leading_slash(&segments[..index].join("/")),
        None => leading_slash(chapter_id),
    }
}

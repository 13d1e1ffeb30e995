//! Site adapters behind one capability contract.
//!
//! Every adapter implements [`MangaSource`]: four async operations returning the
//! shapes in [`crate::model`]. An empty `Vec` means "no results" and is never
//! an error; errors are reserved for transport failures and data that is
//! still missing after every strategy was tried.
//!
//! Each adapter also exposes its parsing as plain functions over HTML text
//! (`parse_latest`, `parse_details`, ...) so saved pages can be run through
//! the same extraction without a network.

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::ids::{IdScheme, absolute_url, manga_id_from_chapter};
use crate::model::{Manga, MangaDetails, SourceInfo};
use crate::strategy::RawEntry;

pub mod asura;
pub mod mangalife;
pub mod manhuafast;
pub mod registry;

pub use asura::AsuraSource;
pub use mangalife::MangaLifeSource;
pub use manhuafast::ManhuaFastSource;
pub use registry::SourceRegistry;

/// The four operations every source adapter provides.
#[async_trait]
pub trait MangaSource: Send + Sync {
    /// Static description: id, display name and origin.
    fn info(&self) -> SourceInfo;

    /// One page (1-indexed) of the site's latest or popular listing.
    async fn get_latest_manga(&self, page: u32) -> Result<Vec<Manga>>;

    /// Titles matching a free-text query.
    async fn search_manga(&self, query: &str) -> Result<Vec<Manga>>;

    /// Metadata and chapter list for a title id produced by this adapter.
    async fn get_manga_details(&self, manga_id: &str) -> Result<MangaDetails>;

    /// Absolute page image URLs for a chapter id, in reading order.
    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>>;

    /// Runs this adapter's extraction for `kind` over an already fetched document.
    ///
    /// `id` is the public id the document belongs to; only detail pages use it.
    /// No secondary requests are made, so a detail page whose chapter list is
    /// loaded separately yields whatever chapters the document itself holds.
    fn extract(&self, kind: PageKind, html: &str, id: &str) -> Result<Extracted>;

    /// The id of the title a chapter id belongs to.
    ///
    /// The default drops the chapter segment; sites whose chapter paths do not
    /// nest under the title override it.
    fn manga_id_for_chapter(&self, chapter_id: &str) -> String {
        manga_id_from_chapter(chapter_id)
    }
}

/// Output of [`MangaSource::extract`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extracted {
    Listing(Vec<Manga>),
    Details(MangaDetails),
    Pages(Vec<String>),
}

/// Turns raw listing blocks into public entries for `source_id`.
pub(crate) fn to_listing(entries: Vec<RawEntry>, scheme: &IdScheme, origin: &str, source_id: &str) -> Vec<Manga> {
    entries
        .into_iter()
        .map(|entry| Manga {
            id: scheme.to_public(&entry.link),
            title: entry.title,
            cover: absolute_url(origin, &entry.image),
            source_id: source_id.to_string(),
        })
        .collect()
}

/// Percent-encodes a search query for use in a URL query string.
pub(crate) fn encode_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect()
}

/// Which kind of page a saved document is, for offline parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Latest,
    Search,
    Details,
    Pages,
}

impl std::str::FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "listing" => Ok(Self::Latest),
            "search" => Ok(Self::Search),
            "details" | "manga" => Ok(Self::Details),
            "pages" | "chapter" => Ok(Self::Pages),
            _ => Err(format!("Invalid page kind: {}. Valid options: latest, search, details, pages", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query(" solo leveling "), "solo+leveling");
        assert_eq!(encode_query("a&b=c"), "a%26b%3Dc");
    }

    #[test]
    fn test_to_listing_normalizes_ids_and_covers() {
        let entries = vec![RawEntry::new("https://asuracomic.net/series/solo", "Solo", "/c.webp").unwrap()];
        let listing = to_listing(entries, &IdScheme::new("series"), "https://asuracomic.net", "asura");

        assert_eq!(listing[0].id, "/solo");
        assert_eq!(listing[0].cover, "https://asuracomic.net/c.webp");
        assert_eq!(listing[0].source_id, "asura");
    }

    #[test]
    fn test_page_kind_from_str() {
        assert_eq!("latest".parse::<PageKind>(), Ok(PageKind::Latest));
        assert_eq!("Chapter".parse::<PageKind>(), Ok(PageKind::Pages));
        assert!("cover".parse::<PageKind>().is_err());
    }
}

//! Normalized records shared by every source adapter.
//!
//! Whatever markup a site serves, adapters hand back these shapes. All of them
//! are plain values scoped to one fetch; nothing here is cached or persisted.

use serde::{Deserialize, Serialize};

/// One title in a paginated listing or a search result set.
///
/// `id` is source-relative: it starts with exactly one `/` and never contains
/// the site's collection segment, so it can be fed straight back into
/// [`MangaSource::get_manga_details`](crate::MangaSource::get_manga_details).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    /// Cover image URL, empty when the listing had none.
    pub cover: String,
    pub source_id: String,
}

/// One chapter of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Same normalization rules as [`Manga::id`].
    pub id: String,
    pub title: String,
    /// Parsed chapter number; adapters fall back to a positional index or `0`.
    pub number: f64,
    /// Release date as printed by the site, empty when unknown.
    pub date: String,
}

/// Full metadata plus chapter list for one title.
///
/// `chapters` keeps the order the site lists them in, which is newest first
/// for every bundled adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDetails {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub source_id: String,
    pub description: String,
    pub authors: Vec<String>,
    pub status: String,
    pub genres: Vec<String>,
    pub chapters: Vec<Chapter>,
}

impl MangaDetails {
    /// The listing-shaped view of this record.
    pub fn summary(&self) -> Manga {
        Manga {
            id: self.id.clone(),
            title: self.title.clone(),
            cover: self.cover.clone(),
            source_id: self.source_id.clone(),
        }
    }
}

/// One page record recovered from an embedded script payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub order: i64,
    pub url: String,
}

/// Static description of an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    /// Stable lowercase identifier used for registry lookups.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Origin every relative path is resolved against.
    pub base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manga_serializes_camel_case() {
        let manga = Manga {
            id: "/solo-leveling".to_string(),
            title: "Solo Leveling".to_string(),
            cover: String::new(),
            source_id: "asura".to_string(),
        };

        let json = serde_json::to_value(&manga).unwrap();
        assert_eq!(json["sourceId"], "asura");
        assert!(json.get("source_id").is_none());
    }

    #[test]
    fn test_details_summary() {
        let details = MangaDetails {
            id: "/a".to_string(),
            title: "A".to_string(),
            cover: "https://cdn/a.webp".to_string(),
            source_id: "asura".to_string(),
            description: String::new(),
            authors: vec![],
            status: "Ongoing".to_string(),
            genres: vec![],
            chapters: vec![],
        };

        let summary = details.summary();
        assert_eq!(summary.id, "/a");
        assert_eq!(summary.cover, "https://cdn/a.webp");
    }

    #[test]
    fn test_page_entry_from_json() {
        let pages: Vec<PageEntry> = serde_json::from_str(r#"[{"order":2,"url":"/a"},{"order":1,"url":"/b"}]"#).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1], PageEntry { order: 1, url: "/b".to_string() });
    }
}

//! Composite chapter load: pages plus enough series context to navigate.
//!
//! Pages and series details are fetched concurrently. Pages are required;
//! details are not, so a failing details request degrades the context
//! instead of failing the load.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ids::leading_slash;
use crate::model::{Chapter, MangaDetails};
use crate::source::MangaSource;
use crate::{Result, TankobonError};

/// Series summary shown alongside a chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MangaInfo {
    pub id: String,
    pub title: String,
    pub cover: String,
    /// The manga id without its leading `/`.
    pub slug: String,
}

/// Everything needed to render one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderContext {
    pub pages: Vec<String>,
    pub source_id: String,
    pub chapter_id: String,
    pub manga: MangaInfo,
    /// Full chapter list, newest first; empty when details were unavailable.
    pub chapters: Vec<Chapter>,
    pub current: Option<Chapter>,
    /// The older neighbour (`index + 1`).
    pub prev: Option<Chapter>,
    /// The newer neighbour (`index - 1`).
    pub next: Option<Chapter>,
}

/// Loads a chapter's pages together with its series context.
///
/// # Errors
///
/// Fails with the page request's error, or with [`TankobonError::NotFound`]
/// when the chapter yields no pages.
pub async fn load_chapter(source: &dyn MangaSource, chapter_id: &str) -> Result<ReaderContext> {
    let chapter_id = leading_slash(chapter_id.trim());
    let manga_id = source.manga_id_for_chapter(&chapter_id);
    let slug = manga_id.trim_start_matches('/').to_string();
    debug!(chapter = %chapter_id, manga = %manga_id, "loading chapter");

    let (pages, details) = tokio::join!(source.get_chapter_pages(&chapter_id), source.get_manga_details(&manga_id));

    let pages = pages?;
    if pages.is_empty() {
        return Err(TankobonError::NotFound(format!("chapter {} has no pages", chapter_id)));
    }

    let details = match details {
        Ok(details) => Some(details),
        Err(e) => {
            warn!(error = %e, manga = %manga_id, "failed to load manga details, continuing without them");
            None
        }
    };

    let manga = match &details {
        Some(details) => MangaInfo {
            id: details.id.clone(),
            title: details.title.clone(),
            cover: details.cover.clone(),
            slug: slug.clone(),
        },
        None => MangaInfo { id: manga_id.clone(), title: slug.replace('-', " "), cover: String::new(), slug },
    };

    let chapters = details.map(|MangaDetails { chapters, .. }| chapters).unwrap_or_default();
    let (current, prev, next) = match locate(&chapters, &chapter_id) {
        Some(index) => (
            chapters.get(index).cloned(),
            chapters.get(index + 1).cloned(),
            index.checked_sub(1).and_then(|i| chapters.get(i)).cloned(),
        ),
        None => (None, None, None),
    };

    Ok(ReaderContext {
        pages,
        source_id: source.info().id,
        chapter_id,
        manga,
        chapters,
        current,
        prev,
        next,
    })
}

/// Index of `chapter_id` in `chapters`: exact match first, then a suffix match either way.
pub fn locate(chapters: &[Chapter], chapter_id: &str) -> Option<usize> {
    chapters.iter().position(|c| c.id == chapter_id).or_else(|| {
        chapters
            .iter()
            .position(|c| c.id.ends_with(chapter_id) || chapter_id.ends_with(c.id.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Manga, SourceInfo};
    use crate::source::{Extracted, PageKind};
    use async_trait::async_trait;

    struct FakeSource {
        pages: Vec<String>,
        details: Option<MangaDetails>,
    }

    fn chapter(id: &str, number: f64) -> Chapter {
        Chapter { id: id.to_string(), title: format!("Chapter {}", number), number, date: String::new() }
    }

    fn details() -> MangaDetails {
        MangaDetails {
            id: "/solo-leveling".to_string(),
            title: "Solo Leveling".to_string(),
            cover: "https://cdn/solo.webp".to_string(),
            source_id: "fake".to_string(),
            description: String::new(),
            authors: vec![],
            status: "Ongoing".to_string(),
            genres: vec![],
            chapters: vec![
                chapter("/solo-leveling/chapter/3", 3.0),
                chapter("/solo-leveling/chapter/2", 2.0),
                chapter("/solo-leveling/chapter/1", 1.0),
            ],
        }
    }

    #[async_trait]
    impl MangaSource for FakeSource {
        fn info(&self) -> SourceInfo {
            SourceInfo { id: "fake".to_string(), name: "Fake".to_string(), base_url: "http://fake".to_string() }
        }

        async fn get_latest_manga(&self, _page: u32) -> Result<Vec<Manga>> {
            Ok(vec![])
        }

        async fn search_manga(&self, _query: &str) -> Result<Vec<Manga>> {
            Ok(vec![])
        }

        async fn get_manga_details(&self, manga_id: &str) -> Result<MangaDetails> {
            assert_eq!(manga_id, "/solo-leveling");
            self.details
                .clone()
                .ok_or(TankobonError::Status { url: "http://fake/series/solo-leveling".to_string(), status: 500 })
        }

        async fn get_chapter_pages(&self, _chapter_id: &str) -> Result<Vec<String>> {
            Ok(self.pages.clone())
        }

        fn extract(&self, _kind: PageKind, _html: &str, _id: &str) -> Result<Extracted> {
            Ok(Extracted::Pages(vec![]))
        }
    }

    fn pages() -> Vec<String> {
        vec!["https://cdn/1.webp".to_string(), "https://cdn/2.webp".to_string()]
    }

    #[tokio::test]
    async fn test_navigation_around_middle_chapter() {
        let source = FakeSource { pages: pages(), details: Some(details()) };

        let ctx = load_chapter(&source, "solo-leveling/chapter/2").await.unwrap();

        assert_eq!(ctx.chapter_id, "/solo-leveling/chapter/2");
        assert_eq!(ctx.source_id, "fake");
        assert_eq!(ctx.pages.len(), 2);
        assert_eq!(ctx.manga.title, "Solo Leveling");
        assert_eq!(ctx.manga.slug, "solo-leveling");
        assert_eq!(ctx.current.unwrap().number, 2.0);
        assert_eq!(ctx.next.unwrap().number, 3.0);
        assert_eq!(ctx.prev.unwrap().number, 1.0);
    }

    #[tokio::test]
    async fn test_newest_chapter_has_no_next() {
        let source = FakeSource { pages: pages(), details: Some(details()) };

        let ctx = load_chapter(&source, "/solo-leveling/chapter/3").await.unwrap();

        assert!(ctx.next.is_none());
        assert_eq!(ctx.prev.unwrap().number, 2.0);
    }

    #[tokio::test]
    async fn test_details_failure_degrades() {
        let source = FakeSource { pages: pages(), details: None };

        let ctx = load_chapter(&source, "/solo-leveling/chapter/1").await.unwrap();

        assert_eq!(ctx.pages.len(), 2);
        assert_eq!(ctx.manga.id, "/solo-leveling");
        assert_eq!(ctx.manga.title, "solo leveling");
        assert_eq!(ctx.manga.cover, "");
        assert!(ctx.chapters.is_empty());
        assert!(ctx.current.is_none() && ctx.prev.is_none() && ctx.next.is_none());
    }

    #[tokio::test]
    async fn test_no_pages_is_not_found() {
        let source = FakeSource { pages: vec![], details: Some(details()) };

        let result = load_chapter(&source, "/solo-leveling/chapter/1").await;

        assert!(matches!(result, Err(TankobonError::NotFound(_))));
    }

    #[test]
    fn test_locate_suffix_match() {
        let chapters = details().chapters;

        assert_eq!(locate(&chapters, "/solo-leveling/chapter/1"), Some(2));
        assert_eq!(locate(&chapters, "/chapter/2"), Some(1));
        assert_eq!(locate(&chapters, "/series/solo-leveling/chapter/3"), Some(0));
        assert_eq!(locate(&chapters, "/other"), None);
    }
}

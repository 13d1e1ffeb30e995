//! ManhuaFast (`manhuafast.com`), a WordPress Madara theme site.
//!
//! Madara templates nest wrappers loosely enough that the repaired tree is an
//! unreliable guide, so every extraction here is a pattern scan over the raw
//! markup. The chapter list is not in the series page at all: the theme loads
//! it with a `POST {series}/ajax/chapters/` after the page renders.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::{Extracted, MangaSource, PageKind, encode_query, to_listing};
use crate::Result;
use crate::fetch::{FetchConfig, Transport};
use crate::ids::{IdScheme, NumberFallback, absolute_url, chapter_number};
use crate::model::{Chapter, Manga, MangaDetails, SourceInfo};
use crate::strategy::{GroupMap, PatternScan};

pub const ID: &str = "manhuafast";
pub const NAME: &str = "ManhuaFast";
pub const BASE_URL: &str = "https://manhuafast.com";

const SCHEME: IdScheme = IdScheme::new("manga");

static SUMMARY_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*class=["'][^"']*\bsummary__content\b[^"']*["'][^>]*>.*?<h1[^>]*>\s*(.*?)\s*</h1>(.*?)</div>"#)
        .expect("summary content pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Adapter for ManhuaFast.
#[derive(Debug, Clone)]
pub struct ManhuaFastSource {
    transport: Transport,
    latest: PatternScan,
    search: PatternScan,
    cover: PatternScan,
    chapters: PatternScan,
    pages: PatternScan,
}

impl ManhuaFastSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::with_base_url(BASE_URL, config)
    }

    pub fn with_base_url(base_url: &str, config: FetchConfig) -> Result<Self> {
        let listing = &["href", "title", "data-src"];
        let single = GroupMap { link: 1, title: 1, image: None };

        Ok(Self {
            transport: Transport::new(base_url, config)?,
            latest: PatternScan::block("div", "col-6", listing, GroupMap::default())?,
            search: PatternScan::block("div", "col-4", listing, GroupMap::default())?,
            cover: PatternScan::block("div", "summary_image", &["href", "data-src"], single)?,
            chapters: PatternScan::block("li", "wp-manga-chapter", &["href"], single)?,
            pages: PatternScan::block("div", "page-break no-gaps", &["data-src"], single)?,
        })
    }

    pub fn parse_latest(&self, html: &str) -> Vec<Manga> {
        to_listing(self.latest.scan(html), &SCHEME, self.transport.origin(), ID)
    }

    pub fn parse_search(&self, html: &str) -> Vec<Manga> {
        to_listing(self.search.scan(html), &SCHEME, self.transport.origin(), ID)
    }

    /// Parses a series page. Chapters are whatever the page itself carries,
    /// which for a live Madara page is usually nothing.
    pub fn parse_details(&self, html: &str, manga_id: &str) -> MangaDetails {
        let id = SCHEME.to_public(manga_id);

        let cover = self
            .cover
            .capture_all(html, 2)
            .into_iter()
            .next()
            .map(|url| absolute_url(self.transport.origin(), &url))
            .unwrap_or_default();

        let (title, description) = match SUMMARY_CONTENT.captures(html) {
            Some(caps) => (collapse(&caps[1]), collapse(&caps[2])),
            None => (String::new(), String::new()),
        };

        MangaDetails {
            title: if title.is_empty() { id.clone() } else { title },
            id,
            cover,
            source_id: ID.to_string(),
            description,
            authors: Vec::new(),
            status: "Ongoing".to_string(),
            genres: Vec::new(),
            chapters: self.parse_chapters(html),
        }
    }

    /// Parses the `li.wp-manga-chapter` entries of a chapter list fragment.
    pub fn parse_chapters(&self, html: &str) -> Vec<Chapter> {
        self.chapters
            .capture_all(html, 1)
            .into_iter()
            .enumerate()
            .map(|(index, link)| {
                let id = SCHEME.to_public(&link);
                let slug = id.split('/').filter(|s| !s.is_empty()).next_back().unwrap_or_default();
                let title = title_case(slug);

                Chapter {
                    number: chapter_number(&title, &id, index, NumberFallback::Zero),
                    title: if title.is_empty() { "Chapter".to_string() } else { title },
                    id,
                    date: String::new(),
                }
            })
            .collect()
    }

    /// Reader image URLs, in page order, with stray whitespace removed.
    pub fn parse_pages(&self, html: &str) -> Vec<String> {
        self.pages
            .capture_all(html, 1)
            .into_iter()
            .map(|url| url.split_whitespace().collect::<String>())
            .map(|url| absolute_url(self.transport.origin(), &url))
            .collect()
    }

    /// Loads the chapter list fragment for the series at `site_path`.
    ///
    /// A failing request is not fatal for the detail record; it is logged and
    /// treated as an empty list.
    async fn fetch_chapters(&self, site_path: &str) -> Vec<Chapter> {
        let endpoint = format!("{}/ajax/chapters/", site_path.trim_end_matches('/'));

        match self.transport.post_document(&endpoint).await {
            Ok(fragment) => {
                let chapters = self.parse_chapters(&fragment);
                debug!(count = chapters.len(), "loaded chapter list");
                chapters
            }
            Err(e) => {
                warn!(error = %e, endpoint = %endpoint, "failed to load chapter list");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl MangaSource for ManhuaFastSource {
    fn info(&self) -> SourceInfo {
        SourceInfo { id: ID.to_string(), name: NAME.to_string(), base_url: self.transport.origin().to_string() }
    }

    async fn get_latest_manga(&self, page: u32) -> Result<Vec<Manga>> {
        let html = self.transport.fetch_document(&format!("/page/{}/", page)).await?;
        Ok(self.parse_latest(&html))
    }

    async fn search_manga(&self, query: &str) -> Result<Vec<Manga>> {
        let path = format!(
            "/?s={}&post_type=wp-manga&op=&author=&artist=&release=&adult=",
            encode_query(query)
        );
        let html = self.transport.fetch_document(&path).await?;
        Ok(self.parse_search(&html))
    }

    async fn get_manga_details(&self, manga_id: &str) -> Result<MangaDetails> {
        let site_path = SCHEME.to_site(manga_id);
        let html = self.transport.fetch_document(&site_path).await?;

        let mut details = self.parse_details(&html, manga_id);
        let chapters = self.fetch_chapters(&site_path).await;
        if !chapters.is_empty() {
            details.chapters = chapters;
        }

        Ok(details)
    }

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>> {
        let html = self.transport.fetch_document(&SCHEME.to_site(chapter_id)).await?;
        Ok(self.parse_pages(&html))
    }

    fn extract(&self, kind: PageKind, html: &str, id: &str) -> Result<Extracted> {
        Ok(match kind {
            PageKind::Latest => Extracted::Listing(self.parse_latest(html)),
            PageKind::Search => Extracted::Listing(self.parse_search(html)),
            PageKind::Details => Extracted::Details(self.parse_details(html, id)),
            PageKind::Pages => Extracted::Pages(self.parse_pages(html)),
        })
    }
}

/// Strips tags and collapses whitespace runs into single spaces.
fn collapse(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// `chapter-12-5` -> `Chapter 12 5`.
fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ManhuaFastSource {
        ManhuaFastSource::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_latest_strips_collection() {
        let html = r#"
            <div class="col-6 col-md-2 badge-pos-2">
                <div class="page-item-detail manga">
                    <a href="https://manhuafast.com/manga/martial-peak/" title="Martial Peak">
                        <img data-src="https://manhuafast.com/wp-content/uploads/mp.jpg" class="img-responsive">
                    </a>
                </div>
            </div>
        "#;

        let manga = source().parse_latest(html);

        assert_eq!(manga.len(), 1);
        assert_eq!(manga[0].id, "/martial-peak/");
        assert_eq!(manga[0].title, "Martial Peak");
        assert_eq!(manga[0].cover, "https://manhuafast.com/wp-content/uploads/mp.jpg");
        assert_eq!(manga[0].source_id, "manhuafast");
    }

    #[test]
    fn test_search_uses_col_4_blocks() {
        let html = r#"
            <div class="col-6"><a href="/manga/wrong/" title="Wrong"><img data-src="/w.jpg"></a></div>
            <div class="col-4 c-image-hover"><a href="/manga/right/" title="Right"><img data-src="/r.jpg"></a></div>
        "#;

        let manga = source().parse_search(html);

        assert_eq!(manga.len(), 1);
        assert_eq!(manga[0].id, "/right/");
        assert_eq!(manga[0].cover, "https://manhuafast.com/r.jpg");
    }

    #[test]
    fn test_parse_details_summary() {
        let html = r#"
            <div class="summary_image">
                <a href="https://manhuafast.com/manga/martial-peak/">
                    <img data-src="https://manhuafast.com/wp-content/uploads/mp-193x278.jpg" alt="Martial Peak">
                </a>
            </div>
            <div class="post-title summary__content">
                <h1>
                    Martial Peak
                </h1>
                <p>The journey to the <b>martial</b> peak
                   is a lonely one.</p>
            </div>
        "#;

        let details = source().parse_details(html, "/martial-peak/");

        assert_eq!(details.id, "/martial-peak/");
        assert_eq!(details.title, "Martial Peak");
        assert_eq!(details.description, "The journey to the martial peak is a lonely one.");
        assert_eq!(details.cover, "https://manhuafast.com/wp-content/uploads/mp-193x278.jpg");
        assert_eq!(details.status, "Ongoing");
        assert!(details.chapters.is_empty());
    }

    #[test]
    fn test_parse_details_title_falls_back_to_id() {
        let details = source().parse_details("<html><body></body></html>", "manga/unknown");
        assert_eq!(details.id, "/unknown");
        assert_eq!(details.title, "/unknown");
        assert_eq!(details.cover, "");
    }

    #[test]
    fn test_parse_chapters_from_fragment() {
        let html = r#"
            <ul class="main version-chap">
                <li class="wp-manga-chapter has-thumb">
                    <a href="https://manhuafast.com/manga/martial-peak/chapter-3800/">Chapter 3800</a>
                    <span class="chapter-release-date"><i>2 hours ago</i></span>
                </li>
                <li class="wp-manga-chapter">
                    <a href="https://manhuafast.com/manga/martial-peak/chapter-12-5/">Chapter 12.5</a>
                </li>
                <li class="wp-manga-chapter">
                    <a href="https://manhuafast.com/manga/martial-peak/side-story/">Side</a>
                </li>
            </ul>
        "#;

        let chapters = source().parse_chapters(html);

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].id, "/martial-peak/chapter-3800/");
        assert_eq!(chapters[0].title, "Chapter 3800");
        assert_eq!(chapters[0].number, 3800.0);
        assert_eq!(chapters[1].number, 12.0);
        assert_eq!(chapters[2].title, "Side Story");
        assert_eq!(chapters[2].number, 0.0);
        assert!(chapters.iter().all(|c| c.date.is_empty()));
    }

    #[test]
    fn test_parse_pages_removes_whitespace() {
        let html = r#"
            <div class="page-break no-gaps">
                <img id="image-0" data-src="
                    https://cdn.manhuafast.com/mp/3800/01.jpg" class="wp-manga-chapter-img">
            </div>
            <div class="page-break no-gaps">
                <img id="image-1" data-src="https://cdn.manhuafast.com/mp/3800/02.jpg " class="wp-manga-chapter-img">
            </div>
        "#;

        assert_eq!(
            source().parse_pages(html),
            vec!["https://cdn.manhuafast.com/mp/3800/01.jpg", "https://cdn.manhuafast.com/mp/3800/02.jpg"]
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("chapter-10"), "Chapter 10");
        assert_eq!(title_case("--a-b"), "A B");
        assert_eq!(title_case(""), "");
    }
}

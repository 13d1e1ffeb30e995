//! MangaLife (`manga4life.com`).
//!
//! Markup is tree-friendly, so listings and details are structural queries.
//! Each query lists every container variant the site has shipped; the first
//! element found wins. Chapter readers live under `/read-online/`, outside
//! the `/manga/` collection.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::{Extracted, MangaSource, PageKind, encode_query, to_listing};
use crate::Result;
use crate::fetch::{FetchConfig, Transport};
use crate::ids::{IdScheme, NumberFallback, absolute_url, chapter_number, leading_slash, manga_id_from_chapter};
use crate::model::{Chapter, Manga, MangaDetails, SourceInfo};
use crate::parse::{Document, Element};
use crate::strategy::ListingQuery;

pub const ID: &str = "mangalife";
pub const NAME: &str = "MangaLife";
pub const BASE_URL: &str = "https://manga4life.com";

const SCHEME: IdScheme = IdScheme::new("manga").with_exempt(&["read-online"]);

const LATEST: ListingQuery = ListingQuery {
    block: ".manga-list .manga-item, .search-results .result-item",
    link: Some("a"),
    title: Some(".manga-title, .title, h3"),
    image: "img",
    image_attrs: &["src", "data-src"],
};

const SEARCH: ListingQuery = ListingQuery {
    block: ".manga-list .manga-item, .search-results .result-item, .SeriesResult",
    link: Some("a"),
    title: Some(".manga-title, .title, h3, .SeriesName"),
    image: "img",
    image_attrs: &["src", "data-src"],
};

const TITLE: &str = "h1, .manga-title, .SeriesName";
const COVER: &str = ".cover img, .manga-cover img, .SeriesImage img";
const DESCRIPTION: &str = ".summary, .description, .Content";
const AUTHORS: &str = ".author a, .AuthorName";
const STATUS: &str = ".status, .PublishStatus";
const GENRES: &str = ".genre a, .genres a, .GenreTag";
const CHAPTERS: &str = ".chapter-list li, .ChapterList a, .chapter-item";
const CHAPTER_DATE: &str = ".date, .chapter-date, time";
const READER_IMAGES: &str = ".reader-area img, .chapter-images img, .ImageGallery img, .viewer img";

static STATUS_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)status:?").expect("status label pattern"));

static MAIN_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)MainFunction\s*=\s*function\s*\(.*?\)\s*\{.*?(\[.*?\])").expect("main function pattern")
});

/// Adapter for MangaLife.
#[derive(Debug, Clone)]
pub struct MangaLifeSource {
    transport: Transport,
}

impl MangaLifeSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::with_base_url(BASE_URL, config)
    }

    pub fn with_base_url(base_url: &str, config: FetchConfig) -> Result<Self> {
        Ok(Self { transport: Transport::new(base_url, config)? })
    }

    pub fn parse_latest(&self, html: &str) -> Result<Vec<Manga>> {
        let doc = Document::parse(html);
        Ok(to_listing(LATEST.run(&doc)?, &SCHEME, self.transport.origin(), ID))
    }

    pub fn parse_search(&self, html: &str) -> Result<Vec<Manga>> {
        let doc = Document::parse(html);
        Ok(to_listing(SEARCH.run(&doc)?, &SCHEME, self.transport.origin(), ID))
    }

    pub fn parse_details(&self, html: &str, manga_id: &str) -> Result<MangaDetails> {
        let doc = Document::parse(html);

        let status = STATUS_LABEL.replace_all(&doc.first_text(STATUS)?, "").trim().to_string();

        Ok(MangaDetails {
            id: SCHEME.to_public(manga_id),
            title: doc.first_text(TITLE)?,
            cover: absolute_url(self.transport.origin(), &doc.first_attr(COVER, &["src", "data-src"])?),
            source_id: ID.to_string(),
            description: doc.first_text(DESCRIPTION)?,
            authors: texts(&doc, AUTHORS)?,
            status: if status.is_empty() { "Unknown".to_string() } else { status },
            genres: texts(&doc, GENRES)?,
            chapters: parse_chapters(&doc)?,
        })
    }

    /// Reader images first; the `MainFunction` script array when the reader
    /// container is rendered client-side.
    pub fn parse_pages(&self, html: &str) -> Result<Vec<String>> {
        let doc = Document::parse(html);

        let mut pages = Vec::new();
        for img in doc.select(READER_IMAGES)? {
            let Some(src) = img.attr_any(&["src", "data-src"]) else {
                continue;
            };
            if src.contains("loading") || src.contains("placeholder") {
                continue;
            }
            pages.push(absolute_url(self.transport.origin(), src));
        }

        if pages.is_empty() {
            debug!("no reader images, trying MainFunction script");
            pages = script_pages(html)
                .into_iter()
                .map(|url| absolute_url(self.transport.origin(), &url))
                .filter(|url| !url.is_empty())
                .collect();
        }

        Ok(pages)
    }
}

#[async_trait]
impl MangaSource for MangaLifeSource {
    fn info(&self) -> SourceInfo {
        SourceInfo { id: ID.to_string(), name: NAME.to_string(), base_url: self.transport.origin().to_string() }
    }

    async fn get_latest_manga(&self, page: u32) -> Result<Vec<Manga>> {
        let html = self
            .transport
            .fetch_document(&format!("/search/?sort=vm&desc=true&page={}", page))
            .await?;
        self.parse_latest(&html)
    }

    async fn search_manga(&self, query: &str) -> Result<Vec<Manga>> {
        let html = self
            .transport
            .fetch_document(&format!("/search/?keyword={}", encode_query(query)))
            .await?;
        self.parse_search(&html)
    }

    async fn get_manga_details(&self, manga_id: &str) -> Result<MangaDetails> {
        let html = self.transport.fetch_document(&SCHEME.to_site(manga_id)).await?;
        self.parse_details(&html, manga_id)
    }

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>> {
        let html = self.transport.fetch_document(&SCHEME.to_site(chapter_id)).await?;
        self.parse_pages(&html)
    }

    fn extract(&self, kind: PageKind, html: &str, id: &str) -> Result<Extracted> {
        Ok(match kind {
            PageKind::Latest => Extracted::Listing(self.parse_latest(html)?),
            PageKind::Search => Extracted::Listing(self.parse_search(html)?),
            PageKind::Details => Extracted::Details(self.parse_details(html, id)?),
            PageKind::Pages => Extracted::Pages(self.parse_pages(html)?),
        })
    }

    /// Reader pages live at `/read-online/<Title>-chapter-<n>.html`, outside the title path.
    fn manga_id_for_chapter(&self, chapter_id: &str) -> String {
        let Some(page) = chapter_id.trim_start_matches('/').strip_prefix("read-online/") else {
            return manga_id_from_chapter(chapter_id);
        };

        let stem = page.trim_end_matches(".html");
        match stem.rfind("-chapter-") {
            Some(index) => leading_slash(&stem[..index]),
            None => manga_id_from_chapter(chapter_id),
        }
    }
}

/// Trimmed, non-empty texts of every element matching `selector`.
fn texts(doc: &Document, selector: &str) -> Result<Vec<String>> {
    Ok(doc
        .select(selector)?
        .iter()
        .map(Element::text_trimmed)
        .filter(|text| !text.is_empty())
        .collect())
}

fn parse_chapters(doc: &Document) -> Result<Vec<Chapter>> {
    let mut chapters = Vec::new();

    for (index, row) in doc.select(CHAPTERS)?.into_iter().enumerate() {
        let link = if row.is("a") { Some(row) } else { row.select_first("a")? };
        let Some(href) = link.and_then(|a| a.attr("href")).filter(|href| !href.trim().is_empty()) else {
            continue;
        };

        let id = SCHEME.to_public(href);
        let date = row.select_first(CHAPTER_DATE)?.map(|el| el.text_trimmed()).unwrap_or_default();

        // Rows often nest the date inside the link itself.
        let mut text = link.map(|a| a.text()).unwrap_or_default();
        if !date.is_empty() {
            text = text.replace(&date, "");
        }
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let number = chapter_number(&text, href, index, NumberFallback::Zero);

        chapters.push(Chapter {
            title: if text.is_empty() { format!("Chapter {}", number) } else { text },
            id,
            number,
            date,
        });
    }

    Ok(chapters)
}

/// Page URLs from the array literal inside the reader's `MainFunction`.
fn script_pages(html: &str) -> Vec<String> {
    let Some(caps) = MAIN_FUNCTION.captures(html) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(&caps[1].replace('\'', "\"")) {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "failed to parse MainFunction page array");
            Vec::new()
        }
    }
}

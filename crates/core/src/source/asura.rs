//! Asura Scans (`asuracomic.net`).
//!
//! A Next.js site: listings and details render server-side and parse well as
//! a tree, while chapter pages ship their image list inside hydration script
//! chunks. Internal paths live under `/series/`, which public ids drop.

use async_trait::async_trait;
use tracing::debug;

use super::{Extracted, MangaSource, PageKind, encode_query, to_listing};
use crate::fetch::{FetchConfig, Transport};
use crate::ids::{IdScheme, NumberFallback, absolute_url, chapter_number};
use crate::model::{Chapter, Manga, MangaDetails, SourceInfo};
use crate::parse::{Document, Element};
use crate::strategy::{
    ListingQuery, PayloadRecovery, RawEntry, UrlPattern, dedup_ordered, first_matching_urls, halve_duplicates,
    scan_blocks,
};
use crate::Result;

pub const ID: &str = "asura";
pub const NAME: &str = "Asura Scans";
pub const BASE_URL: &str = "https://asuracomic.net";
pub const CDN_ORIGIN: &str = "https://gg.asuracomic.net";

/// Above this many scanned page URLs the list is assumed to be emitted twice.
pub const DUPLICATE_THRESHOLD: usize = 60;

const SCHEME: IdScheme = IdScheme::new("series").with_exempt(&["comic"]);
const HYDRATION_MARKER: &str = "self.__next_f.push";

const LATEST_BLOCK: &str = "div.grid.grid-rows-1 div.w-full.p-1.pt-1.pb-3";
const SEARCH: ListingQuery = ListingQuery {
    block: "div.grid.grid-cols-2.gap-3.p-4 > a",
    link: None,
    title: Some("span.block.font-bold"),
    image: "img",
    image_attrs: &["src", "data-src"],
};

const TITLE: &str = "h1, .text-xl.font-bold";
const COVER: &str = r#"img[alt*="poster"], .series-cover img"#;
const DESCRIPTION: &str = r#"span[class*="A2A2A2"], p.text-sm, .summary, .description"#;
const GENRES: &str = "div.flex.flex-row.flex-wrap.gap-3 button";
const CHAPTER_BLOCKS: &str = ".scrollbar-thin div";

/// Adapter for Asura Scans.
#[derive(Debug, Clone)]
pub struct AsuraSource {
    transport: Transport,
    payload: PayloadRecovery,
    page_patterns: Vec<UrlPattern>,
}

impl AsuraSource {
    /// Creates the adapter against the public origin.
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::with_base_url(BASE_URL, config)
    }

    /// Creates the adapter against another origin (a mirror or a test server).
    pub fn with_base_url(base_url: &str, config: FetchConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url, config)?,
            payload: PayloadRecovery { marker: HYDRATION_MARKER, key: "pages", cdn_origin: CDN_ORIGIN.to_string() },
            page_patterns: page_patterns()?,
        })
    }

    /// Parses a latest-updates page.
    pub fn parse_latest(&self, html: &str) -> Result<Vec<Manga>> {
        let doc = Document::parse(html);
        let entries = scan_blocks(&doc, LATEST_BLOCK, latest_entry)?;
        Ok(to_listing(entries, &SCHEME, self.transport.origin(), ID))
    }

    /// Parses a search results page.
    pub fn parse_search(&self, html: &str) -> Result<Vec<Manga>> {
        let doc = Document::parse(html);
        Ok(to_listing(SEARCH.run(&doc)?, &SCHEME, self.transport.origin(), ID))
    }

    /// Parses a series page into a detail record for `manga_id`.
    pub fn parse_details(&self, html: &str, manga_id: &str) -> Result<MangaDetails> {
        let doc = Document::parse(html);

        let status = labelled_values(&doc, "Status")?.into_iter().next().unwrap_or_else(|| "Ongoing".to_string());

        let mut authors = labelled_values(&doc, "Author")?;
        authors.extend(labelled_values(&doc, "Artist")?);

        let genres = doc
            .select(GENRES)?
            .iter()
            .map(|el| el.text_trimmed())
            .filter(|genre| !genre.is_empty())
            .collect();

        Ok(MangaDetails {
            id: SCHEME.to_public(manga_id),
            title: doc.first_text(TITLE)?,
            cover: absolute_url(self.transport.origin(), &doc.first_attr(COVER, &["src", "data-src"])?),
            source_id: ID.to_string(),
            description: doc.first_text(DESCRIPTION)?,
            authors: dedup_ordered(authors),
            status,
            genres: dedup_ordered::<Vec<String>>(genres),
            chapters: parse_chapters(&doc)?,
        })
    }

    /// Extracts page URLs from a chapter page.
    ///
    /// The hydration payload is authoritative; the markup scan only runs when
    /// no payload could be recovered.
    pub fn parse_pages(&self, html: &str) -> Vec<String> {
        let pages = self.payload.recover(html);
        if !pages.is_empty() {
            return pages;
        }

        debug!("no hydration payload, scanning markup for page images");
        let urls = first_matching_urls(html, &self.page_patterns)
            .into_iter()
            .map(|url| absolute_url(CDN_ORIGIN, &url))
            .collect();

        halve_duplicates(dedup_ordered::<Vec<String>>(urls), DUPLICATE_THRESHOLD)
    }
}

#[async_trait]
impl MangaSource for AsuraSource {
    fn info(&self) -> SourceInfo {
        SourceInfo { id: ID.to_string(), name: NAME.to_string(), base_url: self.transport.origin().to_string() }
    }

    async fn get_latest_manga(&self, page: u32) -> Result<Vec<Manga>> {
        let html = self.transport.fetch_document(&format!("/page/{}", page)).await?;
        self.parse_latest(&html)
    }

    async fn search_manga(&self, query: &str) -> Result<Vec<Manga>> {
        let html = self
            .transport
            .fetch_document(&format!("/series?page=1&name={}", encode_query(query)))
            .await?;
        self.parse_search(&html)
    }

    async fn get_manga_details(&self, manga_id: &str) -> Result<MangaDetails> {
        let html = self.transport.fetch_document(&SCHEME.to_site(manga_id)).await?;
        self.parse_details(&html, manga_id)
    }

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>> {
        let html = self.transport.fetch_document(&SCHEME.to_site(chapter_id)).await?;
        Ok(self.parse_pages(&html))
    }

    fn extract(&self, kind: PageKind, html: &str, id: &str) -> Result<Extracted> {
        Ok(match kind {
            PageKind::Latest => Extracted::Listing(self.parse_latest(html)?),
            PageKind::Search => Extracted::Listing(self.parse_search(html)?),
            PageKind::Details => Extracted::Details(self.parse_details(html, id)?),
            PageKind::Pages => Extracted::Pages(self.parse_pages(html)),
        })
    }
}

/// Candidate page URL shapes, most specific first.
fn page_patterns() -> Result<Vec<UrlPattern>> {
    let cdn_host = regex::escape(CDN_ORIGIN.trim_start_matches("https://"));

    Ok(vec![
        UrlPattern::new(
            "cdn-media",
            &format!(
                r#"https://{}/storage/media/\d+/(?:conversions/)?[^"'\s<>\\]+?\.(?:webp|jpe?g|png)"#,
                cdn_host
            ),
            0,
        )?,
        UrlPattern::new("image-url", r#"https?://[^"'\s<>\\]+?\.(?:webp|jpe?g|png|gif)"#, 0)?,
        UrlPattern::new("cdn-host", &format!(r#"(?:https?:)?//{}/[^"'\s<>\\]+"#, cdn_host), 0)?,
        UrlPattern::new("src-attr", r#"\ssrc=["']([^"']+?\.(?:webp|jpe?g|png|gif)[^"']*)["']"#, 1)?,
    ])
}

/// One latest-updates card: the title sits in the span wrapping the series link.
fn latest_entry(block: Element<'_>) -> Result<Option<RawEntry>> {
    let Some(title_span) = block.select("span")?.into_iter().find(|span| span.has("a").unwrap_or(false)) else {
        return Ok(None);
    };

    let link = title_span
        .select_first("a")?
        .and_then(|a| a.attr("href"))
        .unwrap_or_default();

    let text = title_span.text();
    let title = text.split("Chapter").next().unwrap_or_default();

    let image = block
        .select_first("img")?
        .and_then(|img| img.attr_any(&["src", "data-src"]))
        .unwrap_or_default();

    Ok(RawEntry::new(link, title, image))
}

/// Values of the `<h3>label</h3><h3>value</h3>` pairs in the info panel.
///
/// Asura prints `_` for unknown values; those are dropped.
fn labelled_values(doc: &Document, label: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();

    for block in doc.select("div")? {
        let headings = block.select("h3")?;
        if headings.len() < 2 || !headings[0].text_trimmed().eq_ignore_ascii_case(label) {
            continue;
        }

        let value = headings[1].text_trimmed();
        if !value.is_empty() && value != "_" {
            values.extend(value.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()));
        }
        break;
    }

    Ok(values)
}

/// Chapter rows, newest first as listed.
///
/// Only the innermost `div` around each row is used, so wrappers that also
/// contain headings do not produce phantom chapters.
fn parse_chapters(doc: &Document) -> Result<Vec<Chapter>> {
    let mut chapters: Vec<Chapter> = Vec::new();

    for block in doc.select(CHAPTER_BLOCKS)? {
        if !block.has("h3")? || !block.has("a[href]")? {
            continue;
        }
        let mut nested = false;
        for inner in block.select("div")? {
            if inner.has("h3")? {
                nested = true;
                break;
            }
        }
        if nested {
            continue;
        }

        let Some(href) = block.select_first("a[href]")?.and_then(|a| a.attr("href")) else {
            continue;
        };
        let id = SCHEME.to_public(href);
        if chapters.iter().any(|chapter| chapter.id == id) {
            continue;
        }

        let headings = block.select("h3")?;
        let heading = headings.first().map(|h| h.text_trimmed()).unwrap_or_default();
        let date = match headings.as_slice() {
            [_, .., last] => last.text_trimmed(),
            _ => String::new(),
        };

        let number = chapter_number(&heading, &id, chapters.len(), NumberFallback::Position);
        let title = if heading.is_empty() { format!("Chapter {}", number) } else { heading };

        chapters.push(Chapter { id, title, number, date });
    }

    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AsuraSource {
        AsuraSource::new(FetchConfig::default()).unwrap()
    }

    const LATEST: &str = r#"
        <div class="grid grid-rows-1 grid-cols-1 sm:grid-cols-2 bg-[#222222] p-3 pb-0">
            <div class="w-full p-1 pt-1 pb-3">
                <img src="https://gg.asuracomic.net/storage/covers/solo.webp">
                <span class="text-[15px]"><a href="/series/solo-leveling-4f2a">Solo Leveling</a></span>
                <span><a href="/series/solo-leveling-4f2a/chapter/200">Chapter 200</a></span>
            </div>
            <div class="w-full p-1 pt-1 pb-3">
                <img src="/cover/tower.webp">
                <span><a href="series/tower-of-god-99">Tower of GodChapter 12</a></span>
            </div>
            <div class="w-full p-1 pt-1 pb-3"><span>Advertisement</span></div>
        </div>
    "#;

    #[test]
    fn test_parse_latest() {
        let manga = source().parse_latest(LATEST).unwrap();

        assert_eq!(manga.len(), 2);
        assert_eq!(manga[0].id, "/solo-leveling-4f2a");
        assert_eq!(manga[0].title, "Solo Leveling");
        assert_eq!(manga[1].id, "/tower-of-god-99");
        assert_eq!(manga[1].title, "Tower of God");
        assert_eq!(manga[1].cover, "https://asuracomic.net/cover/tower.webp");
        assert!(manga.iter().all(|m| m.source_id == ID));
    }

    #[test]
    fn test_parse_chapters_innermost_rows() {
        let html = r#"
            <div class="scrollbar-thin">
                <div class="wrapper">
                    <div class="row"><h3><a href="solo/chapter/2">Chapter 2</a></h3><h3>May 2nd 2024</h3></div>
                    <div class="row"><h3><a href="/series/solo/chapter/1">Chapter 1</a></h3><h3>May 1st 2024</h3></div>
                    <div class="row"><h3><a href="/series/solo/prologue">Prologue</a></h3></div>
                </div>
            </div>
        "#;
        let doc = Document::parse(html);

        let chapters = parse_chapters(&doc).unwrap();

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].id, "/solo/chapter/2");
        assert_eq!(chapters[0].date, "May 2nd 2024");
        assert_eq!(chapters[1].number, 1.0);
        assert_eq!(chapters[2].title, "Prologue");
        assert_eq!(chapters[2].number, 3.0);
        assert_eq!(chapters[2].date, "");
    }

    #[test]
    fn test_labelled_values_skip_placeholder() {
        let html = r#"
            <div class="grid">
                <div><h3>Author</h3><h3>Chugong</h3></div>
                <div><h3>Artist</h3><h3>_</h3></div>
                <div><h3>Status</h3><h3>Completed</h3></div>
            </div>
        "#;
        let doc = Document::parse(html);

        assert_eq!(labelled_values(&doc, "Author").unwrap(), vec!["Chugong"]);
        assert!(labelled_values(&doc, "Artist").unwrap().is_empty());
        assert_eq!(labelled_values(&doc, "status").unwrap(), vec!["Completed"]);
    }

    #[test]
    fn test_pages_from_markup_when_no_payload() {
        let html = r#"
            <img src="https://gg.asuracomic.net/storage/media/101/conversions/01-optimized.webp">
            <img src="https://gg.asuracomic.net/storage/media/102/conversions/02-optimized.webp">
            <img src="https://gg.asuracomic.net/storage/media/101/conversions/01-optimized.webp">
            <img src="https://asuracomic.net/images/logo.png">
        "#;

        let pages = source().parse_pages(html);

        assert_eq!(
            pages,
            vec![
                "https://gg.asuracomic.net/storage/media/101/conversions/01-optimized.webp",
                "https://gg.asuracomic.net/storage/media/102/conversions/02-optimized.webp",
            ]
        );
    }

    #[test]
    fn test_pages_src_attribute_last_resort() {
        let html = r#"<div><img class="page" src="/chapters/5/001.jpg"></div>"#;
        assert_eq!(source().parse_pages(html), vec!["https://gg.asuracomic.net/chapters/5/001.jpg"]);
    }

    #[test]
    fn test_doubled_markup_is_halved() {
        let mut html = String::new();
        for variant in ["optimized", "full"] {
            for i in 0..40 {
                html.push_str(&format!(
                    r#"<img src="https://gg.asuracomic.net/storage/media/{}/conversions/p-{}.webp">"#,
                    i, variant
                ));
            }
        }

        let pages = source().parse_pages(&html);

        assert_eq!(pages.len(), 40);
        assert!(pages.iter().all(|p| p.ends_with("p-optimized.webp")));
    }

    #[test]
    fn test_no_pages_is_empty() {
        assert!(source().parse_pages("<html><body><p>Not found</p></body></html>").is_empty());
    }
}

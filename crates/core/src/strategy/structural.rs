//! Structural queries over a parsed document tree.

use crate::Result;
use crate::parse::{Document, Element};

/// One listing block as found in markup, before id normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub link: String,
    pub title: String,
    pub image: String,
}

impl RawEntry {
    /// Builds an entry from trimmed parts, or `None` when link or title is empty.
    ///
    /// Listing pages are full of layout blocks that match an entry selector
    /// without being entries; those are dropped here rather than reported.
    pub fn new(link: &str, title: &str, image: &str) -> Option<Self> {
        let link = link.trim();
        let title = title.trim();

        if link.is_empty() || title.is_empty() {
            return None;
        }

        Some(Self { link: link.to_string(), title: title.to_string(), image: image.trim().to_string() })
    }
}

/// Runs `extract` on every element matching `block`, keeping the entries it returns.
pub fn scan_blocks<F>(doc: &Document, block: &str, mut extract: F) -> Result<Vec<RawEntry>>
where
    F: FnMut(Element<'_>) -> Result<Option<RawEntry>>,
{
    let mut entries = Vec::new();

    for element in doc.select(block)? {
        if let Some(entry) = extract(element)? {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Declarative selector set for the common "link + title + image" listing block.
#[derive(Debug, Clone, Copy)]
pub struct ListingQuery {
    /// Selector for each entry block.
    pub block: &'static str,
    /// Selector for the link inside the block; `None` reads `href` from the block itself.
    pub link: Option<&'static str>,
    /// Selector for the title inside the block; `None` uses the link's text.
    pub title: Option<&'static str>,
    /// Selector for the cover image inside the block.
    pub image: &'static str,
    /// Attributes tried in order for the cover URL.
    pub image_attrs: &'static [&'static str],
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self { block: "div", link: Some("a"), title: None, image: "img", image_attrs: &["src", "data-src"] }
    }
}

impl ListingQuery {
    /// Extracts every complete entry from `doc`, in document order.
    pub fn run(&self, doc: &Document) -> Result<Vec<RawEntry>> {
        scan_blocks(doc, self.block, |block| self.extract(block))
    }

    fn extract(&self, block: Element<'_>) -> Result<Option<RawEntry>> {
        let link = match self.link {
            Some(selector) => block.select_first(selector)?,
            None => Some(block),
        };
        let Some(link) = link else {
            return Ok(None);
        };

        let title = match self.title {
            Some(selector) => block.select_first(selector)?.map(|el| el.text()).unwrap_or_default(),
            None => link.text(),
        };

        let image = block
            .select_first(self.image)?
            .and_then(|img| img.attr_any(self.image_attrs))
            .unwrap_or_default();

        Ok(RawEntry::new(link.attr("href").unwrap_or_default(), &title, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div class="list">
            <div class="item"><a href="/series/one">One</a><img src="/one.webp"></div>
            <div class="item"><a href="/series/two"> </a><img src="/two.webp"></div>
            <div class="item"><a href="/series/three"><span class="name">Three</span></a><img src="" data-src="/three.webp"></div>
            <div class="item"><span>ad slot</span></div>
        </div>
    "#;

    #[test]
    fn test_raw_entry_requires_link_and_title() {
        assert!(RawEntry::new("", "Title", "").is_none());
        assert!(RawEntry::new("/x", "  ", "").is_none());
        assert_eq!(RawEntry::new(" /x ", " T ", " i ").unwrap().link, "/x");
    }

    #[test]
    fn test_listing_query_skips_incomplete_blocks() {
        let doc = Document::parse(LISTING);
        let query = ListingQuery { block: "div.item", ..Default::default() };

        let entries = query.run(&doc).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "One");
        assert_eq!(entries[1].link, "/series/three");
        assert_eq!(entries[1].image, "/three.webp");
    }

    #[test]
    fn test_listing_query_title_selector() {
        let doc = Document::parse(LISTING);
        let query = ListingQuery { block: "div.item", title: Some("span.name"), ..Default::default() };

        let entries = query.run(&doc).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Three");
    }

    #[test]
    fn test_listing_query_link_on_block() {
        let doc = Document::parse(r#"<div class="grid"><a href="series/x"><span class="t">X</span><img src="/x.png"></a></div>"#);
        let query = ListingQuery { block: "div.grid > a", link: None, title: Some("span.t"), ..Default::default() };

        let entries = query.run(&doc).unwrap();

        assert_eq!(entries, vec![RawEntry::new("series/x", "X", "/x.png").unwrap()]);
    }

    #[test]
    fn test_scan_blocks_is_idempotent() {
        let doc = Document::parse(LISTING);
        let query = ListingQuery { block: "div.item", ..Default::default() };

        assert_eq!(query.run(&doc).unwrap(), query.run(&doc).unwrap());
    }
}

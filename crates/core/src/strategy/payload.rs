//! Recovery of page lists that client bundles inline inside script bodies.
//!
//! Hydrating front-ends push their state as string chunks, e.g.
//! `self.__next_f.push([1,"...\"pages\":[{\"order\":1,\"url\":\"...\"}]..."])`.
//! The page list is a JSON array sitting inside that string with its quotes
//! escaped. Recovery finds the array by key, undoes the escaping and parses it.
//! A payload that does not parse is logged and treated as "no pages", so the
//! caller can still try a markup scan.

use regex::Regex;
use tracing::{debug, warn};

use crate::ids::absolute_url;
use crate::model::PageEntry;
use crate::parse::Document;

/// Concatenates every script body containing `marker`.
///
/// Falls back to the whole raw document when no script matches, which also
/// covers markup the tree builder mangled.
pub fn script_text(html: &str, marker: &str) -> String {
    let doc = Document::parse(html);
    let joined: String = doc.scripts().into_iter().filter(|script| script.contains(marker)).collect();

    if joined.is_empty() { html.to_string() } else { joined }
}

/// Finds the array stored under `key`, preferring the escaped `\"key\":[...]` form.
///
/// Returns the array text ready for JSON parsing: the escaped form comes back
/// unescaped, the plain form untouched.
pub fn find_array(text: &str, key: &str) -> Option<String> {
    let key = regex::escape(key);

    let escaped = Regex::new(&format!(r#"\\"{}\\":(\[.*?\])"#, key)).ok()?;
    if let Some(caps) = escaped.captures(text) {
        debug!("found escaped payload array");
        return Some(unescape(&caps[1]));
    }

    let plain = Regex::new(&format!(r#""{}":(\[.*?\])"#, key)).ok()?;
    plain.captures(text).map(|caps| {
        debug!("found plain payload array");
        caps[1].to_string()
    })
}

/// Reverses one level of string escaping: `\"` becomes `"`, then `\\` becomes `\`.
///
/// ```rust
/// use tankobon_core::strategy::unescape;
///
/// assert_eq!(unescape(r#"[{\"url\":\"/a\"}]"#), r#"[{"url":"/a"}]"#);
/// ```
pub fn unescape(raw: &str) -> String {
    raw.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Parses a page array and sorts it by `order`; malformed input yields an empty list.
pub fn parse_pages(json: &str) -> Vec<PageEntry> {
    match serde_json::from_str::<Vec<PageEntry>>(json) {
        Ok(mut pages) => {
            pages.sort_by_key(|page| page.order);
            pages
        }
        Err(e) => {
            warn!(error = %e, "failed to parse embedded page payload");
            Vec::new()
        }
    }
}

/// Settings for recovering one site's embedded page list.
#[derive(Debug, Clone)]
pub struct PayloadRecovery {
    /// Substring identifying hydration scripts.
    pub marker: &'static str,
    /// JSON key holding the page array.
    pub key: &'static str,
    /// Origin relative page URLs are resolved against.
    pub cdn_origin: String,
}

impl PayloadRecovery {
    /// Recovers absolute page URLs from `html`, ordered by page `order`.
    pub fn recover(&self, html: &str) -> Vec<String> {
        let text = script_text(html, self.marker);

        let Some(array) = find_array(&text, self.key) else {
            debug!(key = self.key, "no embedded page payload");
            return Vec::new();
        };

        parse_pages(&array)
            .into_iter()
            .map(|page| absolute_url(&self.cdn_origin, &page.url))
            .filter(|url| !url.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery() -> PayloadRecovery {
        PayloadRecovery { marker: "self.__next_f.push", key: "pages", cdn_origin: "https://gg.asuracomic.net".to_string() }
    }

    #[test]
    fn test_escaped_payload_sorted_by_order() {
        let html = r#"<html><body><script>self.__next_f.push([1,"x\"pages\":[{\"order\":2,\"url\":\"/a\"},{\"order\":1,\"url\":\"/b\"}]y"])</script></body></html>"#;

        let urls = recovery().recover(html);

        assert_eq!(urls, vec!["https://gg.asuracomic.net/b", "https://gg.asuracomic.net/a"]);
    }

    #[test]
    fn test_plain_payload_used_when_no_escaped_form() {
        let html = r#"<script>self.__next_f.push({"pages":[{"order":1,"url":"https://cdn.x/1.webp"}]})</script>"#;

        let urls = recovery().recover(html);

        assert_eq!(urls, vec!["https://cdn.x/1.webp"]);
    }

    #[test]
    fn test_falls_back_to_raw_document() {
        let html = r#"<div data-state='"pages":[{"order":1,"url":"p/1.jpg"}]'></div>"#;

        let urls = recovery().recover(html);

        assert_eq!(urls, vec!["https://gg.asuracomic.net/p/1.jpg"]);
    }

    #[test]
    fn test_scripts_without_marker_are_ignored() {
        let html = r#"
            <script>var x = {"pages":[{"order":9,"url":"/wrong"}]};</script>
            <script>self.__next_f.push([1,"\"pages\":[{\"order\":1,\"url\":\"/right\"}]"])</script>
        "#;

        let urls = recovery().recover(html);

        assert_eq!(urls, vec!["https://gg.asuracomic.net/right"]);
    }

    #[test]
    fn test_malformed_payload_is_empty() {
        let html = r#"<script>self.__next_f.push([1,"\"pages\":[{\"order\":1,\"url\":]"])</script>"#;
        assert!(recovery().recover(html).is_empty());
    }

    #[test]
    fn test_missing_payload_is_empty() {
        assert!(recovery().recover("<html><body><p>nothing</p></body></html>").is_empty());
    }

    #[test]
    fn test_unescape_double_backslash() {
        assert_eq!(unescape(r"a\\b"), r"a\b");
    }

    #[test]
    fn test_parse_pages_ignores_extra_fields() {
        let pages = parse_pages(r#"[{"order":3,"url":"/c","width":800},{"order":1,"url":"/a"}]"#);
        assert_eq!(pages.iter().map(|p| p.order).collect::<Vec<_>>(), vec![1, 3]);
    }
}

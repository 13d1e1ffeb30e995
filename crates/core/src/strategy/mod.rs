//! Reusable extraction techniques.
//!
//! - [`structural`]: CSS selection over a parsed tree.
//! - [`pattern`]: regular-expression scans over raw markup, for pages whose
//!   nesting is too broken to trust a tree.
//! - [`payload`]: recovery of JSON that a client bundle inlines, escaped, in
//!   script bodies.
//! - [`fallback`]: ordered first-non-empty resolution and order-preserving dedup.
//!
//! Strategies never fail on "nothing found"; they return empty results and let
//! the adapter try the next one.

pub mod fallback;
pub mod pattern;
pub mod payload;
pub mod structural;

pub use fallback::{dedup_ordered, first_non_empty, halve_duplicates};
pub use pattern::{GroupMap, PatternScan, UrlPattern, block_pattern, first_matching_urls};
pub use payload::{PayloadRecovery, find_array, parse_pages, script_text, unescape};
pub use structural::{ListingQuery, RawEntry, scan_blocks};

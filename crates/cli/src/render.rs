//! Plain-text renderings of engine results for `--format text`.

use std::fmt::Write;

use tankobon_core::{Extracted, Manga, MangaDetails, ReaderContext, SourceInfo};

pub fn sources(sources: &[SourceInfo]) -> String {
    let mut out = String::new();
    for source in sources {
        let _ = writeln!(out, "{:<12} {:<14} {}", source.id, source.name, source.base_url);
    }
    out
}

pub fn listing(manga: &[Manga]) -> String {
    if manga.is_empty() {
        return "No results\n".to_string();
    }

    let mut out = String::new();
    for entry in manga {
        let _ = writeln!(out, "{}  {}", entry.id, entry.title);
    }
    out
}

pub fn details(details: &MangaDetails) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", details.title);
    let _ = writeln!(out, "id:      {}", details.id);
    let _ = writeln!(out, "status:  {}", details.status);
    if !details.authors.is_empty() {
        let _ = writeln!(out, "authors: {}", details.authors.join(", "));
    }
    if !details.genres.is_empty() {
        let _ = writeln!(out, "genres:  {}", details.genres.join(", "));
    }
    if !details.cover.is_empty() {
        let _ = writeln!(out, "cover:   {}", details.cover);
    }
    if !details.description.is_empty() {
        let _ = writeln!(out, "\n{}", details.description);
    }

    let _ = writeln!(out, "\n{} chapters", details.chapters.len());
    for chapter in &details.chapters {
        if chapter.date.is_empty() {
            let _ = writeln!(out, "  {:>8}  {}  {}", chapter.number, chapter.title, chapter.id);
        } else {
            let _ = writeln!(
                out,
                "  {:>8}  {}  {}  ({})",
                chapter.number, chapter.title, chapter.id, chapter.date
            );
        }
    }

    out
}

pub fn pages(pages: &[String]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = writeln!(out, "{}", page);
    }
    out
}

pub fn reader(ctx: &ReaderContext) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} / {}", ctx.manga.title, ctx.chapter_id);
    if let Some(current) = &ctx.current {
        let _ = writeln!(out, "current: {}", current.title);
    }
    if let Some(prev) = &ctx.prev {
        let _ = writeln!(out, "prev:    {}", prev.id);
    }
    if let Some(next) = &ctx.next {
        let _ = writeln!(out, "next:    {}", next.id);
    }
    let _ = writeln!(out);
    out.push_str(&pages(&ctx.pages));

    out
}

pub fn extracted(result: &Extracted) -> String {
    match result {
        Extracted::Listing(manga) => listing(manga),
        Extracted::Details(record) => details(record),
        Extracted::Pages(urls) => pages(urls),
    }
}

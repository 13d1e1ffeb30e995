use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tankobon_core::strategy::{GroupMap, PatternScan, RawEntry, scan_blocks};
use tankobon_core::{AsuraSource, Document, FetchConfig, ManhuaFastSource};

fn bench_listing_strategies(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/sites/manhuafast/latest.html").unwrap();
    let scan = PatternScan::block("div", "col-6", &["href", "title", "data-src"], GroupMap::default()).unwrap();

    let mut group = c.benchmark_group("listing");

    group.bench_function("structural", |b| {
        b.iter(|| {
            let doc = Document::parse(black_box(&html));
            scan_blocks(&doc, "div.col-6", |block| {
                let Some(link) = block.select_first("a[href]")? else {
                    return Ok(None);
                };
                let image = block
                    .select_first("img")?
                    .and_then(|img| img.attr_any(&["data-src", "src"]))
                    .unwrap_or_default();
                Ok(RawEntry::new(
                    link.attr("href").unwrap_or_default(),
                    link.attr("title").unwrap_or_default(),
                    image,
                ))
            })
            .unwrap()
        })
    });

    group.bench_function("pattern", |b| b.iter(|| scan.scan(black_box(&html))));

    group.finish();
}

fn bench_adapters(c: &mut Criterion) {
    let asura_latest = std::fs::read_to_string("../../tests/fixtures/sites/asura/latest.html").unwrap();
    let asura_chapter = std::fs::read_to_string("../../tests/fixtures/sites/asura/chapter.html").unwrap();
    let manhuafast_latest = std::fs::read_to_string("../../tests/fixtures/sites/manhuafast/latest.html").unwrap();

    let asura = AsuraSource::new(FetchConfig::default()).unwrap();
    let manhuafast = ManhuaFastSource::new(FetchConfig::default()).unwrap();

    c.bench_function("asura_latest", |b| b.iter(|| asura.parse_latest(black_box(&asura_latest))));
    c.bench_function("asura_pages_payload", |b| b.iter(|| asura.parse_pages(black_box(&asura_chapter))));
    c.bench_function("manhuafast_latest", |b| {
        b.iter(|| manhuafast.parse_latest(black_box(&manhuafast_latest)))
    });
}

criterion_group!(benches, bench_listing_strategies, bench_adapters);
criterion_main!(benches);

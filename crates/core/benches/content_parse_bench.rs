//! Benchmarks for page content parsing and regeneration.
//!
//! Benchmark groups:
//! - `content_parse`: full page parse at various stream sizes
//! - `content_parse_sliced`: the same content parsed in small slices
//! - `content_generate`: rewriting a parsed page after every object moved

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use quire_core::model::objects::{Dictionary, PDFObject, PDFStream};
use quire_core::{ContentGenerator, Document, Page, ParseOptions};

// =============================================================================
// Data Generation
// =============================================================================

/// Content with `n` drawing blocks mixing paths, text and state changes.
fn generate_content(n: usize) -> Vec<u8> {
    let templates: &[&[u8]] = &[
        b"q 1 0 0 1 10 10 cm 0 0 m 100 0 l 100 50 l h S Q\n",
        b"BT /F1 12 Tf 72 720 Td (Hello World) Tj [(A) -120 (B)] TJ ET\n",
        b"q .5 .5 .5 rg 20 20 40 40 re f Q\n",
        b"q 2 w 1 J [3 2] 0 d 0 0 m 10 10 50 50 90 10 c S Q\n",
        b"/Span <</MCID 1>> BDC 0 0 1 1 re f EMC\n",
    ];
    let mut data = Vec::with_capacity(n * 50);
    for i in 0..n {
        data.extend_from_slice(templates[i % templates.len()]);
    }
    data
}

fn document_with_page(content: &[u8]) -> (Document, u32) {
    let mut doc = Document::with_catalog();
    let contents = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
        Dictionary::new(),
        content.to_vec(),
    ))));
    let mut page = Dictionary::new();
    page.insert("Contents".into(), PDFObject::Ref(contents));
    let objid = doc.add_page(page).map(|r| r.objid).unwrap_or_default();
    (doc, objid)
}

fn parse_page(doc: &Document, objid: u32, options: ParseOptions) -> Option<Page> {
    let mut page = Page::load(doc, objid).ok()?;
    page.parse_content(doc, options);
    Some(page)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse");
    for blocks in [100, 1_000, 10_000] {
        let content = generate_content(blocks);
        let (doc, objid) = document_with_page(&content);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| black_box(parse_page(&doc, objid, ParseOptions::default())));
        });
    }
    group.finish();
}

fn bench_parse_sliced(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse_sliced");
    let content = generate_content(1_000);
    let (doc, objid) = document_with_page(&content);
    for slice_budget in [64, 512, 4096] {
        let options = ParseOptions {
            slice_budget,
            ..ParseOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(slice_budget),
            &options,
            |b, options| {
                b.iter(|| black_box(parse_page(&doc, objid, *options)));
            },
        );
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_generate");
    for blocks in [100, 1_000] {
        let content = generate_content(blocks);
        let (doc, objid) = document_with_page(&content);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| {
                let mut doc = doc.clone();
                let Some(mut page) = parse_page(&doc, objid, ParseOptions::default()) else {
                    return;
                };
                for obj in page.holder_mut().iter_mut() {
                    obj.transform((1.0, 0.0, 0.0, 1.0, 1.0, 1.0));
                }
                let result = ContentGenerator::new(&mut doc, page.holder_mut()).generate_content();
                black_box(result).ok();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_parse_sliced, bench_generate);
criterion_main!(benches);

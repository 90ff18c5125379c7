//! Benchmarks for banner building.
//!
//! Run with: cargo bench

use std::path::PathBuf;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use tempfile::TempDir;

use repo_banner::banner::{DirectBuilder, TemplateBuilder};
use repo_banner::{BannerData, BuildOptions, Builder, Document, FontResolver, Registry};

/// Roughly the size of a subset display font.
const FONT_SIZE: usize = 64 * 1024;

fn template(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("deploy/templates")
        .join(name)
}

fn fonts() -> (TempDir, Arc<Registry>) {
    let dir = TempDir::new().unwrap();
    let data = vec![0x5a; FONT_SIZE];
    std::fs::create_dir(dir.path().join("web")).unwrap();
    std::fs::write(dir.path().join("gt-pressura-regular.ttf"), &data).unwrap();
    std::fs::write(dir.path().join("web/gt-pressura-regular.woff"), &data).unwrap();
    std::fs::write(dir.path().join("web/gt-pressura-regular.woff2"), &data).unwrap();
    let registry = Arc::new(Registry::default_fonts(dir.path()));
    (dir, registry)
}

fn sample() -> BannerData {
    BannerData::new("numtide", "treefmt")
        .with_description("one CLI to format your repo, with every formatter you already use")
        .with_language("Go")
        .with_stats(2817, 143)
}

// ============================================================================
// Builders
// ============================================================================

fn bench_template_embedded(c: &mut Criterion) {
    let (_dir, registry) = fonts();
    let builder = TemplateBuilder::from_file(registry, template("banner.svg.mustache"), "").unwrap();
    let data = sample();

    c.bench_function("template_embedded", |b| {
        b.iter(|| builder.build(&data, &BuildOptions::default()).unwrap());
    });
}

fn bench_template_web(c: &mut Criterion) {
    let (_dir, registry) = fonts();
    let builder = TemplateBuilder::from_file(
        registry,
        template("banner.svg.mustache"),
        "https://banners.example.com",
    )
    .unwrap();
    let data = sample();

    c.bench_function("template_web", |b| {
        b.iter(|| builder.build(&data, &BuildOptions::default()).unwrap());
    });
}

fn bench_direct_embedded(c: &mut Criterion) {
    let (_dir, registry) = fonts();
    let builder = DirectBuilder::from_file(registry, template("banner.svg"), "").unwrap();
    let data = sample();

    c.bench_function("direct_embedded", |b| {
        b.iter(|| builder.build(&data, &BuildOptions::default()).unwrap());
    });
}

// ============================================================================
// Document and font scanning
// ============================================================================

fn bench_document_mutation(c: &mut Criterion) {
    let source = std::fs::read_to_string(template("banner.svg")).unwrap();

    c.bench_function("document_mutation", |b| {
        b.iter(|| {
            let mut doc = Document::new(source.as_str());
            doc.update_text_by_id("repo-name", "treefmt").unwrap();
            doc.update_multiline_text("description", &["one CLI", "to format your repo"])
                .unwrap();
            doc.hide_element_by_id("stats-group").unwrap();
            doc.into_string()
        });
    });
}

fn bench_extract_fonts(c: &mut Criterion) {
    let (_dir, registry) = fonts();
    let builder = TemplateBuilder::from_file(
        registry.clone(),
        template("banner-stats.svg.mustache"),
        "https://banners.example.com",
    )
    .unwrap();
    let svg = builder.build(&sample(), &BuildOptions::default()).unwrap();
    let resolver = FontResolver::new(&registry);

    c.bench_function("extract_fonts", |b| {
        b.iter(|| resolver.extract_fonts_from_svg(&svg).unwrap());
    });
}

criterion_group!(
    benches,
    // Builders
    bench_template_embedded,
    bench_template_web,
    bench_direct_embedded,
    // Document and font scanning
    bench_document_mutation,
    bench_extract_fonts,
);
criterion_main!(benches);

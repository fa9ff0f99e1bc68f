//! Benchmarks for the feature rendering pipeline.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use map_common::{RenderError, RenderResult};
use renderer::{png, CancelToken, FontCache, GraphicLoader, MapRenderer, PixmapSurface, SymbolCache};
use test_utils::{fixtures, point_grid, square_feature};

struct NoLoader;

impl GraphicLoader for NoLoader {
    fn load(&self, href: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::ResourceUnavailable(href.into()))
    }
}

fn renderer() -> MapRenderer {
    MapRenderer::new(
        SymbolCache::new(Arc::new(NoLoader)),
        FontCache::with_directories(vec![]),
    )
}

// =============================================================================
// POINT MARK BENCHMARKS
// =============================================================================

fn bench_point_marks(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_marks");
    let style = fixtures::mark_style("pois", "circle", 8.0);
    let viewport = fixtures::unit_viewport();
    let cancel = CancelToken::new();

    for side in [10usize, 32] {
        let features = point_grid("pois", side, side, 100.0 / side as f64);
        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("cold_cache", side * side), &features, |b, features| {
            b.iter(|| {
                let mut r = renderer();
                let mut surface = PixmapSurface::new(256, 256).unwrap();
                black_box(
                    r.render(features, &style, &viewport, &mut surface, &cancel)
                        .unwrap(),
                );
            })
        });

        group.bench_with_input(BenchmarkId::new("warm_cache", side * side), &features, |b, features| {
            let mut r = renderer();
            let mut warmup = PixmapSurface::new(256, 256).unwrap();
            r.render(features, &style, &viewport, &mut warmup, &cancel)
                .unwrap();
            b.iter(|| {
                let mut surface = PixmapSurface::new(256, 256).unwrap();
                black_box(
                    r.render(features, &style, &viewport, &mut surface, &cancel)
                        .unwrap(),
                );
            })
        });
    }

    group.finish();
}

// =============================================================================
// POLYGON FILL BENCHMARKS
// =============================================================================

fn bench_polygon_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygon_fill");
    let style = fixtures::red_fill_style("areas");
    let viewport = fixtures::unit_viewport();
    let cancel = CancelToken::new();

    let features: Vec<_> = (0..100)
        .map(|i| {
            let base = (i % 10) as f64 * 10.0;
            square_feature(&format!("a.{i}"), "areas", base, base + 9.0)
        })
        .collect();
    group.throughput(Throughput::Elements(features.len() as u64));

    group.bench_function("100_squares", |b| {
        let mut r = renderer();
        b.iter(|| {
            let mut surface = PixmapSurface::new(512, 512).unwrap();
            black_box(
                r.render(&features, &style, &viewport, &mut surface, &cancel)
                    .unwrap(),
            );
        })
    });

    group.finish();
}

// =============================================================================
// PNG ENCODING BENCHMARKS
// =============================================================================

fn bench_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");

    let mut surface = PixmapSurface::new(512, 512).unwrap();
    let features = point_grid("pois", 16, 16, 100.0 / 16.0);
    renderer()
        .render(
            &features,
            &fixtures::mark_style("pois", "square", 6.0),
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();
    let pixmap = surface.into_pixmap();

    group.bench_function("auto_512", |b| {
        b.iter(|| black_box(png::encode_auto(&pixmap).unwrap()))
    });
    group.bench_function("rgba_512", |b| {
        b.iter(|| black_box(png::encode_rgba(&pixmap).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_point_marks,
    bench_polygon_fill,
    bench_png_encoding
);
criterion_main!(benches);

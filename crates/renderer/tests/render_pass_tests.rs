//! End-to-end render pass tests: features + style + viewport to pixels.

use std::sync::Arc;

use map_common::filter::{CompareOp, Filter};
use map_common::style::{
    FeatureTypeStyle, Fill, LabelPlacement, PolygonSymbolizer, Rule, Style, Symbolizer,
    TextSymbolizer,
};
use map_common::{Expression, RenderError, RenderResult, Viewport};
use renderer::{CancelToken, FontCache, GraphicLoader, MapRenderer, PixmapSurface, SymbolCache};
use test_utils::{
    fixtures, labelled_point, line_feature, point_feature, require_font, square_feature,
    RecordingSurface,
};

struct NoLoader;

impl GraphicLoader for NoLoader {
    fn load(&self, href: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::ResourceUnavailable(href.into()))
    }
}

fn renderer() -> MapRenderer {
    MapRenderer::new(SymbolCache::new(Arc::new(NoLoader)), FontCache::new())
}

fn pixel(surface: &PixmapSurface, x: usize, y: usize) -> tiny_skia::PremultipliedColorU8 {
    let pixmap = surface.pixmap();
    pixmap.pixels()[y * pixmap.width() as usize + x]
}

#[test]
fn test_point_mark_lands_at_projected_device_position() {
    // World (50, 50) under the unit viewport maps to device (50, 50).
    let features = vec![point_feature("p.1", "pois", 50.0, 50.0)];
    let style = fixtures::mark_style("pois", "square", 10.0);

    let mut surface = PixmapSurface::new(100, 100).unwrap();
    let stats = renderer()
        .render(
            &features,
            &style,
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(stats.objects_drawn, 1);

    // Center of the mark is painted, well outside it is not.
    assert!(pixel(&surface, 50, 50).alpha() > 0);
    assert_eq!(pixel(&surface, 50, 60).alpha(), 0);
    assert_eq!(pixel(&surface, 10, 10).alpha(), 0);
}

#[test]
fn test_filtered_rule_and_else_fallback_color_differently() {
    let style = Style {
        name: "graded".to_string(),
        feature_type_styles: vec![FeatureTypeStyle {
            feature_type_name: "areas".to_string(),
            rules: vec![
                Rule {
                    filter: Some(Filter::compare("value", CompareOp::Gt, 5.0)),
                    symbolizers: vec![Symbolizer::Polygon(PolygonSymbolizer {
                        fill: Some(Fill::solid("#0000FF")),
                        ..Default::default()
                    })],
                    ..Default::default()
                },
                Rule {
                    is_else_filter: true,
                    symbolizers: vec![Symbolizer::Polygon(PolygonSymbolizer {
                        fill: Some(Fill::solid("#00FF00")),
                        ..Default::default()
                    })],
                    ..Default::default()
                },
            ],
        }],
    };

    let features = vec![
        square_feature("f.hi", "areas", 10.0, 40.0)
            .with_attribute("value", map_common::AttributeValue::Number(9.0)),
        square_feature("f.lo", "areas", 60.0, 90.0)
            .with_attribute("value", map_common::AttributeValue::Number(1.0)),
    ];

    let mut surface = PixmapSurface::new(100, 100).unwrap();
    renderer()
        .render(
            &features,
            &style,
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();

    // World (25, 25) is device (25, 75); the high-value square is blue.
    assert_eq!(pixel(&surface, 25, 75).demultiply().blue(), 255);
    // World (75, 75) is device (75, 25); the else square is green.
    assert_eq!(pixel(&surface, 75, 25).demultiply().green(), 255);
}

#[test]
fn test_polygon_fill_precedes_stroke() {
    let style = fixtures::single_rule_style(
        "areas",
        vec![Symbolizer::Polygon(PolygonSymbolizer {
            fill: Some(Fill {
                opacity: Expression::Number(0.5),
                ..Fill::solid("#FF0000")
            }),
            stroke: Some(map_common::style::Stroke::solid("#000000", 2.0)),
            ..Default::default()
        })],
    );
    let features = vec![square_feature("f.1", "areas", 20.0, 80.0)];

    let mut surface = RecordingSurface::new(100, 100);
    renderer()
        .render(
            &features,
            &style,
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(surface.calls.len(), 2);
    assert!(surface.calls[0].is_fill());
    assert!(surface.calls[1].is_stroke());
    assert!((surface.calls[0].opacity() - 0.5).abs() < 1e-6);
    assert!((surface.calls[1].opacity() - 1.0).abs() < 1e-6);
}

#[test]
fn test_stroke_width_compensates_for_world_transform() {
    // Viewport maps 200 world units onto 100 pixels: scale_x = 0.5, so a
    // 3px stroke becomes 6 world units wide under the world transform.
    let viewport = Viewport::new(
        map_common::BoundingBox::new(0.0, 0.0, 200.0, 200.0),
        100,
        100,
    );
    let style = fixtures::stroke_style("roads", "#000000", 3.0);
    let features = vec![line_feature("r.1", "roads", 10.0, 190.0, 100.0)];

    let mut surface = RecordingSurface::new(100, 100);
    renderer()
        .render(&features, &style, &viewport, &mut surface, &CancelToken::new())
        .unwrap();

    let strokes = surface.strokes();
    assert_eq!(strokes.len(), 1);
    match strokes[0] {
        test_utils::DrawCall::Stroke { width, dashed, .. } => {
            assert!((width - 6.0).abs() < 1e-4);
            assert!(!dashed);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_repeat_passes_are_byte_identical() {
    let features = vec![
        square_feature("f.1", "areas", 5.0, 45.0),
        square_feature("f.2", "areas", 55.0, 95.0),
    ];
    let style = fixtures::red_fill_style("areas");
    let cancel = CancelToken::new();
    let mut r = renderer();

    let mut first = PixmapSurface::new(100, 100).unwrap();
    r.render(&features, &style, &fixtures::unit_viewport(), &mut first, &cancel)
        .unwrap();

    let mut second = PixmapSurface::new(100, 100).unwrap();
    let stats = r
        .render(&features, &style, &fixtures::unit_viewport(), &mut second, &cancel)
        .unwrap();

    assert_eq!(stats.objects_built, 0);
    assert_eq!(stats.cache_reused, 2);
    assert_eq!(first.pixmap().data(), second.pixmap().data());
}

#[test]
fn test_label_draws_halo_under_glyphs() {
    let fonts = FontCache::new();
    let _ = require_font!(fonts);

    let style = fixtures::single_rule_style(
        "pois",
        vec![Symbolizer::Text(TextSymbolizer {
            geometry: None,
            label: Expression::Attribute("name".to_string()),
            font: Default::default(),
            placement: LabelPlacement::default(),
            halo: Some(map_common::style::Halo::default()),
            fill: Fill::black(),
        })],
    );
    let features = vec![labelled_point("p.1", "pois", 50.0, 50.0, "Springfield")];

    let mut surface = RecordingSurface::new(100, 100);
    let stats = renderer()
        .render(
            &features,
            &style,
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(stats.objects_drawn, 1);

    // Halo stroke first, glyph fill second.
    assert_eq!(surface.calls.len(), 2);
    assert!(surface.calls[0].is_stroke());
    assert!(surface.calls[1].is_fill());
}

#[test]
fn test_unlabelled_feature_draws_nothing() {
    let style = fixtures::single_rule_style(
        "pois",
        vec![Symbolizer::Text(TextSymbolizer {
            geometry: None,
            label: Expression::Attribute("name".to_string()),
            font: Default::default(),
            placement: LabelPlacement::default(),
            halo: None,
            fill: Fill::black(),
        })],
    );
    // No "name" attribute at all.
    let features = vec![point_feature("p.1", "pois", 50.0, 50.0)];

    let mut surface = RecordingSurface::new(100, 100);
    let stats = renderer()
        .render(
            &features,
            &style,
            &fixtures::unit_viewport(),
            &mut surface,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(stats.objects_drawn, 0);
    assert!(surface.calls.is_empty());
}

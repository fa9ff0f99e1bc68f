//! Render a small styled map to `map.png`.
//!
//! Run with: cargo run --package renderer --example render_map
//!
//! Set RUST_LOG=renderer=debug to see pass statistics.

use std::sync::Arc;

use geo_types::{Geometry, LineString, Polygon};
use map_common::style::{
    FeatureTypeStyle, Fill, Graphic, LineSymbolizer, PointSymbolizer, PolygonSymbolizer, Rule,
    Stroke, Style, Symbolizer,
};
use map_common::{AttributeValue, BoundingBox, Feature, Viewport};
use renderer::{CancelToken, FileLoader, FontCache, MapRenderer, PixmapSurface, SymbolCache};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let features = build_features();
    let style = build_style();
    let viewport = Viewport::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 512, 512);

    let mut renderer = MapRenderer::new(SymbolCache::new(Arc::new(FileLoader)), FontCache::new());
    let mut surface = PixmapSurface::new(viewport.width, viewport.height)
        .ok_or("zero-size surface")?;

    let stats = renderer.render(&features, &style, &viewport, &mut surface, &CancelToken::new())?;
    println!(
        "rendered {} objects ({} features seen)",
        stats.objects_drawn, stats.features_seen
    );

    let png = surface.encode_png()?;
    std::fs::write("map.png", png)?;
    println!("wrote map.png");
    Ok(())
}

fn build_features() -> Vec<Feature> {
    let lake: Geometry<f64> = Polygon::new(
        LineString::from(vec![
            (15.0, 20.0),
            (45.0, 15.0),
            (55.0, 40.0),
            (35.0, 55.0),
            (10.0, 45.0),
            (15.0, 20.0),
        ]),
        vec![],
    )
    .into();

    let road: Geometry<f64> = LineString::from(vec![
        (0.0, 70.0),
        (30.0, 65.0),
        (60.0, 75.0),
        (100.0, 68.0),
    ])
    .into();

    vec![
        Feature::new("lake.1", "water", Some(lake)),
        Feature::new("road.1", "roads", Some(road))
            .with_attribute("lanes", AttributeValue::Number(4.0)),
        Feature::new(
            "town.1",
            "towns",
            Some(geo_types::Point::new(70.0, 30.0).into()),
        ),
        Feature::new(
            "town.2",
            "towns",
            Some(geo_types::Point::new(25.0, 80.0).into()),
        ),
    ]
}

fn build_style() -> Style {
    Style {
        name: "demo".to_string(),
        feature_type_styles: vec![
            FeatureTypeStyle {
                feature_type_name: "water".to_string(),
                rules: vec![Rule {
                    symbolizers: vec![Symbolizer::Polygon(PolygonSymbolizer {
                        fill: Some(Fill::solid("#4A90D9")),
                        stroke: Some(Stroke::solid("#2B5E8C", 1.5)),
                        ..Default::default()
                    })],
                    ..Default::default()
                }],
            },
            FeatureTypeStyle {
                feature_type_name: "roads".to_string(),
                rules: vec![Rule {
                    symbolizers: vec![Symbolizer::Line(LineSymbolizer {
                        stroke: Some(Stroke::solid("#333333", 3.0)),
                        ..Default::default()
                    })],
                    ..Default::default()
                }],
            },
            FeatureTypeStyle {
                feature_type_name: "towns".to_string(),
                rules: vec![Rule {
                    symbolizers: vec![Symbolizer::Point(PointSymbolizer {
                        geometry: None,
                        graphic: Graphic::mark("star"),
                    })],
                    ..Default::default()
                }],
            },
        ],
    }
}

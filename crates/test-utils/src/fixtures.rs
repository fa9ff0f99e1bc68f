//! Common fixtures for rendering tests.

use map_common::style::{
    FeatureTypeStyle, Fill, Graphic, LineSymbolizer, PointSymbolizer, PolygonSymbolizer, Rule,
    Stroke, Style, Symbolizer,
};
use map_common::{BoundingBox, Viewport};

/// Common world envelopes for testing.
pub mod envelope {
    /// Global geographic envelope.
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// A unit-per-pixel 100x100 world, handy for pixel assertions.
    pub const HUNDRED: (f64, f64, f64, f64) = (0.0, 0.0, 100.0, 100.0);

    /// Degenerate envelope (zero area).
    pub const POINT: (f64, f64, f64, f64) = (5.0, 5.0, 5.0, 5.0);
}

pub fn bbox(env: (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(env.0, env.1, env.2, env.3)
}

/// The standard test viewport: world (0,0)-(100,100) onto 100x100 pixels,
/// so one world unit is one pixel and device y is the flipped world y.
pub fn unit_viewport() -> Viewport {
    Viewport::new(bbox(envelope::HUNDRED), 100, 100)
}

/// A style with a single rule wrapping the given symbolizers, applied to
/// the given feature type.
pub fn single_rule_style(feature_type: &str, symbolizers: Vec<Symbolizer>) -> Style {
    Style {
        name: format!("{feature_type}-test"),
        feature_type_styles: vec![FeatureTypeStyle {
            feature_type_name: feature_type.to_string(),
            rules: vec![Rule {
                symbolizers,
                ..Default::default()
            }],
        }],
    }
}

/// Red fill, no outline.
pub fn red_fill_style(feature_type: &str) -> Style {
    single_rule_style(
        feature_type,
        vec![Symbolizer::Polygon(PolygonSymbolizer {
            fill: Some(Fill::solid("#FF0000")),
            stroke: None,
            ..Default::default()
        })],
    )
}

/// Solid stroke of the given colour and width.
pub fn stroke_style(feature_type: &str, color: &str, width: f64) -> Style {
    single_rule_style(
        feature_type,
        vec![Symbolizer::Line(LineSymbolizer {
            stroke: Some(Stroke::solid(color, width)),
            ..Default::default()
        })],
    )
}

/// A point symbolizer stamping the named mark at the given size.
pub fn mark_style(feature_type: &str, mark: &str, size: f64) -> Style {
    let mut graphic = Graphic::mark(mark);
    graphic.size = size.into();
    single_rule_style(
        feature_type,
        vec![Symbolizer::Point(PointSymbolizer {
            geometry: None,
            graphic,
        })],
    )
}

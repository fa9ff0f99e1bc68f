//! Rendered objects: the cached per-(feature, symbolizer) products.
//!
//! A rendered object captures everything about a feature/symbolizer pair
//! that is worth computing once: the flattened world path, the resolved
//! point symbol, the laid-out label anchor. What stays dynamic (colours,
//! sizes, rotations, opacities) is evaluated from the symbolizer at draw
//! time so one symbolizer can vary per feature.
//!
//! Construction never fails the pass: anything unresolvable produces the
//! `NotRenderable` sentinel, which is cached like any other object and
//! skipped at draw time.

use std::sync::Arc;

use map_common::style::{GraphicSymbol, Symbolizer};
use map_common::{BoundingBox, Feature};
use rusttype::Font;
use tiny_skia::{Path, Pixmap};

use crate::fonts::FontCache;
use crate::symbols::{rgba_to_pixmap, SymbolCache};
use crate::{marks, path};

/// Caches consulted while building rendered objects.
pub struct BuildContext<'a> {
    pub symbols: &'a SymbolCache,
    pub fonts: &'a FontCache,
}

/// One of the five renderable variants, or the non-renderable sentinel.
pub enum RenderedObject {
    Polygon(RenderedPolygon),
    Line(RenderedLine),
    Point(RenderedPoint),
    Text(RenderedText),
    Raster(RenderedRaster),
    NotRenderable,
}

impl RenderedObject {
    pub fn is_renderable(&self) -> bool {
        !matches!(self, RenderedObject::NotRenderable)
    }
}

pub struct RenderedPolygon {
    /// Area path in world coordinates, holes as even-odd subpaths.
    pub area: Path,
    /// Ring polylines in world coordinates, for graphic strokes.
    pub outlines: Vec<Vec<(f64, f64)>>,
}

pub struct RenderedLine {
    /// Line path in world coordinates.
    pub path: Path,
    pub lines: Vec<Vec<(f64, f64)>>,
}

pub struct RenderedPoint {
    /// Anchor in world coordinates.
    pub x: f64,
    pub y: f64,
    pub symbol: ResolvedSymbol,
}

/// The first graphic candidate that resolved, ready to stamp.
pub enum ResolvedSymbol {
    Image(Arc<Pixmap>),
    Mark {
        shape: Path,
        /// Index of the winning candidate in the graphic's symbol list, so
        /// draw time can re-evaluate its fill/stroke expressions.
        candidate: usize,
    },
    TextMark {
        font: Arc<Font<'static>>,
        text: String,
    },
}

pub struct RenderedText {
    pub label: String,
    pub font: Arc<Font<'static>>,
    pub placement: ResolvedPlacement,
}

/// Label anchor geometry, resolved at build time.
pub enum ResolvedPlacement {
    /// Anchor point in world coordinates.
    Point { x: f64, y: f64 },
    /// Start and end of the line's chord in world coordinates, plus the
    /// perpendicular offset in pixels.
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        offset: f64,
    },
}

pub struct RenderedRaster {
    pub pixmap: Arc<Pixmap>,
    pub envelope: BoundingBox,
}

/// Build the rendered object for a (feature, symbolizer) pair.
pub fn build(feature: &Feature, symbolizer: &Symbolizer, ctx: &BuildContext) -> RenderedObject {
    match symbolizer {
        Symbolizer::Polygon(sym) => build_polygon(feature, sym),
        Symbolizer::Line(sym) => build_line(feature, sym),
        Symbolizer::Point(sym) => build_point(feature, sym, ctx),
        Symbolizer::Text(sym) => build_text(feature, sym, ctx),
        Symbolizer::Raster(_) => build_raster(feature),
    }
}

fn build_polygon(
    feature: &Feature,
    sym: &map_common::style::PolygonSymbolizer,
) -> RenderedObject {
    let Some(geometry) = feature.geometry_named(sym.geometry.as_deref()) else {
        warn_skipped(feature, "polygon symbolizer without geometry");
        return RenderedObject::NotRenderable;
    };
    let Some(area) = path::geometry_path(geometry) else {
        warn_skipped(feature, "empty geometry for polygon symbolizer");
        return RenderedObject::NotRenderable;
    };
    RenderedObject::Polygon(RenderedPolygon {
        area,
        outlines: path::flatten_lines(geometry),
    })
}

fn build_line(feature: &Feature, sym: &map_common::style::LineSymbolizer) -> RenderedObject {
    // A line symbolizer without a stroke draws nothing at all.
    if sym.stroke.is_none() {
        return RenderedObject::NotRenderable;
    }
    let Some(geometry) = feature.geometry_named(sym.geometry.as_deref()) else {
        warn_skipped(feature, "line symbolizer without geometry");
        return RenderedObject::NotRenderable;
    };
    let Some(line) = path::line_path(geometry) else {
        warn_skipped(feature, "empty geometry for line symbolizer");
        return RenderedObject::NotRenderable;
    };
    RenderedObject::Line(RenderedLine {
        path: line,
        lines: path::flatten_lines(geometry),
    })
}

fn build_point(
    feature: &Feature,
    sym: &map_common::style::PointSymbolizer,
    ctx: &BuildContext,
) -> RenderedObject {
    let Some(geometry) = feature.geometry_named(sym.geometry.as_deref()) else {
        warn_skipped(feature, "point symbolizer without geometry");
        return RenderedObject::NotRenderable;
    };
    let Some((x, y)) = path::representative_point(geometry) else {
        warn_skipped(feature, "empty geometry for point symbolizer");
        return RenderedObject::NotRenderable;
    };

    // Candidates are tried in declared order; the first that resolves wins
    // and the rest are ignored.
    for (candidate, symbol) in sym.graphic.symbols.iter().enumerate() {
        match symbol {
            GraphicSymbol::External { href, format } => {
                match ctx.symbols.resolve_external(href, format.as_deref()) {
                    Ok(pixmap) => {
                        return RenderedObject::Point(RenderedPoint {
                            x,
                            y,
                            symbol: ResolvedSymbol::Image(pixmap),
                        })
                    }
                    Err(e) => {
                        tracing::debug!(feature = feature.id(), href, error = %e,
                            "External graphic candidate unavailable, trying next");
                    }
                }
            }
            GraphicSymbol::Mark { name, .. } => {
                if let Some(shape) = marks::mark_path(name) {
                    return RenderedObject::Point(RenderedPoint {
                        x,
                        y,
                        symbol: ResolvedSymbol::Mark { shape, candidate },
                    });
                }
            }
            GraphicSymbol::TextMark { text, families } => {
                let Some(text) = text.text(feature).filter(|t| !t.is_empty()) else {
                    continue;
                };
                if let Some(font) = ctx.fonts.resolve(families) {
                    return RenderedObject::Point(RenderedPoint {
                        x,
                        y,
                        symbol: ResolvedSymbol::TextMark { font, text },
                    });
                }
            }
        }
    }

    warn_skipped(feature, "no graphic candidate resolved for point symbolizer");
    RenderedObject::NotRenderable
}

fn build_text(
    feature: &Feature,
    sym: &map_common::style::TextSymbolizer,
    ctx: &BuildContext,
) -> RenderedObject {
    let Some(geometry) = feature.geometry_named(sym.geometry.as_deref()) else {
        warn_skipped(feature, "text symbolizer without geometry");
        return RenderedObject::NotRenderable;
    };

    // A null/empty label means this feature is simply unlabelled.
    let Some(label) = sym.label.text(feature).filter(|l| !l.is_empty()) else {
        return RenderedObject::NotRenderable;
    };

    let Some(font) = ctx.fonts.resolve(&sym.font.families) else {
        warn_skipped(feature, "no font family resolved for text symbolizer");
        return RenderedObject::NotRenderable;
    };

    let placement = match &sym.placement {
        map_common::style::LabelPlacement::Point { .. } => {
            let Some((x, y)) = path::representative_point(geometry) else {
                warn_skipped(feature, "empty geometry for text symbolizer");
                return RenderedObject::NotRenderable;
            };
            ResolvedPlacement::Point { x, y }
        }
        map_common::style::LabelPlacement::Line { offset } => {
            let lines = path::flatten_lines(geometry);
            let Some(line) = lines.iter().find(|l| l.len() >= 2) else {
                warn_skipped(feature, "line label placement on non-line geometry");
                return RenderedObject::NotRenderable;
            };
            let (x0, y0) = line[0];
            let (x1, y1) = *line.last().unwrap_or(&line[0]);
            ResolvedPlacement::Line {
                x0,
                y0,
                x1,
                y1,
                offset: *offset,
            }
        }
    };

    RenderedObject::Text(RenderedText {
        label,
        font,
        placement,
    })
}

fn build_raster(feature: &Feature) -> RenderedObject {
    // The coverage arrives in an attribute literally named "grid".
    let coverage = match feature.attribute("grid") {
        Ok(map_common::AttributeValue::Grid(coverage)) => coverage.clone(),
        _ => {
            warn_skipped(feature, "raster symbolizer without a 'grid' attribute");
            return RenderedObject::NotRenderable;
        }
    };

    let Some(pixmap) = rgba_to_pixmap(&coverage.rgba, coverage.width, coverage.height) else {
        warn_skipped(feature, "grid coverage with zero size");
        return RenderedObject::NotRenderable;
    };

    RenderedObject::Raster(RenderedRaster {
        pixmap: Arc::new(pixmap),
        envelope: coverage.envelope,
    })
}

fn warn_skipped(feature: &Feature, reason: &str) {
    tracing::warn!(feature = feature.id(), reason, "Symbolizer not renderable");
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::style::{
        Graphic, LineSymbolizer, PointSymbolizer, PolygonSymbolizer, RasterSymbolizer, Stroke,
    };
    use map_common::{AttributeValue, Expression, GridCoverage};
    use geo_types::{point, polygon};
    use std::sync::Arc as StdArc;

    struct NoLoader;
    impl crate::symbols::GraphicLoader for NoLoader {
        fn load(&self, href: &str) -> map_common::RenderResult<Vec<u8>> {
            Err(map_common::RenderError::ResourceUnavailable(href.into()))
        }
    }

    fn ctx() -> (SymbolCache, FontCache) {
        (
            SymbolCache::new(StdArc::new(NoLoader)),
            FontCache::with_directories(vec![]),
        )
    }

    fn poly_feature() -> Feature {
        let geom: geo_types::Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0),
        ]
        .into();
        Feature::new("f.1", "areas", Some(geom))
    }

    #[test]
    fn test_polygon_build() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let sym = Symbolizer::Polygon(PolygonSymbolizer::default());
        assert!(build(&poly_feature(), &sym, &ctx).is_renderable());
    }

    #[test]
    fn test_missing_geometry_is_not_renderable() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let feature = Feature::new("f.2", "areas", None);
        let sym = Symbolizer::Polygon(PolygonSymbolizer::default());
        assert!(!build(&feature, &sym, &ctx).is_renderable());
    }

    #[test]
    fn test_strokeless_line_is_not_renderable() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let sym = Symbolizer::Line(LineSymbolizer::default());
        assert!(!build(&poly_feature(), &sym, &ctx).is_renderable());

        let with_stroke = Symbolizer::Line(LineSymbolizer {
            stroke: Some(Stroke::default()),
            ..Default::default()
        });
        assert!(build(&poly_feature(), &with_stroke, &ctx).is_renderable());
    }

    #[test]
    fn test_point_candidate_fallback() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let feature = Feature::new("f.3", "pois", Some(point! { x: 1.0, y: 2.0 }.into()));

        // First candidate (external) cannot load; the mark wins.
        let graphic = Graphic {
            symbols: vec![
                GraphicSymbol::External {
                    href: "file:///missing.png".into(),
                    format: None,
                },
                GraphicSymbol::Mark {
                    name: "circle".into(),
                    fill: None,
                    stroke: None,
                },
            ],
            size: Expression::Number(8.0),
            rotation: Expression::Number(0.0),
            opacity: Expression::Number(1.0),
        };
        let sym = Symbolizer::Point(PointSymbolizer {
            geometry: None,
            graphic,
        });

        match build(&feature, &sym, &ctx) {
            RenderedObject::Point(p) => {
                assert!(matches!(p.symbol, ResolvedSymbol::Mark { candidate: 1, .. }));
                assert_eq!((p.x, p.y), (1.0, 2.0));
            }
            _ => panic!("expected a point object"),
        }
    }

    #[test]
    fn test_null_label_is_not_renderable() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let feature = Feature::new("f.4", "pois", Some(point! { x: 1.0, y: 2.0 }.into()))
            .with_attribute("name", AttributeValue::Null);
        let sym = Symbolizer::Text(map_common::style::TextSymbolizer {
            geometry: None,
            label: Expression::Attribute("name".into()),
            font: Default::default(),
            placement: Default::default(),
            halo: None,
            fill: map_common::style::Fill::black(),
        });
        assert!(!build(&feature, &sym, &ctx).is_renderable());
    }

    #[test]
    fn test_raster_requires_grid_attribute() {
        let (symbols, fonts) = ctx();
        let ctx = BuildContext {
            symbols: &symbols,
            fonts: &fonts,
        };
        let sym = Symbolizer::Raster(RasterSymbolizer::default());

        let bare = Feature::new("f.5", "grids", None);
        assert!(!build(&bare, &sym, &ctx).is_renderable());

        let coverage = GridCoverage::solid(
            2,
            2,
            [0, 255, 0, 255],
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        );
        let with_grid = Feature::new("f.6", "grids", None)
            .with_attribute("grid", AttributeValue::Grid(StdArc::new(coverage)));
        assert!(build(&with_grid, &sym, &ctx).is_renderable());
    }
}

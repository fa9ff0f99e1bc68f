//! Render pass orchestration.
//!
//! A pass walks the style's feature-type styles in declaration order, gates
//! features by type name, viewport envelope, scale range and filter, builds
//! (or reuses) the rendered object for each matching (feature, symbolizer)
//! pair, and draws the results in encounter order. Per-item failures are
//! logged and skipped; only configuration errors and cancellation abort the
//! pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use map_common::style::Style;
use map_common::{BoundingBox, Feature, RenderError, RenderResult, Viewport};

use crate::draw::SymbolRenderer;
use crate::fonts::FontCache;
use crate::path;
use crate::rendered::{self, BuildContext, RenderedObject};
use crate::rules;
use crate::surface::Surface;
use crate::symbols::SymbolCache;
use crate::transform::WorldToDevice;

/// Cooperative cancellation flag, checked between features and between
/// draw operations. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn check(&self) -> RenderResult<()> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Counters from one pass, for logging and cache behaviour tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Features that passed the feature-type gate, per feature-type style.
    pub features_seen: usize,
    /// Features rejected by the viewport envelope.
    pub features_skipped: usize,
    /// Features for which at least one rule matched.
    pub rules_matched: usize,
    /// Rendered objects built this pass.
    pub objects_built: usize,
    /// Rendered objects served from the cache, including whole-plan
    /// replays where the matcher never runs.
    pub cache_reused: usize,
    /// Draw operations actually executed (non-renderables excluded).
    pub objects_drawn: usize,
}

/// Identity of one cached (feature, symbolizer) pairing: feature-type
/// style, rule and symbolizer indices in the style, feature index in the
/// slice.
type CacheKey = (usize, usize, usize, usize);

/// The inputs the cache was built against. Any change invalidates it.
#[derive(PartialEq, Eq)]
struct CacheIdentity {
    features: (usize, usize),
    style: usize,
}

/// A completed pass's draw plan, kept so the next pass over the same
/// inputs replays it without touching the matcher. Matching depends on
/// the scale denominator and the envelope gate, so the plan records both
/// and is discarded when either differs.
struct StoredPlan {
    scale_denominator: f64,
    envelope: BoundingBox,
    keys: Vec<CacheKey>,
}

impl StoredPlan {
    fn matches(&self, scale_denominator: f64, envelope: &BoundingBox) -> bool {
        self.scale_denominator == scale_denominator && self.envelope == *envelope
    }
}

/// Drives render passes and owns the rendered-object cache between them.
///
/// The cache is keyed by position, not content: it stays valid only while
/// the caller passes the same feature slice and style, which the renderer
/// detects by address. Any other input clears it.
pub struct MapRenderer {
    symbols: SymbolCache,
    fonts: FontCache,
    outer: Option<WorldToDevice>,
    cache: HashMap<CacheKey, RenderedObject>,
    cache_identity: Option<CacheIdentity>,
    plan: Option<StoredPlan>,
}

impl MapRenderer {
    pub fn new(symbols: SymbolCache, fonts: FontCache) -> Self {
        Self {
            symbols,
            fonts,
            outer: None,
            cache: HashMap::new(),
            cache_identity: None,
            plan: None,
        }
    }

    /// Concatenate an outer device transform onto every pass, for drawing
    /// into a rotated or offset frame of a larger surface.
    pub fn with_concatenated(mut self, outer: WorldToDevice) -> Self {
        self.outer = Some(outer);
        self
    }

    pub fn symbol_cache(&self) -> &SymbolCache {
        &self.symbols
    }

    pub fn font_cache(&self) -> &FontCache {
        &self.fonts
    }

    /// Render `features` styled by `style` into the viewport on `surface`.
    ///
    /// Returns the pass counters. Fails only on a degenerate viewport or
    /// cancellation; anything wrong with an individual feature or
    /// symbolizer is logged and skipped.
    pub fn render(
        &mut self,
        features: &[Feature],
        style: &Style,
        viewport: &Viewport,
        surface: &mut dyn Surface,
        cancel: &CancelToken,
    ) -> RenderResult<PassStats> {
        if viewport.is_degenerate() {
            return Err(RenderError::Configuration(format!(
                "degenerate viewport: {}x{} px over {:?}",
                viewport.width, viewport.height, viewport.envelope
            )));
        }

        let mut world = WorldToDevice::compute(viewport);
        if let Some(outer) = &self.outer {
            world = world.then(outer);
        }
        let scale_denominator = world.scale_denominator();

        self.refresh_cache_identity(features, style);

        let mut stats = PassStats::default();
        // A plan from a previous pass over the same inputs, scale and
        // envelope replays as-is: no gating, no matching, no building.
        let plan = match self.plan.take() {
            Some(plan) if plan.matches(scale_denominator, &viewport.envelope) => {
                stats.cache_reused = plan.keys.len();
                plan
            }
            _ => {
                let keys = self.build_phase(
                    features,
                    style,
                    viewport,
                    scale_denominator,
                    cancel,
                    &mut stats,
                )?;
                StoredPlan {
                    scale_denominator,
                    envelope: viewport.envelope,
                    keys,
                }
            }
        };
        self.draw_phase(features, style, &plan.keys, &world, surface, cancel, &mut stats)?;
        self.plan = Some(plan);

        tracing::debug!(
            features_seen = stats.features_seen,
            objects_built = stats.objects_built,
            cache_reused = stats.cache_reused,
            objects_drawn = stats.objects_drawn,
            scale_denominator,
            "Render pass complete"
        );
        Ok(stats)
    }

    /// Drop the cache and plan when the feature slice or style is not the
    /// one they were built against.
    fn refresh_cache_identity(&mut self, features: &[Feature], style: &Style) {
        let identity = CacheIdentity {
            features: (features.as_ptr() as usize, features.len()),
            style: style as *const Style as usize,
        };
        if self.cache_identity.as_ref() != Some(&identity) {
            self.cache.clear();
            self.plan = None;
            self.cache_identity = Some(identity);
        }
    }

    /// Match features against rules and make sure every matched pairing has
    /// a rendered object in the cache. Returns the draw plan in encounter
    /// order.
    fn build_phase(
        &mut self,
        features: &[Feature],
        style: &Style,
        viewport: &Viewport,
        scale_denominator: f64,
        cancel: &CancelToken,
        stats: &mut PassStats,
    ) -> RenderResult<Vec<CacheKey>> {
        let ctx = BuildContext {
            symbols: &self.symbols,
            fonts: &self.fonts,
        };
        let mut plan = Vec::new();

        for (fts_index, fts) in style.feature_type_styles.iter().enumerate() {
            for (feature_index, feature) in features.iter().enumerate() {
                cancel.check()?;

                if !rules::feature_type_matches(fts, feature) {
                    continue;
                }
                stats.features_seen += 1;

                if outside_viewport(feature, viewport) {
                    stats.features_skipped += 1;
                    continue;
                }

                let matched =
                    rules::applicable_symbolizers(feature, &fts.rules, scale_denominator);
                if matched.symbolizers.is_empty() {
                    continue;
                }
                stats.rules_matched += 1;

                for m in &matched.symbolizers {
                    let key = (fts_index, m.rule_index, m.symbolizer_index, feature_index);
                    if self.cache.contains_key(&key) {
                        stats.cache_reused += 1;
                    } else {
                        let object = rendered::build(feature, m.symbolizer, &ctx);
                        self.cache.insert(key, object);
                        stats.objects_built += 1;
                    }
                    plan.push(key);
                }
            }
        }

        Ok(plan)
    }

    /// Draw the planned objects in order. A failing object is logged and
    /// skipped unless the error is fatal.
    fn draw_phase(
        &self,
        features: &[Feature],
        style: &Style,
        plan: &[CacheKey],
        world: &WorldToDevice,
        surface: &mut dyn Surface,
        cancel: &CancelToken,
        stats: &mut PassStats,
    ) -> RenderResult<()> {
        let renderer = SymbolRenderer {
            symbols: &self.symbols,
            fonts: &self.fonts,
        };

        for &(fts_index, rule_index, symbolizer_index, feature_index) in plan {
            cancel.check()?;

            let Some(object) = self
                .cache
                .get(&(fts_index, rule_index, symbolizer_index, feature_index))
            else {
                continue;
            };
            if !object.is_renderable() {
                continue;
            }

            let symbolizer = &style.feature_type_styles[fts_index].rules[rule_index].symbolizers
                [symbolizer_index];
            let feature = &features[feature_index];

            match renderer.render(object, symbolizer, feature, world, surface) {
                Ok(()) => stats.objects_drawn += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(feature = feature.id(), error = %e, "Draw failed, skipping");
                }
            }
        }

        Ok(())
    }
}

/// Envelope gate: a feature whose geometry lies entirely outside the
/// viewport draws nothing. Features without a geometry (raster coverages
/// carried in attributes) are never rejected here.
fn outside_viewport(feature: &Feature, viewport: &Viewport) -> bool {
    match feature.default_geometry() {
        Some(geometry) => match path::geometry_bbox(geometry) {
            Some(bbox) => !bbox.intersects(&viewport.envelope),
            None => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixmapSurface;
    use crate::symbols::GraphicLoader;
    use geo_types::{point, polygon};
    use map_common::filter::{CompareOp, Filter};
    use map_common::style::{
        FeatureTypeStyle, Fill, LineSymbolizer, PolygonSymbolizer, Rule, Stroke, Symbolizer,
    };
    use map_common::{AttributeValue, BoundingBox};

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

    fn square(id: &str, min: f64, max: f64) -> Feature {
        let geom: geo_types::Geometry<f64> = polygon![
            (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]
        .into();
        Feature::new(id, "areas", Some(geom))
    }

    fn fill_style() -> Style {
        Style {
            name: "areas".to_string(),
            feature_type_styles: vec![FeatureTypeStyle {
                feature_type_name: "areas".to_string(),
                rules: vec![Rule {
                    symbolizers: vec![Symbolizer::Polygon(PolygonSymbolizer {
                        fill: Some(Fill::solid("#FF0000")),
                        stroke: None,
                        ..Default::default()
                    })],
                    ..Default::default()
                }],
            }],
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 100, 100)
    }

    #[test]
    fn test_degenerate_viewport_is_configuration_error() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        let bad = Viewport::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0, 10);

        let err = r
            .render(&[], &fill_style(), &bad, &mut surface, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_pass_draws_and_counts() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let features = vec![square("f.1", 10.0, 40.0)];
        let style = fill_style();

        let stats = r
            .render(&features, &style, &viewport(), &mut surface, &CancelToken::new())
            .unwrap();
        assert_eq!(stats.features_seen, 1);
        assert_eq!(stats.objects_built, 1);
        assert_eq!(stats.objects_drawn, 1);
        assert_eq!(stats.cache_reused, 0);

        // Device y is flipped: world (25, 25) lands in the lower-left.
        let px = surface.pixmap().pixels()[75 * 100 + 25];
        assert_eq!(px.red(), 255);
    }

    #[test]
    fn test_second_pass_reuses_cache() {
        let mut r = renderer();
        let features = vec![square("f.1", 10.0, 40.0), square("f.2", 50.0, 90.0)];
        let style = fill_style();
        let cancel = CancelToken::new();

        let mut s1 = PixmapSurface::new(100, 100).unwrap();
        let first = r.render(&features, &style, &viewport(), &mut s1, &cancel).unwrap();
        assert_eq!(first.objects_built, 2);

        let mut s2 = PixmapSurface::new(100, 100).unwrap();
        let second = r.render(&features, &style, &viewport(), &mut s2, &cancel).unwrap();
        assert_eq!(second.objects_built, 0);
        assert_eq!(second.cache_reused, 2);
        // The stored plan replays without re-entering the matching loop.
        assert_eq!(second.rules_matched, 0);
        assert_eq!(second.features_seen, 0);

        // Byte-identical output across passes.
        assert_eq!(s1.pixmap().data(), s2.pixmap().data());
    }

    #[test]
    fn test_viewport_change_rematches_but_keeps_built_objects() {
        let mut r = renderer();
        let features = vec![square("f.1", 10.0, 40.0), square("f.2", 50.0, 90.0)];
        let style = fill_style();
        let cancel = CancelToken::new();

        let mut s1 = PixmapSurface::new(100, 100).unwrap();
        r.render(&features, &style, &viewport(), &mut s1, &cancel).unwrap();

        // Shifted envelope: the plan is stale, the world-coordinate
        // objects are not.
        let shifted = Viewport::new(BoundingBox::new(5.0, 5.0, 105.0, 105.0), 100, 100);
        let mut s2 = PixmapSurface::new(100, 100).unwrap();
        let second = r.render(&features, &style, &shifted, &mut s2, &cancel).unwrap();
        assert_eq!(second.rules_matched, 2);
        assert_eq!(second.objects_built, 0);
        assert_eq!(second.cache_reused, 2);
    }

    #[test]
    fn test_cache_invalidated_by_different_style() {
        let mut r = renderer();
        let features = vec![square("f.1", 10.0, 40.0)];
        let cancel = CancelToken::new();
        let mut surface = PixmapSurface::new(100, 100).unwrap();

        let style_a = fill_style();
        r.render(&features, &style_a, &viewport(), &mut surface, &cancel).unwrap();

        let style_b = fill_style();
        let stats = r
            .render(&features, &style_b, &viewport(), &mut surface, &cancel)
            .unwrap();
        assert_eq!(stats.objects_built, 1);
        assert_eq!(stats.cache_reused, 0);
    }

    #[test]
    fn test_envelope_gate_skips_outside_features() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let features = vec![square("f.in", 10.0, 40.0), square("f.out", 500.0, 600.0)];

        let stats = r
            .render(&features, &fill_style(), &viewport(), &mut surface, &CancelToken::new())
            .unwrap();
        assert_eq!(stats.features_seen, 2);
        assert_eq!(stats.features_skipped, 1);
        assert_eq!(stats.objects_drawn, 1);
    }

    #[test]
    fn test_non_renderable_does_not_poison_the_pass() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let features = vec![
            square("f.1", 10.0, 40.0),
            Feature::new("f.broken", "areas", None),
            square("f.3", 50.0, 90.0),
        ];

        let stats = r
            .render(&features, &fill_style(), &viewport(), &mut surface, &CancelToken::new())
            .unwrap();
        // The geometry-less feature builds a sentinel but draws nothing.
        assert_eq!(stats.objects_built, 3);
        assert_eq!(stats.objects_drawn, 2);
    }

    #[test]
    fn test_cancellation_aborts_the_pass() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = r
            .render(
                &[square("f.1", 10.0, 40.0)],
                &fill_style(),
                &viewport(),
                &mut surface,
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
    }

    #[test]
    fn test_filter_and_else_rule_selection() {
        let style = Style {
            name: "graded".to_string(),
            feature_type_styles: vec![FeatureTypeStyle {
                feature_type_name: "pois".to_string(),
                rules: vec![
                    Rule {
                        filter: Some(Filter::compare("value", CompareOp::Gt, 5.0)),
                        symbolizers: vec![Symbolizer::Line(LineSymbolizer {
                            stroke: Some(Stroke::solid("#0000FF", 2.0)),
                            ..Default::default()
                        })],
                        ..Default::default()
                    },
                    Rule {
                        is_else_filter: true,
                        symbolizers: vec![Symbolizer::Line(LineSymbolizer {
                            stroke: Some(Stroke::solid("#00FF00", 2.0)),
                            ..Default::default()
                        })],
                        ..Default::default()
                    },
                ],
            }],
        };

        let geom: geo_types::Geometry<f64> =
            geo_types::LineString::from(vec![(10.0, 50.0), (90.0, 50.0)]).into();
        let features = vec![
            Feature::new("f.hi", "pois", Some(geom.clone()))
                .with_attribute("value", AttributeValue::Number(9.0)),
            Feature::new("f.lo", "pois", Some(geom))
                .with_attribute("value", AttributeValue::Number(1.0)),
        ];

        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let stats = r
            .render(&features, &style, &viewport(), &mut surface, &CancelToken::new())
            .unwrap();
        // One feature per rule: both draw, neither matches twice.
        assert_eq!(stats.rules_matched, 2);
        assert_eq!(stats.objects_drawn, 2);
    }

    #[test]
    fn test_point_feature_ignores_unmatched_feature_type() {
        let mut r = renderer();
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let features = vec![Feature::new(
            "f.other",
            "roads",
            Some(point! { x: 50.0, y: 50.0 }.into()),
        )];

        let stats = r
            .render(&features, &fill_style(), &viewport(), &mut surface, &CancelToken::new())
            .unwrap();
        assert_eq!(stats.features_seen, 0);
        assert_eq!(stats.objects_drawn, 0);
    }
}

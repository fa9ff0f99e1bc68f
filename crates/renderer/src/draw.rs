//! Symbol execution: draws rendered objects onto a surface.
//!
//! All visual parameters (colours, opacities, widths, sizes, rotations)
//! are evaluated against the feature here, at draw time, so one symbolizer
//! instance can vary feature to feature. Geometry and resolved resources
//! come pre-computed in the rendered object.

use std::sync::Arc;

use map_common::style::{
    self, Fill, Graphic, GraphicSymbol, LineCapStyle, LineJoinStyle, Stroke, Symbolizer,
};
use map_common::{Expression, Feature, RenderError, RenderResult};
use rusttype::{Font, Scale};
use tiny_skia::{FillRule, Path, PathBuilder, Pixmap, Transform};

use crate::fonts::FontCache;
use crate::rendered::{
    RenderedObject, RenderedPoint, RenderedPolygon, RenderedRaster, RenderedText,
    ResolvedPlacement, ResolvedSymbol,
};
use crate::surface::{PaintSpec, Surface, TransformGuard};
use crate::symbols::SymbolCache;
use crate::transform::WorldToDevice;

/// Fallback fill colour when a colour expression does not resolve.
const DEFAULT_COLOR: (u8, u8, u8) = (128, 128, 128);

/// Executes rendered objects against a surface.
pub struct SymbolRenderer<'a> {
    pub symbols: &'a SymbolCache,
    pub fonts: &'a FontCache,
}

impl SymbolRenderer<'_> {
    /// Draw one rendered object. The symbolizer must be the one the object
    /// was built from; the orchestrator guarantees the pairing.
    pub fn render(
        &self,
        object: &RenderedObject,
        symbolizer: &Symbolizer,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        match (object, symbolizer) {
            (RenderedObject::NotRenderable, _) => Ok(()),
            (RenderedObject::Polygon(poly), Symbolizer::Polygon(sym)) => {
                self.render_polygon(poly, sym, feature, world, surface)
            }
            (RenderedObject::Line(line), Symbolizer::Line(sym)) => {
                match &sym.stroke {
                    Some(stroke) => self
                        .render_stroke(&line.path, &line.lines, stroke, feature, world, surface),
                    None => Ok(()),
                }
            }
            (RenderedObject::Point(point), Symbolizer::Point(sym)) => {
                self.render_point(point, &sym.graphic, feature, world, surface)
            }
            (RenderedObject::Text(text), Symbolizer::Text(sym)) => {
                self.render_text(text, sym, feature, world, surface)
            }
            (RenderedObject::Raster(raster), Symbolizer::Raster(sym)) => {
                self.render_raster(raster, sym, feature, world, surface)
            }
            _ => Err(RenderError::Unexpected(
                "rendered object does not match its symbolizer".to_string(),
            )),
        }
    }

    // === Polygon ===

    fn render_polygon(
        &self,
        poly: &RenderedPolygon,
        sym: &style::PolygonSymbolizer,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        // Fill first, then stroke, so the outline stays visible.
        if let Some(fill) = &sym.fill {
            let paint = self.fill_paint(fill, feature, world)?;
            let mut guard = TransformGuard::new(surface, world.to_skia());
            guard.fill_path(&poly.area, &paint, FillRule::EvenOdd);
        }
        if let Some(stroke) = &sym.stroke {
            self.render_stroke(&poly.area, &poly.outlines, stroke, feature, world, surface)?;
        }
        Ok(())
    }

    /// Resolve a fill to a paint: solid colour, or a repeating texture
    /// rasterized from the fill's graphic.
    fn fill_paint(
        &self,
        fill: &Fill,
        feature: &Feature,
        world: &WorldToDevice,
    ) -> RenderResult<PaintSpec> {
        let opacity = fill.opacity.number_or(feature, 1.0) as f32;
        if let Some(graphic) = &fill.graphic {
            let tile = self.rasterize_graphic(graphic, feature)?;
            // The fill happens under the world transform; the inverse
            // horizontal scale keeps the tile at its requested pixel size.
            return Ok(PaintSpec::Texture {
                pixmap: tile,
                scale: (1.0 / world.scale_x()) as f32,
                opacity,
            });
        }
        Ok(PaintSpec::solid(
            resolve_color(&fill.color, feature),
            opacity,
        ))
    }

    // === Stroke (shared by lines and polygon outlines) ===

    fn render_stroke(
        &self,
        path: &Path,
        lines: &[Vec<(f64, f64)>],
        stroke: &Stroke,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        if let Some(graphic) = &stroke.graphic {
            return self.render_graphic_stroke(lines, graphic, feature, world, surface);
        }

        let paint = PaintSpec::solid(
            resolve_color(&stroke.color, feature),
            stroke.opacity.number_or(feature, 1.0) as f32,
        );
        let device_stroke = device_stroke(stroke, feature, world);
        let mut guard = TransformGuard::new(surface, world.to_skia());
        guard.stroke_path(path, &paint, &device_stroke);
        Ok(())
    }

    /// Stamp the stroke's symbol image along each line segment at a
    /// spacing equal to the image's width, clipping the final stamp to the
    /// segment's remaining length.
    fn render_graphic_stroke(
        &self,
        lines: &[Vec<(f64, f64)>],
        graphic: &Graphic,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        let stamp = self.rasterize_graphic(graphic, feature)?;
        let step = stamp.width() as f64;
        if step <= 0.0 {
            return Ok(());
        }
        let half_height = stamp.height() as f32 / 2.0;

        for line in lines {
            let device: Vec<(f64, f64)> = line.iter().map(|&(x, y)| world.apply(x, y)).collect();
            for pair in device.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                let length = (x1 - x0).hypot(y1 - y0);
                if length <= 0.0 {
                    continue;
                }
                let angle_deg = (y1 - y0).atan2(x1 - x0).to_degrees() as f32;
                let (ux, uy) = ((x1 - x0) / length, (y1 - y0) / length);

                let mut travelled = 0.0;
                while travelled < length {
                    let remaining = length - travelled;
                    let image = if remaining >= step {
                        stamp.clone()
                    } else {
                        // Partial stamp at the segment tail.
                        match crop_columns(&stamp, remaining.ceil() as u32) {
                            Some(cropped) => Arc::new(cropped),
                            None => break,
                        }
                    };

                    let px = (x0 + ux * travelled) as f32;
                    let py = (y0 + uy * travelled) as f32;
                    let placement = Transform::from_translate(0.0, -half_height)
                        .post_rotate(angle_deg)
                        .post_translate(px, py);
                    surface.draw_pixmap(&image, placement, 1.0);

                    travelled += step;
                }
            }
        }
        Ok(())
    }

    // === Point ===

    fn render_point(
        &self,
        point: &RenderedPoint,
        graphic: &Graphic,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        let size = graphic.size.number_or(feature, 16.0);
        let opacity = graphic.opacity.number_or(feature, 1.0) as f32;
        // Rotation is degrees from north in the style; the transform may
        // already carry rotation from a concatenated widget frame, which
        // the symbol must not inherit twice.
        let rotation_deg =
            graphic.rotation.number_or(feature, 0.0) - world.implied_rotation().to_degrees();
        let (ax, ay) = world.apply(point.x, point.y);

        match &point.symbol {
            ResolvedSymbol::Mark { shape, candidate } => {
                let (fill, stroke) = mark_parts(graphic, *candidate);
                let local = Transform::from_scale(size as f32, size as f32)
                    .post_rotate(rotation_deg as f32)
                    .post_translate(ax as f32, ay as f32);
                let mut guard = TransformGuard::new(surface, local);

                if let Some(fill) = fill {
                    let paint = PaintSpec::solid(
                        resolve_color(&fill.color, feature),
                        fill.opacity.number_or(feature, 1.0) as f32 * opacity,
                    );
                    guard.fill_path(shape, &paint, FillRule::EvenOdd);
                }
                if let Some(stroke) = stroke {
                    let paint = PaintSpec::solid(
                        resolve_color(&stroke.color, feature),
                        stroke.opacity.number_or(feature, 1.0) as f32 * opacity,
                    );
                    let width = stroke.width.number_or(feature, 1.0);
                    let device_stroke = tiny_skia::Stroke {
                        // The local transform scales the unit shape by
                        // `size`; the width compensates back to pixels.
                        width: (width / size).max(f64::EPSILON) as f32,
                        line_cap: line_cap(stroke.line_cap),
                        line_join: line_join(stroke.line_join),
                        ..tiny_skia::Stroke::default()
                    };
                    guard.stroke_path(shape, &paint, &device_stroke);
                }
                Ok(())
            }
            ResolvedSymbol::Image(pixmap) => {
                let (w, h) = (pixmap.width() as f64, pixmap.height() as f64);
                let scale = (size / w.max(h)) as f32;
                let placement = Transform::from_translate(-(w as f32) / 2.0, -(h as f32) / 2.0)
                    .post_scale(scale, scale)
                    .post_rotate(rotation_deg as f32)
                    .post_translate(ax as f32, ay as f32);
                surface.draw_pixmap(pixmap, placement, opacity);
                Ok(())
            }
            ResolvedSymbol::TextMark { font, text } => {
                let Some(run) = GlyphRun::layout(font, text, size as f32) else {
                    return Ok(());
                };
                // Centered on the anchor like any other mark.
                let local = Transform::from_translate(
                    -run.width / 2.0,
                    (run.ascent - run.descent) / 2.0,
                )
                .post_rotate(rotation_deg as f32)
                .post_translate(ax as f32, ay as f32);
                let mut guard = TransformGuard::new(surface, local);
                guard.fill_path(
                    &run.path,
                    &PaintSpec::solid((0, 0, 0), opacity),
                    FillRule::EvenOdd,
                );
                Ok(())
            }
        }
    }

    // === Text ===

    fn render_text(
        &self,
        text: &RenderedText,
        sym: &style::TextSymbolizer,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        let size = sym.font.size.number_or(feature, 10.0) as f32;
        let Some(run) = GlyphRun::layout(&text.font, &text.label, size) else {
            return Ok(());
        };

        // Device anchor, label-space offset, and rotation per placement.
        let (anchor, offset, rotation_deg) = match (&text.placement, &sym.placement) {
            (
                ResolvedPlacement::Point { x, y },
                style::LabelPlacement::Point {
                    anchor,
                    displacement,
                    rotation,
                },
            ) => {
                let device = world.apply(*x, *y);
                let (fx, fy) = *anchor;
                let dx = -fx as f32 * run.width + displacement.0 as f32;
                let dy = -(run.descent - fy as f32 * (run.descent + run.ascent))
                    - displacement.1 as f32;
                let rot = rotation.number_or(feature, 0.0) - world.implied_rotation().to_degrees();
                (device, (dx, dy), rot)
            }
            (
                ResolvedPlacement::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    offset,
                },
                _,
            ) => {
                let (dx0, dy0) = world.apply(*x0, *y0);
                let (dx1, dy1) = world.apply(*x1, *y1);
                let mid = ((dx0 + dx1) / 2.0, (dy0 + dy1) / 2.0);
                let mut angle = (dy1 - dy0).atan2(dx1 - dx0).to_degrees();
                // Keep the label upright.
                if angle > 90.0 {
                    angle -= 180.0;
                } else if angle < -90.0 {
                    angle += 180.0;
                }
                (mid, (-run.width / 2.0, -*offset as f32), angle)
            }
            // A point-resolved placement with a line placement spec (or
            // vice versa) cannot happen out of the factory.
            _ => {
                return Err(RenderError::Unexpected(
                    "label placement mismatch".to_string(),
                ))
            }
        };

        let local = Transform::from_translate(offset.0, offset.1)
            .post_rotate(rotation_deg as f32)
            .post_translate(anchor.0 as f32, anchor.1 as f32);
        let mut guard = TransformGuard::new(surface, local);

        // Halo goes beneath the glyphs: the outline stroked wide and
        // filled with the halo's colour.
        if let Some(halo) = &sym.halo {
            let paint = PaintSpec::solid(
                resolve_color(&halo.fill.color, feature),
                halo.fill.opacity.number_or(feature, 1.0) as f32,
            );
            let outline = tiny_skia::Stroke {
                width: (halo.radius * 2.0) as f32,
                line_cap: tiny_skia::LineCap::Round,
                line_join: tiny_skia::LineJoin::Round,
                ..tiny_skia::Stroke::default()
            };
            guard.stroke_path(&run.path, &paint, &outline);
        }

        let paint = PaintSpec::solid(
            resolve_color(&sym.fill.color, feature),
            sym.fill.opacity.number_or(feature, 1.0) as f32,
        );
        guard.fill_path(&run.path, &paint, FillRule::EvenOdd);
        Ok(())
    }

    // === Raster ===

    fn render_raster(
        &self,
        raster: &RenderedRaster,
        sym: &style::RasterSymbolizer,
        feature: &Feature,
        world: &WorldToDevice,
        surface: &mut dyn Surface,
    ) -> RenderResult<()> {
        let opacity = sym.opacity.number_or(feature, 1.0) as f32;
        let env = &raster.envelope;

        // Pixel space -> world space (top row at max_y), then the world
        // transform takes it to the device.
        let to_world = Transform::from_row(
            (env.width() / raster.pixmap.width() as f64) as f32,
            0.0,
            0.0,
            (-env.height() / raster.pixmap.height() as f64) as f32,
            env.min_x as f32,
            env.max_y as f32,
        );
        let placement = to_world.post_concat(world.to_skia());
        surface.draw_pixmap(&raster.pixmap, placement, opacity);
        Ok(())
    }

    // === Graphic rasterization (fills, strokes) ===

    /// Rasterize a graphic's first resolvable candidate into a bitmap at
    /// its requested size, for texture fills and graphic strokes.
    fn rasterize_graphic(
        &self,
        graphic: &Graphic,
        feature: &Feature,
    ) -> RenderResult<Arc<Pixmap>> {
        let size = graphic.size.number_or(feature, 16.0) as f32;

        for symbol in &graphic.symbols {
            match symbol {
                GraphicSymbol::External { href, format } => {
                    match self.symbols.resolve_external(href, format.as_deref()) {
                        Ok(image) => return scale_to(&image, size),
                        Err(_) => continue,
                    }
                }
                GraphicSymbol::Mark { name, fill, stroke } => {
                    let fill = fill.as_ref().map(|f| {
                        (
                            resolve_color(&f.color, feature),
                            f.opacity.number_or(feature, 1.0) as f32,
                        )
                    });
                    let stroke = stroke.as_ref().map(|s| {
                        (
                            (
                                resolve_color(&s.color, feature),
                                s.opacity.number_or(feature, 1.0) as f32,
                            ),
                            s.width.number_or(feature, 1.0) as f32,
                        )
                    });
                    let fill = fill.map(|((r, g, b), o)| (r, g, b, o));
                    let stroke = stroke.map(|(((r, g, b), o), w)| ((r, g, b, o), w));
                    match self.symbols.rasterize_mark(name, size, fill, stroke) {
                        Ok(pixmap) => return Ok(pixmap),
                        Err(_) => continue,
                    }
                }
                GraphicSymbol::TextMark { text, families } => {
                    let Some(text) = text.text(feature).filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    let Some(font) = self.fonts.resolve(families) else {
                        continue;
                    };
                    if let Some(pixmap) = rasterize_text_mark(&font, &text, size) {
                        return Ok(Arc::new(pixmap));
                    }
                }
            }
        }

        Err(RenderError::ResourceUnavailable(
            "no graphic candidate resolved".to_string(),
        ))
    }
}

/// Map a style stroke to a device stroke under the world transform: widths
/// and dash lengths arrive in pixels and are divided by the horizontal
/// scale factor. Only the X factor is used even when X/Y scales differ,
/// matching the legacy one-axis approximation.
fn device_stroke(stroke: &Stroke, feature: &Feature, world: &WorldToDevice) -> tiny_skia::Stroke {
    let scale = world.scale_x();
    let width = stroke.width.number_or(feature, 1.0) / scale;

    let dash = if stroke.dash_array.is_empty() {
        None
    } else {
        let lengths: Vec<f32> = stroke
            .dash_array
            .iter()
            .map(|d| (*d as f64 / scale) as f32)
            .collect();
        tiny_skia::StrokeDash::new(lengths, (stroke.dash_offset as f64 / scale) as f32)
    };

    tiny_skia::Stroke {
        width: width.max(f64::EPSILON) as f32,
        line_cap: line_cap(stroke.line_cap),
        line_join: line_join(stroke.line_join),
        dash,
        ..tiny_skia::Stroke::default()
    }
}

fn line_cap(cap: LineCapStyle) -> tiny_skia::LineCap {
    match cap {
        LineCapStyle::Butt => tiny_skia::LineCap::Butt,
        LineCapStyle::Round => tiny_skia::LineCap::Round,
        LineCapStyle::Square => tiny_skia::LineCap::Square,
    }
}

fn line_join(join: LineJoinStyle) -> tiny_skia::LineJoin {
    match join {
        LineJoinStyle::Miter => tiny_skia::LineJoin::Miter,
        LineJoinStyle::Round => tiny_skia::LineJoin::Round,
        LineJoinStyle::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

/// Resolve a colour expression, falling back to the default grey.
fn resolve_color(expr: &Expression, feature: &Feature) -> (u8, u8, u8) {
    expr.text(feature)
        .and_then(|s| style::hex_color(&s))
        .unwrap_or(DEFAULT_COLOR)
}

/// The fill/stroke of the mark candidate that won at build time.
fn mark_parts(graphic: &Graphic, candidate: usize) -> (Option<&Fill>, Option<&Stroke>) {
    match graphic.symbols.get(candidate) {
        Some(GraphicSymbol::Mark { fill, stroke, .. }) => (fill.as_ref(), stroke.as_ref()),
        _ => (None, None),
    }
}

/// A laid-out glyph run: the outline path (baseline at y=0, x from 0) and
/// its metrics in pixels.
struct GlyphRun {
    path: Path,
    width: f32,
    ascent: f32,
    /// Distance from baseline to the bottom of the box, positive down.
    descent: f32,
}

impl GlyphRun {
    fn layout(font: &Font<'static>, text: &str, size: f32) -> Option<GlyphRun> {
        let scale = Scale::uniform(size);
        let v_metrics = font.v_metrics(scale);
        let glyphs: Vec<_> = font
            .layout(text, scale, rusttype::point(0.0, 0.0))
            .collect();
        let width = glyphs
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);

        let mut pb = PathBuilder::new();
        for glyph in &glyphs {
            let pos = glyph.position();
            let mut outline = GlyphOutline {
                pb: &mut pb,
                dx: pos.x,
                dy: pos.y,
            };
            glyph.unpositioned().build_outline(&mut outline);
        }

        Some(GlyphRun {
            path: pb.finish()?,
            width,
            ascent: v_metrics.ascent,
            descent: -v_metrics.descent,
        })
    }
}

/// Adapter feeding glyph outlines into a path builder at a pen position.
struct GlyphOutline<'a> {
    pb: &'a mut PathBuilder,
    dx: f32,
    dy: f32,
}

impl rusttype::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.pb.move_to(x + self.dx, y + self.dy);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.pb.line_to(x + self.dx, y + self.dy);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.pb
            .quad_to(x1 + self.dx, y1 + self.dy, x + self.dx, y + self.dy);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.pb.cubic_to(
            x1 + self.dx,
            y1 + self.dy,
            x2 + self.dx,
            y2 + self.dy,
            x + self.dx,
            y + self.dy,
        );
    }

    fn close(&mut self) {
        self.pb.close();
    }
}

/// Rasterize a glyph run into a tight pixmap, for text-mark graphics.
fn rasterize_text_mark(font: &Arc<Font<'static>>, text: &str, size: f32) -> Option<Pixmap> {
    let run = GlyphRun::layout(font, text, size)?;
    let w = run.width.ceil().max(1.0) as u32;
    let h = (run.ascent + run.descent).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(w, h)?;

    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    pixmap.fill_path(
        &run.path,
        &paint,
        FillRule::EvenOdd,
        Transform::from_translate(0.0, run.ascent),
        None,
    );
    Some(pixmap)
}

/// Scale an image to fit `size` pixels on its larger side. Returns the
/// original when it already fits exactly.
fn scale_to(image: &Arc<Pixmap>, size: f32) -> RenderResult<Arc<Pixmap>> {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if (w.max(h) - size).abs() < 0.5 {
        return Ok(image.clone());
    }
    let scale = size / w.max(h);
    let out_w = ((w * scale).ceil() as u32).max(1);
    let out_h = ((h * scale).ceil() as u32).max(1);
    let mut out = Pixmap::new(out_w, out_h).ok_or_else(|| {
        RenderError::ResourceUnavailable("zero-size graphic raster".to_string())
    })?;
    out.draw_pixmap(
        0,
        0,
        image.as_ref().as_ref(),
        &tiny_skia::PixmapPaint::default(),
        Transform::from_scale(scale, scale),
        None,
    );
    Ok(Arc::new(out))
}

/// Copy the leftmost `width` columns of a stamp, for the clipped final
/// stamp of a graphic stroke.
fn crop_columns(stamp: &Arc<Pixmap>, width: u32) -> Option<Pixmap> {
    let width = width.min(stamp.width());
    if width == 0 {
        return None;
    }
    let mut out = Pixmap::new(width, stamp.height())?;
    let src = stamp.pixels();
    let dst = out.pixels_mut();
    let (src_w, dst_w) = (stamp.width() as usize, width as usize);
    for row in 0..stamp.height() as usize {
        dst[row * dst_w..(row + 1) * dst_w]
            .copy_from_slice(&src[row * src_w..row * src_w + dst_w]);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::AttributeValue;

    #[test]
    fn test_resolve_color_fallback() {
        let f = Feature::new("f", "t", None);
        assert_eq!(
            resolve_color(&Expression::Text("#FF0000".into()), &f),
            (255, 0, 0)
        );
        assert_eq!(
            resolve_color(&Expression::Text("not-a-color".into()), &f),
            DEFAULT_COLOR
        );
        assert_eq!(
            resolve_color(&Expression::Attribute("missing".into()), &f),
            DEFAULT_COLOR
        );
    }

    #[test]
    fn test_resolve_color_from_attribute() {
        let f = Feature::new("f", "t", None)
            .with_attribute("col", AttributeValue::Text("#00FF00".into()));
        assert_eq!(
            resolve_color(&Expression::Attribute("col".into()), &f),
            (0, 255, 0)
        );
    }

    #[test]
    fn test_device_stroke_scales_width_and_dashes() {
        let vp = map_common::Viewport::new(
            map_common::BoundingBox::new(0.0, 0.0, 20.0, 20.0),
            100,
            100,
        );
        let world = WorldToDevice::compute(&vp); // scale_x = 5
        let f = Feature::new("f", "t", None);
        let stroke = Stroke {
            width: Expression::Number(10.0),
            dash_array: vec![5.0, 5.0],
            ..Default::default()
        };
        let device = device_stroke(&stroke, &f, &world);
        assert_eq!(device.width, 2.0);
        assert!(device.dash.is_some());
    }

    #[test]
    fn test_crop_columns() {
        let mut pixmap = Pixmap::new(4, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 20, 30, 255));
        let stamp = Arc::new(pixmap);

        let cropped = crop_columns(&stamp, 2).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.pixels()[0].blue(), 30);

        assert!(crop_columns(&stamp, 0).is_none());
        // Wider than the source clamps to the source.
        assert_eq!(crop_columns(&stamp, 9).unwrap().width(), 4);
    }
}

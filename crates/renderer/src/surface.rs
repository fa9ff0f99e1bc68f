//! The 2D drawing surface abstraction.
//!
//! The engine draws through this trait so the production target (a
//! tiny-skia pixmap) and test doubles (a call recorder) are
//! interchangeable. The surface carries a current transform; path drawing
//! happens under it, pixmap blits carry their own placement transform.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tiny_skia::{
    FillRule, Paint, Path, Pattern, Pixmap, PixmapPaint, SpreadMode, Stroke, Transform,
};

/// How a path is painted: a solid colour with its own alpha, or a
/// repeating texture tile.
#[derive(Debug, Clone)]
pub enum PaintSpec {
    Solid {
        color: (u8, u8, u8),
        opacity: f32,
    },
    Texture {
        pixmap: Arc<Pixmap>,
        /// Extra scale applied to the tile.
        scale: f32,
        opacity: f32,
    },
}

impl PaintSpec {
    pub fn solid(color: (u8, u8, u8), opacity: f32) -> Self {
        PaintSpec::Solid {
            color,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// The effective alpha of this paint, for draw-order assertions.
    pub fn opacity(&self) -> f32 {
        match self {
            PaintSpec::Solid { opacity, .. } => *opacity,
            PaintSpec::Texture { opacity, .. } => *opacity,
        }
    }
}

/// A 2D device surface the renderer can draw on.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// The current transform applied to path drawing.
    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    fn fill_path(&mut self, path: &Path, paint: &PaintSpec, fill_rule: FillRule);
    fn stroke_path(&mut self, path: &Path, paint: &PaintSpec, stroke: &Stroke);

    /// Blit a pixmap under the given placement transform (device space;
    /// the current transform does not apply).
    fn draw_pixmap(&mut self, pixmap: &Pixmap, placement: Transform, opacity: f32);
}

/// Scoped transform override: sets a transform on creation and restores
/// the previous one on drop, even if drawing bails early.
pub struct TransformGuard<'a> {
    surface: &'a mut dyn Surface,
    saved: Transform,
}

impl<'a> TransformGuard<'a> {
    pub fn new(surface: &'a mut dyn Surface, transform: Transform) -> Self {
        let saved = surface.transform();
        surface.set_transform(transform);
        Self { surface, saved }
    }
}

impl<'a> Drop for TransformGuard<'a> {
    fn drop(&mut self) {
        self.surface.set_transform(self.saved);
    }
}

impl<'a> Deref for TransformGuard<'a> {
    type Target = dyn Surface + 'a;

    fn deref(&self) -> &Self::Target {
        self.surface
    }
}

impl<'a> DerefMut for TransformGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.surface
    }
}

/// The production surface: an owned tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    transform: Transform,
}

impl PixmapSurface {
    /// A transparent surface, `None` when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            transform: Transform::identity(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Encode the surface contents as a PNG via the snapshot encoder.
    pub fn encode_png(&self) -> Result<Vec<u8>, String> {
        crate::png::encode_auto(&self.pixmap)
    }

    fn resolve_paint<'p>(&self, spec: &'p PaintSpec) -> Paint<'p> {
        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };
        match spec {
            PaintSpec::Solid { color, opacity } => {
                let (r, g, b) = *color;
                paint.set_color_rgba8(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0) as u8);
            }
            PaintSpec::Texture {
                pixmap,
                scale,
                opacity,
            } => {
                paint.shader = Pattern::new(
                    pixmap.as_ref().as_ref(),
                    SpreadMode::Repeat,
                    tiny_skia::FilterQuality::Bilinear,
                    opacity.clamp(0.0, 1.0),
                    Transform::from_scale(*scale, *scale),
                );
            }
        }
        paint
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn fill_path(&mut self, path: &Path, paint: &PaintSpec, fill_rule: FillRule) {
        let paint = self.resolve_paint(paint);
        self.pixmap
            .fill_path(path, &paint, fill_rule, self.transform, None);
    }

    fn stroke_path(&mut self, path: &Path, paint: &PaintSpec, stroke: &Stroke) {
        let paint = self.resolve_paint(paint);
        self.pixmap
            .stroke_path(path, &paint, stroke, self.transform, None);
    }

    fn draw_pixmap(&mut self, pixmap: &Pixmap, placement: Transform, opacity: f32) {
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, pixmap.as_ref(), &paint, placement, None);
    }
}

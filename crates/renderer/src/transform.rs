//! World-to-device affine transform composition.
//!
//! Maps world coordinates (map units, Y up) onto device pixels (Y down) for
//! a given envelope/viewport pair. The horizontal scale factor also yields
//! the scale denominator that gates rule applicability.

use map_common::{BoundingBox, Viewport};
use tiny_skia::Transform;

/// A 2x3 affine transform from world to device coordinates, kept in f64 so
/// large projected coordinates survive the math before hitting the f32
/// raster surface.
///
/// Maps (x, y) to (sx*x + kx*y + tx, ky*x + sy*y + ty).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldToDevice {
    pub sx: f64,
    pub kx: f64,
    pub ky: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl WorldToDevice {
    pub const IDENTITY: WorldToDevice = WorldToDevice {
        sx: 1.0,
        kx: 0.0,
        ky: 0.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Derive the transform for a viewport:
    /// `[sx, 0, 0, -sy, tx, ty]` with the Y axis flipped (map Y grows up,
    /// device Y grows down).
    ///
    /// A degenerate viewport produces an infinite/NaN transform; callers
    /// gate on [`Viewport::is_degenerate`] before computing.
    pub fn compute(viewport: &Viewport) -> Self {
        let env: &BoundingBox = &viewport.envelope;
        let sx = viewport.width as f64 / env.width();
        let sy = viewport.height as f64 / env.height();

        Self {
            sx,
            kx: 0.0,
            ky: 0.0,
            sy: -sy,
            tx: -env.min_x * sx,
            ty: env.min_y * sy + viewport.height as f64,
        }
    }

    /// Compose with an outer (device-side) transform: the result applies
    /// `self` first, then `outer`. Used by the concatenate mode when the
    /// surface already carries a widget transform.
    pub fn then(&self, outer: &WorldToDevice) -> Self {
        Self {
            sx: outer.sx * self.sx + outer.kx * self.ky,
            kx: outer.sx * self.kx + outer.kx * self.sy,
            ky: outer.ky * self.sx + outer.sy * self.ky,
            sy: outer.ky * self.kx + outer.sy * self.sy,
            tx: outer.sx * self.tx + outer.kx * self.ty + outer.tx,
            ty: outer.ky * self.tx + outer.sy * self.ty + outer.ty,
        }
    }

    /// Transform a world point to device pixels.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.sx * x + self.kx * y + self.tx,
            self.ky * x + self.sy * y + self.ty,
        )
    }

    /// The scale denominator used for rule applicability: the reciprocal of
    /// the horizontal scale factor. Computed once per pass and reused for
    /// every feature/rule pair.
    pub fn scale_denominator(&self) -> f64 {
        1.0 / self.sx
    }

    /// Horizontal scale factor (device pixels per world unit). Stroke
    /// widths and dash lengths specified in pixels are divided by this when
    /// drawn under the world transform. Only the X factor is used even for
    /// anisotropic transforms, matching the legacy behavior.
    pub fn scale_x(&self) -> f64 {
        self.sx
    }

    /// The rotation already carried by the transform, recovered as
    /// atan(shearY / scaleY). A transform concatenated from a rotated
    /// widget frame carries rotation that point symbols and labels must
    /// subtract to honor their requested rotation.
    pub fn implied_rotation(&self) -> f64 {
        (self.ky / self.sy).atan()
    }

    /// Ratio of vertical to horizontal scale magnitude. Point symbols
    /// multiply their Y scale by this so they render isotropically in
    /// device pixels even under anisotropic world-to-device scale.
    pub fn anisotropy(&self) -> f64 {
        (self.sy / self.sx).abs()
    }

    /// Lossy conversion for the raster surface.
    pub fn to_skia(&self) -> Transform {
        Transform::from_row(
            self.sx as f32,
            self.ky as f32,
            self.kx as f32,
            self.sy as f32,
            self.tx as f32,
            self.ty as f32,
        )
    }

    pub fn from_skia(t: Transform) -> Self {
        Self {
            sx: t.sx as f64,
            kx: t.kx as f64,
            ky: t.ky as f64,
            sy: t.sy as f64,
            tx: t.tx as f64,
            ty: t.ty as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(BoundingBox::new(0.0, 0.0, 20.0, 20.0), 100, 100)
    }

    #[test]
    fn test_compute_matrix() {
        let t = WorldToDevice::compute(&viewport());
        assert_eq!(t.sx, 5.0);
        assert_eq!(t.sy, -5.0);
        assert_eq!(t.tx, 0.0);
        assert_eq!(t.ty, 100.0);
    }

    #[test]
    fn test_y_flip() {
        let t = WorldToDevice::compute(&viewport());
        // World (0, 0) is the bottom-left of the map, device bottom-left.
        assert_eq!(t.apply(0.0, 0.0), (0.0, 100.0));
        // World (20, 20) is the top-right.
        assert_eq!(t.apply(20.0, 20.0), (100.0, 0.0));
        // Center maps to center.
        assert_eq!(t.apply(10.0, 10.0), (50.0, 50.0));
    }

    #[test]
    fn test_offset_envelope() {
        let vp = Viewport::new(BoundingBox::new(100.0, 200.0, 120.0, 220.0), 100, 100);
        let t = WorldToDevice::compute(&vp);
        assert_eq!(t.apply(100.0, 200.0), (0.0, 100.0));
        assert_eq!(t.apply(120.0, 220.0), (100.0, 0.0));
    }

    #[test]
    fn test_scale_denominator() {
        let t = WorldToDevice::compute(&viewport());
        assert_eq!(t.scale_denominator(), 0.2);
    }

    #[test]
    fn test_concatenate() {
        let inner = WorldToDevice::compute(&viewport());
        // Outer frame shifts everything 10px right, 20px down.
        let outer = WorldToDevice {
            tx: 10.0,
            ty: 20.0,
            ..WorldToDevice::IDENTITY
        };
        let combined = inner.then(&outer);
        assert_eq!(combined.apply(10.0, 10.0), (60.0, 70.0));
    }

    #[test]
    fn test_implied_rotation_of_plain_transform_is_zero() {
        let t = WorldToDevice::compute(&viewport());
        assert_eq!(t.implied_rotation(), 0.0);
    }

    #[test]
    fn test_anisotropy() {
        let vp = Viewport::new(BoundingBox::new(0.0, 0.0, 20.0, 10.0), 100, 100);
        let t = WorldToDevice::compute(&vp);
        assert_eq!(t.scale_x(), 5.0);
        assert_eq!(t.anisotropy(), 2.0);
    }

    #[test]
    fn test_degenerate_envelope_is_non_finite() {
        let vp = Viewport::new(BoundingBox::new(5.0, 5.0, 5.0, 5.0), 100, 100);
        let t = WorldToDevice::compute(&vp);
        assert!(!t.sx.is_finite());
    }
}

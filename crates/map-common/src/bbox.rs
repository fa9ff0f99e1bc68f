//! World-coordinate bounding boxes.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in world (map) coordinates.
///
/// Units are whatever the feature geometries use — degrees for geographic
/// data, meters for projected data. The renderer never reprojects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A degenerate box around a single point, useful as a fold seed.
    pub fn around_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Width in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the box has no usable area (zero/negative extent, or any
    /// non-finite corner). A degenerate box cannot anchor a render pass.
    pub fn is_degenerate(&self) -> bool {
        !(self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite())
            || self.width() <= 0.0
            || self.height() <= 0.0
    }

    /// Check if this box intersects another. Touching edges count as
    /// intersecting so that features sitting exactly on the viewport edge
    /// are not culled.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if a point is contained within this box (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow the box to cover a point.
    pub fn expand_to(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// The smallest box covering both inputs.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_height() {
        let bbox = BoundingBox::new(0.0, 0.0, 20.0, 10.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn test_intersects_touching_edge() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
        let c = BoundingBox::new(10.1, 0.0, 20.0, 10.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_degenerate() {
        assert!(BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_degenerate());
        assert!(BoundingBox::new(10.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(BoundingBox::new(0.0, 0.0, f64::NAN, 10.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_union_and_expand() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 10.0));

        let mut p = BoundingBox::around_point(3.0, 4.0);
        p.expand_to(-1.0, 6.0);
        assert_eq!(p, BoundingBox::new(-1.0, 4.0, 3.0, 6.0));
    }
}

//! Device viewport: the pairing of a world envelope with a pixel rectangle.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// The target of a render pass: which part of the world is drawn, and how
/// many device pixels it maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// World envelope shown by this viewport.
    pub envelope: BoundingBox,
    /// Device width in pixels.
    pub width: u32,
    /// Device height in pixels.
    pub height: u32,
}

impl Viewport {
    pub fn new(envelope: BoundingBox, width: u32, height: u32) -> Self {
        Self {
            envelope,
            width,
            height,
        }
    }

    /// A viewport that cannot anchor a render pass: zero-size device
    /// rectangle or a degenerate envelope. The transform math would produce
    /// infinities, so passes reject these up front.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0 || self.envelope.is_degenerate()
    }
}

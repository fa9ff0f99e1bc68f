//! Grid coverages: pre-rasterized grids handed to the renderer as feature
//! attributes.
//!
//! The renderer treats a coverage as opaque pixels with a world envelope;
//! producing one (reading a data file, applying a colour ramp) is the job
//! of an upstream collaborator.

use crate::bbox::BoundingBox;

/// An RGBA raster pinned to a world envelope.
#[derive(Debug, Clone)]
pub struct GridCoverage {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major, top row first.
    pub rgba: Vec<u8>,
    /// World envelope the pixels cover.
    pub envelope: BoundingBox,
}

impl GridCoverage {
    /// Create a coverage, validating the buffer length.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>, envelope: BoundingBox) -> Option<Self> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
            envelope,
        })
    }

    /// A solid-colour coverage, mostly useful in tests.
    pub fn solid(width: u32, height: u32, color: [u8; 4], envelope: BoundingBox) -> Self {
        let mut rgba = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
            envelope,
        }
    }
}

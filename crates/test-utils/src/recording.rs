//! A surface that records draw calls instead of producing pixels.
//!
//! Draw-order and paint assertions read the call log; nothing is
//! rasterized.

use renderer::{PaintSpec, Surface};
use tiny_skia::{FillRule, Path, Pixmap, Stroke, Transform};

/// One recorded draw operation.
#[derive(Debug, Clone)]
pub enum DrawCall {
    Fill {
        color: Option<(u8, u8, u8)>,
        opacity: f32,
        transform: Transform,
    },
    Stroke {
        color: Option<(u8, u8, u8)>,
        opacity: f32,
        width: f32,
        dashed: bool,
        transform: Transform,
    },
    Blit {
        width: u32,
        height: u32,
        opacity: f32,
        placement: Transform,
    },
}

impl DrawCall {
    pub fn opacity(&self) -> f32 {
        match self {
            DrawCall::Fill { opacity, .. }
            | DrawCall::Stroke { opacity, .. }
            | DrawCall::Blit { opacity, .. } => *opacity,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, DrawCall::Fill { .. })
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self, DrawCall::Stroke { .. })
    }

    pub fn is_blit(&self) -> bool {
        matches!(self, DrawCall::Blit { .. })
    }
}

fn paint_color(paint: &PaintSpec) -> Option<(u8, u8, u8)> {
    match paint {
        PaintSpec::Solid { color, .. } => Some(*color),
        PaintSpec::Texture { .. } => None,
    }
}

/// Surface double that appends every call to a log.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    transform: Transform,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Transform::identity(),
            calls: Vec::new(),
        }
    }

    pub fn fills(&self) -> Vec<&DrawCall> {
        self.calls.iter().filter(|c| c.is_fill()).collect()
    }

    pub fn strokes(&self) -> Vec<&DrawCall> {
        self.calls.iter().filter(|c| c.is_stroke()).collect()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn fill_path(&mut self, _path: &Path, paint: &PaintSpec, _fill_rule: FillRule) {
        self.calls.push(DrawCall::Fill {
            color: paint_color(paint),
            opacity: paint.opacity(),
            transform: self.transform,
        });
    }

    fn stroke_path(&mut self, _path: &Path, paint: &PaintSpec, stroke: &Stroke) {
        self.calls.push(DrawCall::Stroke {
            color: paint_color(paint),
            opacity: paint.opacity(),
            width: stroke.width,
            dashed: stroke.dash.is_some(),
            transform: self.transform,
        });
    }

    fn draw_pixmap(&mut self, pixmap: &Pixmap, placement: Transform, opacity: f32) {
        self.calls.push(DrawCall::Blit {
            width: pixmap.width(),
            height: pixmap.height(),
            opacity,
            placement,
        });
    }
}

//! Style-driven rendering of geographic features.
//!
//! The pipeline: features + a resolved style + a viewport go in, pixels come
//! out. [`pass::MapRenderer`] drives a pass: it derives the world-to-device
//! transform, matches features against scale- and filter-gated style rules,
//! builds cached per-(feature, symbolizer) rendered objects, and draws them
//! in declaration order (painter's algorithm).

pub mod draw;
pub mod fonts;
pub mod marks;
pub mod pass;
pub mod path;
pub mod png;
pub mod rendered;
pub mod rules;
pub mod surface;
pub mod symbols;
pub mod transform;

pub use fonts::FontCache;
pub use pass::{CancelToken, MapRenderer, PassStats};
pub use surface::{PaintSpec, PixmapSurface, Surface};
pub use symbols::{FileLoader, GraphicLoader, SymbolCache};
pub use transform::WorldToDevice;

//! The symbol raster cache: external graphics and rasterized marks.
//!
//! Decoded bitmaps are expensive; the cache keeps them for its lifetime,
//! bounded by entry count with oldest-first eviction. The cache is an
//! injected object, shared via `Arc`, never process-global.
//!
//! Loads can be synchronous (decode on first use) or prefetched on a
//! background thread. A prefetch parks a channel receiver in the cache
//! slot; the first resolve blocks on `recv_timeout`, so completion is a
//! deterministic signal and a stuck loader resolves to a recorded failure
//! after the deadline instead of wedging the pass.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use map_common::{RenderError, RenderResult};
use tiny_skia::Pixmap;

/// Fetches raw bytes for an external-graphic reference. The I/O seam:
/// network fetch, test stubs, and retry policy all live behind this.
pub trait GraphicLoader: Send + Sync {
    fn load(&self, href: &str) -> RenderResult<Vec<u8>>;
}

/// Loader reading `file://` references and plain paths from disk.
#[derive(Debug, Default)]
pub struct FileLoader;

impl GraphicLoader for FileLoader {
    fn load(&self, href: &str) -> RenderResult<Vec<u8>> {
        let path = href.strip_prefix("file://").unwrap_or(href);
        std::fs::read(path)
            .map_err(|e| RenderError::ResourceUnavailable(format!("{}: {}", href, e)))
    }
}

enum CacheSlot {
    Ready(Arc<Pixmap>),
    /// The load failed or timed out; remembered so the pass does not retry.
    Failed(String),
    Pending(Receiver<Result<Pixmap, String>>),
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<String, CacheSlot>,
    insertion_order: VecDeque<String>,
}

/// Cache of decoded symbol rasters, keyed by external-graphic href or mark
/// descriptor.
pub struct SymbolCache {
    loader: Arc<dyn GraphicLoader>,
    state: Mutex<CacheState>,
    max_entries: usize,
    load_timeout: Duration,
}

impl SymbolCache {
    pub fn new(loader: Arc<dyn GraphicLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(CacheState::default()),
            max_entries: 256,
            load_timeout: Duration::from_secs(5),
        }
    }

    /// Bound the number of cached entries (oldest evicted first).
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Deadline for a prefetched load to complete before it is recorded as
    /// failed.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Resolve an external graphic to a decoded bitmap, loading and
    /// decoding synchronously unless a prefetch is already in flight.
    pub fn resolve_external(&self, href: &str, format: Option<&str>) -> RenderResult<Arc<Pixmap>> {
        // Answer hits and take over a pending receiver under the lock, but
        // never wait or decode while holding it: other callers keep moving.
        let pending = {
            let mut state = self.state.lock().expect("symbol cache poisoned");
            match state.slots.get(href) {
                Some(CacheSlot::Ready(pixmap)) => return Ok(pixmap.clone()),
                Some(CacheSlot::Failed(reason)) => {
                    return Err(RenderError::ResourceUnavailable(format!(
                        "{}: {}",
                        href, reason
                    )))
                }
                Some(CacheSlot::Pending(_)) => {
                    match state.slots.remove(href) {
                        Some(CacheSlot::Pending(rx)) => Some(rx),
                        _ => None,
                    }
                }
                None => None,
            }
        };

        let outcome = match pending {
            Some(rx) => match rx.recv_timeout(self.load_timeout) {
                Ok(Ok(pixmap)) => Ok(Arc::new(pixmap)),
                Ok(Err(reason)) => Err(reason),
                Err(_) => Err("background load timed out".to_string()),
            },
            None => self
                .loader
                .load(href)
                .and_then(|bytes| decode_graphic(&bytes, href, format))
                .map(Arc::new)
                .map_err(|e| e.to_string()),
        };

        let mut state = self.state.lock().expect("symbol cache poisoned");
        self.record(&mut state, href, outcome)
    }

    /// Start a background load for a reference so a later
    /// [`resolve_external`](Self::resolve_external) finds it decoded (or
    /// waits on its completion signal). A no-op when the reference is
    /// already cached or in flight.
    pub fn prefetch(&self, href: &str, format: Option<&str>) {
        let mut state = self.state.lock().expect("symbol cache poisoned");
        if state.slots.contains_key(href) {
            return;
        }

        let (tx, rx) = mpsc::channel();
        state.slots.insert(href.to_string(), CacheSlot::Pending(rx));
        drop(state);

        let loader = self.loader.clone();
        let href = href.to_string();
        let format = format.map(|f| f.to_string());
        std::thread::spawn(move || {
            let result = loader
                .load(&href)
                .and_then(|bytes| decode_graphic(&bytes, &href, format.as_deref()))
                .map_err(|e| e.to_string());
            // Receiver may already be gone (cache dropped); that is fine.
            let _ = tx.send(result);
        });
    }

    /// Rasterize a mark with evaluated fill/stroke into a `size`x`size`
    /// bitmap, for graphic fills and graphic strokes. Cached by the full
    /// descriptor since the evaluated parameters vary per feature.
    pub fn rasterize_mark(
        &self,
        name: &str,
        size: f32,
        fill: Option<(u8, u8, u8, f32)>,
        stroke: Option<((u8, u8, u8, f32), f32)>,
    ) -> RenderResult<Arc<Pixmap>> {
        let key = format!("mark:{}:{}:{:?}:{:?}", name.to_ascii_lowercase(), size, fill, stroke);

        let mut state = self.state.lock().expect("symbol cache poisoned");
        if let Some(CacheSlot::Ready(pixmap)) = state.slots.get(&key) {
            return Ok(pixmap.clone());
        }

        let outcome = draw_mark(name, size, fill, stroke)
            .map(Arc::new)
            .map_err(|e| e.to_string());
        self.record(&mut state, &key, outcome)
    }

    /// Number of entries currently cached (test hook).
    pub fn len(&self) -> usize {
        self.state.lock().expect("symbol cache poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(
        &self,
        state: &mut CacheState,
        key: &str,
        outcome: Result<Arc<Pixmap>, String>,
    ) -> RenderResult<Arc<Pixmap>> {
        let (slot, result) = match outcome {
            Ok(pixmap) => (CacheSlot::Ready(pixmap.clone()), Ok(pixmap)),
            Err(reason) => {
                tracing::warn!(key, reason = %reason, "Symbol resolution failed");
                (
                    CacheSlot::Failed(reason.clone()),
                    Err(RenderError::ResourceUnavailable(format!(
                        "{}: {}",
                        key, reason
                    ))),
                )
            }
        };

        state.slots.insert(key.to_string(), slot);
        if !state.insertion_order.iter().any(|k| k == key) {
            state.insertion_order.push_back(key.to_string());
        }
        self.evict(state);
        result
    }

    fn evict(&self, state: &mut CacheState) {
        while state.slots.len() > self.max_entries {
            let Some(oldest) = state.insertion_order.pop_front() else {
                break;
            };
            // Pending slots hold a live receiver; push them to the back
            // instead of dropping the completion signal.
            if matches!(state.slots.get(&oldest), Some(CacheSlot::Pending(_))) {
                state.insertion_order.push_back(oldest);
                break;
            }
            state.slots.remove(&oldest);
        }
    }
}

/// Decode raw bytes to a pixmap: SVG through usvg/resvg, everything else
/// through the image crate.
fn decode_graphic(bytes: &[u8], href: &str, format: Option<&str>) -> RenderResult<Pixmap> {
    let is_svg = format.map(|f| f.contains("svg")).unwrap_or(false)
        || href.to_ascii_lowercase().ends_with(".svg");

    if is_svg {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_data(bytes, &opt)
            .map_err(|e| RenderError::ResourceUnavailable(format!("{}: {}", href, e)))?;
        let size = tree.size();
        let (w, h) = (size.width().ceil() as u32, size.height().ceil() as u32);
        let mut pixmap = Pixmap::new(w.max(1), h.max(1)).ok_or_else(|| {
            RenderError::ResourceUnavailable(format!("{}: zero-size SVG", href))
        })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        return Ok(pixmap);
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| RenderError::ResourceUnavailable(format!("{}: {}", href, e)))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    rgba_to_pixmap(img.as_raw(), w, h)
        .ok_or_else(|| RenderError::ResourceUnavailable(format!("{}: empty image", href)))
}

/// Copy straight RGBA bytes into a premultiplied pixmap.
pub(crate) fn rgba_to_pixmap(rgba: &[u8], width: u32, height: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    for (px, chunk) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *px = tiny_skia::ColorU8::from_rgba(chunk[0], chunk[1], chunk[2], chunk[3]).premultiply();
    }
    Some(pixmap)
}

fn draw_mark(
    name: &str,
    size: f32,
    fill: Option<(u8, u8, u8, f32)>,
    stroke: Option<((u8, u8, u8, f32), f32)>,
) -> RenderResult<Pixmap> {
    let shape = crate::marks::mark_path(name)
        .ok_or_else(|| RenderError::ResourceUnavailable(format!("unknown mark '{}'", name)))?;

    let px = size.ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(px, px)
        .ok_or_else(|| RenderError::ResourceUnavailable("zero-size mark raster".to_string()))?;

    // Unit square -0.5..0.5 scaled up and centered in the pixmap.
    let t = tiny_skia::Transform::from_scale(size, size)
        .post_translate(px as f32 / 2.0, px as f32 / 2.0);

    if let Some((r, g, b, opacity)) = fill {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0) as u8);
        paint.anti_alias = true;
        pixmap.fill_path(&shape, &paint, tiny_skia::FillRule::EvenOdd, t, None);
    }
    if let Some(((r, g, b, opacity), width)) = stroke {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0) as u8);
        paint.anti_alias = true;
        let stroke = tiny_skia::Stroke {
            // The transform scales by `size`, so the width compensates.
            width: (width / size).max(f32::EPSILON),
            ..tiny_skia::Stroke::default()
        };
        pixmap.stroke_path(&shape, &paint, &stroke, t, None);
    }

    Ok(pixmap)
}

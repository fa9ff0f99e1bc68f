//! Font resolution and caching.
//!
//! Text symbolizers name a list of candidate font families; resolution
//! walks that list through a fallback chain: already-loaded cache, fonts
//! registered in-memory, then TTF/OTF files found in the system font
//! directories. A family that resolves once stays loaded for the cache's
//! lifetime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusttype::Font;

/// Families tried when a text symbolizer names no usable family at all.
const DEFAULT_FAMILIES: &[&str] = &["DejaVuSans", "DejaVu Sans", "Arial", "LiberationSans"];

/// Shared font cache. Injected into the renderer at construction; never
/// global state.
pub struct FontCache {
    loaded: Mutex<HashMap<String, Arc<Font<'static>>>>,
    /// Families known to be unresolvable, so repeated misses skip the
    /// directory scan.
    misses: Mutex<HashMap<String, ()>>,
    directories: Vec<PathBuf>,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCache {
    /// A cache scanning the platform's usual font directories.
    pub fn new() -> Self {
        Self::with_directories(system_font_directories())
    }

    /// A cache scanning only the given directories. Tests use this with an
    /// empty list to force registered-only resolution.
    pub fn with_directories(directories: Vec<PathBuf>) -> Self {
        Self {
            loaded: Mutex::new(HashMap::new()),
            misses: Mutex::new(HashMap::new()),
            directories,
        }
    }

    /// Register an in-memory font under a family name. Returns false when
    /// the bytes do not parse as a font.
    pub fn register(&self, family: &str, data: Vec<u8>) -> bool {
        match Font::try_from_vec(data) {
            Some(font) => {
                self.loaded
                    .lock()
                    .expect("font cache poisoned")
                    .insert(normalize(family), Arc::new(font));
                true
            }
            None => {
                tracing::warn!(family, "Rejected unparsable font registration");
                false
            }
        }
    }

    /// Resolve the first loadable family from the candidate list. An empty
    /// candidate list falls back to a set of commonly installed families.
    pub fn resolve(&self, families: &[String]) -> Option<Arc<Font<'static>>> {
        if families.is_empty() {
            return DEFAULT_FAMILIES
                .iter()
                .find_map(|f| self.resolve_family(f));
        }
        families.iter().find_map(|f| self.resolve_family(f))
    }

    fn resolve_family(&self, family: &str) -> Option<Arc<Font<'static>>> {
        let key = normalize(family);

        if let Some(font) = self.loaded.lock().expect("font cache poisoned").get(&key) {
            return Some(font.clone());
        }
        if self
            .misses
            .lock()
            .expect("font cache poisoned")
            .contains_key(&key)
        {
            return None;
        }

        match self.scan_directories(&key) {
            Some(font) => {
                let font = Arc::new(font);
                self.loaded
                    .lock()
                    .expect("font cache poisoned")
                    .insert(key, font.clone());
                Some(font)
            }
            None => {
                self.misses
                    .lock()
                    .expect("font cache poisoned")
                    .insert(key, ());
                None
            }
        }
    }

    /// Look for `<family>.ttf`/`.otf` (normalized, case-insensitive) under
    /// the configured directories, two levels deep.
    fn scan_directories(&self, key: &str) -> Option<Font<'static>> {
        for dir in &self.directories {
            if let Some(font) = scan_directory(dir, key, 2) {
                return Some(font);
            }
        }
        None
    }
}

fn scan_directory(dir: &Path, key: &str, depth: u8) -> Option<Font<'static>> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                if let Some(font) = scan_directory(&path, key, depth - 1) {
                    return Some(font);
                }
            }
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !ext.eq_ignore_ascii_case("ttf") && !ext.eq_ignore_ascii_case("otf") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if normalize(stem) != key {
            continue;
        }

        match std::fs::read(&path).ok().and_then(Font::try_from_vec) {
            Some(font) => return Some(font),
            None => {
                tracing::warn!(path = %path.display(), "Skipping unparsable font file");
            }
        }
    }
    None
}

/// Family names compare case-insensitively with spaces and hyphens ignored,
/// so "DejaVu Sans" finds DejaVuSans.ttf.
fn normalize(family: &str) -> String {
    family
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn system_font_directories() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".fonts"));
    }
    dirs
}

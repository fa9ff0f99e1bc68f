//! Shared test utilities for the feature-wms workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Viewport and style fixtures
//! - Synthetic feature generators
//! - A call-recording surface for draw-order assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, RecordingSurface};
//! ```

pub mod fixtures;
pub mod generators;
pub mod recording;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use recording::*;

/// Macro to skip a test when no usable font is installed.
///
/// Text rendering needs a real font file. CI images usually carry the
/// DejaVu family, but a bare environment may not, so text tests resolve
/// a font first and skip cleanly when none is found.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_font;
///
/// #[test]
/// fn test_labels() {
///     let fonts = renderer::FontCache::new();
///     let _font = require_font!(fonts);
///     // Test code using the font cache...
/// }
/// ```
#[macro_export]
macro_rules! require_font {
    ($cache:expr) => {{
        match $cache.resolve(&[]) {
            Some(font) => font,
            None => {
                eprintln!("SKIPPED: no system font found for text rendering test.");
                return;
            }
        }
    }};
}

/// Assert two floats are within `1e-6` of each other (or a given epsilon).
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-6)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $eps,
            "approx assertion failed: {} vs {} (eps {})",
            l,
            r,
            $eps
        );
    }};
}

//! The mark library: canonical vector shapes for point symbols.
//!
//! Every mark is defined on the unit square, -0.5..0.5 on both axes, and is
//! scaled/rotated at render time. Names match the usual well-known-name
//! vocabulary and are case-insensitive.

use tiny_skia::{Path, PathBuilder};

/// Shape names the library answers to.
pub const MARK_NAMES: &[&str] = &[
    "square", "circle", "triangle", "star", "cross", "x", "arrow",
];

/// Look up a mark shape by well-known name. Returns `None` for unknown
/// names so the caller can fall through to the next graphic candidate.
pub fn mark_path(name: &str) -> Option<Path> {
    match name.to_ascii_lowercase().as_str() {
        "square" => square(),
        "circle" => circle(),
        "triangle" => triangle(),
        "star" => star(),
        "cross" => cross(),
        "x" => x_mark(),
        "arrow" => arrow(),
        _ => None,
    }
}

fn square() -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(-0.5, -0.5);
    pb.line_to(0.5, -0.5);
    pb.line_to(0.5, 0.5);
    pb.line_to(-0.5, 0.5);
    pb.close();
    pb.finish()
}

fn circle() -> Option<Path> {
    PathBuilder::from_circle(0.0, 0.0, 0.5)
}

fn triangle() -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(0.0, -0.5);
    pb.line_to(0.5, 0.5);
    pb.line_to(-0.5, 0.5);
    pb.close();
    pb.finish()
}

/// Five-pointed star: alternating outer/inner vertices on two radii.
fn star() -> Option<Path> {
    let outer = 0.5_f32;
    let inner = 0.19_f32;
    let mut pb = PathBuilder::new();
    for i in 0..10 {
        let r = if i % 2 == 0 { outer } else { inner };
        // Start at the top point, proceed clockwise.
        let angle = std::f32::consts::PI * (i as f32 / 5.0) - std::f32::consts::FRAC_PI_2;
        let (x, y) = (r * angle.cos(), r * angle.sin());
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

fn cross() -> Option<Path> {
    let a = 0.125_f32; // half arm width
    let mut pb = PathBuilder::new();
    pb.move_to(-a, -0.5);
    pb.line_to(a, -0.5);
    pb.line_to(a, -a);
    pb.line_to(0.5, -a);
    pb.line_to(0.5, a);
    pb.line_to(a, a);
    pb.line_to(a, 0.5);
    pb.line_to(-a, 0.5);
    pb.line_to(-a, a);
    pb.line_to(-0.5, a);
    pb.line_to(-0.5, -a);
    pb.line_to(-a, -a);
    pb.close();
    pb.finish()
}

/// Diagonal cross: the upright cross rotated 45 degrees.
fn x_mark() -> Option<Path> {
    let path = cross()?;
    path.transform(tiny_skia::Transform::from_rotate(45.0))
}

fn arrow() -> Option<Path> {
    // Shaft plus head, pointing up (north) before rotation.
    let shaft = 0.125_f32;
    let head = 0.3_f32;
    let mut pb = PathBuilder::new();
    pb.move_to(0.0, -0.5);
    pb.line_to(head, -0.1);
    pb.line_to(shaft, -0.1);
    pb.line_to(shaft, 0.5);
    pb.line_to(-shaft, 0.5);
    pb.line_to(-shaft, -0.1);
    pb.line_to(-head, -0.1);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_names_resolve() {
        for name in MARK_NAMES {
            assert!(mark_path(name).is_some(), "mark '{}' missing", name);
        }
    }

    #[test]
    fn test_name_case_insensitive() {
        assert!(mark_path("Circle").is_some());
        assert!(mark_path("STAR").is_some());
    }

    #[test]
    fn test_unknown_name() {
        assert!(mark_path("hexagon").is_none());
    }

    #[test]
    fn test_unit_square_bounds() {
        for name in MARK_NAMES {
            let path = mark_path(name).unwrap();
            let b = path.bounds();
            assert!(
                b.left() >= -0.75 && b.right() <= 0.75 && b.top() >= -0.75 && b.bottom() <= 0.75,
                "mark '{}' escapes the unit square: {:?}",
                name,
                b
            );
        }
    }
}

//! Geometry-to-path conversion.
//!
//! Flattens geo-types geometries (already in world coordinates) into
//! tiny-skia paths of move/line/close operations. Two interpretations
//! exist: the area interpretation used by polygon fills (holes become
//! even-odd subpaths) and the line interpretation used by strokes (a
//! polygon degenerates to its rings, a point to a zero-length subpath).

use geo_types::{Geometry, LineString, Polygon};
use map_common::BoundingBox;
use tiny_skia::{Path, PathBuilder};

/// Build the area path for a geometry. Returns `None` for empty geometry.
pub fn geometry_path(geometry: &Geometry<f64>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    add_geometry(&mut pb, geometry, true);
    pb.finish()
}

/// Build the line interpretation of a geometry: polygons contribute their
/// exterior outline and interior rings, points a zero-length subpath (which
/// draws as a dot under round caps).
pub fn line_path(geometry: &Geometry<f64>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    add_geometry(&mut pb, geometry, false);
    pb.finish()
}

fn add_geometry(pb: &mut PathBuilder, geometry: &Geometry<f64>, close_rings: bool) {
    match geometry {
        Geometry::Point(p) => {
            // Zero-length subpath; visible only with round caps.
            pb.move_to(p.x() as f32, p.y() as f32);
            pb.line_to(p.x() as f32, p.y() as f32);
        }
        Geometry::MultiPoint(mp) => {
            for p in &mp.0 {
                pb.move_to(p.x() as f32, p.y() as f32);
                pb.line_to(p.x() as f32, p.y() as f32);
            }
        }
        Geometry::Line(l) => {
            pb.move_to(l.start.x as f32, l.start.y as f32);
            pb.line_to(l.end.x as f32, l.end.y as f32);
        }
        Geometry::LineString(ls) => add_line_string(pb, ls, false),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                add_line_string(pb, ls, false);
            }
        }
        Geometry::Polygon(poly) => add_polygon(pb, poly, close_rings),
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                add_polygon(pb, poly, close_rings);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                add_geometry(pb, g, close_rings);
            }
        }
        Geometry::Rect(r) => add_polygon(pb, &r.to_polygon(), close_rings),
        Geometry::Triangle(t) => add_polygon(pb, &t.to_polygon(), close_rings),
    }
}

fn add_polygon(pb: &mut PathBuilder, poly: &Polygon<f64>, close_rings: bool) {
    add_line_string(pb, poly.exterior(), close_rings);
    for ring in poly.interiors() {
        add_line_string(pb, ring, close_rings);
    }
}

fn add_line_string(pb: &mut PathBuilder, ls: &LineString<f64>, close: bool) {
    let mut coords = ls.coords();
    let Some(first) = coords.next() else {
        return;
    };
    pb.move_to(first.x as f32, first.y as f32);
    for c in coords {
        pb.line_to(c.x as f32, c.y as f32);
    }
    if close {
        pb.close();
    }
}

/// Flatten a geometry to world-space polylines, for graphic-stroke segment
/// walking and line label placement. Polygons yield their rings closed
/// (last point repeats the first); points yield single-point polylines.
pub fn flatten_lines(geometry: &Geometry<f64>) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    collect_lines(geometry, &mut out);
    out
}

fn collect_lines(geometry: &Geometry<f64>, out: &mut Vec<Vec<(f64, f64)>>) {
    match geometry {
        Geometry::Point(p) => out.push(vec![(p.x(), p.y())]),
        Geometry::MultiPoint(mp) => {
            for p in &mp.0 {
                out.push(vec![(p.x(), p.y())]);
            }
        }
        Geometry::Line(l) => out.push(vec![(l.start.x, l.start.y), (l.end.x, l.end.y)]),
        Geometry::LineString(ls) => push_ring(ls, false, out),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                push_ring(ls, false, out);
            }
        }
        Geometry::Polygon(poly) => {
            push_ring(poly.exterior(), true, out);
            for ring in poly.interiors() {
                push_ring(ring, true, out);
            }
        }
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                collect_lines(&Geometry::Polygon(poly.clone()), out);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                collect_lines(g, out);
            }
        }
        Geometry::Rect(r) => collect_lines(&Geometry::Polygon(r.to_polygon()), out),
        Geometry::Triangle(t) => collect_lines(&Geometry::Polygon(t.to_polygon()), out),
    }
}

fn push_ring(ls: &LineString<f64>, close: bool, out: &mut Vec<Vec<(f64, f64)>>) {
    if ls.0.is_empty() {
        return;
    }
    let mut line: Vec<(f64, f64)> = ls.coords().map(|c| (c.x, c.y)).collect();
    if close && line.len() > 1 && line.first() != line.last() {
        line.push(line[0]);
    }
    out.push(line);
}

/// World-space bounding box of a geometry, `None` when empty. Used for the
/// viewport reject test before rule matching.
pub fn geometry_bbox(geometry: &Geometry<f64>) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    let mut visit = |x: f64, y: f64| match bbox.as_mut() {
        Some(b) => b.expand_to(x, y),
        None => bbox = Some(BoundingBox::around_point(x, y)),
    };
    visit_coords(geometry, &mut visit);
    bbox
}

fn visit_coords(geometry: &Geometry<f64>, visit: &mut impl FnMut(f64, f64)) {
    match geometry {
        Geometry::Point(p) => visit(p.x(), p.y()),
        Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| visit(p.x(), p.y())),
        Geometry::Line(l) => {
            visit(l.start.x, l.start.y);
            visit(l.end.x, l.end.y);
        }
        Geometry::LineString(ls) => ls.coords().for_each(|c| visit(c.x, c.y)),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                ls.coords().for_each(|c| visit(c.x, c.y));
            }
        }
        Geometry::Polygon(poly) => {
            poly.exterior().coords().for_each(|c| visit(c.x, c.y));
            for ring in poly.interiors() {
                ring.coords().for_each(|c| visit(c.x, c.y));
            }
        }
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                poly.exterior().coords().for_each(|c| visit(c.x, c.y));
                for ring in poly.interiors() {
                    ring.coords().for_each(|c| visit(c.x, c.y));
                }
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                visit_coords(g, visit);
            }
        }
        Geometry::Rect(r) => {
            visit(r.min().x, r.min().y);
            visit(r.max().x, r.max().y);
        }
        Geometry::Triangle(t) => {
            visit(t.0.x, t.0.y);
            visit(t.1.x, t.1.y);
            visit(t.2.x, t.2.y);
        }
    }
}

/// A representative point for label anchoring: the point itself for points,
/// the bbox center otherwise.
pub fn representative_point(geometry: &Geometry<f64>) -> Option<(f64, f64)> {
    match geometry {
        Geometry::Point(p) => Some((p.x(), p.y())),
        other => {
            let bbox = geometry_bbox(other)?;
            Some((
                (bbox.min_x + bbox.max_x) / 2.0,
                (bbox.min_y + bbox.max_y) / 2.0,
            ))
        }
    }
}

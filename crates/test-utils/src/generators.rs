//! Synthetic feature generators.
//!
//! These build predictable geometries so tests can assert exact device
//! positions after the world-to-device transform.

use geo_types::{Geometry, LineString, Polygon};
use map_common::{AttributeValue, Feature};

/// A single point feature of the given type.
pub fn point_feature(id: &str, feature_type: &str, x: f64, y: f64) -> Feature {
    Feature::new(
        id,
        feature_type,
        Some(geo_types::Point::new(x, y).into()),
    )
}

/// An axis-aligned square polygon feature.
pub fn square_feature(id: &str, feature_type: &str, min: f64, max: f64) -> Feature {
    let ring = LineString::from(vec![
        (min, min),
        (max, min),
        (max, max),
        (min, max),
        (min, min),
    ]);
    let geom: Geometry<f64> = Polygon::new(ring, vec![]).into();
    Feature::new(id, feature_type, Some(geom))
}

/// A horizontal line feature at height `y`, spanning `x0..x1`.
pub fn line_feature(id: &str, feature_type: &str, x0: f64, x1: f64, y: f64) -> Feature {
    let geom: Geometry<f64> = LineString::from(vec![(x0, y), (x1, y)]).into();
    Feature::new(id, feature_type, Some(geom))
}

/// A grid of point features spaced `step` apart, with a `value` attribute
/// equal to `col * 1000 + row` so filters have something predictable to
/// bite on.
pub fn point_grid(feature_type: &str, cols: usize, rows: usize, step: f64) -> Vec<Feature> {
    let mut features = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let id = format!("{feature_type}.{col}_{row}");
            features.push(
                point_feature(&id, feature_type, col as f64 * step, row as f64 * step)
                    .with_attribute(
                        "value",
                        AttributeValue::Number((col * 1000 + row) as f64),
                    ),
            );
        }
    }
    features
}

/// A labelled point feature: a `name` attribute plus the point geometry.
pub fn labelled_point(id: &str, feature_type: &str, x: f64, y: f64, label: &str) -> Feature {
    point_feature(id, feature_type, x, y)
        .with_attribute("name", AttributeValue::Text(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_grid_values() {
        let grid = point_grid("pois", 3, 2, 10.0);
        assert_eq!(grid.len(), 6);

        let f = &grid[4]; // col 1, row 1
        assert_eq!(f.id(), "pois.1_1");
        assert_eq!(
            f.attribute("value").unwrap().as_f64(),
            Some(1001.0)
        );
    }

    #[test]
    fn test_square_feature_is_closed() {
        let f = square_feature("s", "areas", 0.0, 10.0);
        match f.default_geometry() {
            Some(Geometry::Polygon(p)) => {
                assert_eq!(p.exterior().0.first(), p.exterior().0.last());
            }
            _ => panic!("expected a polygon"),
        }
    }
}

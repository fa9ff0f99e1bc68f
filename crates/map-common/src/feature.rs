//! The feature record consumed by the renderer.
//!
//! Features are produced by an external datastore; the renderer only reads
//! them. A feature carries a stable id, a schema type name, a default
//! geometry, and a bag of named attribute values.

use std::collections::HashMap;
use std::sync::Arc;

use geo_types::Geometry;
use thiserror::Error;

use crate::coverage::GridCoverage;

/// A single attribute value. `Null` is a real value (an attribute that is
/// present but empty), distinct from the attribute being absent.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Null,
    Number(f64),
    Text(String),
    Boolean(bool),
    Geometry(Geometry<f64>),
    Grid(Arc<GridCoverage>),
}

impl AttributeValue {
    /// Numeric coercion: numbers pass through, booleans become 0/1, numeric
    /// strings parse. Everything else is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text coercion: strings pass through, numbers and booleans format.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(s) => Some(s.clone()),
            AttributeValue::Number(n) => Some(format_number(*n)),
            AttributeValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Format a number the way labels expect: integral values without a
/// trailing ".0".
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Typed "attribute not found" signal from [`Feature::attribute`].
#[derive(Debug, Error)]
#[error("Attribute not found: '{name}' on feature '{feature_id}'")]
pub struct AttributeError {
    pub name: String,
    pub feature_id: String,
}

/// A geographic feature: id + type name + default geometry + attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    id: String,
    type_name: String,
    geometry: Option<Geometry<f64>>,
    attributes: HashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        type_name: impl Into<String>,
        geometry: Option<Geometry<f64>>,
    ) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            geometry,
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Stable identity used for caching and diagnostics.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Schema type name, matched case-insensitively against feature-type
    /// styles.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The default geometry, if the feature has one.
    pub fn default_geometry(&self) -> Option<&Geometry<f64>> {
        self.geometry.as_ref()
    }

    /// Look up an attribute by name. Absent attributes are a typed error;
    /// present-but-null attributes return `AttributeValue::Null`.
    pub fn attribute(&self, name: &str) -> Result<&AttributeValue, AttributeError> {
        self.attributes.get(name).ok_or_else(|| AttributeError {
            name: name.to_string(),
            feature_id: self.id.clone(),
        })
    }

    /// Resolve the geometry a symbolizer asks for: a named geometry
    /// attribute when the symbolizer specifies one, else the default.
    pub fn geometry_named(&self, name: Option<&str>) -> Option<&Geometry<f64>> {
        match name {
            None => self.default_geometry(),
            Some(n) => match self.attributes.get(n) {
                Some(AttributeValue::Geometry(g)) => Some(g),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    fn sample() -> Feature {
        Feature::new("roads.1", "roads", Some(point! { x: 1.0, y: 2.0 }.into()))
            .with_attribute("name", AttributeValue::Text("M4".into()))
            .with_attribute("lanes", AttributeValue::Number(3.0))
            .with_attribute("toll", AttributeValue::Null)
    }

    #[test]
    fn test_attribute_lookup() {
        let f = sample();
        assert!(matches!(
            f.attribute("lanes"),
            Ok(AttributeValue::Number(n)) if *n == 3.0
        ));
        assert!(f.attribute("toll").unwrap().is_null());

        let err = f.attribute("surface").unwrap_err();
        assert_eq!(err.name, "surface");
        assert_eq!(err.feature_id, "roads.1");
    }

    #[test]
    fn test_coercions() {
        assert_eq!(AttributeValue::Text("42".into()).as_f64(), Some(42.0));
        assert_eq!(AttributeValue::Boolean(true).as_f64(), Some(1.0));
        assert_eq!(AttributeValue::Number(3.0).as_text().as_deref(), Some("3"));
        assert_eq!(
            AttributeValue::Number(2.5).as_text().as_deref(),
            Some("2.5")
        );
        assert!(AttributeValue::Null.as_f64().is_none());
    }

    #[test]
    fn test_named_geometry() {
        let centroid: Geometry<f64> = point! { x: 9.0, y: 9.0 }.into();
        let f = sample().with_attribute("centroid", AttributeValue::Geometry(centroid));

        assert!(f.geometry_named(None).is_some());
        assert!(matches!(
            f.geometry_named(Some("centroid")),
            Some(Geometry::Point(p)) if p.x() == 9.0
        ));
        assert!(f.geometry_named(Some("missing")).is_none());
    }
}

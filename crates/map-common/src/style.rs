//! The resolved style model: styles, feature-type styles, rules, and
//! symbolizers.
//!
//! This is already-resolved data, typically authored as JSON. Loading SLD
//! or other style dialects into this model is an upstream concern. Order is
//! meaningful everywhere: feature-type styles, rules, and symbolizers are
//! drawn in declaration order (painter's algorithm).

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::filter::Filter;

/// An ordered sequence of feature-type styles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    #[serde(default)]
    pub feature_type_styles: Vec<FeatureTypeStyle>,
}

/// Rules targeting one feature type by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTypeStyle {
    /// Schema type name this block applies to, matched case-insensitively.
    pub feature_type_name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A scale-range- and filter-gated bundle of symbolizers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: Option<String>,
    /// Inclusive lower bound on the scale denominator.
    #[serde(default)]
    pub min_scale_denominator: f64,
    /// Exclusive upper bound on the scale denominator.
    #[serde(default = "default_max_scale")]
    pub max_scale_denominator: f64,
    #[serde(default)]
    pub filter: Option<Filter>,
    /// An else rule fires only for features no non-else rule matched.
    #[serde(default)]
    pub is_else_filter: bool,
    #[serde(default)]
    pub symbolizers: Vec<Symbolizer>,
}

fn default_max_scale() -> f64 {
    f64::INFINITY
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            name: None,
            min_scale_denominator: 0.0,
            max_scale_denominator: f64::INFINITY,
            filter: None,
            is_else_filter: false,
            symbolizers: Vec::new(),
        }
    }
}

/// One paint instruction for one geometry kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbolizer {
    Polygon(PolygonSymbolizer),
    Line(LineSymbolizer),
    Point(PointSymbolizer),
    Text(TextSymbolizer),
    Raster(RasterSymbolizer),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolygonSymbolizer {
    /// Named geometry attribute; the default geometry when absent.
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub fill: Option<Fill>,
    #[serde(default)]
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineSymbolizer {
    #[serde(default)]
    pub geometry: Option<String>,
    /// A line symbolizer without a stroke draws nothing.
    #[serde(default)]
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSymbolizer {
    #[serde(default)]
    pub geometry: Option<String>,
    pub graphic: Graphic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSymbolizer {
    #[serde(default)]
    pub geometry: Option<String>,
    /// Label expression; a null label makes the feature unlabelled.
    pub label: Expression,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default)]
    pub placement: LabelPlacement,
    #[serde(default)]
    pub halo: Option<Halo>,
    #[serde(default = "Fill::black")]
    pub fill: Fill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterSymbolizer {
    #[serde(default = "default_opacity")]
    pub opacity: Expression,
}

impl Default for RasterSymbolizer {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
        }
    }
}

/// Font request: family candidates tried in order, plus a size expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default = "default_font_size")]
    pub size: Expression,
}

fn default_font_size() -> Expression {
    Expression::Number(10.0)
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            size: default_font_size(),
        }
    }
}

/// Where a label goes relative to its geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPlacement {
    /// Anchor + displacement + rotation. Anchor is in fractions of the text
    /// bounding box ((0,0) = lower-left, (1,1) = upper-right); displacement
    /// is in pixels; rotation in degrees clockwise.
    Point {
        #[serde(default = "default_anchor")]
        anchor: (f64, f64),
        #[serde(default)]
        displacement: (f64, f64),
        #[serde(default)]
        rotation: Expression,
    },
    /// Along the line's start-to-end chord, centered at the chord midpoint,
    /// offset perpendicular by `offset` pixels.
    Line {
        #[serde(default)]
        offset: f64,
    },
}

fn default_anchor() -> (f64, f64) {
    (0.5, 0.5)
}

impl Default for LabelPlacement {
    fn default() -> Self {
        LabelPlacement::Point {
            anchor: default_anchor(),
            displacement: (0.0, 0.0),
            rotation: Expression::Number(0.0),
        }
    }
}

/// Filled outline behind text glyphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Halo {
    #[serde(default = "default_halo_radius")]
    pub radius: f64,
    #[serde(default = "Fill::white")]
    pub fill: Fill,
}

fn default_halo_radius() -> f64 {
    1.0
}

impl Default for Halo {
    fn default() -> Self {
        Halo {
            radius: default_halo_radius(),
            fill: Fill::white(),
        }
    }
}

/// Solid or textured area fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    #[serde(default = "default_fill_color")]
    pub color: Expression,
    #[serde(default = "default_opacity")]
    pub opacity: Expression,
    /// When set, the fill is a repeating texture of this graphic instead of
    /// a solid colour.
    #[serde(default)]
    pub graphic: Option<Graphic>,
}

fn default_fill_color() -> Expression {
    Expression::Text("#808080".to_string())
}

fn default_opacity() -> Expression {
    Expression::Number(1.0)
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            color: default_fill_color(),
            opacity: default_opacity(),
            graphic: None,
        }
    }
}

impl Fill {
    pub fn solid(color: &str) -> Self {
        Self {
            color: Expression::Text(color.to_string()),
            ..Default::default()
        }
    }

    pub fn black() -> Self {
        Self::solid("#000000")
    }

    pub fn white() -> Self {
        Self::solid("#FFFFFF")
    }
}

/// Line stroke parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(default = "default_stroke_color")]
    pub color: Expression,
    #[serde(default = "default_stroke_width")]
    pub width: Expression,
    #[serde(default = "default_opacity")]
    pub opacity: Expression,
    #[serde(default)]
    pub line_cap: LineCapStyle,
    #[serde(default)]
    pub line_join: LineJoinStyle,
    /// Alternating dash/gap lengths in pixels; empty means solid.
    #[serde(default)]
    pub dash_array: Vec<f32>,
    #[serde(default)]
    pub dash_offset: f32,
    /// When set, the stroke is realized by stamping this graphic along the
    /// path instead of drawing a line.
    #[serde(default)]
    pub graphic: Option<Graphic>,
}

fn default_stroke_color() -> Expression {
    Expression::Text("#000000".to_string())
}

fn default_stroke_width() -> Expression {
    Expression::Number(1.0)
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: default_stroke_color(),
            width: default_stroke_width(),
            opacity: default_opacity(),
            line_cap: LineCapStyle::default(),
            line_join: LineJoinStyle::default(),
            dash_array: Vec::new(),
            dash_offset: 0.0,
            graphic: None,
        }
    }
}

impl Stroke {
    pub fn solid(color: &str, width: f64) -> Self {
        Self {
            color: Expression::Text(color.to_string()),
            width: Expression::Number(width),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCapStyle {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineJoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// A graphic: an ordered list of candidate symbols plus shared size,
/// rotation and opacity. Candidates are tried in declared order and the
/// first one that resolves wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graphic {
    pub symbols: Vec<GraphicSymbol>,
    #[serde(default = "default_graphic_size")]
    pub size: Expression,
    /// Degrees clockwise from north.
    #[serde(default)]
    pub rotation: Expression,
    #[serde(default = "default_opacity")]
    pub opacity: Expression,
}

fn default_graphic_size() -> Expression {
    Expression::Number(16.0)
}

impl Graphic {
    /// A graphic with a single mark candidate, the common case.
    pub fn mark(name: &str) -> Self {
        Self {
            symbols: vec![GraphicSymbol::Mark {
                name: name.to_string(),
                fill: Some(Fill::default()),
                stroke: Some(Stroke::default()),
            }],
            size: default_graphic_size(),
            rotation: Expression::Number(0.0),
            opacity: default_opacity(),
        }
    }
}

/// One candidate symbol within a graphic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicSymbol {
    /// Reference to an image resolved through the symbol raster cache.
    External {
        href: String,
        #[serde(default)]
        format: Option<String>,
    },
    /// A named vector mark from the mark library.
    Mark {
        name: String,
        #[serde(default)]
        fill: Option<Fill>,
        #[serde(default)]
        stroke: Option<Stroke>,
    },
    /// A glyph from a font used as a symbol.
    TextMark {
        text: Expression,
        #[serde(default)]
        families: Vec<String>,
    },
}

/// Parse a hex colour string ("#RRGGBB" or "RRGGBB") to RGB.
pub fn hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

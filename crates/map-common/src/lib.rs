//! Shared model types for the feature-wms workspace.
//!
//! Everything the renderer consumes but does not own lives here: world
//! envelopes and device viewports, the feature record and its attribute
//! values, filter/expression evaluation, the resolved style model, and the
//! error taxonomy shared across crates.

pub mod bbox;
pub mod coverage;
pub mod error;
pub mod expr;
pub mod feature;
pub mod filter;
pub mod style;
pub mod viewport;

pub use bbox::BoundingBox;
pub use coverage::GridCoverage;
pub use error::{RenderError, RenderResult};
pub use expr::Expression;
pub use feature::{AttributeError, AttributeValue, Feature};
pub use filter::{CompareOp, Filter};
pub use viewport::Viewport;

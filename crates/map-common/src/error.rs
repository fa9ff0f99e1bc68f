//! Error types for feature-wms crates.

use thiserror::Error;

/// Result type alias using RenderError.
pub type RenderResult<T> = Result<T, RenderError>;

/// Primary error type for rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    // === Pass-level errors (abort the current pass) ===
    #[error("Invalid render configuration: {0}")]
    Configuration(String),

    #[error("Render pass cancelled")]
    Cancelled,

    // === Per-item errors (the affected item is skipped) ===
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl RenderError {
    /// Whether this error aborts the whole pass. Everything else is scoped
    /// to one feature/symbolizer and the pass continues without it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Configuration(_) | RenderError::Cancelled)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::ResourceUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        assert!(RenderError::Configuration("no surface".into()).is_fatal());
        assert!(RenderError::Cancelled.is_fatal());
        assert!(!RenderError::ResourceUnavailable("graphic".into()).is_fatal());
        assert!(!RenderError::Geometry("empty".into()).is_fatal());
        assert!(!RenderError::Unexpected("filter".into()).is_fatal());
    }
}

//! Visualizer error types

use crate::config::ConfigError;
use crate::render::BackendError;

/// Result type for visualizer operations
pub type VisualizerResult<T> = Result<T, VisualizerError>;

/// Errors surfaced by [`PolygonVisualizer`](super::PolygonVisualizer).
///
/// Unresolvable property values and degenerate shapes are not errors; they
/// only skip work for the affected entity in the current frame.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    /// The visualizer was used after [`destroy`](super::PolygonVisualizer::destroy)
    #[error("This visualizer was destroyed")]
    Destroyed,

    /// The update time is not a finite number
    #[error("Update time must be finite, got {0}")]
    InvalidTime(f64),

    /// The render backend failed; usually resource exhaustion
    #[error("Render backend error: {0}")]
    Backend(#[from] BackendError),

    /// The configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

//! # Visualizer Configuration
//!
//! Tunables for the polygon visualizer: how degenerate shapes are rejected,
//! how ellipses are tessellated, and what the ambient logging level is.

use super::{Config, ConfigError};
use crate::foundation::math::Color;
use serde::{Deserialize, Serialize};

/// Configuration for [`PolygonVisualizer`](crate::visualizer::PolygonVisualizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Default log filter used by the demo and by `logging::init_with_level`
    pub log_level: String,
    /// Shapes with fewer vertices are never rendered
    pub min_vertex_count: usize,
    /// Angular spacing between derived ellipse vertices, in radians
    pub ellipse_granularity: f64,
    /// Color baked into static instances whose material has no color
    pub default_color: Color,
    /// Upper bound on live backend primitives for the headless backend
    pub max_backend_primitives: Option<usize>,
}

impl VisualizerConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            min_vertex_count: 4,
            ellipse_granularity: std::f64::consts::PI / 32.0,
            default_color: Color::WHITE,
            max_backend_primitives: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the minimum renderable vertex count
    pub fn with_min_vertex_count(mut self, count: usize) -> Self {
        self.min_vertex_count = count;
        self
    }

    /// Set the ellipse tessellation step
    pub fn with_ellipse_granularity(mut self, radians: f64) -> Self {
        self.ellipse_granularity = radians;
        self
    }

    /// Set the fallback instance color
    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    /// Cap the number of live backend primitives
    pub fn with_max_backend_primitives(mut self, max: usize) -> Self {
        self.max_backend_primitives = Some(max);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_vertex_count < 3 {
            return Err(ConfigError::Invalid(format!(
                "min_vertex_count must be at least 3, got {}",
                self.min_vertex_count
            )));
        }

        if !(self.ellipse_granularity.is_finite() && self.ellipse_granularity > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ellipse_granularity must be a positive angle, got {}",
                self.ellipse_granularity
            )));
        }

        if self.max_backend_primitives == Some(0) {
            return Err(ConfigError::Invalid(
                "max_backend_primitives must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for VisualizerConfig {}

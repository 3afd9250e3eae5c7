//! Geometry descriptions handed to the backend
//!
//! Triangulation is the backend's job; these types only carry the outline and
//! the height parameters.

use super::attributes::InstanceAttributes;
use crate::foundation::math::Point3;
use crate::scene::EntityId;

/// Polygon outline plus optional heights
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonGeometry {
    /// Outline vertices
    pub positions: Vec<Point3>,
    /// Height of the surface
    pub height: Option<f64>,
    /// Height of the extruded top face
    pub extruded_height: Option<f64>,
}

impl PolygonGeometry {
    /// Create a geometry from an outline and heights
    pub fn from_positions(positions: Vec<Point3>, height: Option<f64>, extruded_height: Option<f64>) -> Self {
        Self {
            positions,
            height,
            extruded_height,
        }
    }

    /// Number of outline vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// True when the geometry describes an extruded volume
    pub fn is_extruded(&self) -> bool {
        self.extruded_height.is_some()
    }
}

/// One entity's geometry inside a merged primitive
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInstance {
    /// Entity the instance belongs to; used to address its attributes
    pub id: EntityId,
    /// Instance geometry
    pub geometry: PolygonGeometry,
    /// Attribute values the primitive is built with
    pub attributes: InstanceAttributes,
}

/// Appearance of a merged primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Appearance {
    /// Whether instances are drawn with blending
    pub translucent: bool,
}

impl Appearance {
    /// Per-instance color appearance
    pub fn per_instance_color(translucent: bool) -> Self {
        Self { translucent }
    }
}

//! Backend abstraction consumed by the batches
//!
//! Two kinds of renderables exist:
//!
//! - **Merged primitives** hold many [`GeometryInstance`]s built together.
//!   Geometry is fixed at construction; only each instance's
//!   [`InstanceAttributes`] can be written afterwards.
//! - **Polygons** are discrete, mutable renderables used one per entity.

use super::attributes::InstanceAttributes;
use super::geometry::{Appearance, GeometryInstance, PolygonGeometry};
use crate::scene::{EntityId, Material};

slotmap::new_key_type! {
    /// Handle to a merged primitive
    pub struct PrimitiveHandle;
    /// Handle to a discrete polygon renderable
    pub struct PolygonHandle;
}

/// Position of an instance's attribute block inside a merged primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceSlot(pub usize);

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a render backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Handle does not refer to a live merged primitive
    #[error("Invalid primitive handle: {0:?}")]
    InvalidPrimitive(PrimitiveHandle),

    /// Handle does not refer to a live polygon
    #[error("Invalid polygon handle: {0:?}")]
    InvalidPolygon(PolygonHandle),

    /// A merged primitive needs at least one instance
    #[error("Cannot build a merged primitive without instances")]
    EmptyPrimitive,

    /// Resource limit reached
    #[error("Backend capacity exceeded: {current} >= {max}")]
    CapacityExceeded {
        /// Live renderables at the time of the request
        current: usize,
        /// Maximum allowed renderables
        max: usize,
    },
}

/// Renderer-side operations the visualizer relies on
pub trait RenderBackend {
    /// Build a merged primitive from instances, synchronously
    fn create_primitive(
        &mut self,
        instances: &[GeometryInstance],
        appearance: Appearance,
    ) -> BackendResult<PrimitiveHandle>;

    /// Release a merged primitive
    fn destroy_primitive(&mut self, handle: PrimitiveHandle) -> BackendResult<()>;

    /// Find the attribute slot of an instance by entity id
    fn instance_slot(&self, handle: PrimitiveHandle, id: &EntityId) -> Option<InstanceSlot>;

    /// Mutable view of an instance's attribute block
    fn instance_attributes_mut(
        &mut self,
        handle: PrimitiveHandle,
        slot: InstanceSlot,
    ) -> Option<&mut InstanceAttributes>;

    /// Allocate a discrete polygon renderable, initially hidden and empty
    fn create_polygon(&mut self) -> BackendResult<PolygonHandle>;

    /// Release a discrete polygon renderable
    fn destroy_polygon(&mut self, handle: PolygonHandle) -> BackendResult<()>;

    /// Show or hide a polygon
    fn set_polygon_show(&mut self, handle: PolygonHandle, show: bool) -> BackendResult<()>;

    /// Replace a polygon's geometry
    fn set_polygon_geometry(&mut self, handle: PolygonHandle, geometry: &PolygonGeometry) -> BackendResult<()>;

    /// Replace a polygon's material
    fn set_polygon_material(&mut self, handle: PolygonHandle, material: &Material) -> BackendResult<()>;
}

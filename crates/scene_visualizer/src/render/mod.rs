//! Rendering contract
//!
//! The visualizer never talks to a graphics API directly. It describes
//! merged primitives and discrete polygons through [`RenderBackend`], and the
//! backend decides how to draw them.

pub mod attributes;
pub mod geometry;
pub mod backend;
pub mod headless;

pub use attributes::InstanceAttributes;
pub use geometry::{Appearance, GeometryInstance, PolygonGeometry};
pub use backend::{BackendError, BackendResult, InstanceSlot, PolygonHandle, PrimitiveHandle, RenderBackend};
pub use headless::{BackendStats, HeadlessBackend};

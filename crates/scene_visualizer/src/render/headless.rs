//! # Headless Backend
//!
//! An in-memory [`RenderBackend`] that records everything the visualizer asks
//! for instead of drawing it. Used by the demo and the test suites to observe
//! rebuilds, attribute patches and renderable reuse.

use super::attributes::InstanceAttributes;
use super::backend::{
    BackendError, BackendResult, InstanceSlot, PolygonHandle, PrimitiveHandle, RenderBackend,
};
use super::geometry::{Appearance, GeometryInstance, PolygonGeometry};
use crate::scene::{EntityId, Material};
use slotmap::SlotMap;
use std::collections::HashMap;

/// A merged primitive as recorded by the headless backend
#[derive(Debug, Clone)]
pub struct MergedPrimitive {
    /// Appearance the primitive was built with
    pub appearance: Appearance,
    /// Instance ids in build order
    pub ids: Vec<EntityId>,
    /// Instance geometries in build order
    pub geometries: Vec<PolygonGeometry>,
    /// Attribute block, one entry per instance
    pub attributes: Vec<InstanceAttributes>,
    slots: HashMap<EntityId, usize>,
}

impl MergedPrimitive {
    /// Number of instances
    pub fn instance_count(&self) -> usize {
        self.ids.len()
    }

    /// Attributes of an instance by entity id
    pub fn attributes_of(&self, id: &EntityId) -> Option<&InstanceAttributes> {
        self.slots.get(id).map(|&slot| &self.attributes[slot])
    }
}

/// A discrete polygon as recorded by the headless backend
#[derive(Debug, Clone, Default)]
pub struct PolygonRenderable {
    /// Visibility
    pub show: bool,
    /// Current geometry
    pub geometry: PolygonGeometry,
    /// Current material
    pub material: Material,
}

/// Counters of backend activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Merged primitives built
    pub primitives_created: usize,
    /// Merged primitives released
    pub primitives_destroyed: usize,
    /// Polygons allocated
    pub polygons_created: usize,
    /// Polygons released
    pub polygons_destroyed: usize,
    /// Attribute views handed out for patching
    pub attribute_writes: usize,
    /// Polygon geometry replacements
    pub geometry_updates: usize,
    /// Polygon material replacements
    pub material_updates: usize,
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    primitives: SlotMap<PrimitiveHandle, MergedPrimitive>,
    polygons: SlotMap<PolygonHandle, PolygonRenderable>,
    max_renderables: Option<usize>,
    stats: BackendStats,
}

impl HeadlessBackend {
    /// Create an unbounded backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that refuses to hold more than `max` live renderables
    /// (merged primitives and polygons combined)
    pub fn with_capacity_limit(max: usize) -> Self {
        Self {
            max_renderables: Some(max),
            ..Self::default()
        }
    }

    /// Activity counters
    pub fn stats(&self) -> &BackendStats {
        &self.stats
    }

    /// Live merged primitives
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Live polygons, shown or hidden
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Live polygons currently shown
    pub fn visible_polygon_count(&self) -> usize {
        self.polygons.values().filter(|polygon| polygon.show).count()
    }

    /// Every live renderable
    pub fn renderable_count(&self) -> usize {
        self.primitives.len() + self.polygons.len()
    }

    /// Look up a merged primitive
    pub fn primitive(&self, handle: PrimitiveHandle) -> Option<&MergedPrimitive> {
        self.primitives.get(handle)
    }

    /// Iterate merged primitives
    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveHandle, &MergedPrimitive)> {
        self.primitives.iter()
    }

    /// Look up a polygon
    pub fn polygon(&self, handle: PolygonHandle) -> Option<&PolygonRenderable> {
        self.polygons.get(handle)
    }

    /// Iterate polygons, visible or not
    pub fn polygons(&self) -> impl Iterator<Item = (PolygonHandle, &PolygonRenderable)> {
        self.polygons.iter()
    }

    /// Raw attribute block of a merged primitive, as it would be uploaded
    pub fn attribute_bytes(&self, handle: PrimitiveHandle) -> Option<&[u8]> {
        self.primitives
            .get(handle)
            .map(|primitive| bytemuck::cast_slice(primitive.attributes.as_slice()))
    }

    fn reserve(&self) -> BackendResult<()> {
        match self.max_renderables {
            Some(max) if self.renderable_count() >= max => Err(BackendError::CapacityExceeded {
                current: self.renderable_count(),
                max,
            }),
            _ => Ok(()),
        }
    }

    fn polygon_mut(&mut self, handle: PolygonHandle) -> BackendResult<&mut PolygonRenderable> {
        self.polygons
            .get_mut(handle)
            .ok_or(BackendError::InvalidPolygon(handle))
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_primitive(
        &mut self,
        instances: &[GeometryInstance],
        appearance: Appearance,
    ) -> BackendResult<PrimitiveHandle> {
        if instances.is_empty() {
            return Err(BackendError::EmptyPrimitive);
        }
        self.reserve()?;

        let primitive = MergedPrimitive {
            appearance,
            ids: instances.iter().map(|instance| instance.id.clone()).collect(),
            geometries: instances.iter().map(|instance| instance.geometry.clone()).collect(),
            attributes: instances.iter().map(|instance| instance.attributes).collect(),
            slots: instances
                .iter()
                .enumerate()
                .map(|(slot, instance)| (instance.id.clone(), slot))
                .collect(),
        };
        self.stats.primitives_created += 1;
        log::trace!(
            "Built merged primitive with {} instances (translucent: {})",
            primitive.instance_count(),
            appearance.translucent
        );
        Ok(self.primitives.insert(primitive))
    }

    fn destroy_primitive(&mut self, handle: PrimitiveHandle) -> BackendResult<()> {
        self.primitives
            .remove(handle)
            .ok_or(BackendError::InvalidPrimitive(handle))?;
        self.stats.primitives_destroyed += 1;
        Ok(())
    }

    fn instance_slot(&self, handle: PrimitiveHandle, id: &EntityId) -> Option<InstanceSlot> {
        self.primitives
            .get(handle)?
            .slots
            .get(id)
            .map(|&slot| InstanceSlot(slot))
    }

    fn instance_attributes_mut(
        &mut self,
        handle: PrimitiveHandle,
        slot: InstanceSlot,
    ) -> Option<&mut InstanceAttributes> {
        let attributes = self.primitives.get_mut(handle)?.attributes.get_mut(slot.0)?;
        self.stats.attribute_writes += 1;
        Some(attributes)
    }

    fn create_polygon(&mut self) -> BackendResult<PolygonHandle> {
        self.reserve()?;
        self.stats.polygons_created += 1;
        Ok(self.polygons.insert(PolygonRenderable::default()))
    }

    fn destroy_polygon(&mut self, handle: PolygonHandle) -> BackendResult<()> {
        self.polygons
            .remove(handle)
            .ok_or(BackendError::InvalidPolygon(handle))?;
        self.stats.polygons_destroyed += 1;
        Ok(())
    }

    fn set_polygon_show(&mut self, handle: PolygonHandle, show: bool) -> BackendResult<()> {
        self.polygon_mut(handle)?.show = show;
        Ok(())
    }

    fn set_polygon_geometry(&mut self, handle: PolygonHandle, geometry: &PolygonGeometry) -> BackendResult<()> {
        self.polygon_mut(handle)?.geometry.clone_from(geometry);
        self.stats.geometry_updates += 1;
        Ok(())
    }

    fn set_polygon_material(&mut self, handle: PolygonHandle, material: &Material) -> BackendResult<()> {
        self.polygon_mut(handle)?.material.clone_from(material);
        self.stats.material_updates += 1;
        Ok(())
    }
}

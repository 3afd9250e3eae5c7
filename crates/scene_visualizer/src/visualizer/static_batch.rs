//! # Static Attribute Batch
//!
//! Renders every time-invariant entity of one translucency class as a single
//! merged primitive.
//!
//! Membership changes are expensive: the whole primitive is rebuilt on the
//! next update. In steady state the batch only writes the color and show
//! slots of instances whose color or visibility still varies over time, which
//! never touches geometry.

use super::batch::{BatchKind, BatchStats, GeometryBatch};
use super::classifier::PropertyShapeClassifier;
use crate::config::VisualizerConfig;
use crate::foundation::math::Color;
use crate::foundation::time::SimTime;
use crate::render::{
    Appearance, BackendResult, GeometryInstance, InstanceAttributes, InstanceSlot,
    PolygonGeometry, PrimitiveHandle, RenderBackend,
};
use crate::scene::{Entity, EntityId, EntityKeyedRegistry, PropertyRef};
use bitflags::bitflags;
use std::rc::Rc;

bitflags! {
    /// Instance attributes that must be re-evaluated every frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DynamicAttributes: u8 {
        /// Color property is time-varying
        const COLOR = 0b01;
        /// Show property is time-varying, or the entity has availability
        const SHOW = 0b10;
    }
}

/// Per-entity state inside a static batch
struct StaticRecord {
    entity: Rc<Entity>,
    instance: GeometryInstance,
    color: Option<PropertyRef<Color>>,
    show: Option<PropertyRef<bool>>,
    dynamic: DynamicAttributes,
    /// Resolved lazily after each rebuild
    slot: Option<InstanceSlot>,
}

impl StaticRecord {
    /// Write current color/show values into `attributes`, skipping values
    /// that are undefined at `time`
    fn refresh(&self, time: SimTime, attributes: &mut InstanceAttributes) {
        if self.dynamic.contains(DynamicAttributes::COLOR) {
            if let Some(color) = self.color.as_ref().and_then(|color| color.value_at(time)) {
                attributes.set_color(color);
            }
        }
        if self.dynamic.contains(DynamicAttributes::SHOW) {
            if let Some(show) = resolve_show(&self.entity, self.show.as_ref(), time) {
                attributes.set_show(show);
            }
        }
    }
}

/// Visibility at `time`: hidden outside availability, otherwise the show
/// property (visible when absent). `None` when the show value is undefined.
pub(crate) fn resolve_show(entity: &Entity, show: Option<&PropertyRef<bool>>, time: SimTime) -> Option<bool> {
    if !entity.is_available(time) {
        return Some(false);
    }
    show.map_or(Some(true), |show| show.value_at(time))
}

/// Merged-primitive batch for one translucency class
pub struct StaticAttributeBatch {
    translucent: bool,
    classifier: PropertyShapeClassifier,
    default_color: Color,
    records: EntityKeyedRegistry<StaticRecord>,
    primitive: Option<PrimitiveHandle>,
    rebuild_needed: bool,
    instances_scratch: Vec<GeometryInstance>,
    stats: BatchStats,
}

impl StaticAttributeBatch {
    /// Create an empty batch for the given translucency class
    pub fn new(translucent: bool, config: &VisualizerConfig) -> Self {
        Self {
            translucent,
            classifier: PropertyShapeClassifier::new(config.min_vertex_count),
            default_color: config.default_color,
            records: EntityKeyedRegistry::new(),
            primitive: None,
            rebuild_needed: false,
            instances_scratch: Vec::new(),
            stats: BatchStats::default(),
        }
    }

    /// Whether this batch draws with blending
    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    /// True when membership changed since the last rebuild
    pub fn rebuild_needed(&self) -> bool {
        self.rebuild_needed
    }

    /// The current merged primitive, if one is built
    pub fn primitive(&self) -> Option<PrimitiveHandle> {
        self.primitive
    }

    /// Which attributes of an entity are re-evaluated per frame
    pub fn dynamic_attributes(&self, id: &EntityId) -> Option<DynamicAttributes> {
        self.records.get(id).map(|record| record.dynamic)
    }

    fn rebuild(&mut self, time: SimTime, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        if let Some(previous) = self.primitive.take() {
            backend.destroy_primitive(previous)?;
        }

        self.instances_scratch.clear();
        for record in self.records.values_mut() {
            record.slot = None;
            let mut attributes = record.instance.attributes;
            record.refresh(time, &mut attributes);
            record.instance.attributes = attributes;
            self.instances_scratch.push(record.instance.clone());
        }

        if !self.instances_scratch.is_empty() {
            let appearance = Appearance::per_instance_color(self.translucent);
            self.primitive = Some(backend.create_primitive(&self.instances_scratch, appearance)?);
        }
        self.instances_scratch.clear();

        self.rebuild_needed = false;
        self.stats.rebuilds += 1;
        log::debug!(
            "Rebuilt {} batch with {} instances",
            self.kind(),
            self.records.len()
        );
        Ok(())
    }

    fn patch_attributes(
        &mut self,
        time: SimTime,
        primitive: PrimitiveHandle,
        backend: &mut dyn RenderBackend,
    ) {
        for record in self.records.values_mut() {
            if record.dynamic.is_empty() {
                continue;
            }

            let slot = match record.slot {
                Some(slot) => slot,
                None => match backend.instance_slot(primitive, record.entity.id()) {
                    Some(slot) => *record.slot.insert(slot),
                    None => continue,
                },
            };

            if let Some(attributes) = backend.instance_attributes_mut(primitive, slot) {
                record.refresh(time, attributes);
                self.stats.attribute_patches += 1;
                log::trace!("Patched {:?} of {}", record.dynamic, record.entity.id());
            }
        }
    }
}

impl GeometryBatch for StaticAttributeBatch {
    fn kind(&self) -> BatchKind {
        if self.translucent {
            BatchKind::TranslucentStatic
        } else {
            BatchKind::OpaqueStatic
        }
    }

    fn matches(&self, time: SimTime, entity: &Entity) -> bool {
        self.classifier.static_translucency(time, entity) == Some(self.translucent)
    }

    fn add(&mut self, time: SimTime, entity: Rc<Entity>) {
        let polygon = entity.polygon().unwrap_or_default();
        let color = polygon
            .material
            .as_ref()
            .and_then(|material| material.as_color())
            .and_then(|material| material.color.clone());

        let show = resolve_show(&entity, polygon.show.as_ref(), time).unwrap_or(true);
        let resolved_color = color
            .as_ref()
            .and_then(|color| color.value_at(time))
            .unwrap_or(self.default_color);

        let mut positions = Vec::new();
        if let Some(property) = entity.vertex_positions() {
            property.sample_into(time, &mut positions);
        }
        let height = polygon.height.as_ref().and_then(|height| height.value_at(time));
        let extruded_height = polygon
            .extruded_height
            .as_ref()
            .and_then(|extruded| extruded.value_at(time));

        let mut dynamic = DynamicAttributes::empty();
        if color.as_ref().map_or(false, |color| !color.is_constant()) {
            dynamic |= DynamicAttributes::COLOR;
        }
        if polygon.show.as_ref().map_or(false, |show| !show.is_constant()) || entity.has_availability() {
            dynamic |= DynamicAttributes::SHOW;
        }

        let id = entity.id().clone();
        let record = StaticRecord {
            instance: GeometryInstance {
                id: id.clone(),
                geometry: PolygonGeometry::from_positions(positions, height, extruded_height),
                attributes: InstanceAttributes::new(resolved_color, show),
            },
            entity,
            color,
            show: polygon.show,
            dynamic,
            slot: None,
        };

        log::trace!("Added {} to {} batch (dynamic attributes: {:?})", id, self.kind(), dynamic);
        self.records.insert(id, record);
        self.rebuild_needed = true;
    }

    fn remove(&mut self, id: &EntityId, _backend: &mut dyn RenderBackend) -> BackendResult<bool> {
        let removed = self.records.remove(id).is_some();
        self.rebuild_needed |= removed;
        Ok(removed)
    }

    fn update(&mut self, time: SimTime, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        if self.rebuild_needed {
            return self.rebuild(time, backend);
        }
        if let Some(primitive) = self.primitive {
            self.patch_attributes(time, primitive, backend);
        }
        Ok(())
    }

    fn remove_all_primitives(&mut self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        if let Some(primitive) = self.primitive.take() {
            backend.destroy_primitive(primitive)?;
        }
        self.records.clear();
        self.rebuild_needed = false;
        Ok(())
    }

    fn contains(&self, id: &EntityId) -> bool {
        self.records.contains(id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn stats(&self) -> BatchStats {
        BatchStats {
            entities: self.records.len(),
            active_renderables: usize::from(self.primitive.is_some()),
            ..self.stats.clone()
        }
    }
}

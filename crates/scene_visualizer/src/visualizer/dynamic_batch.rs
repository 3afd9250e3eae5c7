//! # Dynamic Entity Batch
//!
//! Catch-all batch: one discrete polygon renderable per visible entity,
//! re-derived from current property values every frame.
//!
//! ```text
//! tracked entity ──visible──► acquire ◄── free-list (LIFO)
//!        │                       │
//!        └──hidden / removed──► release ──► free-list
//! ```
//!
//! Geometry is only pushed to the backend when the resolved value differs
//! from what the renderable already shows. Materials are re-resolved every
//! frame and pushed when they change.

use super::batch::{BatchKind, BatchStats, GeometryBatch};
use super::classifier::PropertyShapeClassifier;
use super::static_batch::resolve_show;
use crate::config::VisualizerConfig;
use crate::foundation::math::Point3;
use crate::foundation::time::SimTime;
use crate::render::{BackendResult, PolygonGeometry, PolygonHandle, RenderBackend};
use crate::scene::{Entity, EntityId, EntityKeyedRegistry, Material, PolygonGraphics};
use std::rc::Rc;

/// Per-entity state inside the dynamic batch
struct DynamicRecord {
    entity: Rc<Entity>,
    polygon: Option<PolygonHandle>,
    /// Geometry last pushed to `polygon`
    geometry: Option<PolygonGeometry>,
    /// Material last pushed to `polygon`
    material: Option<Material>,
}

impl DynamicRecord {
    /// Hide the renderable and hand it to the free-list
    fn release(
        &mut self,
        free_list: &mut Vec<PolygonHandle>,
        backend: &mut dyn RenderBackend,
    ) -> BackendResult<()> {
        if let Some(polygon) = self.polygon.take() {
            backend.set_polygon_show(polygon, false)?;
            free_list.push(polygon);
        }
        self.geometry = None;
        self.material = None;
        Ok(())
    }
}

/// Reusable per-frame buffers
#[derive(Default)]
struct Scratch {
    ids: Vec<EntityId>,
    geometry: PolygonGeometry,
    material: Material,
}

/// One renderable per entity, recycled through a free-list
pub struct DynamicEntityBatch {
    classifier: PropertyShapeClassifier,
    ellipse_granularity: f64,
    records: EntityKeyedRegistry<DynamicRecord>,
    free_list: Vec<PolygonHandle>,
    scratch: Scratch,
    stats: BatchStats,
}

impl DynamicEntityBatch {
    /// Create an empty batch
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            classifier: PropertyShapeClassifier::new(config.min_vertex_count),
            ellipse_granularity: config.ellipse_granularity,
            records: EntityKeyedRegistry::new(),
            free_list: Vec::new(),
            scratch: Scratch::default(),
            stats: BatchStats::default(),
        }
    }

    /// Renderable currently showing an entity
    pub fn polygon_of(&self, id: &EntityId) -> Option<PolygonHandle> {
        self.records.get(id).and_then(|record| record.polygon)
    }

    /// Renderables waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

/// Resolve the outline of `entity` at `time` into `positions`.
///
/// Returns `false` when a contributing property is undefined; `positions`
/// then holds stale data and must not be used.
fn resolve_outline(
    entity: &Entity,
    time: SimTime,
    granularity: f64,
    positions: &mut Vec<Point3>,
) -> bool {
    if let Some(vertices) = entity.vertex_positions() {
        return vertices.sample_into(time, positions);
    }
    let (Some(ellipse), Some(position)) = (entity.ellipse(), entity.position()) else {
        return false;
    };
    position
        .value_at(time)
        .map_or(false, |center| ellipse.sample_outline(time, &center, granularity, positions))
}

impl GeometryBatch for DynamicEntityBatch {
    fn kind(&self) -> BatchKind {
        BatchKind::Dynamic
    }

    fn matches(&self, time: SimTime, entity: &Entity) -> bool {
        self.classifier.has_usable_shape(time, entity)
    }

    fn add(&mut self, _time: SimTime, entity: Rc<Entity>) {
        let id = entity.id().clone();
        log::trace!("Tracking {} in dynamic batch", id);
        self.records.insert(
            id,
            DynamicRecord {
                entity,
                polygon: None,
                geometry: None,
                material: None,
            },
        );
    }

    fn remove(&mut self, id: &EntityId, backend: &mut dyn RenderBackend) -> BackendResult<bool> {
        let Some(mut record) = self.records.remove(id) else {
            return Ok(false);
        };
        record.release(&mut self.free_list, backend)?;
        Ok(true)
    }

    fn update(&mut self, time: SimTime, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let min_vertex_count = self.classifier.min_vertex_count();
        let Scratch { ids, geometry, material: scratch_material } = &mut self.scratch;
        ids.clear();
        ids.extend(self.records.keys().cloned());

        for id in ids.iter() {
            let Some(record) = self.records.get_mut(id) else {
                continue;
            };
            let entity = Rc::clone(&record.entity);

            let polygon_graphics = match entity.polygon() {
                Some(polygon) if entity.has_shape_source() => polygon,
                _ => {
                    record.release(&mut self.free_list, backend)?;
                    continue;
                }
            };

            match resolve_show(&entity, polygon_graphics.show.as_ref(), time) {
                None => continue,
                Some(false) => {
                    record.release(&mut self.free_list, backend)?;
                    continue;
                }
                Some(true) => {}
            }

            if !resolve_outline(&entity, time, self.ellipse_granularity, &mut geometry.positions) {
                continue;
            }
            if geometry.positions.len() < min_vertex_count {
                record.release(&mut self.free_list, backend)?;
                continue;
            }
            geometry.height = sample_height(&polygon_graphics, time, false);
            geometry.extruded_height = sample_height(&polygon_graphics, time, true);

            let polygon = match record.polygon {
                Some(polygon) => polygon,
                None => {
                    let polygon = match self.free_list.last().copied() {
                        Some(polygon) => {
                            // Recycled renderables still carry the previous owner's material
                            let material = Material::default();
                            backend.set_polygon_material(polygon, &material)?;
                            record.material = Some(material);
                            self.free_list.pop();
                            polygon
                        }
                        None => backend.create_polygon()?,
                    };
                    backend.set_polygon_show(polygon, true)?;
                    *record.polygon.insert(polygon)
                }
            };

            if record.geometry.as_ref() != Some(&*geometry) {
                backend.set_polygon_geometry(polygon, geometry)?;
                match record.geometry.as_mut() {
                    Some(cached) => cached.clone_from(geometry),
                    None => record.geometry = Some(geometry.clone()),
                }
                self.stats.geometry_updates += 1;
                log::trace!("Pushed {} vertices for {}", geometry.vertex_count(), id);
            }

            let resolved = match &polygon_graphics.material {
                Some(material) => {
                    if let Some(previous) = &record.material {
                        scratch_material.clone_from(previous);
                    }
                    material.resolve(time, scratch_material) || record.material.is_some()
                }
                None => {
                    *scratch_material = Material::default();
                    true
                }
            };
            if resolved && record.material.as_ref() != Some(&*scratch_material) {
                backend.set_polygon_material(polygon, scratch_material)?;
                record.material = Some(scratch_material.clone());
            }
        }
        Ok(())
    }

    fn remove_all_primitives(&mut self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        for (_, record) in self.records.drain() {
            if let Some(polygon) = record.polygon {
                backend.destroy_polygon(polygon)?;
            }
        }
        for polygon in self.free_list.drain(..) {
            backend.destroy_polygon(polygon)?;
        }
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
            active_renderables: self
                .records
                .values()
                .filter(|record| record.polygon.is_some())
                .count(),
            free_renderables: self.free_list.len(),
            ..self.stats.clone()
        }
    }
}

fn sample_height(polygon: &PolygonGraphics, time: SimTime, extruded: bool) -> Option<f64> {
    let property = if extruded {
        polygon.extruded_height.as_ref()
    } else {
        polygon.height.as_ref()
    };
    property.and_then(|height| height.value_at(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Color;
    use crate::foundation::time::{TimeInterval, TimeIntervalCollection};
    use crate::render::HeadlessBackend;
    use crate::scene::{
        constant, EllipseGraphics, MaterialProperty, SampledProperty, StripeMaterialProperty,
    };

    fn square(offset: f64) -> Vec<Point3> {
        vec![
            Point3::new(offset, 0.0, 0.0),
            Point3::new(offset + 1.0, 0.0, 0.0),
            Point3::new(offset + 1.0, 1.0, 0.0),
            Point3::new(offset, 1.0, 0.0),
        ]
    }

    fn moving_square(name: &str) -> Rc<Entity> {
        let positions = SampledProperty::new()
            .with_sample(SimTime::EPOCH, square(0.0))
            .with_sample(SimTime::from_seconds(10.0), square(10.0));
        Rc::new(
            Entity::new(name)
                .with_vertex_positions(Rc::new(positions))
                .with_polygon(PolygonGraphics::new()),
        )
    }

    fn batch() -> DynamicEntityBatch {
        DynamicEntityBatch::new(&VisualizerConfig::default())
    }

    #[test]
    fn test_add_defers_allocation() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        batch.add(SimTime::EPOCH, moving_square("a"));
        assert_eq!(backend.polygon_count(), 0);

        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        let polygon = batch.polygon_of(&EntityId::new("a")).expect("Should have a renderable");
        assert!(backend.polygon(polygon).map_or(false, |p| p.show));
        assert_eq!(backend.stats().geometry_updates, 1);
        assert_eq!(backend.stats().material_updates, 1);
    }

    #[test]
    fn test_unchanged_geometry_not_pushed() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        batch.add(SimTime::EPOCH, moving_square("a"));

        batch.update(SimTime::from_seconds(20.0), &mut backend).expect("Should update");
        batch.update(SimTime::from_seconds(30.0), &mut backend).expect("Should update");
        assert_eq!(backend.stats().geometry_updates, 1);

        batch.update(SimTime::from_seconds(5.0), &mut backend).expect("Should update");
        assert_eq!(backend.stats().geometry_updates, 2);
        assert_eq!(backend.stats().material_updates, 1);
        assert_eq!(batch.stats().geometry_updates, 2);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        batch.add(SimTime::EPOCH, moving_square("a"));
        batch.add(SimTime::EPOCH, moving_square("b"));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        let a = batch.polygon_of(&EntityId::new("a")).expect("Should have a renderable");
        let b = batch.polygon_of(&EntityId::new("b")).expect("Should have a renderable");

        batch.remove(&EntityId::new("a"), &mut backend).expect("Should remove");
        batch.remove(&EntityId::new("b"), &mut backend).expect("Should remove");
        assert_eq!(batch.free_count(), 2);
        assert_eq!(backend.visible_polygon_count(), 0);

        batch.add(SimTime::EPOCH, moving_square("c"));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        assert_eq!(batch.polygon_of(&EntityId::new("c")), Some(b));
        assert_eq!(batch.free_count(), 1);
        assert_eq!(backend.stats().polygons_created, 2);

        batch.add(SimTime::EPOCH, moving_square("d"));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        assert_eq!(batch.polygon_of(&EntityId::new("d")), Some(a));
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        batch.add(SimTime::EPOCH, moving_square("a"));
        assert!(batch.remove(&EntityId::new("a"), &mut backend).expect("Should remove"));
        assert!(!batch.remove(&EntityId::new("a"), &mut backend).expect("Should remove"));
        assert!(batch.is_empty());
        assert_eq!(batch.free_count(), 0);
    }

    #[test]
    fn test_short_outline_rejected_until_it_recovers() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        let positions = SampledProperty::new()
            .with_sample(SimTime::EPOCH, square(0.0)[..3].to_vec())
            .with_sample(SimTime::from_seconds(10.0), square(0.0));
        batch.add(
            SimTime::EPOCH,
            Rc::new(
                Entity::new("a")
                    .with_vertex_positions(Rc::new(positions))
                    .with_polygon(PolygonGraphics::new()),
            ),
        );

        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        assert_eq!(backend.polygon_count(), 0);

        batch.update(SimTime::from_seconds(10.0), &mut backend).expect("Should update");
        assert_eq!(backend.visible_polygon_count(), 1);
    }

    #[test]
    fn test_hidden_outside_availability() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        let entity = Entity::new("a")
            .with_vertex_positions(Rc::new(
                SampledProperty::new().with_sample(SimTime::EPOCH, square(0.0)),
            ))
            .with_polygon(PolygonGraphics::new())
            .with_availability(TimeIntervalCollection::from_interval(TimeInterval::closed(
                SimTime::EPOCH,
                SimTime::from_seconds(1.0),
            )));
        batch.add(SimTime::EPOCH, Rc::new(entity));

        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        assert_eq!(backend.visible_polygon_count(), 1);

        batch.update(SimTime::from_seconds(2.0), &mut backend).expect("Should update");
        assert_eq!(backend.visible_polygon_count(), 0);
        assert!(batch.polygon_of(&EntityId::new("a")).is_none());
        assert_eq!(batch.stats().free_renderables, 1);
        assert_eq!(batch.stats().active_renderables, 0);
    }

    #[test]
    fn test_material_change_pushed() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        let color = SampledProperty::new()
            .with_sample(SimTime::EPOCH, Color::BLACK)
            .with_sample(SimTime::from_seconds(1.0), Color::WHITE);
        let entity = Entity::new("a")
            .with_vertex_positions(constant(square(0.0)))
            .with_polygon(PolygonGraphics::new().with_material(MaterialProperty::color(Rc::new(color))));
        batch.add(SimTime::EPOCH, Rc::new(entity));

        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        assert_eq!(backend.stats().material_updates, 1);

        batch.update(SimTime::from_seconds(1.0), &mut backend).expect("Should update");
        let polygon = batch.polygon_of(&EntityId::new("a")).expect("Should have a renderable");
        assert_eq!(
            backend.polygon(polygon).map(|p| p.material.clone()),
            Some(Material::Color { color: Color::WHITE })
        );
        assert_eq!(backend.stats().geometry_updates, 1);
    }

    #[test]
    fn test_ellipse_outline() {
        let mut backend = HeadlessBackend::new();
        let mut batch = DynamicEntityBatch::new(
            &VisualizerConfig::default().with_ellipse_granularity(std::f64::consts::FRAC_PI_4),
        );
        let entity = Entity::new("ellipse")
            .with_position(constant(Point3::new(5.0, 5.0, 0.0)))
            .with_ellipse(EllipseGraphics::new(constant(2.0), constant(1.0)))
            .with_polygon(PolygonGraphics::new());
        batch.add(SimTime::EPOCH, Rc::new(entity));

        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        let polygon = batch.polygon_of(&EntityId::new("ellipse")).expect("Should have a renderable");
        let geometry = backend.polygon(polygon).map(|p| p.geometry.clone()).expect("Should exist");
        assert_eq!(geometry.vertex_count(), 8);
        approx::assert_relative_eq!(geometry.positions[0].x, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_remove_all_destroys_free_renderables() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        batch.add(SimTime::EPOCH, moving_square("a"));
        batch.add(SimTime::EPOCH, moving_square("b"));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        batch.remove(&EntityId::new("a"), &mut backend).expect("Should remove");

        batch.remove_all_primitives(&mut backend).expect("Should tear down");
        assert_eq!(backend.polygon_count(), 0);
        assert_eq!(batch.free_count(), 0);
        assert!(batch.is_empty());

        batch.remove_all_primitives(&mut backend).expect("Should tear down again");
        assert_eq!(backend.stats().polygons_destroyed, 2);
    }

    #[test]
    fn test_recycled_renderable_drops_previous_material() {
        let mut backend = HeadlessBackend::new();
        let mut batch = batch();
        let striped = Entity::new("a")
            .with_vertex_positions(constant(square(0.0)))
            .with_polygon(PolygonGraphics::new().with_material(MaterialProperty::Stripe(
                StripeMaterialProperty {
                    even_color: Some(constant(Color::BLACK)),
                    odd_color: Some(constant(Color::BLACK)),
                    repeat: Some(constant(8.0)),
                },
            )));
        batch.add(SimTime::EPOCH, Rc::new(striped));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");
        let polygon = batch.polygon_of(&EntityId::new("a")).expect("Should have a renderable");
        batch.remove(&EntityId::new("a"), &mut backend).expect("Should remove");

        let unresolved: SampledProperty<Color> = SampledProperty::new();
        let entity = Entity::new("b")
            .with_vertex_positions(constant(square(0.0)))
            .with_polygon(
                PolygonGraphics::new().with_material(MaterialProperty::color(Rc::new(unresolved))),
            );
        batch.add(SimTime::EPOCH, Rc::new(entity));
        batch.update(SimTime::EPOCH, &mut backend).expect("Should update");

        assert_eq!(batch.polygon_of(&EntityId::new("b")), Some(polygon));
        assert_eq!(
            backend.polygon(polygon).map(|p| p.material.clone()),
            Some(Material::default())
        );
    }
}

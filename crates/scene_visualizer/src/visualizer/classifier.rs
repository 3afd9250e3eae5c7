//! Property shape classification
//!
//! Decides, from an entity's properties at the moment it is added, which
//! batch can render it most cheaply. Each rule is a plain predicate; the
//! coordinator tries batches in priority order and the first match wins.

use crate::foundation::time::SimTime;
use crate::scene::{Entity, PropertyRef};

/// Outcome of classifying one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeClass {
    /// No usable shape; no batch takes the entity
    Unusable,
    /// Everything static; rendered in a merged primitive
    Static {
        /// Whether the sampled color had alpha below 1
        translucent: bool,
    },
    /// Usable shape with time-varying geometry or a non-color material
    Dynamic,
}

/// Stateless predicates shared by the batches
#[derive(Debug, Clone, Copy)]
pub struct PropertyShapeClassifier {
    min_vertex_count: usize,
}

impl PropertyShapeClassifier {
    /// Create a classifier rejecting outlines shorter than `min_vertex_count`
    pub fn new(min_vertex_count: usize) -> Self {
        Self { min_vertex_count }
    }

    /// Minimum vertex count of a renderable outline
    pub fn min_vertex_count(&self) -> usize {
        self.min_vertex_count
    }

    /// True when the entity exposes a shape at all.
    ///
    /// A constant vertex list can never recover from being too short, so it
    /// is checked here. Time-varying outlines are accepted and re-checked by
    /// the dynamic batch every frame.
    pub fn has_usable_shape(&self, time: SimTime, entity: &Entity) -> bool {
        if !entity.has_shape_source() {
            return false;
        }
        match entity.vertex_positions() {
            Some(positions) if positions.is_constant() => positions
                .value_at(time)
                .map_or(false, |positions| positions.len() >= self.min_vertex_count),
            _ => true,
        }
    }

    /// Static batch eligibility: `Some(translucent)` when the entity can live
    /// in a merged primitive, `None` otherwise.
    ///
    /// Translucency comes from sampling the material color once, at `time`.
    /// An unresolvable color counts as opaque.
    pub fn static_translucency(&self, time: SimTime, entity: &Entity) -> Option<bool> {
        if !self.has_usable_shape(time, entity) {
            return None;
        }
        if !entity.vertex_positions().map_or(false, |positions| positions.is_constant()) {
            return None;
        }

        let polygon = entity.polygon()?;
        if !is_constant_or_absent(polygon.height.as_ref())
            || !is_constant_or_absent(polygon.extruded_height.as_ref())
        {
            return None;
        }

        let Some(material) = polygon.material else {
            return Some(false);
        };
        let color = material.as_color()?;
        let translucent = color
            .color
            .as_ref()
            .and_then(|color| color.value_at(time))
            .map_or(false, |color| !color.is_opaque());
        Some(translucent)
    }

    /// Full classification, in batch priority order
    pub fn classify(&self, time: SimTime, entity: &Entity) -> ShapeClass {
        if let Some(translucent) = self.static_translucency(time, entity) {
            ShapeClass::Static { translucent }
        } else if self.has_usable_shape(time, entity) {
            ShapeClass::Dynamic
        } else {
            ShapeClass::Unusable
        }
    }
}

fn is_constant_or_absent<T>(property: Option<&PropertyRef<T>>) -> bool {
    property.map_or(true, |property| property.is_constant())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Point3};
    use crate::scene::{
        constant, EllipseGraphics, ImageMaterialProperty, MaterialProperty, PolygonGraphics,
        SampledProperty,
    };
    use std::rc::Rc;

    fn square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn classifier() -> PropertyShapeClassifier {
        PropertyShapeClassifier::new(4)
    }

    fn static_polygon(material: Option<MaterialProperty>) -> Entity {
        let polygon = PolygonGraphics::new();
        let polygon = match material {
            Some(material) => polygon.with_material(material),
            None => polygon,
        };
        Entity::new("polygon")
            .with_vertex_positions(constant(square()))
            .with_polygon(polygon)
    }

    #[test]
    fn test_missing_polygon_is_unusable() {
        let entity = Entity::new("bare").with_vertex_positions(constant(square()));
        assert_eq!(classifier().classify(SimTime::EPOCH, &entity), ShapeClass::Unusable);
    }

    #[test]
    fn test_no_material_is_opaque_static() {
        let entity = static_polygon(None);
        assert_eq!(
            classifier().classify(SimTime::EPOCH, &entity),
            ShapeClass::Static { translucent: false }
        );
    }

    #[test]
    fn test_alpha_splits_static_classes() {
        let opaque = static_polygon(Some(MaterialProperty::color(constant(Color::WHITE))));
        let translucent = static_polygon(Some(MaterialProperty::color(constant(
            Color::WHITE.with_alpha(0.5),
        ))));

        assert_eq!(classifier().static_translucency(SimTime::EPOCH, &opaque), Some(false));
        assert_eq!(classifier().static_translucency(SimTime::EPOCH, &translucent), Some(true));
    }

    #[test]
    fn test_unresolvable_color_is_opaque() {
        let entity = static_polygon(Some(MaterialProperty::color(Rc::new(
            SampledProperty::<Color>::new(),
        ))));
        assert_eq!(classifier().static_translucency(SimTime::EPOCH, &entity), Some(false));
    }

    #[test]
    fn test_image_material_goes_dynamic() {
        let entity = static_polygon(Some(MaterialProperty::Image(ImageMaterialProperty {
            image: constant("grid.png".to_string()),
            color: None,
        })));
        assert_eq!(classifier().classify(SimTime::EPOCH, &entity), ShapeClass::Dynamic);
    }

    #[test]
    fn test_time_varying_height_goes_dynamic() {
        let entity = Entity::new("tower")
            .with_vertex_positions(constant(square()))
            .with_polygon(PolygonGraphics::new().with_extruded_height(Rc::new(
                SampledProperty::new()
                    .with_sample(SimTime::EPOCH, 0.0_f64)
                    .with_sample(SimTime::from_seconds(10.0), 100.0),
            )));
        assert_eq!(classifier().classify(SimTime::EPOCH, &entity), ShapeClass::Dynamic);
    }

    #[test]
    fn test_short_constant_outline_is_unusable() {
        let entity = Entity::new("triangle")
            .with_vertex_positions(constant(square()[..3].to_vec()))
            .with_polygon(PolygonGraphics::new());
        assert_eq!(classifier().classify(SimTime::EPOCH, &entity), ShapeClass::Unusable);
    }

    #[test]
    fn test_ellipse_is_dynamic() {
        let entity = Entity::new("ellipse")
            .with_position(constant(Point3::origin()))
            .with_ellipse(EllipseGraphics::new(constant(2.0), constant(1.0)))
            .with_polygon(PolygonGraphics::new());
        assert_eq!(classifier().classify(SimTime::EPOCH, &entity), ShapeClass::Dynamic);
    }
}

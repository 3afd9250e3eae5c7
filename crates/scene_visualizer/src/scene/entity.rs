//! Scene entities
//!
//! An [`Entity`] is a bag of optional property slots identified by an
//! [`EntityId`]. Slots can be replaced at any time; replacing one raises
//! [`Entity::definition_changed`].

use super::ellipse::EllipseGraphics;
use super::material::MaterialProperty;
use super::property::PropertyRef;
use crate::foundation::event::Event;
use crate::foundation::math::Point3;
use crate::foundation::time::{SimTime, TimeIntervalCollection};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unique entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Rc<str>);

impl EntityId {
    /// Create an id
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Rc::from(id.as_ref()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(Rc::from(id))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Polygon appearance properties
#[derive(Clone, Default)]
pub struct PolygonGraphics {
    /// Visibility; visible when absent
    pub show: Option<PropertyRef<bool>>,
    /// Fill material; white color when absent
    pub material: Option<MaterialProperty>,
    /// Height of the polygon surface
    pub height: Option<PropertyRef<f64>>,
    /// Height of the extruded top face
    pub extruded_height: Option<PropertyRef<f64>>,
}

impl PolygonGraphics {
    /// Polygon graphics with every property absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the show property
    pub fn with_show(mut self, show: PropertyRef<bool>) -> Self {
        self.show = Some(show);
        self
    }

    /// Set the material
    pub fn with_material(mut self, material: MaterialProperty) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the height property
    pub fn with_height(mut self, height: PropertyRef<f64>) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the extruded height property
    pub fn with_extruded_height(mut self, extruded_height: PropertyRef<f64>) -> Self {
        self.extruded_height = Some(extruded_height);
        self
    }
}

impl fmt::Debug for PolygonGraphics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonGraphics")
            .field("show", &self.show.is_some())
            .field("material", &self.material)
            .field("height", &self.height.is_some())
            .field("extruded_height", &self.extruded_height.is_some())
            .finish()
    }
}

/// Names the property slot a definition change refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityProperty {
    /// Availability intervals
    Availability,
    /// Position
    Position,
    /// Vertex positions
    VertexPositions,
    /// Polygon graphics
    Polygon,
    /// Ellipse graphics
    Ellipse,
}

/// Argument of [`Entity::definition_changed`]
#[derive(Debug, Clone)]
pub struct DefinitionChange {
    /// Entity whose slot was replaced
    pub entity_id: EntityId,
    /// Slot that was replaced
    pub property: EntityProperty,
}

/// A time-varying scene object
pub struct Entity {
    id: EntityId,
    availability: RefCell<Option<TimeIntervalCollection>>,
    position: RefCell<Option<PropertyRef<Point3>>>,
    vertex_positions: RefCell<Option<PropertyRef<Vec<Point3>>>>,
    polygon: RefCell<Option<PolygonGraphics>>,
    ellipse: RefCell<Option<EllipseGraphics>>,
    definition_changed: Event<DefinitionChange>,
}

impl Entity {
    /// Create an entity with no properties
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            availability: RefCell::new(None),
            position: RefCell::new(None),
            vertex_positions: RefCell::new(None),
            polygon: RefCell::new(None),
            ellipse: RefCell::new(None),
            definition_changed: Event::new(),
        }
    }

    /// Builder: set availability
    pub fn with_availability(self, availability: TimeIntervalCollection) -> Self {
        *self.availability.borrow_mut() = Some(availability);
        self
    }

    /// Builder: set position
    pub fn with_position(self, position: PropertyRef<Point3>) -> Self {
        *self.position.borrow_mut() = Some(position);
        self
    }

    /// Builder: set vertex positions
    pub fn with_vertex_positions(self, positions: PropertyRef<Vec<Point3>>) -> Self {
        *self.vertex_positions.borrow_mut() = Some(positions);
        self
    }

    /// Builder: set polygon graphics
    pub fn with_polygon(self, polygon: PolygonGraphics) -> Self {
        *self.polygon.borrow_mut() = Some(polygon);
        self
    }

    /// Builder: set ellipse graphics
    pub fn with_ellipse(self, ellipse: EllipseGraphics) -> Self {
        *self.ellipse.borrow_mut() = Some(ellipse);
        self
    }

    /// Entity id
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Raised after any property slot is replaced
    pub fn definition_changed(&self) -> &Event<DefinitionChange> {
        &self.definition_changed
    }

    /// True when `time` is inside the availability intervals, or when the
    /// entity has no availability at all
    pub fn is_available(&self, time: SimTime) -> bool {
        self.availability
            .borrow()
            .as_ref()
            .map_or(true, |availability| availability.contains(time))
    }

    /// True when availability intervals are defined
    pub fn has_availability(&self) -> bool {
        self.availability.borrow().is_some()
    }

    /// Current position property
    pub fn position(&self) -> Option<PropertyRef<Point3>> {
        self.position.borrow().clone()
    }

    /// Current vertex position property
    pub fn vertex_positions(&self) -> Option<PropertyRef<Vec<Point3>>> {
        self.vertex_positions.borrow().clone()
    }

    /// Current polygon graphics
    pub fn polygon(&self) -> Option<PolygonGraphics> {
        self.polygon.borrow().clone()
    }

    /// Current ellipse graphics
    pub fn ellipse(&self) -> Option<EllipseGraphics> {
        self.ellipse.borrow().clone()
    }

    /// True when the entity can produce a polygon outline: polygon graphics
    /// plus either explicit vertex positions or an ellipse around a position
    pub fn has_shape_source(&self) -> bool {
        self.polygon.borrow().is_some()
            && (self.vertex_positions.borrow().is_some()
                || (self.ellipse.borrow().is_some() && self.position.borrow().is_some()))
    }

    /// Replace availability
    pub fn set_availability(&self, availability: Option<TimeIntervalCollection>) {
        *self.availability.borrow_mut() = availability;
        self.raise_changed(EntityProperty::Availability);
    }

    /// Replace the position property
    pub fn set_position(&self, position: Option<PropertyRef<Point3>>) {
        *self.position.borrow_mut() = position;
        self.raise_changed(EntityProperty::Position);
    }

    /// Replace the vertex position property
    pub fn set_vertex_positions(&self, positions: Option<PropertyRef<Vec<Point3>>>) {
        *self.vertex_positions.borrow_mut() = positions;
        self.raise_changed(EntityProperty::VertexPositions);
    }

    /// Replace polygon graphics
    pub fn set_polygon(&self, polygon: Option<PolygonGraphics>) {
        *self.polygon.borrow_mut() = polygon;
        self.raise_changed(EntityProperty::Polygon);
    }

    /// Replace ellipse graphics
    pub fn set_ellipse(&self, ellipse: Option<EllipseGraphics>) {
        *self.ellipse.borrow_mut() = ellipse;
        self.raise_changed(EntityProperty::Ellipse);
    }

    fn raise_changed(&self, property: EntityProperty) {
        self.definition_changed.raise(&DefinitionChange {
            entity_id: self.id.clone(),
            property,
        });
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("has_availability", &self.has_availability())
            .field("has_shape_source", &self.has_shape_source())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::time::TimeInterval;
    use crate::scene::property::constant;
    use std::cell::Cell;

    #[test]
    fn test_availability() {
        let entity = Entity::new("a").with_availability(TimeIntervalCollection::from_interval(
            TimeInterval::closed(SimTime::from_seconds(0.0), SimTime::from_seconds(10.0)),
        ));
        assert!(entity.is_available(SimTime::from_seconds(5.0)));
        assert!(!entity.is_available(SimTime::from_seconds(11.0)));
        assert!(Entity::new("b").is_available(SimTime::from_seconds(11.0)));
    }

    #[test]
    fn test_shape_source() {
        let entity = Entity::new("a").with_polygon(PolygonGraphics::new());
        assert!(!entity.has_shape_source());

        entity.set_vertex_positions(Some(constant(vec![Point3::origin(); 4])));
        assert!(entity.has_shape_source());

        let ellipse_only = Entity::new("b")
            .with_polygon(PolygonGraphics::new())
            .with_ellipse(EllipseGraphics::new(constant(1.0), constant(1.0)));
        assert!(!ellipse_only.has_shape_source());
        ellipse_only.set_position(Some(constant(Point3::origin())));
        assert!(ellipse_only.has_shape_source());
    }

    #[test]
    fn test_definition_changed_raised_on_set() {
        let entity = Entity::new("a");
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        entity.definition_changed().add_listener(move |change: &DefinitionChange| {
            assert_eq!(change.entity_id.as_str(), "a");
            assert_eq!(change.property, EntityProperty::Polygon);
            sink.set(sink.get() + 1);
        });

        entity.set_polygon(Some(PolygonGraphics::new()));
        assert_eq!(count.get(), 1);
    }
}

//! Scene data model
//!
//! Entities, their time-varying properties, and the collection that owns
//! them. The visualizer only reads from this module; the application mutates
//! it.

pub mod property;
pub mod material;
pub mod ellipse;
pub mod entity;
pub mod registry;
pub mod collection;

pub use property::{
    constant, CallbackProperty, ConstantProperty, Property, PropertyRef, SampledProperty,
    TimeIntervalProperty,
};
pub use material::{
    ColorMaterialProperty, ImageMaterialProperty, Material, MaterialProperty, StripeMaterialProperty,
};
pub use ellipse::EllipseGraphics;
pub use entity::{DefinitionChange, Entity, EntityId, EntityProperty, PolygonGraphics};
pub use registry::EntityKeyedRegistry;
pub use collection::{CollectionChange, CollectionError, EntityCollection};

//! # Scene Visualizer
//!
//! Keeps a live collection of time-varying polygon entities on screen with as
//! few renderable primitives as possible.
//!
//! ## Features
//!
//! - **Classification**: every added entity is routed once to the cheapest
//!   batch its properties allow
//! - **Merged primitives**: static entities share one primitive per
//!   translucency class and only get per-instance color/show patches
//! - **Renderable reuse**: dynamic entities recycle polygons through a
//!   free-list
//! - **Backend agnostic**: drawing goes through the [`render::RenderBackend`]
//!   trait; [`render::HeadlessBackend`] records everything in memory
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_visualizer::prelude::*;
//! use std::rc::Rc;
//!
//! let collection = Rc::new(EntityCollection::new());
//! let mut visualizer = PolygonVisualizer::new(
//!     HeadlessBackend::new(),
//!     VisualizerConfig::default(),
//!     Some(Rc::clone(&collection)),
//! )?;
//!
//! let square = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! collection
//!     .add(Entity::new("lot").with_vertex_positions(constant(square)).with_polygon(PolygonGraphics::new()))
//!     .expect("unique id");
//!
//! visualizer.update(SimTime::EPOCH)?;
//! assert_eq!(visualizer.batch_of(&EntityId::new("lot")), Some(BatchKind::OpaqueStatic));
//! # Ok::<(), VisualizerError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod visualizer;

/// Common imports for visualizer users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, VisualizerConfig},
        foundation::{
            math::{Color, Point3},
            time::{SimTime, TimeInterval, TimeIntervalCollection},
        },
        render::{HeadlessBackend, RenderBackend},
        scene::{
            constant, Entity, EntityCollection, EntityId, MaterialProperty, PolygonGraphics,
            Property, PropertyRef, SampledProperty,
        },
        visualizer::{BatchKind, PolygonVisualizer, VisualizerError, VisualizerResult},
    };
}

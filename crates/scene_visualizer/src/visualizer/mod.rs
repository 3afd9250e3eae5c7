//! Batching and classification engine
//!
//! [`PolygonVisualizer`] owns three batches in fixed priority order:
//!
//! 1. [`StaticAttributeBatch`] (opaque) - one merged primitive
//! 2. [`StaticAttributeBatch`] (translucent) - one merged primitive
//! 3. [`DynamicEntityBatch`] - one polygon per entity, the catch-all
//!
//! An added entity goes to the first batch whose predicate accepts it.

pub mod batch;
pub mod classifier;
pub mod coordinator;
pub mod dynamic_batch;
pub mod error;
pub mod static_batch;


pub use batch::{BatchKind, BatchStats, GeometryBatch};
pub use classifier::{PropertyShapeClassifier, ShapeClass};
pub use coordinator::{PolygonVisualizer, VisualizerStats};
pub use dynamic_batch::DynamicEntityBatch;
pub use error::{VisualizerError, VisualizerResult};
pub use static_batch::{DynamicAttributes, StaticAttributeBatch};

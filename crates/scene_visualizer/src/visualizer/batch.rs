//! Capability interface shared by every batch kind

use crate::foundation::time::SimTime;
use crate::render::{BackendResult, RenderBackend};
use crate::scene::{Entity, EntityId};
use std::fmt;
use std::rc::Rc;

/// The fixed set of batches, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    /// Merged primitive for static, fully opaque entities
    OpaqueStatic,
    /// Merged primitive for static, translucent entities
    TranslucentStatic,
    /// One renderable per entity; accepts anything with a usable shape
    Dynamic,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpaqueStatic => "opaque static",
            Self::TranslucentStatic => "translucent static",
            Self::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

/// Counters describing one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Entities currently held
    pub entities: usize,
    /// Full merged-primitive rebuilds
    pub rebuilds: u64,
    /// Per-instance attribute patches
    pub attribute_patches: u64,
    /// Discrete geometry replacements
    pub geometry_updates: u64,
    /// Renderables in use
    pub active_renderables: usize,
    /// Renderables waiting on the free-list
    pub free_renderables: usize,
}

/// One rendering strategy owning a subset of entities.
///
/// Each batch exclusively owns its records and only touches backend
/// renderables it created.
pub trait GeometryBatch {
    /// Which batch this is
    fn kind(&self) -> BatchKind;

    /// Classification predicate, evaluated once when an entity is added
    fn matches(&self, time: SimTime, entity: &Entity) -> bool;

    /// Take ownership of rendering `entity`
    fn add(&mut self, time: SimTime, entity: Rc<Entity>);

    /// Stop rendering an entity. Returns whether the batch held it; a no-op
    /// for entities the batch never saw.
    fn remove(&mut self, id: &EntityId, backend: &mut dyn RenderBackend) -> BackendResult<bool>;

    /// Bring renderables up to date for `time`
    fn update(&mut self, time: SimTime, backend: &mut dyn RenderBackend) -> BackendResult<()>;

    /// Release every renderable and forget every entity. Idempotent.
    fn remove_all_primitives(&mut self, backend: &mut dyn RenderBackend) -> BackendResult<()>;

    /// Check whether the batch holds an entity
    fn contains(&self, id: &EntityId) -> bool;

    /// Number of entities held
    fn len(&self) -> usize;

    /// True when the batch holds no entities
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters
    fn stats(&self) -> BatchStats;
}

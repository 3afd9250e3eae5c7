//! # Polygon Visualizer
//!
//! Routes entities of an [`EntityCollection`] into the three batches and
//! drives them once per frame.
//!
//! ## Update cycle
//!
//! ```text
//! collection_changed ──► pending { added, removed }
//!
//! update(time):
//!   1. drain removed  → remove() on every batch
//!   2. drain added    → first batch whose matches() accepts it → add()
//!   3. every batch    → update(time)
//! ```
//!
//! Classification happens once, when an added entity is drained. Property
//! changes on a placed entity only mark it stale; it moves batches only if it
//! is removed and added again.

use super::batch::{BatchKind, BatchStats, GeometryBatch};
use super::dynamic_batch::DynamicEntityBatch;
use super::error::{VisualizerError, VisualizerResult};
use super::static_batch::StaticAttributeBatch;
use crate::config::VisualizerConfig;
use crate::foundation::event::ListenerId;
use crate::foundation::time::SimTime;
use crate::render::RenderBackend;
use crate::scene::{
    CollectionChange, DefinitionChange, Entity, EntityCollection, EntityId, EntityKeyedRegistry,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Membership changes reported since the last update. `added` and `removed`
/// never share a key.
#[derive(Default)]
struct PendingChanges {
    added: EntityKeyedRegistry<Rc<Entity>>,
    removed: EntityKeyedRegistry<Rc<Entity>>,
}

impl PendingChanges {
    fn entity_added(&mut self, entity: &Rc<Entity>) {
        let id = entity.id().clone();
        self.removed.remove(&id);
        self.added.insert(id, Rc::clone(entity));
    }

    fn entity_removed(&mut self, entity: &Rc<Entity>) {
        let id = entity.id().clone();
        self.added.remove(&id);
        self.removed.insert(id, Rc::clone(entity));
    }

    /// Removals go first so a replacement sharing an id ends up added
    fn apply(&mut self, change: &CollectionChange) {
        for entity in &change.removed {
            self.entity_removed(entity);
        }
        for entity in &change.added {
            self.entity_added(entity);
        }
    }

    /// Put back entries an aborted update did not get to. Changes recorded
    /// since the drain take precedence.
    fn requeue_removed(&mut self, entries: impl IntoIterator<Item = (EntityId, Rc<Entity>)>) {
        for (id, entity) in entries {
            if !self.added.contains(&id) && !self.removed.contains(&id) {
                self.removed.insert(id, entity);
            }
        }
    }

    fn requeue_added(&mut self, entries: impl IntoIterator<Item = (EntityId, Rc<Entity>)>) {
        for (id, entity) in entries {
            if !self.added.contains(&id) && !self.removed.contains(&id) {
                self.added.insert(id, entity);
            }
        }
    }

    fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}

/// Definition-change listener registered on a tracked entity
struct Subscription {
    entity: Rc<Entity>,
    listener: ListenerId,
}

/// Aggregate counters across all batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualizerStats {
    /// Per-batch counters, in priority order
    pub batches: Vec<(BatchKind, BatchStats)>,
    /// Additions waiting for the next update
    pub pending_added: usize,
    /// Removals waiting for the next update
    pub pending_removed: usize,
    /// Tracked entities whose definition changed after classification
    pub stale_entities: usize,
}

impl VisualizerStats {
    /// Entities currently placed in some batch
    pub fn placed_entities(&self) -> usize {
        self.batches.iter().map(|(_, stats)| stats.entities).sum()
    }
}

/// Maps a live entity collection onto batched renderables
pub struct PolygonVisualizer<B: RenderBackend> {
    backend: B,
    config: VisualizerConfig,
    batches: Vec<Box<dyn GeometryBatch>>,
    collection: Option<Rc<EntityCollection>>,
    collection_listener: Option<ListenerId>,
    pending: Rc<RefCell<PendingChanges>>,
    stale: Rc<RefCell<HashSet<EntityId>>>,
    subscriptions: EntityKeyedRegistry<Subscription>,
    destroyed: bool,
}

impl<B: RenderBackend> PolygonVisualizer<B> {
    /// Create a visualizer drawing into `backend`, optionally attached to a
    /// collection right away
    pub fn new(
        backend: B,
        config: VisualizerConfig,
        collection: Option<Rc<EntityCollection>>,
    ) -> VisualizerResult<Self> {
        config.validate()?;

        let batches: Vec<Box<dyn GeometryBatch>> = vec![
            Box::new(StaticAttributeBatch::new(false, &config)),
            Box::new(StaticAttributeBatch::new(true, &config)),
            Box::new(DynamicEntityBatch::new(&config)),
        ];

        let mut visualizer = Self {
            backend,
            config,
            batches,
            collection: None,
            collection_listener: None,
            pending: Rc::new(RefCell::new(PendingChanges::default())),
            stale: Rc::new(RefCell::new(HashSet::new())),
            subscriptions: EntityKeyedRegistry::new(),
            destroyed: false,
        };
        if collection.is_some() {
            visualizer.set_entity_collection(collection)?;
        }
        Ok(visualizer)
    }

    /// Attach to a different collection (or none).
    ///
    /// Detaches from the previous collection and tears down every renderable,
    /// then treats every current member of the new collection as added.
    pub fn set_entity_collection(
        &mut self,
        collection: Option<Rc<EntityCollection>>,
    ) -> VisualizerResult<()> {
        self.ensure_alive()?;
        let unchanged = match (&self.collection, &collection) {
            (Some(current), Some(next)) => Rc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        if self.collection.is_some() {
            self.detach_collection();
            self.remove_all_primitives()?;
            self.pending.borrow_mut().clear();
        }

        if let Some(collection) = collection {
            let pending = Rc::clone(&self.pending);
            let listener = collection
                .collection_changed()
                .add_listener(move |change: &CollectionChange| pending.borrow_mut().apply(change));

            let members = collection.entities();
            {
                let mut pending = self.pending.borrow_mut();
                for entity in &members {
                    pending.entity_added(entity);
                }
            }
            log::info!("Attached to entity collection with {} members", members.len());

            self.collection_listener = Some(listener);
            self.collection = Some(collection);
        }
        Ok(())
    }

    /// Collection currently observed
    pub fn entity_collection(&self) -> Option<&Rc<EntityCollection>> {
        self.collection.as_ref()
    }

    /// Process pending membership changes, then update every batch for `time`.
    ///
    /// When the backend fails while membership changes are applied, the
    /// changes not yet applied stay pending for the next update.
    pub fn update(&mut self, time: SimTime) -> VisualizerResult<()> {
        self.ensure_alive()?;
        if !time.is_valid() {
            return Err(VisualizerError::InvalidTime(time.seconds()));
        }

        let (added, removed) = {
            let mut pending = self.pending.borrow_mut();
            (pending.added.drain(), pending.removed.drain())
        };

        let mut removed = removed.into_iter();
        while let Some((id, entity)) = removed.next() {
            if let Err(err) = self.remove_everywhere(&id) {
                let mut pending = self.pending.borrow_mut();
                pending.requeue_removed(std::iter::once((id, entity)).chain(removed));
                pending.requeue_added(added);
                return Err(err);
            }
            self.unsubscribe(&id);
        }

        let mut added = added.into_iter();
        while let Some((id, entity)) = added.next() {
            // A re-added entity may still be placed; start from scratch
            if let Err(err) = self.remove_everywhere(&id) {
                self.pending
                    .borrow_mut()
                    .requeue_added(std::iter::once((id, entity)).chain(added));
                return Err(err);
            }
            self.unsubscribe(&id);
            self.subscribe(&entity);

            match self.batches.iter_mut().find(|batch| batch.matches(time, &entity)) {
                Some(batch) => {
                    log::debug!("Placed {} in {} batch", id, batch.kind());
                    batch.add(time, entity);
                }
                None => log::warn!("Entity {} has no usable polygon shape; not rendered", id),
            }
        }

        for batch in &mut self.batches {
            batch.update(time, &mut self.backend)?;
        }
        Ok(())
    }

    /// Tear down every renderable and forget every placed entity.
    ///
    /// Pending changes are kept and processed by the next update.
    pub fn remove_all_primitives(&mut self) -> VisualizerResult<()> {
        self.ensure_alive()?;
        for batch in &mut self.batches {
            batch.remove_all_primitives(&mut self.backend)?;
        }
        self.unsubscribe_all();
        Ok(())
    }

    /// Detach from the collection, tear down every renderable and invalidate
    /// the visualizer. Only [`is_destroyed`](Self::is_destroyed) and the
    /// read-only accessors remain usable.
    pub fn destroy(&mut self) -> VisualizerResult<()> {
        self.ensure_alive()?;
        self.detach_collection();
        self.remove_all_primitives()?;
        self.pending.borrow_mut().clear();
        self.destroyed = true;
        log::info!("Polygon visualizer destroyed");
        Ok(())
    }

    /// True after [`destroy`](Self::destroy)
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The batch currently holding an entity
    pub fn batch_of(&self, id: &EntityId) -> Option<BatchKind> {
        self.batches
            .iter()
            .find(|batch| batch.contains(id))
            .map(|batch| batch.kind())
    }

    /// Counters of one batch
    pub fn batch_stats(&self, kind: BatchKind) -> Option<BatchStats> {
        self.batches
            .iter()
            .find(|batch| batch.kind() == kind)
            .map(|batch| batch.stats())
    }

    /// Counters across all batches
    pub fn stats(&self) -> VisualizerStats {
        let pending = self.pending.borrow();
        VisualizerStats {
            batches: self
                .batches
                .iter()
                .map(|batch| (batch.kind(), batch.stats()))
                .collect(),
            pending_added: pending.added.len(),
            pending_removed: pending.removed.len(),
            stale_entities: self.stale.borrow().len(),
        }
    }

    /// True when a tracked entity's definition changed after it was
    /// classified. It keeps its batch until removed and re-added.
    pub fn is_classification_stale(&self, id: &EntityId) -> bool {
        self.stale.borrow().contains(id)
    }

    /// Additions waiting for the next update
    pub fn pending_added_count(&self) -> usize {
        self.pending.borrow().added.len()
    }

    /// Removals waiting for the next update
    pub fn pending_removed_count(&self) -> usize {
        self.pending.borrow().removed.len()
    }

    /// The render backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The render backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Active configuration
    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    fn remove_everywhere(&mut self, id: &EntityId) -> VisualizerResult<()> {
        for batch in &mut self.batches {
            batch.remove(id, &mut self.backend)?;
        }
        Ok(())
    }

    fn ensure_alive(&self) -> VisualizerResult<()> {
        if self.destroyed {
            return Err(VisualizerError::Destroyed);
        }
        Ok(())
    }

    fn detach_collection(&mut self) {
        if let Some(collection) = self.collection.take() {
            if let Some(listener) = self.collection_listener.take() {
                collection.collection_changed().remove_listener(listener);
            }
            log::info!("Detached from entity collection");
        }
    }

    fn subscribe(&mut self, entity: &Rc<Entity>) {
        let stale = Rc::clone(&self.stale);
        let listener = entity
            .definition_changed()
            .add_listener(move |change: &DefinitionChange| {
                log::debug!(
                    "{:?} of {} changed after classification",
                    change.property,
                    change.entity_id
                );
                stale.borrow_mut().insert(change.entity_id.clone());
            });
        self.subscriptions.insert(
            entity.id().clone(),
            Subscription {
                entity: Rc::clone(entity),
                listener,
            },
        );
    }

    fn unsubscribe(&mut self, id: &EntityId) {
        if let Some(subscription) = self.subscriptions.remove(id) {
            subscription
                .entity
                .definition_changed()
                .remove_listener(subscription.listener);
        }
        self.stale.borrow_mut().remove(id);
    }

    fn unsubscribe_all(&mut self) {
        for (_, subscription) in self.subscriptions.drain() {
            subscription
                .entity
                .definition_changed()
                .remove_listener(subscription.listener);
        }
        self.stale.borrow_mut().clear();
    }
}

impl<B: RenderBackend> Drop for PolygonVisualizer<B> {
    fn drop(&mut self) {
        self.detach_collection();
        self.unsubscribe_all();
    }
}

//! Entity collection with batched change notifications
//!
//! Every add or remove raises [`EntityCollection::collection_changed`]
//! immediately unless events are suspended. While suspended, changes are
//! reconciled into one net change that is raised when the outermost
//! [`resume_events`](EntityCollection::resume_events) runs, so listeners see
//! at most one notification per update cycle.

use super::entity::{Entity, EntityId};
use super::registry::EntityKeyedRegistry;
use crate::foundation::event::Event;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Errors raised by collection mutations
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// The id is already used by another member
    #[error("An entity with id {0} already exists in this collection")]
    DuplicateId(EntityId),
}

/// Argument of [`EntityCollection::collection_changed`]
#[derive(Debug, Clone, Default)]
pub struct CollectionChange {
    /// Entities that joined the collection
    pub added: Vec<Rc<Entity>>,
    /// Entities that left the collection
    pub removed: Vec<Rc<Entity>>,
}

impl CollectionChange {
    /// True when nothing was added or removed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered set of entities owned by the application
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: RefCell<EntityKeyedRegistry<Rc<Entity>>>,
    suspend_count: Cell<u32>,
    added: RefCell<EntityKeyedRegistry<Rc<Entity>>>,
    removed: RefCell<EntityKeyedRegistry<Rc<Entity>>>,
    collection_changed: Event<CollectionChange>,
}

impl EntityCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Raised with the net change after each mutation, or once on resume
    pub fn collection_changed(&self) -> &Event<CollectionChange> {
        &self.collection_changed
    }

    /// Add an entity, returning the shared handle stored in the collection
    pub fn add(&self, entity: impl Into<Rc<Entity>>) -> Result<Rc<Entity>, CollectionError> {
        let entity = entity.into();
        let id = entity.id().clone();
        {
            let mut entities = self.entities.borrow_mut();
            if entities.contains(&id) {
                return Err(CollectionError::DuplicateId(id));
            }
            entities.insert(id.clone(), Rc::clone(&entity));
        }

        let cancelled = {
            let mut removed = self.removed.borrow_mut();
            match removed.get(&id) {
                Some(pending) if Rc::ptr_eq(pending, &entity) => removed.remove(&id).is_some(),
                _ => false,
            }
        };
        if !cancelled {
            self.added.borrow_mut().insert(id, Rc::clone(&entity));
        }

        self.raise_if_not_suspended();
        Ok(entity)
    }

    /// Remove an entity by id, returning it if it was a member
    pub fn remove(&self, id: &EntityId) -> Option<Rc<Entity>> {
        let entity = self.entities.borrow_mut().remove(id)?;

        let cancelled = {
            let mut added = self.added.borrow_mut();
            match added.get(id) {
                Some(pending) if Rc::ptr_eq(pending, &entity) => added.remove(id).is_some(),
                _ => false,
            }
        };
        if !cancelled {
            self.removed.borrow_mut().insert(id.clone(), Rc::clone(&entity));
        }

        self.raise_if_not_suspended();
        Some(entity)
    }

    /// Remove every member
    pub fn remove_all(&self) {
        self.suspend_events();
        let ids: Vec<EntityId> = self.entities.borrow().keys().cloned().collect();
        for id in &ids {
            self.remove(id);
        }
        self.resume_events();
    }

    /// Look up a member
    pub fn get_by_id(&self, id: &EntityId) -> Option<Rc<Entity>> {
        self.entities.borrow().get(id).cloned()
    }

    /// Check membership
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.borrow().contains(id)
    }

    /// Snapshot of the members in insertion order
    pub fn entities(&self) -> Vec<Rc<Entity>> {
        self.entities.borrow().values().cloned().collect()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entities.borrow().len()
    }

    /// True when the collection has no members
    pub fn is_empty(&self) -> bool {
        self.entities.borrow().is_empty()
    }

    /// Start accumulating changes instead of raising them. Calls nest.
    pub fn suspend_events(&self) {
        self.suspend_count.set(self.suspend_count.get() + 1);
    }

    /// Undo one [`suspend_events`](Self::suspend_events); the outermost call
    /// raises the accumulated change, if any
    pub fn resume_events(&self) {
        let count = self.suspend_count.get();
        if count == 0 {
            log::warn!("resume_events called without a matching suspend_events");
            return;
        }
        self.suspend_count.set(count - 1);
        self.raise_if_not_suspended();
    }

    /// True while events are suspended
    pub fn events_suspended(&self) -> bool {
        self.suspend_count.get() > 0
    }

    fn raise_if_not_suspended(&self) {
        if self.events_suspended() {
            return;
        }
        let change = CollectionChange {
            added: self.added.borrow_mut().drain().into_iter().map(|(_, e)| e).collect(),
            removed: self.removed.borrow_mut().drain().into_iter().map(|(_, e)| e).collect(),
        };
        if !change.is_empty() {
            self.collection_changed.raise(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(collection: &EntityCollection) -> Rc<RefCell<Vec<(Vec<String>, Vec<String>)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        collection.collection_changed().add_listener(move |change: &CollectionChange| {
            let names = |list: &[Rc<Entity>]| -> Vec<String> {
                list.iter().map(|e| e.id().to_string()).collect()
            };
            sink.borrow_mut().push((names(change.added.as_slice()), names(change.removed.as_slice())));
        });
        log
    }

    #[test]
    fn test_immediate_notifications() {
        let collection = EntityCollection::new();
        let log = recorder(&collection);

        collection.add(Entity::new("a")).expect("Should add");
        collection.remove(&EntityId::new("a"));

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, ["a"]);
        assert_eq!(log[1].1, ["a"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let collection = EntityCollection::new();
        collection.add(Entity::new("a")).expect("Should add");
        assert!(matches!(
            collection.add(Entity::new("a")),
            Err(CollectionError::DuplicateId(_))
        ));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_suspended_changes_reconcile() {
        let collection = EntityCollection::new();
        let kept = collection.add(Entity::new("kept")).expect("Should add");
        let log = recorder(&collection);

        collection.suspend_events();
        collection.suspend_events();
        collection.add(Entity::new("transient")).expect("Should add");
        collection.remove(&EntityId::new("transient"));
        collection.remove(kept.id());
        collection.add(Rc::clone(&kept)).expect("Should re-add");
        collection.add(Entity::new("new")).expect("Should add");
        collection.resume_events();
        assert!(log.borrow().is_empty());
        collection.resume_events();

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, ["new"]);
        assert!(log[0].1.is_empty());
    }

    #[test]
    fn test_remove_all_raises_once() {
        let collection = EntityCollection::new();
        collection.add(Entity::new("a")).expect("Should add");
        collection.add(Entity::new("b")).expect("Should add");
        let log = recorder(&collection);

        collection.remove_all();

        assert!(collection.is_empty());
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1, ["a", "b"]);
    }
}

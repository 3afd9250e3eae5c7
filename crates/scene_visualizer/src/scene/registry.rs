//! Insertion-ordered map keyed by entity id
//!
//! Values live in a slot vector in insertion order and a hash index maps each
//! id to its slot. Removal leaves a tombstone so it stays O(1); tombstones are
//! compacted once they outnumber live entries.

use super::entity::EntityId;
use std::collections::HashMap;

/// Tombstones below this count are never compacted
const MIN_COMPACTION_TOMBSTONES: usize = 16;

/// Unique-key map from [`EntityId`] to `V` with stable insertion-order
/// iteration
#[derive(Debug, Clone)]
pub struct EntityKeyedRegistry<V> {
    slots: Vec<Option<(EntityId, V)>>,
    index: HashMap<EntityId, usize>,
}

impl<V> EntityKeyedRegistry<V> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when there are no live entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check whether `id` is present
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a value. An existing value for the same id is replaced in place
    /// (keeping its position) and returned.
    pub fn insert(&mut self, id: EntityId, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&id) {
            let entry = self.slots[slot].replace((id, value));
            return entry.map(|(_, old)| old);
        }
        self.index.insert(id.clone(), self.slots.len());
        self.slots.push(Some((id, value)));
        None
    }

    /// Look up a value
    pub fn get(&self, id: &EntityId) -> Option<&V> {
        let slot = *self.index.get(id)?;
        self.slots[slot].as_ref().map(|(_, value)| value)
    }

    /// Look up a value mutably
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut V> {
        let slot = *self.index.get(id)?;
        self.slots[slot].as_mut().map(|(_, value)| value)
    }

    /// Remove a value, returning it if it was present
    pub fn remove(&mut self, id: &EntityId) -> Option<V> {
        let slot = self.index.remove(id)?;
        let removed = self.slots[slot].take().map(|(_, value)| value);
        self.maybe_compact();
        removed
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    /// Remove and return every entry in insertion order
    pub fn drain(&mut self) -> Vec<(EntityId, V)> {
        self.index.clear();
        self.slots.drain(..).flatten().collect()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &V)> {
        self.slots.iter().flatten().map(|(id, value)| (id, value))
    }

    /// Iterate entries mutably in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut V)> {
        self.slots.iter_mut().flatten().map(|(id, value)| (&*id, value))
    }

    /// Iterate ids in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &EntityId> {
        self.iter().map(|(id, _)| id)
    }

    /// Iterate values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Iterate values mutably in insertion order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, value)| value)
    }

    fn maybe_compact(&mut self) {
        let tombstones = self.slots.len() - self.index.len();
        if tombstones < MIN_COMPACTION_TOMBSTONES || tombstones <= self.index.len() {
            return;
        }

        self.slots.retain(Option::is_some);
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some((id, _)) = entry {
                if let Some(index) = self.index.get_mut(id) {
                    *index = slot;
                }
            }
        }
    }
}

impl<V> Default for EntityKeyedRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::new(name)
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut registry = EntityKeyedRegistry::new();
        for name in ["a", "b", "c", "d"] {
            registry.insert(id(name), name.to_uppercase());
        }

        assert_eq!(registry.remove(&id("b")), Some("B".to_string()));
        assert_eq!(registry.remove(&id("b")), None);

        let keys: Vec<_> = registry.keys().map(EntityId::as_str).collect();
        assert_eq!(keys, ["a", "c", "d"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut registry = EntityKeyedRegistry::new();
        registry.insert(id("a"), 1);
        registry.insert(id("b"), 2);
        assert_eq!(registry.insert(id("a"), 10), Some(1));

        let values: Vec<_> = registry.values().copied().collect();
        assert_eq!(values, [10, 2]);
    }

    #[test]
    fn test_reinsert_goes_to_end() {
        let mut registry = EntityKeyedRegistry::new();
        registry.insert(id("a"), 1);
        registry.insert(id("b"), 2);
        registry.remove(&id("a"));
        registry.insert(id("a"), 3);

        let keys: Vec<_> = registry.keys().map(EntityId::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_compaction_keeps_lookup_valid() {
        let mut registry = EntityKeyedRegistry::new();
        for i in 0..100 {
            registry.insert(id(&i.to_string()), i);
        }
        for i in 0..90 {
            registry.remove(&id(&i.to_string()));
        }

        assert_eq!(registry.len(), 10);
        assert!(registry.slots.len() < 100);
        for i in 90..100 {
            assert_eq!(registry.get(&id(&i.to_string())), Some(&i));
        }
        let values: Vec<_> = registry.values().copied().collect();
        assert_eq!(values, (90..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_get_mut_and_drain() {
        let mut registry = EntityKeyedRegistry::new();
        registry.insert(id("a"), 1);
        registry.insert(id("b"), 2);
        if let Some(value) = registry.get_mut(&id("b")) {
            *value = 20;
        }

        let drained = registry.drain();
        assert_eq!(drained, vec![(id("a"), 1), (id("b"), 20)]);
        assert!(registry.is_empty());
        assert!(!registry.contains(&id("a")));
    }
}

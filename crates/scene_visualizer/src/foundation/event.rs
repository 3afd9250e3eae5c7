//! Single-threaded listener lists
//!
//! Follows the registration model of the engine event system: only
//! registered handlers are notified, and a handler can be unregistered by
//! the id returned at registration.

use slotmap::SlotMap;
use std::cell::RefCell;
use std::fmt;

slotmap::new_key_type! {
    /// Id returned when a listener is registered
    pub struct ListenerId;
}

type Listener<A> = Box<dyn FnMut(&A)>;

/// A list of callbacks raised with a borrowed argument.
///
/// Listeners must not register or unregister on the same event while it is
/// being raised.
pub struct Event<A> {
    listeners: RefCell<SlotMap<ListenerId, Listener<A>>>,
}

impl<A> Event<A> {
    /// Create an event with no listeners
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(SlotMap::with_key()),
        }
    }

    /// Register a listener
    pub fn add_listener(&self, listener: impl FnMut(&A) + 'static) -> ListenerId {
        self.listeners.borrow_mut().insert(Box::new(listener))
    }

    /// Unregister a listener, returning whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id).is_some()
    }

    /// Invoke every listener with `args`
    pub fn raise(&self, args: &A) {
        for listener in self.listeners.borrow_mut().values_mut() {
            listener(args);
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::cell::Cell;

    #[test]
    fn test_raise_and_remove() {
        let event = Event::<u32>::new();
        let total = Rc::new(Cell::new(0));

        let sink = Rc::clone(&total);
        let id = event.add_listener(move |value| sink.set(sink.get() + *value));
        assert_eq!(event.listener_count(), 1);

        event.raise(&5);
        assert_eq!(total.get(), 5);

        assert!(event.remove_listener(id));
        assert!(!event.remove_listener(id));
        event.raise(&5);
        assert_eq!(total.get(), 5);
    }
}

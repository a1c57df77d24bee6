// SPDX-License-Identifier: GPL-3.0-only

//! Ordered listener registry keyed by event name.
//!
//! Listeners for one event are kept in registration order. Registering the
//! same shared callback twice for the same event is a no-op that returns the
//! existing [`ListenerId`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// A bus callback. Receives the event payload.
pub type Callback = Rc<dyn Fn(&Value)>;

/// Identifies one registration in a [`ListenerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    callback: Callback,
}

/// Event name to insertion-ordered callbacks, de-duplicated by identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Listener>>,
    next_id: u64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for an event.
    ///
    /// If this exact callback (same allocation) is already registered for
    /// the event, nothing changes and the existing id is returned.
    pub fn insert(&mut self, event: &str, callback: Callback) -> ListenerId {
        let entries = self.listeners.entry(event.to_string()).or_default();

        if let Some(existing) = entries.iter().find(|l| same_callback(&l.callback, &callback)) {
            return existing.id;
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        entries.push(Listener { id, callback });
        id
    }

    /// Removes one registration. Returns `false` if it was already gone.
    pub fn remove(&mut self, event: &str, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(event) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|l| l.id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            self.listeners.remove(event);
        }

        removed
    }

    /// Returns the registrations for an event, in registration order.
    #[must_use]
    pub fn snapshot(&self, event: &str) -> Vec<(ListenerId, Callback)> {
        self.listeners
            .get(event)
            .map(|entries| entries.iter().map(|l| (l.id, Rc::clone(&l.callback))).collect())
            .unwrap_or_default()
    }

    /// Returns `true` while the registration is still present.
    #[must_use]
    pub fn contains(&self, event: &str, id: ListenerId) -> bool {
        self.listeners
            .get(event)
            .is_some_and(|entries| entries.iter().any(|l| l.id == id))
    }

    /// Number of callbacks registered for an event.
    #[must_use]
    pub fn len(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Returns `true` if no event has any listener.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, entries) in &self.listeners {
            map.entry(event, &entries.len());
        }
        map.finish()
    }
}

// Compare allocation addresses only; vtable pointers of the same closure may
// differ between codegen units.
fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

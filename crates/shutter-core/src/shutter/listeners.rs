//! Change listener collection shared by single shutters and groups

use std::sync::{Arc, Mutex, PoisonError};

use crate::traits::Listener;

/// Set of change callbacks
///
/// Each listener fires at most once per notification and registering the
/// same `Arc` twice is a no-op. Callbacks run outside the lock, so a listener
/// may itself register further listeners.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<Listener>>,
}

impl ListenerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener unless the same callback is already present
    pub fn add(&self, listener: Listener) {
        let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.iter().any(|existing| same_listener(existing, &listener)) {
            return;
        }
        guard.push(listener);
    }

    /// Unregister a listener, returning whether it was present
    pub fn remove(&self, listener: &Listener) -> bool {
        let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|existing| !same_listener(existing, listener));
        guard.len() != before
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered listener once
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in snapshot {
            listener();
        }
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers of the same closure may differ
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

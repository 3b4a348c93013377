//! Id-indexed registry of shared objects
//!
//! One mutex, one map. Entries are created and erased explicitly; nothing
//! else removes them. The lock is held only for the map operation itself,
//! never while running object code, so registry lookups cannot cycle with
//! per-object locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::id::{next_handle_id, HandleId};

/// Process-wide table mapping handle ids to live objects
///
/// Ids come from one process-wide counter shared by all registries; an id
/// issued by one registry always misses in every other.
///
/// # Example
///
/// ```
/// use napi_host_core::HandleRegistry;
///
/// let registry: HandleRegistry<String> = HandleRegistry::new();
/// let (id, _) = registry.insert("job".to_string());
/// assert_eq!(registry.get(id).as_deref().map(String::as_str), Some("job"));
/// assert!(registry.remove(id).is_some());
/// assert!(registry.get(id).is_none());
/// ```
pub struct HandleRegistry<T> {
    entries: Mutex<HashMap<HandleId, Arc<T>>>,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register `value` under a fresh id
    pub fn insert(&self, value: T) -> (HandleId, Arc<T>) {
        self.insert_with(|_| value)
    }

    /// Register an object that needs to know its own id
    pub fn insert_with<F>(&self, make: F) -> (HandleId, Arc<T>)
    where
        F: FnOnce(HandleId) -> T,
    {
        let id = next_handle_id();
        let object = Arc::new(make(id));
        self.entries.lock().insert(id, Arc::clone(&object));
        (id, object)
    }

    /// Look up a live object
    pub fn get(&self, id: HandleId) -> Option<Arc<T>> {
        if id.is_none() {
            return None;
        }
        self.entries.lock().get(&id).cloned()
    }

    /// Erase an entry, returning it if it was present
    pub fn remove(&self, id: HandleId) -> Option<Arc<T>> {
        self.entries.lock().remove(&id)
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of the registered ids
    pub fn ids(&self) -> Vec<HandleId> {
        self.entries.lock().keys().copied().collect()
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for HandleRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Id allocation for platform handles.
//!
//! The browser hands back its own handle types (`i32` timer handles, listener
//! functions). The backend traits speak in `u64` ids, so each binding keeps a
//! table from the id it issued to whatever it must pass back to the browser
//! to cancel.

use std::collections::HashMap;

/// Monotonic id to platform handle map. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct HandleTable<T> {
    next: u64,
    entries: HashMap<u64, T>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 0,
            entries: HashMap::new(),
        }
    }

    /// Issue a fresh id without binding a handle yet.
    ///
    /// Timers need their id inside the callback before the browser has
    /// returned a handle, hence the split from [`bind`](Self::bind).
    pub fn allocate(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Attach `handle` to a previously allocated id.
    pub fn bind(&mut self, id: u64, handle: T) {
        self.entries.insert(id, handle);
    }

    /// Allocate and bind in one step.
    pub fn insert(&mut self, handle: T) -> u64 {
        let id = self.allocate();
        self.bind(id, handle);
        id
    }

    /// Remove and return the handle for `id`.
    pub fn take(&mut self, id: u64) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Whether `id` is bound.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of bound handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handle is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#![forbid(unsafe_code)]

//! Teardown registry: one cleanup action per subscription id.
//!
//! [`TeardownRegistry::teardown`] removes the entry before running it, so a
//! second call for the same id, including one made by the action itself,
//! finds nothing and does nothing. Construct one registry at startup and
//! hand clones of it to every component that starts subscriptions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Subscription identity.
pub type SubId = u64;

/// A cleanup action, run at most once.
pub type Teardown = Box<dyn FnOnce()>;

/// Shared map from [`SubId`] to its pending [`Teardown`].
#[derive(Clone, Default)]
pub struct TeardownRegistry {
    entries: Rc<RefCell<HashMap<SubId, Teardown>>>,
}

impl fmt::Debug for TeardownRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeardownRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

impl TeardownRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `teardown` under `id`, replacing (without running) any action
    /// already there.
    pub fn register(&self, id: SubId, teardown: impl FnOnce() + 'static) {
        let previous = self.entries.borrow_mut().insert(id, Box::new(teardown));
        if previous.is_some() {
            tracing::debug!(target: "tabwire.sub", sub_id = id, "teardown replaced");
        }
    }

    /// Remove and run the action for `id`. Returns whether one ran.
    pub fn teardown(&self, id: SubId) -> bool {
        let action = self.entries.borrow_mut().remove(&id);
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Whether an action is pending for `id`.
    #[must_use]
    pub fn contains(&self, id: SubId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

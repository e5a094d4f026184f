#![forbid(unsafe_code)]

//! In-memory history, title, listeners, storage, and randomness.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tabwire_backend::{
    HistoryHost, KeyValueStore, ListenerHost, ListenerId, ListenerTarget, RandomSource, TitleHost,
};
use tabwire_core::Location;

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct HistoryState {
    entries: Vec<Location>,
    index: usize,
    pushed: Vec<String>,
    announced: usize,
    assigned: Vec<String>,
}

/// Session history over a list of locations.
///
/// `push_state` resolves its argument against the current location, drops
/// any forward entries, and appends. [`back`](Self::back) and
/// [`forward`](Self::forward) move through the list the way the browser
/// buttons do; the caller then delivers the popstate to whoever listens.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    state: Rc<RefCell<HistoryState>>,
}

impl MemoryHistory {
    /// Start at `href`.
    ///
    /// # Panics
    ///
    /// Panics if `href` is not an absolute URL.
    #[must_use]
    pub fn new(href: &str) -> Self {
        let start = match Location::parse(href) {
            Ok(loc) => loc,
            Err(err) => panic!("MemoryHistory needs an absolute start url: {err}"),
        };
        Self {
            state: Rc::new(RefCell::new(HistoryState {
                entries: vec![start],
                index: 0,
                pushed: Vec::new(),
                announced: 0,
                assigned: Vec::new(),
            })),
        }
    }

    /// Every argument passed to `push_state`, in order.
    #[must_use]
    pub fn pushed(&self) -> Vec<String> {
        self.state.borrow().pushed.clone()
    }

    /// How many times `announce_push` was called.
    #[must_use]
    pub fn announced(&self) -> usize {
        self.state.borrow().announced
    }

    /// Every argument passed to `assign`, in order.
    #[must_use]
    pub fn assigned(&self) -> Vec<String> {
        self.state.borrow().assigned.clone()
    }

    /// Number of entries in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Always false; the stack starts with one entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Step back one entry. Returns the new location, or `None` at the start.
    pub fn back(&self) -> Option<Location> {
        let mut state = self.state.borrow_mut();
        state.index = state.index.checked_sub(1)?;
        Some(state.entries[state.index].clone())
    }

    /// Step forward one entry. Returns the new location, or `None` at the end.
    pub fn forward(&self) -> Option<Location> {
        let mut state = self.state.borrow_mut();
        if state.index + 1 >= state.entries.len() {
            return None;
        }
        state.index += 1;
        Some(state.entries[state.index].clone())
    }
}

impl HistoryHost for MemoryHistory {
    fn location(&self) -> Location {
        let state = self.state.borrow();
        state.entries[state.index].clone()
    }

    fn push_state(&self, url: &str) {
        let mut state = self.state.borrow_mut();
        state.pushed.push(url.to_owned());
        let base = state.entries[state.index].href.clone();
        match Location::resolve(&base, url) {
            Ok(next) => {
                let keep = state.index + 1;
                state.entries.truncate(keep);
                state.entries.push(next);
                state.index = keep;
            }
            Err(err) => tracing::warn!(url, error = %err, "push_state with unresolvable url"),
        }
    }

    fn announce_push(&self) {
        self.state.borrow_mut().announced += 1;
    }

    fn assign(&self, url: &str) {
        self.state.borrow_mut().assigned.push(url.to_owned());
    }
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

/// Document title that counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryTitle {
    title: Rc<RefCell<String>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryTitle {
    /// Start with `title`.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: Rc::new(RefCell::new(title.to_owned())),
            writes: Rc::new(Cell::new(0)),
        }
    }

    /// How many times `set_title` reached the document.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl TitleHost for MemoryTitle {
    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn set_title(&self, title: &str) {
        self.writes.set(self.writes.get() + 1);
        *self.title.borrow_mut() = title.to_owned();
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Payload delivered by [`MemoryListeners::fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeEvent {
    /// Event name, e.g. `"keydown"`.
    pub name: String,
    /// Free-form payload chosen by the test.
    pub detail: String,
}

struct Registered {
    id: ListenerId,
    target: ListenerTarget,
    name: String,
    callback: Rc<dyn Fn(&FakeEvent)>,
}

#[derive(Default)]
struct ListenerState {
    next_id: ListenerId,
    listeners: Vec<Registered>,
}

/// Document and window listeners fired by the test.
#[derive(Clone, Default)]
pub struct MemoryListeners {
    state: Rc<RefCell<ListenerState>>,
}

impl MemoryListeners {
    /// No listeners attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners currently attached for `name` on `target`.
    #[must_use]
    pub fn count(&self, target: ListenerTarget, name: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.target == target && l.name == name)
            .count()
    }

    /// Deliver an event to every listener attached when the call starts.
    /// Returns how many listeners ran.
    pub fn fire(&self, target: ListenerTarget, name: &str, detail: &str) -> usize {
        let snapshot: Vec<Rc<dyn Fn(&FakeEvent)>> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.target == target && l.name == name)
            .map(|l| Rc::clone(&l.callback))
            .collect();
        let event = FakeEvent {
            name: name.to_owned(),
            detail: detail.to_owned(),
        };
        for callback in &snapshot {
            callback(&event);
        }
        snapshot.len()
    }
}

impl ListenerHost for MemoryListeners {
    type Event = FakeEvent;

    fn add_listener(
        &self,
        target: ListenerTarget,
        name: &str,
        callback: Rc<dyn Fn(&FakeEvent)>,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.push(Registered {
            id,
            target,
            name: name.to_owned(),
            callback,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|l| l.id != id);
    }
}

// ---------------------------------------------------------------------------
// Storage and randomness
// ---------------------------------------------------------------------------

/// Key/value store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .borrow()
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Seeded pseudo-random source; equal seeds give equal sequences.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Rc<RefCell<ChaCha8Rng>>,
}

impl SeededRandom {
    /// Create from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.borrow_mut().gen_range(0..n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_state_resolves_and_moves_forward() {
        let history = MemoryHistory::new("https://app.test/");
        history.push_state("/widgets/42");
        assert_eq!(history.location().pathname, "/widgets/42");
        assert_eq!(history.location().hostname, "app.test");
        assert_eq!(history.pushed(), vec!["/widgets/42".to_string()]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn back_and_forward() {
        let history = MemoryHistory::new("https://app.test/a");
        history.push_state("/b");
        history.push_state("/c");

        assert_eq!(history.back().map(|l| l.pathname), Some("/b".into()));
        assert_eq!(history.back().map(|l| l.pathname), Some("/a".into()));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward().map(|l| l.pathname), Some("/b".into()));
    }

    #[test]
    fn push_after_back_drops_forward_entries() {
        let history = MemoryHistory::new("https://app.test/a");
        history.push_state("/b");
        history.back();
        history.push_state("/z");
        assert_eq!(history.len(), 2);
        assert_eq!(history.forward(), None);
    }

    #[test]
    fn title_counts_writes() {
        let title = MemoryTitle::new("start");
        title.set_title("next");
        assert_eq!(title.title(), "next");
        assert_eq!(title.writes(), 1);
    }

    #[test]
    fn listeners_fire_by_target_and_name() {
        let listeners = MemoryListeners::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let id = listeners.add_listener(
            ListenerTarget::Document,
            "keydown",
            Rc::new(move |ev: &FakeEvent| s.borrow_mut().push(ev.detail.clone())),
        );

        assert_eq!(listeners.fire(ListenerTarget::Window, "keydown", "x"), 0);
        assert_eq!(listeners.fire(ListenerTarget::Document, "keydown", "k"), 1);
        listeners.remove_listener(id);
        assert_eq!(listeners.fire(ListenerTarget::Document, "keydown", "k"), 0);
        assert_eq!(*seen.borrow(), vec!["k".to_string()]);
    }

    #[test]
    fn storage_get_set_remove() {
        let store = MemoryStorage::new();
        assert_eq!(store.get("token"), None);
        store.set("token", "abc");
        assert_eq!(store.get("token").as_deref(), Some("abc"));
        store.remove("token");
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn storage_empty_value_reads_as_missing() {
        let store = MemoryStorage::new();
        store.set("token", "");
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn seeded_random_is_repeatable() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        let xs: Vec<u32> = (0..8).map(|_| a.below(100)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.below(100)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| *x < 100));
        assert_eq!(a.below(0), 0);
    }
}

#![forbid(unsafe_code)]

//! In-process publish/subscribe fan-out.
//!
//! Subscribers are notified in subscription order. The list is copy-on-write:
//! [`EventBus::publish`] iterates the snapshot current when it began, so a
//! subscriber that subscribes or unsubscribes during its own notification
//! changes only later publishes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A subscriber callback. Identity is the allocation, so keep the `Rc` you
/// subscribed to unsubscribe later.
pub type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Cloneable handle to one subscriber list.
pub struct EventBus<T> {
    subscribers: Rc<RefCell<Rc<[Subscriber<T>]>>>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .finish()
    }
}

fn same_subscriber<T>(a: &Subscriber<T>, b: &Subscriber<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl<T> EventBus<T> {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Rc::from(Vec::new()))),
        }
    }

    /// Append `subscriber`. Subscribing the same callback twice notifies it
    /// twice.
    pub fn subscribe(&self, subscriber: Subscriber<T>) {
        let mut list = self.subscribers.borrow_mut();
        let mut next = list.to_vec();
        next.push(subscriber);
        *list = Rc::from(next);
    }

    /// Wrap `f`, subscribe it, and return the handle for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe_fn(&self, f: impl Fn(&T) + 'static) -> Subscriber<T>
    where
        T: 'static,
    {
        let subscriber: Subscriber<T> = Rc::new(f);
        self.subscribe(Rc::clone(&subscriber));
        subscriber
    }

    /// Remove every entry of `subscriber`. Unknown subscribers are ignored.
    pub fn unsubscribe(&self, subscriber: &Subscriber<T>) {
        let mut list = self.subscribers.borrow_mut();
        if !list.iter().any(|s| same_subscriber(s, subscriber)) {
            return;
        }
        let next: Vec<_> = list
            .iter()
            .filter(|s| !same_subscriber(s, subscriber))
            .cloned()
            .collect();
        *list = Rc::from(next);
    }

    /// Notify every subscriber present now, in order. Returns how many ran.
    pub fn publish(&self, payload: &T) -> usize {
        let snapshot = Rc::clone(&self.subscribers.borrow());
        for subscriber in snapshot.iter() {
            subscriber(payload);
        }
        snapshot.len()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Whether nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#![forbid(unsafe_code)]

//! The single application-message channel.
//!
//! Every producer (socket frames, navigation, timers, DOM listeners) holds a
//! cloned [`Dispatch`] and pushes typed messages into one [`MessageQueue`].
//! The program loop is the only consumer. A producer never calls into the
//! model directly, so a browser callback always returns to the event loop
//! before the application observes its message.

use std::fmt;
use std::rc::Rc;
use std::sync::mpsc;

/// Producer handle for the message queue.
pub struct Dispatch<M> {
    sender: mpsc::Sender<M>,
    waker: Option<Rc<dyn Fn()>>,
}

impl<M> Clone for Dispatch<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<M> fmt::Debug for Dispatch<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

impl<M> Dispatch<M> {
    /// Queue `msg`. Returns `false` when the queue is gone, in which case the
    /// message is dropped.
    pub fn send(&self, msg: M) -> bool {
        if self.sender.send(msg).is_err() {
            tracing::trace!(target: "tabwire.dispatch", "queue closed; message dropped");
            return false;
        }
        if let Some(wake) = &self.waker {
            wake();
        }
        true
    }
}

/// Receiving end of the message channel.
pub struct MessageQueue<M> {
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
    waker: Option<Rc<dyn Fn()>>,
}

impl<M> Default for MessageQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> MessageQueue<M> {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            waker: None,
        }
    }

    /// Call `waker` after every successful send, so a host can schedule a
    /// pump of the queue. Only dispatchers created afterwards carry it.
    #[must_use]
    pub fn with_waker(mut self, waker: impl Fn() + 'static) -> Self {
        self.waker = Some(Rc::new(waker));
        self
    }

    /// A new producer handle.
    pub fn dispatcher(&self) -> Dispatch<M> {
        Dispatch {
            sender: self.sender.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Next queued message, if any.
    pub fn try_next(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Take every queued message in arrival order.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

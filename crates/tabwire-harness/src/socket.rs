#![forbid(unsafe_code)]

//! Loopback sockets driven by the test.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabwire_backend::{PhysicalSocket, SocketDialer, SocketEvent, SocketEventSink};
use tabwire_core::DialError;

struct Attempt {
    url: String,
    sink: SocketEventSink,
    closed: Rc<Cell<bool>>,
}

#[derive(Default)]
struct DialerState {
    attempts: Vec<Attempt>,
    refuse_next: usize,
}

/// A [`SocketDialer`] that records every dial and lets the test raise events
/// on any physical socket it handed out, including superseded ones.
#[derive(Clone, Default)]
pub struct LoopbackDialer {
    state: Rc<RefCell<DialerState>>,
}

impl LoopbackDialer {
    /// Create a dialer with no attempts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physical sockets handed out so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.state.borrow().attempts.len()
    }

    /// URL of every attempt, in order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.state
            .borrow()
            .attempts
            .iter()
            .map(|a| a.url.clone())
            .collect()
    }

    /// Whether the client closed attempt `index`.
    #[must_use]
    pub fn is_closed(&self, index: usize) -> bool {
        self.state
            .borrow()
            .attempts
            .get(index)
            .is_some_and(|a| a.closed.get())
    }

    /// Fail the next `n` dials with a [`DialError`].
    pub fn refuse_next(&self, n: usize) {
        self.state.borrow_mut().refuse_next = n;
    }

    /// Raise `event` on attempt `index`. Returns `false` if no such attempt.
    pub fn emit(&self, index: usize, event: SocketEvent) -> bool {
        let sink = self
            .state
            .borrow()
            .attempts
            .get(index)
            .map(|a| Rc::clone(&a.sink));
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    /// Raise `event` on the most recent attempt.
    pub fn emit_latest(&self, event: SocketEvent) -> bool {
        match self.attempts().checked_sub(1) {
            Some(index) => self.emit(index, event),
            None => false,
        }
    }
}

struct LoopbackSocket {
    closed: Rc<Cell<bool>>,
}

impl PhysicalSocket for LoopbackSocket {
    fn close(&mut self) {
        self.closed.set(true);
    }
}

impl SocketDialer for LoopbackDialer {
    fn dial(
        &self,
        url: &str,
        events: SocketEventSink,
    ) -> Result<Box<dyn PhysicalSocket>, DialError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_next > 0 {
            state.refuse_next -= 1;
            return Err(DialError::new(url, "refused by loopback"));
        }
        let closed = Rc::new(Cell::new(false));
        state.attempts.push(Attempt {
            url: url.to_owned(),
            sink: events,
            closed: Rc::clone(&closed),
        });
        Ok(Box::new(LoopbackSocket { closed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_attempts_and_routes_events() {
        let dialer = LoopbackDialer::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let mut socket = dialer
            .dial("ws://h/?token=a", Rc::new(move |ev: SocketEvent| s.borrow_mut().push(ev)))
            .unwrap();

        assert_eq!(dialer.attempts(), 1);
        assert_eq!(dialer.urls(), vec!["ws://h/?token=a".to_string()]);
        assert!(dialer.emit_latest(SocketEvent::Message("hi".into())));
        assert!(!dialer.emit(5, SocketEvent::Close));
        assert_eq!(*seen.borrow(), vec![SocketEvent::Message("hi".into())]);

        assert!(!dialer.is_closed(0));
        socket.close();
        assert!(dialer.is_closed(0));
    }

    #[test]
    fn refuses_requested_dials() {
        let dialer = LoopbackDialer::new();
        dialer.refuse_next(1);
        assert!(dialer.dial("ws://h/", Rc::new(|_: SocketEvent| {})).is_err());
        assert!(dialer.dial("ws://h/", Rc::new(|_: SocketEvent| {})).is_ok());
        assert_eq!(dialer.attempts(), 1);
    }

    #[test]
    fn emit_without_attempts_is_false() {
        assert!(!LoopbackDialer::new().emit_latest(SocketEvent::Open));
    }
}

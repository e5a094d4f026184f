#![forbid(unsafe_code)]
#![doc = "Host traits for tabwire: platform abstraction for timers, sockets, history, and the DOM."]
#![doc = ""]
#![doc = "This crate defines the boundary between the tabwire runtime and a platform"]
#![doc = "implementation (the browser via `tabwire-web`, deterministic fakes via"]
#![doc = "`tabwire-harness`). Every method takes `&self`: hosts are single-threaded and"]
#![doc = "callbacks they run are allowed to call back into the same host."]

use core::time::Duration;
use std::rc::Rc;

use tabwire_core::{DialError, Location};

/// Handle returned by [`Scheduler`] for a pending timeout or interval.
pub type TimerId = u64;

/// Handle returned by [`ListenerHost::add_listener`].
pub type ListenerId = u64;

/// Monotonic clock abstraction.
///
/// The browser backend reads `performance.now()`; test hosts advance time
/// explicitly.
pub trait BrowserClock {
    /// Returns elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Deferred-callback scheduler (`setTimeout` / `setInterval`).
///
/// Clearing a timer that already fired, or was never issued, is a no-op.
pub trait Scheduler {
    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timeout.
    fn clear_timeout(&self, id: TimerId);

    /// Run `callback` every `every` until cleared.
    fn set_interval(&self, every: Duration, callback: Box<dyn FnMut()>) -> TimerId;

    /// Cancel an interval.
    fn clear_interval(&self, id: TimerId);
}

/// Notification raised by a physical socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The socket finished its handshake.
    Open,
    /// An inbound text frame, verbatim.
    Message(String),
    /// The socket closed, for any reason.
    Close,
    /// The platform reported an error. A `Close` normally follows.
    Error(String),
}

/// Where a physical socket pushes its [`SocketEvent`]s.
pub type SocketEventSink = Rc<dyn Fn(SocketEvent)>;

/// One underlying socket instance.
pub trait PhysicalSocket {
    /// Close the socket without raising a [`SocketEvent::Close`].
    ///
    /// Implementations must detach their close handler before closing.
    fn close(&mut self);
}

/// Creates physical sockets.
pub trait SocketDialer {
    /// Open a socket to `url`, routing every event it raises into `events`.
    fn dial(
        &self,
        url: &str,
        events: SocketEventSink,
    ) -> Result<Box<dyn PhysicalSocket>, DialError>;
}

/// Browser location and session history.
pub trait HistoryHost {
    /// Current location.
    fn location(&self) -> Location;

    /// Push a history entry without reloading.
    fn push_state(&self, url: &str);

    /// Tell the page that a programmatic navigation just pushed an entry.
    /// Not called for pushes made by intercepted clicks.
    fn announce_push(&self) {}

    /// Leave the app: full page load of `url`.
    fn assign(&self, url: &str);
}

/// Document title access.
pub trait TitleHost {
    /// Current title.
    fn title(&self) -> String;

    /// Overwrite the title.
    fn set_title(&self, title: &str);
}

/// A node in the element tree, enough to walk up from a click target.
pub trait DomNode: Clone {
    /// Upper-case tag name (`"A"`, `"BODY"`, ...).
    fn tag_name(&self) -> String;

    /// Parent element, `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// Link target for anchors.
    fn href(&self) -> Option<String>;
}

/// Object a listener attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// `document`.
    Document,
    /// `window`.
    Window,
}

/// Named DOM event listeners.
pub trait ListenerHost {
    /// Payload handed to listeners.
    type Event: 'static;

    /// Attach `callback` for events called `name` on `target`.
    fn add_listener(
        &self,
        target: ListenerTarget,
        name: &str,
        callback: Rc<dyn Fn(&Self::Event)>,
    ) -> ListenerId;

    /// Detach a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// Persistent string key/value store.
pub trait KeyValueStore {
    /// Stored value, if any. An empty stored value reads as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str);

    /// Delete `key`.
    fn remove(&self, key: &str);
}

/// Scoped element lookup.
pub trait ElementLocator {
    /// Element handle type.
    type Element;

    /// Element with the given id.
    fn by_id(&self, id: &str) -> Option<Self::Element>;

    /// Focus the first element matching `selector`, one tick later.
    fn focus(&self, selector: &str);

    /// Whether `element` sits inside any element matching `selector`.
    fn within(&self, element: &Self::Element, selector: &str) -> bool;
}

/// Pseudo-random integers.
pub trait RandomSource {
    /// Uniform integer in `0..n`; `0` when `n == 0`.
    fn below(&self, n: u32) -> u32;
}

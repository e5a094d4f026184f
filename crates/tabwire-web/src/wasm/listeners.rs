#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tabwire_backend::{ListenerHost, ListenerId, ListenerTarget};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Event, EventTarget, Window};

use super::error_name;
use crate::HandleTable;

struct Attached {
    target: EventTarget,
    name: String,
    function: JsValue,
}

/// `addEventListener` on `document` or `window`.
pub struct WebListeners {
    window: Window,
    document: Document,
    attached: RefCell<HandleTable<Attached>>,
}

impl WebListeners {
    /// `None` without a window and document.
    #[must_use]
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            attached: RefCell::new(HandleTable::new()),
        })
    }

    fn event_target(&self, target: ListenerTarget) -> EventTarget {
        match target {
            ListenerTarget::Document => self.document.clone().into(),
            ListenerTarget::Window => self.window.clone().into(),
        }
    }

    /// Listeners currently attached through this host.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attached.borrow().len()
    }

    /// Whether nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attached.borrow().is_empty()
    }
}

impl ListenerHost for WebListeners {
    type Event = Event;

    fn add_listener(
        &self,
        target: ListenerTarget,
        name: &str,
        callback: Rc<dyn Fn(&Event)>,
    ) -> ListenerId {
        let function =
            Closure::<dyn FnMut(Event)>::new(move |event: Event| callback(&event)).into_js_value();
        let target = self.event_target(target);
        if let Err(err) = target.add_event_listener_with_callback(name, function.unchecked_ref()) {
            tracing::warn!(target: "tabwire.web", event = %name, error = %error_name(&err), "addEventListener failed");
        }
        self.attached.borrow_mut().insert(Attached {
            target,
            name: name.to_owned(),
            function,
        })
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some(attached) = self.attached.borrow_mut().take(id) else {
            return;
        };
        let _ = attached
            .target
            .remove_event_listener_with_callback(&attached.name, attached.function.unchecked_ref());
    }
}

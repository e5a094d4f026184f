#![forbid(unsafe_code)]

use core::time::Duration;
use std::rc::Rc;

use tabwire_backend::{
    DomNode, ElementLocator, HistoryHost, KeyValueStore, RandomSource, Scheduler, TitleHost,
};
use tabwire_core::Location;
use tabwire_runtime::RuntimeConfig;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlAnchorElement, HtmlElement, Storage, Window};

use super::error_name;
use crate::scale_unit;

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// `window.location` and `window.history`.
#[derive(Debug, Clone)]
pub struct WebHistory {
    window: Window,
}

impl WebHistory {
    /// `None` outside a window context.
    #[must_use]
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
        })
    }
}

impl HistoryHost for WebHistory {
    fn location(&self) -> Location {
        let href = match self.window.location().href() {
            Ok(href) => href,
            Err(err) => {
                tracing::warn!(target: "tabwire.nav", error = %error_name(&err), "location.href unreadable");
                return Location::default();
            }
        };
        Location::parse(&href).unwrap_or_else(|err| {
            tracing::warn!(target: "tabwire.nav", error = %err, "location.href unparsable");
            Location::default()
        })
    }

    fn push_state(&self, url: &str) {
        let pushed = self
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(url)));
        if let Err(err) = pushed {
            tracing::warn!(target: "tabwire.nav", error = %error_name(&err), "pushState failed");
        }
    }

    /// Dispatches `onpushstate` on the window for other scripts on the page.
    fn announce_push(&self) {
        let dispatched =
            Event::new("onpushstate").and_then(|event| self.window.dispatch_event(&event));
        if let Err(err) = dispatched {
            tracing::warn!(target: "tabwire.nav", error = %error_name(&err), "onpushstate dispatch failed");
        }
    }

    fn assign(&self, url: &str) {
        if let Err(err) = self.window.location().assign(url) {
            tracing::warn!(target: "tabwire.nav", error = %error_name(&err), "location.assign failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

/// `document.title`.
#[derive(Debug, Clone)]
pub struct WebTitle {
    document: Document,
}

impl WebTitle {
    /// `None` without a document.
    #[must_use]
    pub fn new() -> Option<Self> {
        Some(Self {
            document: web_sys::window()?.document()?,
        })
    }
}

impl TitleHost for WebTitle {
    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }
}

// ---------------------------------------------------------------------------
// DOM
// ---------------------------------------------------------------------------

/// A DOM element as seen by the anchor walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebNode(pub Element);

impl DomNode for WebNode {
    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent_element().map(WebNode)
    }

    /// The resolved `href` property for HTML anchors, the raw attribute
    /// otherwise. `None` when the attribute is missing.
    fn href(&self) -> Option<String> {
        if !self.0.has_attribute("href") {
            return None;
        }
        match self.0.dyn_ref::<HtmlAnchorElement>() {
            Some(anchor) => Some(anchor.href()),
            None => self.0.get_attribute("href"),
        }
    }
}

/// Element lookup scoped to the document.
pub struct WebElements {
    document: Document,
    scheduler: Rc<dyn Scheduler>,
    focus_delay: Duration,
}

impl WebElements {
    /// Focus requests run `config.focus_delay_ms` after the call, on `scheduler`.
    #[must_use]
    pub fn new(scheduler: Rc<dyn Scheduler>, config: &RuntimeConfig) -> Option<Self> {
        Some(Self {
            document: web_sys::window()?.document()?,
            scheduler,
            focus_delay: config.focus_delay(),
        })
    }
}

impl ElementLocator for WebElements {
    type Element = WebNode;

    fn by_id(&self, id: &str) -> Option<WebNode> {
        self.document.get_element_by_id(id).map(WebNode)
    }

    fn focus(&self, selector: &str) {
        let document = self.document.clone();
        let selector = selector.to_owned();
        self.scheduler.set_timeout(
            self.focus_delay,
            Box::new(move || match document.query_selector(&selector) {
                Ok(Some(element)) => {
                    if let Some(html) = element.dyn_ref::<HtmlElement>() {
                        let _ = html.focus();
                    }
                }
                Ok(None) => {
                    tracing::debug!(target: "tabwire.web", selector = %selector, "focus target missing");
                }
                Err(err) => {
                    tracing::warn!(target: "tabwire.web", selector = %selector, error = %error_name(&err), "invalid selector");
                }
            }),
        );
    }

    fn within(&self, element: &WebNode, selector: &str) -> bool {
        matches!(element.0.closest(selector), Ok(Some(_)))
    }
}

// ---------------------------------------------------------------------------
// Storage and randomness
// ---------------------------------------------------------------------------

/// `window.localStorage`.
#[derive(Debug, Clone)]
pub struct WebStorage {
    storage: Storage,
}

impl WebStorage {
    /// `None` when local storage is unavailable (disabled, sandboxed frame).
    #[must_use]
    pub fn local() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage
            .get_item(key)
            .ok()
            .flatten()
            .filter(|value| !value.is_empty())
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set_item(key, value) {
            tracing::warn!(target: "tabwire.web", key = %key, error = %error_name(&err), "localStorage write failed");
        }
    }

    fn remove(&self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}

/// `Math.random()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathRandom;

impl RandomSource for MathRandom {
    fn below(&self, n: u32) -> u32 {
        scale_unit(js_sys::Math::random(), n)
    }
}

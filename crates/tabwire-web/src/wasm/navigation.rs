#![forbid(unsafe_code)]

use std::rc::Rc;

use tabwire_backend::{HistoryHost, ListenerHost, ListenerId, ListenerTarget};
use tabwire_core::{ClickEvent, Modifiers};
use tabwire_runtime::Interception;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent};

use super::browser::WebNode;
use super::listeners::WebListeners;

/// Keeps the navigation listeners attached. Dropping it detaches them.
pub struct NavigationGuard {
    listeners: Rc<WebListeners>,
    ids: [ListenerId; 2],
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        for id in self.ids {
            self.listeners.remove_listener(id);
        }
    }
}

/// Route document clicks and `popstate` through `interception`.
///
/// Clicks whose disposition prevents the default have `preventDefault`
/// called, so the browser does not follow the link itself.
pub fn install_navigation<H, M>(
    interception: Rc<Interception<H, M>>,
    listeners: Rc<WebListeners>,
) -> NavigationGuard
where
    H: HistoryHost + 'static,
    M: 'static,
{
    let nav = Rc::clone(&interception);
    let click = listeners.add_listener(
        ListenerTarget::Document,
        "click",
        Rc::new(move |event: &Event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let modifiers = Modifiers::from_flags(
                mouse.shift_key(),
                mouse.alt_key(),
                mouse.ctrl_key(),
                mouse.meta_key(),
            );
            let target = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .map(WebNode);
            let click = ClickEvent::new(target).with_modifiers(modifiers);
            if nav.on_click(&click).prevents_default() {
                event.prevent_default();
            }
        }),
    );

    let nav = interception;
    let pop = listeners.add_listener(
        ListenerTarget::Window,
        "popstate",
        Rc::new(move |_event: &Event| {
            nav.on_pop_state();
        }),
    );

    NavigationGuard {
        listeners,
        ids: [click, pop],
    }
}

#![forbid(unsafe_code)]

//! `web-sys` implementations of the backend traits. Only compiled on `wasm32`.
//!
//! Every callback handed to the browser is converted with
//! `Closure::into_js_value`, so the JS function owns the Rust closure and the
//! garbage collector frees it. Nothing on the Rust side drops a closure that
//! the browser may still be executing.

mod browser;
mod listeners;
mod navigation;
mod scheduler;
mod socket;

pub use browser::{MathRandom, WebElements, WebHistory, WebNode, WebStorage, WebTitle};
pub use listeners::WebListeners;
pub use navigation::{NavigationGuard, install_navigation};
pub use scheduler::WebScheduler;
pub use socket::WebSocketDialer;

use wasm_bindgen::{JsCast, JsValue};

/// Short description of a thrown JS value: the error's `name` when it is an
/// `Error`, otherwise its string form.
///
/// Messages are omitted: a failed `new WebSocket(url)` echoes the url, token
/// included.
fn error_name(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.name());
    }
    err.as_string().unwrap_or_else(|| "unknown".to_owned())
}

#![forbid(unsafe_code)]

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use tabwire_backend::{Scheduler, TimerId};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

use super::error_name;
use crate::HandleTable;

/// `setTimeout` / `setInterval` on the window.
///
/// Timeouts and intervals share one id space, as in the browser.
#[derive(Debug, Clone)]
pub struct WebScheduler {
    window: Window,
    timers: Rc<RefCell<HandleTable<i32>>>,
}

fn millis(d: Duration) -> i32 {
    i32::try_from(d.as_millis()).unwrap_or(i32::MAX)
}

impl WebScheduler {
    /// `None` outside a window context (workers, Node).
    #[must_use]
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
            timers: Rc::new(RefCell::new(HandleTable::new())),
        })
    }

    fn cancel(&self, id: TimerId) -> Option<i32> {
        self.timers.borrow_mut().take(id)
    }
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.timers.borrow_mut().allocate();
        let timers = Rc::clone(&self.timers);
        let func = Closure::once(move || {
            timers.borrow_mut().take(id);
            callback();
        })
        .into_js_value();

        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(func.unchecked_ref(), millis(delay))
        {
            Ok(handle) => self.timers.borrow_mut().bind(id, handle),
            Err(err) => {
                tracing::warn!(target: "tabwire.web", error = %error_name(&err), "setTimeout failed");
            }
        }
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(handle) = self.cancel(id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }

    fn set_interval(&self, every: Duration, callback: Box<dyn FnMut()>) -> TimerId {
        let func = Closure::wrap(callback).into_js_value();
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(func.unchecked_ref(), millis(every))
        {
            Ok(handle) => self.timers.borrow_mut().insert(handle),
            Err(err) => {
                tracing::warn!(target: "tabwire.web", error = %error_name(&err), "setInterval failed");
                self.timers.borrow_mut().allocate()
            }
        }
    }

    fn clear_interval(&self, id: TimerId) {
        if let Some(handle) = self.cancel(id) {
            self.window.clear_interval_with_handle(handle);
        }
    }
}

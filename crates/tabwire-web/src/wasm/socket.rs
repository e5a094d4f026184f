#![forbid(unsafe_code)]

use std::rc::Rc;

use tabwire_backend::{PhysicalSocket, SocketDialer, SocketEvent, SocketEventSink};
use tabwire_core::DialError;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use super::error_name;

/// Dials browser `WebSocket`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketDialer;

impl WebSocketDialer {
    /// Create a dialer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SocketDialer for WebSocketDialer {
    fn dial(
        &self,
        url: &str,
        events: SocketEventSink,
    ) -> Result<Box<dyn PhysicalSocket>, DialError> {
        let ws = WebSocket::new(url).map_err(|err| DialError::new(url, error_name(&err)))?;

        let sink = Rc::clone(&events);
        let onopen = Closure::<dyn FnMut()>::new(move || sink(SocketEvent::Open)).into_js_value();
        ws.set_onopen(Some(onopen.unchecked_ref()));

        let sink = Rc::clone(&events);
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().as_string() {
                Some(text) => sink(SocketEvent::Message(text)),
                None => tracing::debug!(target: "tabwire.transport", "non-text frame ignored"),
            }
        })
        .into_js_value();
        ws.set_onmessage(Some(onmessage.unchecked_ref()));

        // The browser exposes no detail on socket errors.
        let sink = Rc::clone(&events);
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            sink(SocketEvent::Error("websocket error".to_owned()));
        })
        .into_js_value();
        ws.set_onerror(Some(onerror.unchecked_ref()));

        let sink = events;
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            tracing::debug!(
                target: "tabwire.transport",
                code = event.code(),
                clean = event.was_clean(),
                "websocket closed"
            );
            sink(SocketEvent::Close);
        })
        .into_js_value();
        ws.set_onclose(Some(onclose.unchecked_ref()));

        Ok(Box::new(WebSocketHandle { ws, closed: false }))
    }
}

struct WebSocketHandle {
    ws: WebSocket,
    closed: bool,
}

impl PhysicalSocket for WebSocketHandle {
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Detach before closing so the close event never reaches the sink.
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        self.ws.set_onmessage(None);
        self.ws.set_onopen(None);
        if let Err(err) = self.ws.close() {
            tracing::debug!(target: "tabwire.transport", error = %error_name(&err), "websocket close failed");
        }
    }
}

impl Drop for WebSocketHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#![forbid(unsafe_code)]

//! Reconnecting transport: one logical connection over a sequence of
//! physical sockets.
//!
//! # Lifecycle
//!
//! [`Transport::open`] validates the endpoint and dials immediately. Every
//! physical attempt gets a fresh generation number; the event sink handed to
//! the dialer captures that number, and any event carrying a generation other
//! than the current one is dropped. That keeps a superseded socket from
//! forwarding frames or scheduling reconnects.
//!
//! When the current socket closes, exactly one redial is scheduled after the
//! configured delay (1000ms by default) with the same endpoint and token.
//! Errors are logged only; the close that follows drives the redial. This
//! repeats until [`Connection::disconnect`], which bumps the generation and
//! cancels the pending timer before closing the socket, so the final close
//! is ignored.

use core::time::Duration;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tabwire_backend::{
    PhysicalSocket, Scheduler, SocketDialer, SocketEvent, SocketEventSink, TimerId,
};
use tabwire_core::TransportError;
use url::Url;

use crate::config::{
    ConfigError, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_TOKEN_PARAM, RuntimeConfig,
};
use crate::effect_system;

/// A validated socket base URL: `ws` or `wss`, no query, no fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Validate `endpoint`.
    pub fn parse(endpoint: &str) -> Result<Self, TransportError> {
        let url = Url::parse(endpoint).map_err(|source| TransportError::MalformedEndpoint {
            endpoint: endpoint.to_owned(),
            source,
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::UnsupportedScheme(url.scheme().to_owned()));
        }
        if url.query().is_some() {
            return Err(TransportError::EndpointHasQuery(endpoint.to_owned()));
        }
        if url.fragment().is_some() {
            return Err(TransportError::EndpointHasFragment(endpoint.to_owned()));
        }
        Ok(Self { url })
    }

    /// The endpoint with `param=token` appended, percent-encoded.
    #[must_use]
    pub fn with_token(&self, param: &str, token: &str) -> String {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair(param, token);
        url.into()
    }

    /// Normalized endpoint text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Inbound frame handler.
pub type MessageHandler = Rc<dyn Fn(String)>;

/// Factory for connections sharing one dialer and scheduler.
#[derive(Clone)]
pub struct Transport {
    dialer: Rc<dyn SocketDialer>,
    scheduler: Rc<dyn Scheduler>,
    reconnect_delay: Duration,
    token_param: String,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("reconnect_delay", &self.reconnect_delay)
            .field("token_param", &self.token_param)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// A transport with the default [`RuntimeConfig`].
    pub fn new(dialer: Rc<dyn SocketDialer>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            dialer,
            scheduler,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            token_param: DEFAULT_TOKEN_PARAM.to_owned(),
        }
    }

    /// A transport using the reconnect delay and token parameter of `config`.
    ///
    /// Fails with [`ConfigError::Validation`] when `config` does not pass
    /// [`RuntimeConfig::validate`].
    pub fn with_config(
        dialer: Rc<dyn SocketDialer>,
        scheduler: Rc<dyn Scheduler>,
        config: &RuntimeConfig,
    ) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        Ok(Self {
            dialer,
            scheduler,
            reconnect_delay: config.reconnect_delay(),
            token_param: config.token_param.clone(),
        })
    }

    /// Validate `endpoint` and make the first physical attempt.
    pub fn open(&self, endpoint: &str, token: &str) -> Result<Connection, TransportError> {
        let endpoint = Endpoint::parse(endpoint)?;
        Ok(self.open_endpoint(endpoint, token))
    }

    /// Make the first physical attempt against an already validated endpoint.
    pub fn open_endpoint(&self, endpoint: Endpoint, token: &str) -> Connection {
        let inner = Rc::new(RefCell::new(Inner {
            endpoint,
            token: token.to_owned(),
            token_param: self.token_param.clone(),
            reconnect_delay: self.reconnect_delay,
            generation: 0,
            attempts: 0,
            socket: None,
            on_message: None,
            pending_reconnect: None,
            closed: false,
        }));
        let driver = Driver {
            inner: Rc::downgrade(&inner),
            dialer: Rc::clone(&self.dialer),
            scheduler: Rc::clone(&self.scheduler),
        };
        tracing::debug!(
            target: "tabwire.transport",
            endpoint = %inner.borrow().endpoint,
            "opening connection"
        );
        driver.attempt();
        Connection { inner, driver }
    }
}

struct Inner {
    endpoint: Endpoint,
    token: String,
    token_param: String,
    reconnect_delay: Duration,
    generation: u64,
    attempts: u64,
    socket: Option<Box<dyn PhysicalSocket>>,
    on_message: Option<MessageHandler>,
    pending_reconnect: Option<TimerId>,
    closed: bool,
}

/// Handle to one logical connection. Clones share the same connection.
#[derive(Clone)]
pub struct Connection {
    inner: Rc<RefCell<Inner>>,
    driver: Driver,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Connection")
            .field("endpoint", &inner.endpoint.as_str())
            .field("generation", &inner.generation)
            .field("closed", &inner.closed)
            .finish()
    }
}

impl Connection {
    /// Register the inbound frame handler for the connection's whole life,
    /// across reconnects. Only one handler may be set.
    pub fn set_on_message(&self, handler: impl Fn(String) + 'static) -> Result<(), TransportError> {
        let mut inner = self.inner.borrow_mut();
        if inner.on_message.is_some() {
            return Err(TransportError::HandlerAlreadySet);
        }
        inner.on_message = Some(Rc::new(handler));
        Ok(())
    }

    /// Close the current socket and stop reconnecting for good.
    ///
    /// The generation is bumped and the pending redial cleared before the
    /// socket is closed, so its close event cannot schedule anything.
    /// Repeated calls do nothing.
    pub fn disconnect(&self) {
        let (socket, timer) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.generation += 1;
            (inner.socket.take(), inner.pending_reconnect.take())
        };
        if let Some(timer) = timer {
            self.driver.scheduler.clear_timeout(timer);
        }
        if let Some(mut socket) = socket {
            socket.close();
        }
        tracing::debug!(
            target: "tabwire.transport",
            endpoint = %self.inner.borrow().endpoint,
            "disconnected"
        );
    }

    /// Whether [`disconnect`](Self::disconnect) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Generation of the current physical attempt.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// Physical attempts made so far, successful or not.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.inner.borrow().attempts
    }

    /// Whether a redial is waiting on the scheduler.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.inner.borrow().pending_reconnect.is_some()
    }

    /// The validated endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.inner.borrow().endpoint.clone()
    }
}

/// Weak back-reference used by every handler and timer the connection hands
/// out, so none of them keeps a dropped connection alive.
#[derive(Clone)]
struct Driver {
    inner: Weak<RefCell<Inner>>,
    dialer: Rc<dyn SocketDialer>,
    scheduler: Rc<dyn Scheduler>,
}

impl Driver {
    fn attempt(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let (generation, url, previous) = {
            let mut state = inner.borrow_mut();
            if state.closed {
                return;
            }
            state.pending_reconnect = None;
            state.generation += 1;
            state.attempts += 1;
            let url = state.endpoint.with_token(&state.token_param, &state.token);
            (state.generation, url, state.socket.take())
        };
        if let Some(mut previous) = previous {
            previous.close();
        }

        let driver = self.clone();
        let sink: SocketEventSink = Rc::new(move |event: SocketEvent| {
            driver.on_event(generation, event);
        });
        match self.dialer.dial(&url, sink) {
            Ok(mut socket) => {
                let mut state = inner.borrow_mut();
                if state.closed || state.generation != generation {
                    drop(state);
                    socket.close();
                    return;
                }
                state.socket = Some(socket);
            }
            Err(err) => {
                tracing::warn!(
                    target: "tabwire.transport",
                    endpoint = %inner.borrow().endpoint,
                    reason = %err.reason,
                    generation,
                    "dial failed"
                );
                self.schedule_reconnect(generation);
            }
        }
    }

    fn on_event(&self, generation: u64, event: SocketEvent) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let handler = {
            let state = inner.borrow();
            if state.closed || state.generation != generation {
                tracing::debug!(
                    target: "tabwire.transport",
                    generation,
                    current = state.generation,
                    closed = state.closed,
                    "dropping event from stale socket"
                );
                return;
            }
            state.on_message.clone()
        };
        match event {
            SocketEvent::Open => {
                tracing::debug!(target: "tabwire.transport", generation, "socket open");
            }
            SocketEvent::Message(payload) => match handler {
                Some(handler) => handler(payload),
                None => {
                    tracing::debug!(target: "tabwire.transport", generation, "no handler; frame dropped");
                }
            },
            SocketEvent::Error(reason) => {
                tracing::warn!(
                    target: "tabwire.transport",
                    endpoint = %inner.borrow().endpoint,
                    reason = %reason,
                    generation,
                    "socket error"
                );
            }
            SocketEvent::Close => self.schedule_reconnect(generation),
        }
    }

    fn schedule_reconnect(&self, generation: u64) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let (delay, endpoint) = {
            let state = inner.borrow();
            if state.closed
                || state.generation != generation
                || state.pending_reconnect.is_some()
            {
                return;
            }
            (state.reconnect_delay, state.endpoint.to_string())
        };
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        effect_system::record_reconnect_scheduled(&endpoint, delay_ms, generation);

        let driver = self.clone();
        let timer = self.scheduler.set_timeout(
            delay,
            Box::new(move || driver.reconnect(generation)),
        );
        let mut state = inner.borrow_mut();
        if !state.closed && state.generation == generation {
            state.pending_reconnect = Some(timer);
        }
    }

    fn reconnect(&self, generation: u64) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        {
            let state = inner.borrow();
            if state.closed || state.generation != generation {
                return;
            }
        }
        self.attempt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabwire_harness::{LoopbackDialer, ManualScheduler};

    fn transport() -> (Transport, LoopbackDialer, ManualScheduler) {
        let dialer = LoopbackDialer::new();
        let scheduler = ManualScheduler::new();
        let transport = Transport::new(Rc::new(dialer.clone()), Rc::new(scheduler.clone()));
        (transport, dialer, scheduler)
    }

    #[test]
    fn endpoint_rejects_query_fragment_and_scheme() {
        assert!(matches!(
            Endpoint::parse("not a url"),
            Err(TransportError::MalformedEndpoint { .. })
        ));
        assert_eq!(
            Endpoint::parse("wss://h/ws?x=1"),
            Err(TransportError::EndpointHasQuery("wss://h/ws?x=1".into()))
        );
        assert_eq!(
            Endpoint::parse("wss://h/ws#top"),
            Err(TransportError::EndpointHasFragment("wss://h/ws#top".into()))
        );
        assert_eq!(
            Endpoint::parse("https://h/ws"),
            Err(TransportError::UnsupportedScheme("https".into()))
        );
    }

    #[test]
    fn token_is_percent_encoded() {
        let endpoint = Endpoint::parse("wss://h/ws").unwrap();
        assert_eq!(endpoint.with_token("token", "a b&c"), "wss://h/ws?token=a+b%26c");
    }

    #[test]
    fn open_dials_once_with_token() {
        let (transport, dialer, _) = transport();
        let conn = transport.open("wss://h/ws", "t0k").unwrap();
        assert_eq!(dialer.urls(), vec!["wss://h/ws?token=t0k".to_string()]);
        assert_eq!(conn.generation(), 1);
        assert!(!conn.is_closed());
    }

    #[test]
    fn invalid_config_is_refused() {
        let dialer = LoopbackDialer::new();
        let config = RuntimeConfig {
            reconnect_delay_ms: 0,
            token_param: String::new(),
            ..RuntimeConfig::default()
        };
        let err = Transport::with_config(
            Rc::new(dialer.clone()),
            Rc::new(ManualScheduler::new()),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 2));
        assert_eq!(dialer.attempts(), 0);
    }

    #[test]
    fn default_transport_matches_default_config() {
        let (transport, _, _) = transport();
        let config = RuntimeConfig::default();
        assert_eq!(transport.reconnect_delay, config.reconnect_delay());
        assert_eq!(transport.token_param, config.token_param);
    }

    #[test]
    fn malformed_endpoint_does_not_dial() {
        let (transport, dialer, _) = transport();
        assert!(transport.open("wss://h/ws?token=x", "t").is_err());
        assert_eq!(dialer.attempts(), 0);
    }

    #[test]
    fn second_handler_is_rejected() {
        let (transport, _, _) = transport();
        let conn = transport.open("wss://h/ws", "t").unwrap();
        conn.set_on_message(|_| {}).unwrap();
        assert_eq!(conn.set_on_message(|_| {}), Err(TransportError::HandlerAlreadySet));
    }

    #[test]
    fn frames_forwarded_in_order() {
        let (transport, dialer, _) = transport();
        let conn = transport.open("wss://h/ws", "t").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        conn.set_on_message(move |frame| s.borrow_mut().push(frame))
            .unwrap();

        dialer.emit_latest(SocketEvent::Open);
        dialer.emit_latest(SocketEvent::Message("one".into()));
        dialer.emit_latest(SocketEvent::Message("two".into()));
        assert_eq!(*seen.borrow(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn error_alone_does_not_reconnect() {
        let (transport, dialer, scheduler) = transport();
        let conn = transport.open("wss://h/ws", "t").unwrap();
        dialer.emit_latest(SocketEvent::Error("boom".into()));
        assert!(!conn.reconnect_pending());
        scheduler.advance(Duration::from_secs(5));
        assert_eq!(dialer.attempts(), 1);
    }

    #[test]
    fn duplicate_close_schedules_one_redial() {
        let (transport, dialer, scheduler) = transport();
        let _conn = transport.open("wss://h/ws", "t").unwrap();
        dialer.emit_latest(SocketEvent::Close);
        dialer.emit_latest(SocketEvent::Close);
        assert_eq!(scheduler.pending(), 1);
        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(dialer.attempts(), 2);
    }

    #[test]
    fn dropped_connection_stops_redialing() {
        let (transport, dialer, scheduler) = transport();
        let conn = transport.open("wss://h/ws", "t").unwrap();
        dialer.emit_latest(SocketEvent::Close);
        drop(conn);
        scheduler.advance(Duration::from_secs(2));
        assert_eq!(dialer.attempts(), 1);
    }
}

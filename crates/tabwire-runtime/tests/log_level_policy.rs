#![forbid(unsafe_code)]

//! Log level policy for the transport, navigation, and subscription layers.
//!
//! - Socket errors are `WARN` on `tabwire.transport`
//! - Reconnect scheduling and stale-socket drops are `DEBUG`
//! - Route changes are `DEBUG` on `tabwire.nav`
//! - Subscription lifecycle emits `effect.subscription` spans
//! - No event carries the auth token
//!
//! Run:
//!   cargo test -p tabwire-runtime --test log_level_policy

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tabwire_backend::SocketEvent;
use tabwire_core::Route;
use tabwire_harness::{LoopbackDialer, ManualScheduler, MemoryHistory};
use tabwire_runtime::{
    Every, MessageQueue, NavigationBridge, Subscription, SubscriptionManager, TeardownRegistry,
    Transport,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

#[derive(Default)]
struct Captured {
    events: Vec<CapturedEvent>,
    spans: Vec<String>,
}

struct Capture(Arc<Mutex<Captured>>);

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.0
            .lock()
            .unwrap()
            .spans
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Captured {
    let store = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(Capture(Arc::clone(&store)));
    tracing::subscriber::with_default(subscriber, f);
    let mut guard = store.lock().unwrap();
    std::mem::take(&mut *guard)
}

fn find<'a>(events: &'a [CapturedEvent], target: &str, message: &str) -> Vec<&'a CapturedEvent> {
    events
        .iter()
        .filter(|e| e.target == target && e.message().contains(message))
        .collect()
}

// ============================================================================
// Transport
// ============================================================================

fn transport_run() -> Captured {
    capture(|| {
        let dialer = LoopbackDialer::new();
        let scheduler = ManualScheduler::new();
        let transport = Transport::new(Rc::new(dialer.clone()), Rc::new(scheduler.clone()));
        let conn = transport.open("wss://h/ws", "hunter2").unwrap();
        dialer.emit_latest(SocketEvent::Error("reset by peer".into()));
        dialer.emit_latest(SocketEvent::Close);
        scheduler.advance(Duration::from_millis(1000));
        dialer.emit(0, SocketEvent::Message("late".into()));
        dialer.refuse_next(1);
        dialer.emit_latest(SocketEvent::Close);
        scheduler.advance(Duration::from_millis(1000));
        conn.disconnect();
    })
}

#[test]
fn socket_error_is_warn() {
    let captured = transport_run();
    let errors = find(&captured.events, "tabwire.transport", "socket error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, tracing::Level::WARN);
    assert_eq!(
        errors[0].fields.get("reason").map(String::as_str),
        Some("reset by peer")
    );
}

#[test]
fn refused_dial_is_warn() {
    let captured = transport_run();
    let refused = find(&captured.events, "tabwire.transport", "dial failed");
    assert_eq!(refused.len(), 1);
    assert_eq!(refused[0].level, tracing::Level::WARN);
}

#[test]
fn reconnect_and_stale_drop_are_debug() {
    let captured = transport_run();
    let scheduled = find(&captured.events, "tabwire.transport", "reconnect scheduled");
    assert!(!scheduled.is_empty());
    assert!(scheduled.iter().all(|e| e.level == tracing::Level::DEBUG));

    let stale = find(&captured.events, "tabwire.transport", "stale socket");
    assert!(!stale.is_empty());
    assert!(stale.iter().all(|e| e.level == tracing::Level::DEBUG));
}

#[test]
fn token_never_logged() {
    let captured = transport_run();
    for event in &captured.events {
        for value in event.fields.values() {
            assert!(!value.contains("hunter2"), "token leaked in {event:?}");
        }
    }
}

// ============================================================================
// Navigation and subscriptions
// ============================================================================

#[test]
fn navigation_is_debug_on_nav_target() {
    let captured = capture(|| {
        let history = MemoryHistory::new("https://app.test/");
        let bridge = NavigationBridge::new(Rc::new(history));
        bridge.navigate(&Route::new("/next"));
    });
    let changes = find(&captured.events, "tabwire.nav", "navigation changed");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].level, tracing::Level::DEBUG);
    assert_eq!(
        changes[0].fields.get("trigger").map(String::as_str),
        Some("programmatic")
    );
}

#[test]
fn subscription_lifecycle_emits_spans() {
    let captured = capture(|| {
        let queue = MessageQueue::<()>::new();
        let scheduler = ManualScheduler::new();
        let mut mgr =
            SubscriptionManager::new(TeardownRegistry::new(), queue.dispatcher(), Rc::new(scheduler));
        let subs: Vec<Box<dyn Subscription<()>>> =
            vec![Box::new(Every::with_id(1, Duration::from_millis(5), || ()))];
        mgr.reconcile(subs);
        mgr.reconcile(Vec::new());
    });
    let spans = captured
        .spans
        .iter()
        .filter(|s| s.as_str() == "effect.subscription")
        .count();
    assert_eq!(spans, 2);
    assert_eq!(find(&captured.events, "tabwire.sub", "Starting").len(), 1);
    assert_eq!(find(&captured.events, "tabwire.sub", "Stopping").len(), 1);
}

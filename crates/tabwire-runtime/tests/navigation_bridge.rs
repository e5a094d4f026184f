#![forbid(unsafe_code)]

//! End-to-end navigation scenarios over an in-memory browser.
//!
//! A recording history host and recording message mappers share one log, so
//! the tests can assert the exact interleaving of request message, history
//! push, and change message.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tabwire_backend::HistoryHost;
use tabwire_core::{ClickEvent, Location, Modifiers, Route};
use tabwire_harness::{MemoryDom, MemoryHistory, MemoryTitle};
use tabwire_runtime::{
    ClickDisposition, Interception, MessageQueue, NavigationBridge, PassReason, TitleSync,
};

type Log = Rc<RefCell<Vec<String>>>;

/// History host that logs every push before delegating.
struct RecordingHistory {
    inner: MemoryHistory,
    log: Log,
}

impl HistoryHost for RecordingHistory {
    fn location(&self) -> Location {
        self.inner.location()
    }

    fn push_state(&self, url: &str) {
        self.log.borrow_mut().push(format!("push {url}"));
        self.inner.push_state(url);
    }

    fn announce_push(&self) {
        self.log.borrow_mut().push("announce".to_string());
    }

    fn assign(&self, url: &str) {
        self.inner.assign(url);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Request(Route),
    Change(Route),
}

struct Rig {
    log: Log,
    history: MemoryHistory,
    bridge: NavigationBridge<RecordingHistory>,
    queue: MessageQueue<Msg>,
    nav: Interception<RecordingHistory, Msg>,
    dom: MemoryDom,
}

fn rig() -> Rig {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let history = MemoryHistory::new("https://app.test/home");
    let bridge = NavigationBridge::new(Rc::new(RecordingHistory {
        inner: history.clone(),
        log: Rc::clone(&log),
    }));
    let queue = MessageQueue::new();
    let (req_log, change_log) = (Rc::clone(&log), Rc::clone(&log));
    let nav = bridge.attach_interception(
        queue.dispatcher(),
        move |route| {
            req_log.borrow_mut().push(format!("request {}", route.path));
            Msg::Request(route)
        },
        move |route| {
            change_log.borrow_mut().push(format!("change {}", route.path));
            Msg::Change(route)
        },
    );
    Rig {
        log,
        history,
        bridge,
        queue,
        nav,
        dom: MemoryDom::new(),
    }
}

#[test]
fn plain_click_orders_request_push_change() {
    let r = rig();
    let list = r.dom.append(&r.dom.body(), "ul");
    let anchor = r.dom.append_anchor(&list, "/widgets/42");
    let label = r.dom.append(&anchor, "span");

    let outcome = r.nav.on_click(&ClickEvent::new(Some(label)));

    let ClickDisposition::Intercepted(route) = outcome else {
        panic!("click should be intercepted");
    };
    assert_eq!(route.path, "/widgets/42");
    assert_eq!(
        *r.log.borrow(),
        vec![
            "request /widgets/42".to_string(),
            "push https://app.test/widgets/42".to_string(),
            "change /widgets/42".to_string(),
        ]
    );
    assert_eq!(r.history.location().pathname, "/widgets/42");
    assert_eq!(
        r.queue.drain(),
        vec![Msg::Request(route.clone()), Msg::Change(route)]
    );
}

#[test]
fn shift_click_is_untouched() {
    let r = rig();
    let anchor = r.dom.append_anchor(&r.dom.body(), "/widgets/42");
    let click = ClickEvent::new(Some(anchor)).with_modifiers(Modifiers::SHIFT);

    let outcome = r.nav.on_click(&click);
    assert!(!outcome.prevents_default());
    assert_eq!(outcome, ClickDisposition::PassThrough(PassReason::Modifier));
    assert!(r.log.borrow().is_empty());
    assert!(r.queue.drain().is_empty());
    assert_eq!(r.history.location().pathname, "/home");
}

#[test]
fn back_emits_change_without_request_or_push() {
    let r = rig();
    let anchor = r.dom.append_anchor(&r.dom.body(), "/a");
    r.nav.on_click(&ClickEvent::new(Some(anchor)));
    r.queue.drain();
    r.log.borrow_mut().clear();

    r.history.back();
    let route = r.nav.on_pop_state();
    assert_eq!(route.path, "/home");
    assert_eq!(*r.log.borrow(), vec!["change /home".to_string()]);
    assert_eq!(r.queue.drain(), vec![Msg::Change(route)]);
}

#[test]
fn programmatic_navigate_changes_once() {
    let r = rig();
    let route = Route::new("/reports").with_query("year=2024");
    r.bridge.navigate(&route);

    assert_eq!(
        *r.log.borrow(),
        vec![
            "push /reports?year=2024".to_string(),
            "announce".to_string(),
            "change /reports".to_string()
        ]
    );
    assert_eq!(r.history.location().search, "?year=2024");
    assert_eq!(r.queue.drain(), vec![Msg::Change(route)]);
}

#[test]
fn absolute_and_relative_hrefs_resolve_against_location() {
    let r = rig();
    let rel = r.dom.append_anchor(&r.dom.body(), "settings#top");
    r.nav.on_click(&ClickEvent::new(Some(rel)));
    let route = r.bridge.current_route();
    assert_eq!(route.path, "/settings");
    assert_eq!(route.fragment.as_deref(), Some("top"));
    assert_eq!(route.query, None);
}

#[test]
fn route_without_query_or_fragment_stays_absent() {
    let r = rig();
    let route = r.bridge.current_route();
    assert_eq!(route.query, None);
    assert_eq!(route.fragment, None);
    assert_eq!(route.to_string(), "https://app.test/home");
}

#[test]
fn set_title_twice_writes_once() {
    let title = MemoryTitle::new("");
    let sync = TitleSync::new(Rc::new(title.clone()));
    sync.set_title("Dashboard");
    sync.set_title("Dashboard");
    assert_eq!(title.writes(), 1);
}

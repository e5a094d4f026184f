#![forbid(unsafe_code)]

//! Navigation bridge: browser location and history on one side, the
//! application's [`Route`] messages on the other.
//!
//! Every route change, whatever caused it, is published once on the
//! bridge's change bus:
//!
//! | trigger | request message | history push | change message |
//! |---|---|---|---|
//! | plain anchor click | yes, first | yes | yes, last |
//! | back / forward | no | no (the browser moved) | yes |
//! | [`NavigationBridge::navigate`] | no | yes | yes |
//! | shift/ctrl/meta click | no | no | no |
//!
//! An attached [`Interception`] subscribes to that bus and turns each change
//! into exactly one `on_route_change` message, so programmatic and browser
//! navigation share one downstream path.

use std::fmt;
use std::rc::Rc;

use tabwire_backend::{DomNode, HistoryHost};
use tabwire_core::{ClickEvent, Location, Route};

use crate::dispatch::Dispatch;
use crate::effect_system::{self, NavigationTrigger};
use crate::event_bus::{EventBus, Subscriber};

/// Walk from `start` up through its ancestors to the nearest `A` element.
///
/// Stops at `BODY` without looking further; returns `None` if no anchor
/// sits between the start and the body.
pub fn find_anchor<N: DomNode>(start: Option<N>) -> Option<N> {
    let mut current = start;
    while let Some(node) = current {
        let tag = node.tag_name();
        if tag.eq_ignore_ascii_case("BODY") {
            return None;
        }
        if tag.eq_ignore_ascii_case("A") {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Reads and writes the browser location on behalf of the application.
pub struct NavigationBridge<H> {
    history: Rc<H>,
    changes: EventBus<Route>,
}

impl<H> Clone for NavigationBridge<H> {
    fn clone(&self) -> Self {
        Self {
            history: Rc::clone(&self.history),
            changes: self.changes.clone(),
        }
    }
}

impl<H> fmt::Debug for NavigationBridge<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationBridge")
            .field("change_listeners", &self.changes.len())
            .finish_non_exhaustive()
    }
}

impl<H: HistoryHost + 'static> NavigationBridge<H> {
    /// A bridge over `history`.
    pub fn new(history: Rc<H>) -> Self {
        Self {
            history,
            changes: EventBus::new(),
        }
    }

    /// The history host.
    #[must_use]
    pub fn history(&self) -> &Rc<H> {
        &self.history
    }

    /// The browser's current location as a [`Route`].
    #[must_use]
    pub fn current_route(&self) -> Route {
        Route::from_location(&self.history.location())
    }

    /// Push a history entry for `route`, announce it to the page, then
    /// publish the change.
    pub fn navigate(&self, route: &Route) {
        self.history.push_state(&route.to_string());
        self.history.announce_push();
        effect_system::record_navigation(NavigationTrigger::Programmatic, &route.path);
        self.changes.publish(route);
    }

    /// Leave the application with a full page load.
    pub fn redirect(&self, url: &str) {
        tracing::debug!(target: "tabwire.nav", url, "redirect");
        self.history.assign(url);
    }

    /// The same-process change notification. Every route change is
    /// published here exactly once.
    #[must_use]
    pub fn changes(&self) -> &EventBus<Route> {
        &self.changes
    }

    /// Start translating clicks, popstate, and [`navigate`](Self::navigate)
    /// calls into application messages.
    ///
    /// The host feeds DOM clicks to [`Interception::on_click`] and popstate
    /// events to [`Interception::on_pop_state`]. Dropping the interception
    /// stops the change messages.
    pub fn attach_interception<M: 'static>(
        &self,
        dispatch: Dispatch<M>,
        on_route_request: impl Fn(Route) -> M + 'static,
        on_route_change: impl Fn(Route) -> M + 'static,
    ) -> Interception<H, M> {
        let change_dispatch = dispatch.clone();
        let subscriber = self.changes.subscribe_fn(move |route: &Route| {
            change_dispatch.send(on_route_change(route.clone()));
        });
        Interception {
            bridge: self.clone(),
            dispatch,
            on_route_request: Rc::new(on_route_request),
            subscriber,
        }
    }
}

/// Why a click was left to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Shift, ctrl, or meta was held.
    Modifier,
    /// No anchor between the target and the body.
    NoAnchor,
    /// The anchor has no href.
    NoHref,
    /// The href could not be resolved against the current location.
    Unresolvable,
}

/// Outcome of [`Interception::on_click`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDisposition {
    /// The click became an in-app navigation; suppress the default action.
    Intercepted(Route),
    /// The click is left untouched.
    PassThrough(PassReason),
}

impl ClickDisposition {
    /// Whether the host should call `preventDefault`.
    #[must_use]
    pub fn prevents_default(&self) -> bool {
        matches!(self, Self::Intercepted(_))
    }
}

/// Live click/popstate interception for one message type.
pub struct Interception<H: HistoryHost + 'static, M> {
    bridge: NavigationBridge<H>,
    dispatch: Dispatch<M>,
    on_route_request: Rc<dyn Fn(Route) -> M>,
    subscriber: Subscriber<Route>,
}

impl<H: HistoryHost + 'static, M> fmt::Debug for Interception<H, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interception").finish_non_exhaustive()
    }
}

impl<H: HistoryHost + 'static, M: 'static> Interception<H, M> {
    /// Handle a click on the document body.
    ///
    /// A plain click on or inside an anchor dispatches the request message,
    /// pushes the history entry, and publishes the change, in that order,
    /// before returning.
    pub fn on_click<N: DomNode>(&self, click: &ClickEvent<N>) -> ClickDisposition {
        if click.modifiers.opens_elsewhere() {
            return ClickDisposition::PassThrough(PassReason::Modifier);
        }
        let Some(anchor) = find_anchor(click.target.clone()) else {
            return ClickDisposition::PassThrough(PassReason::NoAnchor);
        };
        let Some(href) = anchor.href() else {
            return ClickDisposition::PassThrough(PassReason::NoHref);
        };
        let base = self.bridge.history.location().href;
        let location = match Location::resolve(&base, &href) {
            Ok(location) => location,
            Err(err) => {
                tracing::debug!(target: "tabwire.nav", href = %href, error = %err, "anchor href not resolvable");
                return ClickDisposition::PassThrough(PassReason::Unresolvable);
            }
        };
        let route = Route::from_location(&location);

        self.dispatch.send((self.on_route_request)(route.clone()));
        self.bridge.history.push_state(&location.href);
        effect_system::record_navigation(NavigationTrigger::Click, &route.path);
        self.bridge.changes.publish(&route);
        ClickDisposition::Intercepted(route)
    }

    /// Handle a popstate: the browser already moved, so only the change is
    /// published.
    pub fn on_pop_state(&self) -> Route {
        let route = self.bridge.current_route();
        effect_system::record_navigation(NavigationTrigger::PopState, &route.path);
        self.bridge.changes.publish(&route);
        route
    }

    /// The bridge this interception is attached to.
    #[must_use]
    pub fn bridge(&self) -> &NavigationBridge<H> {
        &self.bridge
    }
}

impl<H: HistoryHost + 'static, M> Drop for Interception<H, M> {
    fn drop(&mut self) {
        self.bridge.changes.unsubscribe(&self.subscriber);
    }
}

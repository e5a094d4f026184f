#![forbid(unsafe_code)]

//! Subscriptions for continuous event sources.
//!
//! Subscriptions give the model a declarative way to receive messages from
//! timers, DOM listeners, and sockets. The runtime manages their lifecycles
//! from what the model declares as active.
//!
//! # How it works
//!
//! 1. `Model::subscriptions()` returns the set of active subscriptions
//! 2. After each update, [`SubscriptionManager::reconcile`] compares it with
//!    the previous set
//! 3. New ids are started; their teardown goes into the shared
//!    [`TeardownRegistry`]
//! 4. Ids no longer declared are torn down through the registry, so a
//!    subscription that already completed on its own is not torn down twice
//!
//! Messages flow through the same [`Dispatch`] as everything else.

use core::time::Duration;
use std::cell::Cell;
use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use tabwire_backend::{ListenerHost, ListenerId, ListenerTarget, Scheduler, TimerId};
use tabwire_core::TransportError;

use crate::config::RuntimeConfig;
use crate::dispatch::Dispatch;
use crate::effect_system;
use crate::teardown::{SubId, Teardown, TeardownRegistry};
use crate::transport::{Endpoint, Transport};

/// A subscription produces messages from an external event source.
pub trait Subscription<M: 'static> {
    /// Unique identifier for deduplication.
    ///
    /// Subscriptions with the same id are considered identical; the manager
    /// keeps the running one and ignores the new declaration.
    fn id(&self) -> SubId;

    /// Begin producing messages. The returned action releases everything
    /// the subscription acquired and is run at most once.
    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown;

    /// Short label used in logs and spans.
    fn kind(&self) -> &'static str {
        "custom"
    }
}

/// Handle a subscription uses to finish on its own.
#[derive(Clone)]
pub struct Completion {
    id: SubId,
    registry: TeardownRegistry,
    done: Rc<Cell<bool>>,
}

impl Completion {
    fn new(id: SubId, registry: TeardownRegistry) -> Self {
        Self {
            id,
            registry,
            done: Rc::new(Cell::new(false)),
        }
    }

    /// Remove the subscription from the registry and run its teardown.
    /// Calling this more than once, or after an explicit teardown, is a no-op.
    pub fn complete(&self) {
        self.done.set(true);
        self.registry.teardown(self.id);
    }

    /// Id of the subscription this completes.
    #[must_use]
    pub fn id(&self) -> SubId {
        self.id
    }
}

/// What a subscription gets when it starts.
pub struct SubscriptionContext<M> {
    /// Producer handle for application messages.
    pub dispatch: Dispatch<M>,
    /// Shared timer source.
    pub scheduler: Rc<dyn Scheduler>,
    /// Signals natural completion.
    pub completion: Completion,
}

/// Starts and stops subscriptions as the declared set changes.
pub struct SubscriptionManager<M: 'static> {
    declared: Vec<SubId>,
    registry: TeardownRegistry,
    dispatch: Dispatch<M>,
    scheduler: Rc<dyn Scheduler>,
}

impl<M: 'static> SubscriptionManager<M> {
    /// A manager registering teardowns in `registry`.
    pub fn new(
        registry: TeardownRegistry,
        dispatch: Dispatch<M>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            declared: Vec::new(),
            registry,
            dispatch,
            scheduler,
        }
    }

    /// Update the set of active subscriptions.
    ///
    /// - Starts subscriptions whose id is new
    /// - Tears down subscriptions that are no longer declared
    /// - Leaves unchanged ids alone, including ones that already completed
    pub fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let new_ids: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();

        let mut remaining = Vec::new();
        for id in self.declared.drain(..) {
            if new_ids.contains(&id) {
                remaining.push(id);
            } else {
                tracing::debug!(target: "tabwire.sub", sub_id = id, "Stopping subscription");
                self.registry.teardown(id);
            }
        }
        self.declared = remaining;

        let mut active_ids: HashSet<SubId> = self.declared.iter().copied().collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }
            tracing::debug!(target: "tabwire.sub", sub_id = id, "Starting subscription");
            self.declared.push(id);
            self.start(sub.as_ref());
        }
    }

    fn start(&self, sub: &dyn Subscription<M>) {
        let id = sub.id();
        let kind = sub.kind();
        let completion = Completion::new(id, self.registry.clone());
        let done = Rc::clone(&completion.done);
        let ctx = SubscriptionContext {
            dispatch: self.dispatch.clone(),
            scheduler: Rc::clone(&self.scheduler),
            completion,
        };

        effect_system::record_subscription_start(kind, id);
        let teardown = sub.start(ctx);
        let release = move || {
            teardown();
            effect_system::record_subscription_stop(kind, id);
        };
        if done.get() {
            // Finished before it could be registered.
            release();
        } else {
            self.registry.register(id, release);
        }
    }

    /// Tear down every declared subscription.
    pub fn stop_all(&mut self) {
        for id in self.declared.drain(..) {
            self.registry.teardown(id);
        }
    }

    /// Ids currently declared, in start order.
    #[must_use]
    pub fn declared_ids(&self) -> &[SubId] {
        &self.declared
    }

    /// Whether `id` is declared and has not finished.
    #[must_use]
    pub fn is_running(&self, id: SubId) -> bool {
        self.declared.contains(&id) && self.registry.contains(id)
    }
}

impl<M: 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in subscriptions ---

/// A subscription that fires at a fixed interval.
///
/// # Example
///
/// ```ignore
/// fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
///     vec![Box::new(Every::new(Duration::from_secs(1), || Msg::Tick))]
/// }
/// ```
pub struct Every<M> {
    id: SubId,
    interval: Duration,
    make_msg: Rc<dyn Fn() -> M>,
}

impl<M: 'static> Every<M> {
    /// Create a tick subscription with the given interval and message factory.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + 'static) -> Self {
        let id = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX) ^ 0x5449_434B; // "TICK"
        Self::with_id(id, interval, make_msg)
    }

    /// Create a tick subscription with an explicit id.
    pub fn with_id(id: SubId, interval: Duration, make_msg: impl Fn() -> M + 'static) -> Self {
        Self {
            id,
            interval,
            make_msg: Rc::new(make_msg),
        }
    }
}

impl<M: 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown {
        let make_msg = Rc::clone(&self.make_msg);
        let dispatch = ctx.dispatch;
        let timer = ctx.scheduler.set_interval(
            self.interval,
            Box::new(move || {
                dispatch.send(make_msg());
            }),
        );
        let scheduler = ctx.scheduler;
        Box::new(move || scheduler.clear_interval(timer))
    }

    fn kind(&self) -> &'static str {
        "every"
    }
}

/// A one-shot timer that sends one message and then completes itself.
pub struct After<M> {
    id: SubId,
    delay: Duration,
    make_msg: Rc<dyn Fn() -> M>,
}

impl<M: 'static> After<M> {
    /// Fire `make_msg` once after `delay`.
    pub fn new(delay: Duration, make_msg: impl Fn() -> M + 'static) -> Self {
        let id = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX) ^ 0x4146_5452; // "AFTR"
        Self::with_id(id, delay, make_msg)
    }

    /// One-shot timer with an explicit id.
    pub fn with_id(id: SubId, delay: Duration, make_msg: impl Fn() -> M + 'static) -> Self {
        Self {
            id,
            delay,
            make_msg: Rc::new(make_msg),
        }
    }
}

impl<M: 'static> Subscription<M> for After<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown {
        let make_msg = Rc::clone(&self.make_msg);
        let SubscriptionContext {
            dispatch,
            scheduler,
            completion,
        } = ctx;
        let timer = scheduler.set_timeout(
            self.delay,
            Box::new(move || {
                dispatch.send(make_msg());
                completion.complete();
            }),
        );
        Box::new(move || scheduler.clear_timeout(timer))
    }

    fn kind(&self) -> &'static str {
        "after"
    }
}

/// A document or window listener mapped into messages.
///
/// The listener is attached after a scheduler delay (zero by default, i.e.
/// the next tick) so the event that caused the subscription to be declared
/// does not reach it. Tearing down before the attach cancels it.
pub struct OnEvent<H: ListenerHost, M> {
    id: SubId,
    host: Rc<H>,
    target: ListenerTarget,
    name: String,
    attach_delay: Duration,
    map: Rc<dyn Fn(&H::Event) -> Option<M>>,
}

impl<H: ListenerHost + 'static, M: 'static> OnEvent<H, M> {
    /// Listen for `name` on `target`; `map` returns `None` to ignore an event.
    pub fn new(
        id: SubId,
        host: Rc<H>,
        target: ListenerTarget,
        name: impl Into<String>,
        map: impl Fn(&H::Event) -> Option<M> + 'static,
    ) -> Self {
        Self {
            id,
            host,
            target,
            name: name.into(),
            attach_delay: Duration::ZERO,
            map: Rc::new(map),
        }
    }

    /// Wait `delay` before attaching.
    #[must_use]
    pub fn with_attach_delay(mut self, delay: Duration) -> Self {
        self.attach_delay = delay;
        self
    }

    /// Take the attach delay from `config`.
    #[must_use]
    pub fn with_config(self, config: &RuntimeConfig) -> Self {
        self.with_attach_delay(config.listener_attach_delay())
    }
}

impl<H: ListenerHost + 'static, M: 'static> Subscription<M> for OnEvent<H, M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown {
        let attached: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let pending: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));

        let timer = {
            let attached = Rc::clone(&attached);
            let pending = Rc::clone(&pending);
            let host = Rc::clone(&self.host);
            let map = Rc::clone(&self.map);
            let dispatch = ctx.dispatch;
            let target = self.target;
            let name = self.name.clone();
            ctx.scheduler.set_timeout(
                self.attach_delay,
                Box::new(move || {
                    pending.set(None);
                    let callback = Rc::new(move |event: &H::Event| {
                        if let Some(msg) = map(event) {
                            dispatch.send(msg);
                        }
                    });
                    attached.set(Some(host.add_listener(target, &name, callback)));
                }),
            )
        };
        if attached.get().is_none() {
            pending.set(Some(timer));
        }

        let host = Rc::clone(&self.host);
        let scheduler = ctx.scheduler;
        Box::new(move || {
            if let Some(timer) = pending.take() {
                scheduler.clear_timeout(timer);
            }
            if let Some(listener) = attached.take() {
                host.remove_listener(listener);
            }
        })
    }

    fn kind(&self) -> &'static str {
        "on_event"
    }
}

/// A reconnecting socket whose inbound frames become messages.
///
/// Tearing the subscription down disconnects the connection.
pub struct SocketStream<M> {
    id: SubId,
    transport: Transport,
    endpoint: Endpoint,
    token: String,
    map: Rc<dyn Fn(String) -> M>,
}

impl<M: 'static> SocketStream<M> {
    /// Validate `endpoint`; the id is derived from it.
    pub fn new(
        transport: &Transport,
        endpoint: &str,
        token: impl Into<String>,
        map: impl Fn(String) -> M + 'static,
    ) -> Result<Self, TransportError> {
        let endpoint = Endpoint::parse(endpoint)?;
        let mut hasher = DefaultHasher::new();
        endpoint.as_str().hash(&mut hasher);
        Ok(Self {
            id: hasher.finish() ^ 0x534F_434B, // "SOCK"
            transport: transport.clone(),
            endpoint,
            token: token.into(),
            map: Rc::new(map),
        })
    }

    /// Replace the derived id.
    #[must_use]
    pub fn with_id(mut self, id: SubId) -> Self {
        self.id = id;
        self
    }
}

impl<M: 'static> Subscription<M> for SocketStream<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown {
        let connection = self
            .transport
            .open_endpoint(self.endpoint.clone(), &self.token);
        let map = Rc::clone(&self.map);
        let dispatch = ctx.dispatch;
        if let Err(err) = connection.set_on_message(move |frame| {
            dispatch.send(map(frame));
        }) {
            tracing::error!(target: "tabwire.sub", sub_id = self.id, error = %err, "socket handler not installed");
        }
        Box::new(move || connection.disconnect())
    }

    fn kind(&self) -> &'static str {
        "socket"
    }
}

/// A subscription for tests: sends its messages on start, then completes.
pub struct MockSubscription<M> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Clone + 'static> MockSubscription<M> {
    /// Create a mock subscription that sends the given messages.
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn start(&self, ctx: SubscriptionContext<M>) -> Teardown {
        for msg in &self.messages {
            if !ctx.dispatch.send(msg.clone()) {
                break;
            }
        }
        ctx.completion.complete();
        Box::new(|| {})
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}

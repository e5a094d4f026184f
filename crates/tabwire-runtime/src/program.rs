#![forbid(unsafe_code)]

//! Elm-style program loop for browser applications.
//!
//! The program owns the model and the single message queue. Each pumped
//! message goes through `Model::update`; the returned [`Cmd`] is executed
//! and the declared subscriptions are reconciled. Rendering is left to the
//! host.
//!
//! # Example
//!
//! ```ignore
//! use tabwire_runtime::program::{Cmd, Model};
//!
//! struct App { route: Route }
//!
//! enum Msg { RouteRequested(Route), RouteChanged(Route), Frame(String) }
//!
//! impl Model for App {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::RouteRequested(_) => Cmd::none(),
//!             Msg::RouteChanged(route) => {
//!                 self.route = route;
//!                 Cmd::set_title(self.route.path.clone())
//!             }
//!             Msg::Frame(_) => Cmd::none(),
//!         }
//!     }
//! }
//! ```

use std::rc::Rc;

use tabwire_backend::{HistoryHost, Scheduler, TitleHost};
use tabwire_core::Route;

use crate::dispatch::{Dispatch, MessageQueue};
use crate::effect_system;
use crate::navigation::NavigationBridge;
use crate::subscription::{Subscription, SubscriptionManager};
use crate::teardown::TeardownRegistry;
use crate::title::TitleSync;

/// Application state and behavior.
pub trait Model: Sized {
    /// The message type for this model.
    type Message: 'static;

    /// Initialize the model with startup commands.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Update the model in response to a message.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Subscriptions that should be active for the current state.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        Vec::new()
    }
}

/// Side effects returned from `init` and `update`.
#[derive(Debug)]
pub enum Cmd<M> {
    /// No operation.
    None,
    /// Execute several commands in order.
    Batch(Vec<Cmd<M>>),
    /// Queue a message for the model.
    Msg(M),
    /// Push a history entry and raise the route change.
    Navigate(Route),
    /// Set the document title, skipping unchanged writes.
    SetTitle(String),
    /// Leave the application with a full page load.
    Redirect(String),
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a navigation command.
    #[inline]
    pub fn navigate(route: Route) -> Self {
        Self::Navigate(route)
    }

    /// Create a title command.
    #[inline]
    pub fn set_title(title: impl Into<String>) -> Self {
        Self::SetTitle(title.into())
    }

    /// Create a redirect command.
    #[inline]
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect(url.into())
    }

    /// Create a batch of commands.
    pub fn batch(mut cmds: Vec<Self>) -> Self {
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Batch(_) => "batch",
            Self::Msg(_) => "msg",
            Self::Navigate(_) => "navigate",
            Self::SetTitle(_) => "set_title",
            Self::Redirect(_) => "redirect",
        }
    }
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Self::None
    }
}

/// Services a [`Program`] runs against.
pub struct ProgramHost<H, T> {
    /// Shared teardown registry.
    pub registry: TeardownRegistry,
    /// Timer source for subscriptions.
    pub scheduler: Rc<dyn Scheduler>,
    /// Location and history.
    pub navigation: NavigationBridge<H>,
    /// Document title.
    pub title: TitleSync<T>,
}

/// Runs a [`Model`] against its host.
pub struct Program<Mdl: Model, H, T> {
    model: Mdl,
    queue: MessageQueue<Mdl::Message>,
    dispatch: Dispatch<Mdl::Message>,
    subscriptions: SubscriptionManager<Mdl::Message>,
    navigation: NavigationBridge<H>,
    title: TitleSync<T>,
}

impl<Mdl, H, T> Program<Mdl, H, T>
where
    Mdl: Model,
    H: HistoryHost + 'static,
    T: TitleHost,
{
    /// A program with a fresh queue.
    pub fn new(model: Mdl, host: ProgramHost<H, T>) -> Self {
        Self::with_queue(model, MessageQueue::new(), host)
    }

    /// A program consuming `queue`, e.g. one built with a waker.
    pub fn with_queue(
        model: Mdl,
        queue: MessageQueue<Mdl::Message>,
        host: ProgramHost<H, T>,
    ) -> Self {
        let dispatch = queue.dispatcher();
        let subscriptions =
            SubscriptionManager::new(host.registry, dispatch.clone(), host.scheduler);
        Self {
            model,
            queue,
            dispatch,
            subscriptions,
            navigation: host.navigation,
            title: host.title,
        }
    }

    /// A producer handle for this program's queue.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatch<Mdl::Message> {
        self.dispatch.clone()
    }

    /// Run `Model::init`, execute its command, and start the initial
    /// subscriptions.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute(cmd);
        self.reconcile();
    }

    /// Apply every queued message, including ones queued while pumping.
    /// Returns how many messages were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(msg) = self.queue.try_next() {
            applied += 1;
            let cmd = self.model.update(msg);
            self.execute(cmd);
            self.reconcile();
        }
        applied
    }

    fn reconcile(&mut self) {
        let subs = self.model.subscriptions();
        self.subscriptions.reconcile(subs);
    }

    fn execute(&mut self, cmd: Cmd<Mdl::Message>) {
        let command_type = cmd.type_name();
        match cmd {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                }
            }
            Cmd::Msg(m) => {
                self.dispatch.send(m);
            }
            Cmd::Navigate(route) => {
                let navigation = &self.navigation;
                effect_system::trace_command_effect(command_type, || navigation.navigate(&route));
            }
            Cmd::SetTitle(title) => {
                let sync = &self.title;
                effect_system::trace_command_effect(command_type, || {
                    sync.set_title(&title);
                });
            }
            Cmd::Redirect(url) => {
                let navigation = &self.navigation;
                effect_system::trace_command_effect(command_type, || navigation.redirect(&url));
            }
        }
    }

    /// Tear down every subscription.
    pub fn shutdown(&mut self) {
        self.subscriptions.stop_all();
    }

    /// The model.
    #[must_use]
    pub fn model(&self) -> &Mdl {
        &self.model
    }

    /// The navigation bridge.
    #[must_use]
    pub fn navigation(&self) -> &NavigationBridge<H> {
        &self.navigation
    }

    /// The subscription manager.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager<Mdl::Message> {
        &self.subscriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{After, Every};
    use core::time::Duration;
    use pretty_assertions::assert_eq;
    use tabwire_harness::{ManualScheduler, MemoryHistory, MemoryTitle};

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Changed(String),
        Go(&'static str),
        Title(&'static str),
        Tick,
        Ticking(bool),
        Done,
        Chain(u32),
    }

    #[derive(Default)]
    struct App {
        seen: Vec<Msg>,
        ticking: bool,
    }

    impl Model for App {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            Cmd::set_title("Home")
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            self.seen.push(msg.clone());
            match msg {
                Msg::Go(path) => Cmd::navigate(Route::new(path)),
                Msg::Title(title) => Cmd::set_title(title),
                Msg::Ticking(on) => {
                    self.ticking = on;
                    Cmd::none()
                }
                Msg::Chain(n) if n > 0 => Cmd::batch(vec![Cmd::msg(Msg::Chain(n - 1))]),
                _ => Cmd::none(),
            }
        }

        fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
            let mut subs: Vec<Box<dyn Subscription<Msg>>> =
                vec![Box::new(After::with_id(2, Duration::from_millis(50), || Msg::Done))];
            if self.ticking {
                subs.push(Box::new(Every::with_id(1, Duration::from_millis(10), || {
                    Msg::Tick
                })));
            }
            subs
        }
    }

    struct Rig {
        program: Program<App, MemoryHistory, MemoryTitle>,
        history: MemoryHistory,
        title: MemoryTitle,
        scheduler: ManualScheduler,
    }

    fn rig() -> Rig {
        let history = MemoryHistory::new("https://app.test/");
        let title = MemoryTitle::new("");
        let scheduler = ManualScheduler::new();
        let navigation = NavigationBridge::new(Rc::new(history.clone()));
        let host = ProgramHost {
            registry: TeardownRegistry::new(),
            scheduler: Rc::new(scheduler.clone()),
            navigation,
            title: TitleSync::new(Rc::new(title.clone())),
        };
        let mut program = Program::new(App::default(), host);
        program.init();
        Rig {
            program,
            history,
            title,
            scheduler,
        }
    }

    #[test]
    fn init_runs_command_and_starts_subscriptions() {
        let r = rig();
        assert_eq!(r.title.title(), "Home");
        assert!(r.program.subscriptions().is_running(2));
    }

    #[test]
    fn navigate_command_round_trips_as_change() {
        let mut r = rig();
        let nav = r.program.navigation().attach_interception(
            r.program.dispatcher(),
            |_| Msg::Done,
            |route| Msg::Changed(route.path),
        );
        r.program.dispatcher().send(Msg::Go("/widgets"));
        assert_eq!(r.program.pump(), 2);
        assert_eq!(r.history.location().pathname, "/widgets");
        assert_eq!(
            r.program.model().seen,
            vec![Msg::Go("/widgets"), Msg::Changed("/widgets".into())]
        );
        drop(nav);
    }

    #[test]
    fn title_command_is_idempotent() {
        let mut r = rig();
        let tx = r.program.dispatcher();
        tx.send(Msg::Title("Dashboard"));
        tx.send(Msg::Title("Dashboard"));
        r.program.pump();
        // "Home" from init, then "Dashboard" once.
        assert_eq!(r.title.writes(), 2);
        assert_eq!(r.title.title(), "Dashboard");
    }

    #[test]
    fn subscriptions_follow_model_state() {
        let mut r = rig();
        r.program.dispatcher().send(Msg::Ticking(true));
        r.program.pump();
        r.scheduler.advance(Duration::from_millis(25));
        assert_eq!(r.program.pump(), 2);

        r.program.dispatcher().send(Msg::Ticking(false));
        r.program.pump();
        r.scheduler.advance(Duration::from_millis(100));
        // Only the one-shot timer is left to fire.
        assert_eq!(r.program.pump(), 1);
        assert_eq!(r.program.model().seen.last(), Some(&Msg::Done));
    }

    #[test]
    fn messages_queued_while_pumping_are_applied() {
        let mut r = rig();
        r.program.dispatcher().send(Msg::Chain(3));
        assert_eq!(r.program.pump(), 4);
    }

    #[test]
    fn shutdown_stops_timers() {
        let mut r = rig();
        r.program.shutdown();
        r.scheduler.advance(Duration::from_secs(1));
        assert_eq!(r.program.pump(), 0);
    }

    #[test]
    fn batch_collapses() {
        assert!(matches!(Cmd::<()>::batch(vec![]), Cmd::None));
        assert!(matches!(Cmd::batch(vec![Cmd::msg(1)]), Cmd::Msg(1)));
        assert!(matches!(
            Cmd::batch(vec![Cmd::msg(1), Cmd::msg(2)]),
            Cmd::Batch(v) if v.len() == 2
        ));
    }
}

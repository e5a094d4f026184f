#![forbid(unsafe_code)]

//! Runtime for tabwire: the message loop and the stateful browser event
//! sources that feed it.
//!
//! # Role in tabwire
//! `tabwire-runtime` owns everything with a lifecycle: reconnecting sockets,
//! navigation interception, DOM listeners, timers, and the teardown of all of
//! them. It talks to the platform only through `tabwire-backend` traits.
//!
//! # Primary responsibilities
//! - **Transport**: one logical socket over many physical ones, redialed a
//!   fixed delay after every close until disconnected.
//! - **Navigation**: clicks, popstate, and programmatic navigation converge on
//!   one change notification.
//! - **Subscriptions**: declarative timers, listeners, and sockets, each torn
//!   down exactly once through the [`TeardownRegistry`].
//! - **Program**: the single message queue and the update loop.
//!
//! # How it fits in the system
//! Hosts construct one [`TeardownRegistry`], one [`Transport`], and one
//! [`NavigationBridge`] at startup and pass them to the [`Program`]. Tests use
//! `tabwire-harness`; the browser uses `tabwire-web`.

pub mod config;
pub mod dispatch;
pub mod effect_system;
pub mod event_bus;
pub mod navigation;
pub mod program;
pub mod subscription;
pub mod teardown;
pub mod title;
pub mod transport;

pub use config::{ConfigError, RuntimeConfig};
pub use dispatch::{Dispatch, MessageQueue};
pub use event_bus::{EventBus, Subscriber};
pub use navigation::{
    ClickDisposition, Interception, NavigationBridge, PassReason, find_anchor,
};
pub use program::{Cmd, Model, Program, ProgramHost};
pub use subscription::{
    After, Completion, Every, MockSubscription, OnEvent, SocketStream, Subscription,
    SubscriptionContext, SubscriptionManager,
};
pub use teardown::{SubId, Teardown, TeardownRegistry};
pub use title::TitleSync;
pub use transport::{Connection, Endpoint, MessageHandler, Transport};

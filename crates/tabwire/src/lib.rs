#![forbid(unsafe_code)]

//! tabwire public facade crate.
//!
//! Re-exports the types an application needs to run an Elm-style program in
//! the browser: routes and click events, the message loop, subscriptions,
//! the reconnecting transport, and the navigation bridge. The [`prelude`]
//! covers day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use tabwire_core::{ClickEvent, DialError, Location, Modifiers, Route, RouteError, TransportError};

// --- Backend re-exports ----------------------------------------------------

pub use tabwire_backend::{
    BrowserClock, DomNode, ElementLocator, HistoryHost, KeyValueStore, ListenerHost,
    ListenerTarget, PhysicalSocket, RandomSource, Scheduler, SocketDialer, SocketEvent,
    TitleHost,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tabwire_runtime::{
    After, ClickDisposition, Cmd, ConfigError, Connection, Dispatch, Endpoint, EventBus, Every,
    Interception, MessageQueue, Model, NavigationBridge, OnEvent, PassReason, Program,
    ProgramHost, RuntimeConfig, SocketStream, SubId, Subscription, SubscriptionContext,
    SubscriptionManager, TeardownRegistry, TitleSync, Transport,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for tabwire apps.
#[derive(Debug)]
pub enum Error {
    /// A URL could not be parsed or resolved.
    Route(RouteError),
    /// A connection could not be set up.
    Transport(TransportError),
    /// Configuration failed to load.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Route(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<RouteError> for Error {
    fn from(err: RouteError) -> Self {
        Self::Route(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for tabwire APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cmd, Connection, Dispatch, Error, Every, Model, NavigationBridge, Program, ProgramHost,
        Result, Route, RuntimeConfig, Subscription, Transport,
    };

    pub use crate::{backend, core, runtime};

    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use tabwire_backend as backend;
pub use tabwire_core as core;
pub use tabwire_runtime as runtime;
#[cfg(feature = "web")]
pub use tabwire_web as web;

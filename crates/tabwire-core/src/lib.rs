#![forbid(unsafe_code)]

//! Core: routes, browser event types, and the error taxonomy.
//!
//! # Role in tabwire
//! `tabwire-core` holds the plain values that cross every other boundary.
//! It performs no I/O and knows nothing about the browser beyond the shape of
//! what a browser reports.
//!
//! # Primary responsibilities
//! - **Route / Location**: decomposed URIs and the raw pieces a browser
//!   `Location` exposes, with absence encoded as `None` rather than `""`.
//! - **Events**: pointer-click modifiers and click payloads consumed by the
//!   navigation bridge.
//! - **Errors**: construction-time failures for routes and transports.
//!
//! # How it fits in the system
//! `tabwire-backend` defines host traits in terms of these types, and
//! `tabwire-runtime` builds the transport, navigation, and subscription
//! machinery on top of both.

pub mod error;
pub mod event;
pub mod route;

pub use error::{DialError, RouteError, TransportError};
pub use event::{ClickEvent, Modifiers};
pub use route::{Location, Route};

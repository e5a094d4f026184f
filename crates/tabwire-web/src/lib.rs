#![forbid(unsafe_code)]

//! Browser host for tabwire.
//!
//! # Role
//! Binds every `tabwire-backend` trait onto the browser through `web-sys`:
//! timers, WebSockets, history, title, DOM listeners, storage, element lookup,
//! and randomness. [`install_navigation`] wires document clicks and
//! `popstate` into a navigation interception.
//!
//! # Layout
//! The browser bindings only compile on `wasm32`. The bookkeeping they rely on
//! ([`HandleTable`], [`PumpWaker`], [`InstantClock`], [`scale_unit`]) is plain
//! Rust and tested natively.

pub mod clock;
pub mod handles;
pub mod random;
pub mod waker;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use clock::InstantClock;
pub use handles::HandleTable;
pub use random::scale_unit;
pub use waker::PumpWaker;

#[cfg(target_arch = "wasm32")]
pub use wasm::{
    MathRandom, NavigationGuard, WebElements, WebHistory, WebListeners, WebNode, WebScheduler,
    WebSocketDialer, WebStorage, WebTitle, install_navigation,
};

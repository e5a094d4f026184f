#![forbid(unsafe_code)]

//! Deterministic host for tabwire tests.
//!
//! Design goals:
//! - **Host-driven I/O**: tests push socket events, clicks, and history
//!   traversals explicitly.
//! - **Deterministic time**: [`ManualScheduler`] owns a virtual clock that only
//!   moves when [`ManualScheduler::advance`] is called.
//! - **No threads**: everything runs on the caller's stack, like the browser
//!   event loop it stands in for.

pub mod browser;
pub mod dom;
pub mod scheduler;
pub mod socket;

pub use browser::{FakeEvent, MemoryHistory, MemoryListeners, MemoryStorage, MemoryTitle, SeededRandom};
pub use dom::{MemoryDom, NodeRef};
pub use scheduler::ManualScheduler;
pub use socket::LoopbackDialer;

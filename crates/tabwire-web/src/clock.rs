#![forbid(unsafe_code)]

//! Monotonic clock.
//!
//! `web_time::Instant` reads `performance.now()` on `wasm32` and
//! `std::time::Instant` elsewhere, so the same type serves both.

use core::time::Duration;

use tabwire_backend::BrowserClock;
use web_time::Instant;

/// [`BrowserClock`] measured from the moment of construction.
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl InstantClock {
    /// Start a clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl BrowserClock for InstantClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

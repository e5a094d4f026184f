#![forbid(unsafe_code)]

//! Effect observability: monotonic counters and tracing spans.
//!
//! This module provides:
//!
//! - **Metrics counters**: `subscriptions_started_total`,
//!   `subscriptions_stopped_total`, `reconnect_attempts_total`,
//!   `navigations_total`, and `commands_executed_total`.
//! - **Tracing spans**: `effect.command` and `effect.subscription` spans with
//!   structured fields, emitted under the `tabwire.effect` target.
//!
//! Counters are process-wide and only ever increase; tests compare deltas.

use std::sync::atomic::{AtomicU64, Ordering};
use web_time::Instant;

// ---------------------------------------------------------------------------
// Monotonic counters
// ---------------------------------------------------------------------------

static SUBSCRIPTIONS_STARTED_TOTAL: AtomicU64 = AtomicU64::new(0);
static SUBSCRIPTIONS_STOPPED_TOTAL: AtomicU64 = AtomicU64::new(0);
static RECONNECT_ATTEMPTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static NAVIGATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static COMMANDS_EXECUTED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Subscriptions started (monotonic counter).
#[must_use]
pub fn subscriptions_started_total() -> u64 {
    SUBSCRIPTIONS_STARTED_TOTAL.load(Ordering::Relaxed)
}

/// Subscriptions torn down, explicitly or by completing (monotonic counter).
#[must_use]
pub fn subscriptions_stopped_total() -> u64 {
    SUBSCRIPTIONS_STOPPED_TOTAL.load(Ordering::Relaxed)
}

/// Reconnects scheduled after a physical socket closed or failed to dial.
#[must_use]
pub fn reconnect_attempts_total() -> u64 {
    RECONNECT_ATTEMPTS_TOTAL.load(Ordering::Relaxed)
}

/// Route changes delivered through the navigation bridge.
#[must_use]
pub fn navigations_total() -> u64 {
    NAVIGATIONS_TOTAL.load(Ordering::Relaxed)
}

/// Commands executed by the program loop.
#[must_use]
pub fn commands_executed_total() -> u64 {
    COMMANDS_EXECUTED_TOTAL.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Command effect instrumentation
// ---------------------------------------------------------------------------

/// Execute a command effect with tracing instrumentation.
///
/// Wraps execution with an `effect.command` span recording `command_type`
/// and `duration_us`.
pub fn trace_command_effect<F, R>(command_type: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    COMMANDS_EXECUTED_TOTAL.fetch_add(1, Ordering::Relaxed);

    let start = Instant::now();
    let span = tracing::debug_span!(
        "effect.command",
        command_type = %command_type,
        duration_us = tracing::field::Empty,
    )
    .entered();

    let result = f();
    let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    span.record("duration_us", duration_us);

    tracing::debug!(
        target: "tabwire.effect",
        command_type = %command_type,
        duration_us = duration_us,
        "command effect completed"
    );

    result
}

// ---------------------------------------------------------------------------
// Subscription effect instrumentation
// ---------------------------------------------------------------------------

/// Record a subscription start.
pub fn record_subscription_start(sub_type: &str, sub_id: u64) {
    SUBSCRIPTIONS_STARTED_TOTAL.fetch_add(1, Ordering::Relaxed);

    let _span = tracing::debug_span!(
        "effect.subscription",
        sub_type = %sub_type,
        sub_id = sub_id,
        active = true,
    )
    .entered();

    tracing::debug!(
        target: "tabwire.effect",
        sub_type = %sub_type,
        sub_id = sub_id,
        active = true,
        "subscription started"
    );
}

/// Record a subscription stop.
pub fn record_subscription_stop(sub_type: &str, sub_id: u64) {
    SUBSCRIPTIONS_STOPPED_TOTAL.fetch_add(1, Ordering::Relaxed);

    let _span = tracing::debug_span!(
        "effect.subscription",
        sub_type = %sub_type,
        sub_id = sub_id,
        active = false,
    )
    .entered();

    tracing::debug!(
        target: "tabwire.effect",
        sub_type = %sub_type,
        sub_id = sub_id,
        active = false,
        "subscription stopped"
    );
}

// ---------------------------------------------------------------------------
// Transport and navigation
// ---------------------------------------------------------------------------

/// Record a reconnect being scheduled.
pub fn record_reconnect_scheduled(endpoint: &str, delay_ms: u64, generation: u64) {
    RECONNECT_ATTEMPTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        target: "tabwire.transport",
        endpoint = %endpoint,
        delay_ms = delay_ms,
        generation = generation,
        "reconnect scheduled"
    );
}

/// What caused a route change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
    /// An intercepted anchor click.
    Click,
    /// Browser back/forward.
    PopState,
    /// A `navigate` call.
    Programmatic,
}

impl NavigationTrigger {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PopState => "popstate",
            Self::Programmatic => "programmatic",
        }
    }
}

/// Record a route change.
pub fn record_navigation(trigger: NavigationTrigger, path: &str) {
    NAVIGATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        target: "tabwire.nav",
        trigger = trigger.as_str(),
        path = %path,
        "navigation changed"
    );
}

// ============================================================================
// Tests
// ============================================================================

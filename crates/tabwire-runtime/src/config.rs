#![forbid(unsafe_code)]

//! Runtime tunables as data.
//!
//! [`RuntimeConfig::default()`] reproduces the built-in behavior: reconnect
//! one second after a close, pass the token as `?token=`, attach deferred
//! listeners and focus elements on the next scheduler tick.
//!
//! With the `config` feature the struct can be loaded from JSON:
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_json_str(r#"{ "reconnect_delay_ms": 250 }"#)?;
//! ```

use core::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default delay between a socket closing and the next dial.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Default query parameter carrying the auth token.
pub const DEFAULT_TOKEN_PARAM: &str = "token";

/// Tunables for the transport and the DOM-facing subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RuntimeConfig {
    /// Fixed delay before redialing a closed socket. No backoff.
    pub reconnect_delay_ms: u64,

    /// Query parameter name for the token on every physical attempt.
    pub token_param: String,

    /// Delay before an `OnEvent` subscription attaches its listener.
    pub listener_attach_delay_ms: u64,

    /// Delay before a focus request reaches the element.
    pub focus_delay_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            token_param: DEFAULT_TOKEN_PARAM.to_owned(),
            listener_attach_delay_ms: 0,
            focus_delay_ms: 0,
        }
    }
}

impl RuntimeConfig {
    /// Load from a JSON string. Missing fields take their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Serialize to a single JSON line.
    #[cfg(feature = "config")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Problems with the values; empty when the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.reconnect_delay_ms == 0 {
            errors.push("reconnect_delay_ms must be > 0".into());
        }
        if self.token_param.is_empty() {
            errors.push("token_param must not be empty".into());
        }
        errors
    }

    /// [`reconnect_delay_ms`](Self::reconnect_delay_ms) as a `Duration`.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// [`listener_attach_delay_ms`](Self::listener_attach_delay_ms) as a `Duration`.
    #[must_use]
    pub fn listener_attach_delay(&self) -> Duration {
        Duration::from_millis(self.listener_attach_delay_ms)
    }

    /// [`focus_delay_ms`](Self::focus_delay_ms) as a `Duration`.
    #[must_use]
    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}

/// Why a [`RuntimeConfig`] could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parse or encode error.
    #[error("JSON error: {0}")]
    Json(String),
    /// Values out of range.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

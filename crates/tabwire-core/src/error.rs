#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! Only construction-time failures are represented here. Transient socket
//! failures, missing DOM targets, and repeated teardowns are absorbed where
//! they happen and never surface as errors.

use thiserror::Error;

/// A string could not be interpreted as a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The input is not an absolute URL, or cannot be joined onto its base.
    #[error("invalid url `{input}`: {source}")]
    Invalid {
        /// The text that failed to parse.
        input: String,
        /// Underlying parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Failures reported while constructing or configuring a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint is not a well-formed URL.
    #[error("malformed endpoint `{endpoint}`: {source}")]
    MalformedEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Underlying parser failure.
        #[source]
        source: url::ParseError,
    },

    /// The endpoint already carries a query string; the token is appended by
    /// the transport itself.
    #[error("endpoint `{0}` must not carry a query string")]
    EndpointHasQuery(String),

    /// The endpoint carries a fragment, which sockets cannot address.
    #[error("endpoint `{0}` must not carry a fragment")]
    EndpointHasFragment(String),

    /// The endpoint scheme is not a socket scheme.
    #[error("endpoint scheme `{0}` is not ws or wss")]
    UnsupportedScheme(String),

    /// `set_on_message` was called twice on the same logical connection.
    #[error("message handler already set for this connection")]
    HandlerAlreadySet,
}

/// The platform refused to create a physical socket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("socket dial to `{url}` failed: {reason}")]
pub struct DialError {
    /// URL of the attempt, token included.
    pub url: String,
    /// Platform description of the failure.
    pub reason: String,
}

impl DialError {
    /// Create a dial error.
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

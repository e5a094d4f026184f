#![forbid(unsafe_code)]

//! Routes and browser locations.
//!
//! A [`Location`] is what a browser reports: every piece is a string and a
//! missing piece is `""`. A [`Route`] is the application's view of the same
//! address: missing pieces are `None`, so `/a`, `/a?` and `/a#` stay
//! distinguishable from `/a?x` and `/a#x` in round-trips.
//!
//! # Example
//!
//! ```
//! use tabwire_core::{Location, Route};
//!
//! let loc = Location::parse("https://example.com:8443/widgets/42?sort=asc#top").unwrap();
//! let route = Route::from_location(&loc);
//! assert_eq!(route.path, "/widgets/42");
//! assert_eq!(route.query.as_deref(), Some("sort=asc"));
//! assert_eq!(route.fragment.as_deref(), Some("top"));
//! assert_eq!(route.to_string(), "https://example.com:8443/widgets/42?sort=asc#top");
//! ```

use std::fmt;

use url::Url;

use crate::error::RouteError;

/// Raw location pieces, shaped like the browser `URL` accessors.
///
/// `protocol` keeps its trailing `:`, `search` its leading `?` and `hash` its
/// leading `#`. An empty query or fragment reads as `""`, as in a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Full serialized URL.
    pub href: String,
    /// Scheme with trailing colon, e.g. `"https:"`.
    pub protocol: String,
    /// Host without port.
    pub hostname: String,
    /// Port digits, or `""` when default/absent.
    pub port: String,
    /// Path, always present.
    pub pathname: String,
    /// `"?..."` or `""`.
    pub search: String,
    /// `"#..."` or `""`.
    pub hash: String,
}

impl Location {
    /// Parse an absolute URL.
    pub fn parse(href: &str) -> Result<Self, RouteError> {
        let url = Url::parse(href).map_err(|source| RouteError::Invalid {
            input: href.to_owned(),
            source,
        })?;
        Ok(Self::from_url(&url))
    }

    /// Resolve `href` against an absolute `base`, the way an anchor's `href`
    /// property is resolved against the document URL.
    pub fn resolve(base: &str, href: &str) -> Result<Self, RouteError> {
        let base_url = Url::parse(base).map_err(|source| RouteError::Invalid {
            input: base.to_owned(),
            source,
        })?;
        let url = base_url.join(href).map_err(|source| RouteError::Invalid {
            input: href.to_owned(),
            source,
        })?;
        Ok(Self::from_url(&url))
    }

    /// Read the browser-style pieces out of a parsed URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let search = match url.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        };
        let hash = match url.fragment() {
            Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
            _ => String::new(),
        };
        Self {
            href: url.as_str().to_owned(),
            protocol: format!("{}:", url.scheme()),
            hostname: url.host_str().unwrap_or_default().to_owned(),
            port: url.port().map(|p| p.to_string()).unwrap_or_default(),
            pathname: url.path().to_owned(),
            search,
            hash,
        }
    }
}

/// A decomposed URI used as in-app navigation state.
///
/// Routes are immutable values; a navigation produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Scheme without the trailing colon.
    pub scheme: Option<String>,
    /// Always `None` for routes read from a browser location.
    pub userinfo: Option<String>,
    /// Host name.
    pub host: Option<String>,
    /// Explicit port.
    pub port: Option<u16>,
    /// Path; may be empty but is always present.
    pub path: String,
    /// Query without the leading `?`.
    pub query: Option<String>,
    /// Fragment without the leading `#`.
    pub fragment: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

impl Route {
    /// A relative route with only a path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the query (without leading `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the fragment (without leading `#`).
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Decompose a browser location. Every optional piece is `None` unless
    /// the browser reported a non-empty value for it.
    #[must_use]
    pub fn from_location(location: &Location) -> Self {
        let scheme = location
            .protocol
            .strip_suffix(':')
            .unwrap_or(&location.protocol);
        let query = location
            .search
            .strip_prefix('?')
            .unwrap_or(&location.search);
        let fragment = location.hash.strip_prefix('#').unwrap_or(&location.hash);

        Self {
            scheme: non_empty(scheme),
            userinfo: None,
            host: non_empty(&location.hostname),
            port: location.port.parse().ok(),
            path: location.pathname.clone(),
            query: non_empty(query),
            fragment: non_empty(fragment),
        }
    }

    /// Parse an absolute URL into a route.
    pub fn parse(href: &str) -> Result<Self, RouteError> {
        Location::parse(href).map(|loc| Self::from_location(&loc))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(host) = &self.host {
            f.write_str("//")?;
            if let Some(userinfo) = &self.userinfo {
                write!(f, "{userinfo}@")?;
            }
            f.write_str(host)?;
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

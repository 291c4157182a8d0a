//! Typed request options handed to `fetch`.
//!
//! # Design
//! Enumerated fields are typed for convenience but never validated here:
//! every enum has a catch-all variant that carries an unknown token through
//! verbatim, and the host decides whether it is acceptable. Conversions from
//! strings are therefore infallible.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declares a string-token enum with `as_str`, `Display`, `From<&str>`,
/// `From<String>` and serde support as the bare token.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $token:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Any other token, passed through verbatim.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $token,)+
                    $name::Other(token) => token,
                }
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                match token {
                    $($token => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(token: String) -> Self {
                match token.as_str() {
                    $($token => $name::$variant,)+
                    _ => $name::Other(token),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map($name::from)
            }
        }
    };
}

token_enum! {
    /// HTTP request method (RFC 7231 section 4.3, `PATCH` from RFC 5789).
    Method {
        Get => "GET",
        Head => "HEAD",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
        Connect => "CONNECT",
        Options => "OPTIONS",
        Trace => "TRACE",
    }
}

token_enum! {
    /// How the request interacts with the host's HTTP cache.
    Cache {
        Default => "default",
        NoStore => "no-store",
        Reload => "reload",
        NoCache => "no-cache",
        ForceCache => "force-cache",
        OnlyIfCached => "only-if-cached",
    }
}

token_enum! {
    /// Whether cookies and other credentials are sent.
    Credentials {
        Omit => "omit",
        SameOrigin => "same-origin",
        Include => "include",
    }
}

token_enum! {
    /// Cross-origin request mode.
    Mode {
        SameOrigin => "same-origin",
        NoCors => "no-cors",
        Cors => "cors",
        Navigate => "navigate",
    }
}

token_enum! {
    /// Redirect handling.
    Redirect {
        Follow => "follow",
        Error => "error",
        Manual => "manual",
    }
}

token_enum! {
    /// Referrer policy.
    ReferrerPolicy {
        NoReferrer => "no-referrer",
        NoReferrerWhenDowngrade => "no-referrer-when-downgrade",
        Origin => "origin",
        OriginWhenCrossOrigin => "origin-when-cross-origin",
        UnsafeUrl => "unsafe-url",
    }
}

/// Referrer of the request: one of two keywords or an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Referrer {
    NoReferrer,
    Client,
    Url(String),
}

impl Referrer {
    pub fn as_str(&self) -> &str {
        match self {
            Referrer::NoReferrer => "no-referrer",
            Referrer::Client => "client",
            Referrer::Url(url) => url,
        }
    }
}

impl From<&str> for Referrer {
    fn from(value: &str) -> Self {
        match value {
            "no-referrer" => Referrer::NoReferrer,
            "client" => Referrer::Client,
            url => Referrer::Url(url.to_string()),
        }
    }
}

impl From<String> for Referrer {
    fn from(value: String) -> Self {
        match value.as_str() {
            "no-referrer" => Referrer::NoReferrer,
            "client" => Referrer::Client,
            _ => Referrer::Url(value),
        }
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Referrer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Referrer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Referrer::from)
    }
}

/// A request body: a byte stream that is read at most once.
pub struct Body {
    reader: Box<dyn Read + Send>,
}

impl Body {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    pub(crate) fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::new(Cursor::new(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::new(Cursor::new(text.into_bytes()))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::new(text.as_bytes())
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::new(bytes)
    }
}

/// Cancellation handle for a request.
///
/// Accepted on `RequestOptions` but not yet wired to the host: aborting it
/// has no effect on a call in flight.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Options for a single request.
///
/// Every `None` field is left out of the mapped configuration so the host's
/// default applies. Built per request and consumed by `fetch`; the body is
/// drained exactly once.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HashMap<String, String>,
    pub body: Option<Body>,
    pub mode: Option<Mode>,
    pub credentials: Option<Credentials>,
    pub cache: Option<Cache>,
    pub redirect: Option<Redirect>,
    pub referrer: Option<Referrer>,
    pub referrer_policy: Option<ReferrerPolicy>,
    /// Subresource integrity metadata, opaque to this crate.
    pub integrity: Option<String>,
    pub keep_alive: Option<bool>,
    pub signal: Option<AbortSignal>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<Method>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set one header. A later call with the same name replaces the value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn mode(mut self, mode: impl Into<Mode>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn credentials(mut self, credentials: impl Into<Credentials>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    pub fn cache(mut self, cache: impl Into<Cache>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn referrer(mut self, referrer: impl Into<Referrer>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn referrer_policy(mut self, policy: impl Into<ReferrerPolicy>) -> Self {
        self.referrer_policy = Some(policy.into());
        self
    }

    pub fn integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Remove the body, leaving `None` behind.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}

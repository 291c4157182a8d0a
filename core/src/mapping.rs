//! Mapping from `RequestOptions` to the host's generic configuration object.
//!
//! # Design
//! The mapping is an explicit table, one statement per field, over a full
//! destructuring of `RequestOptions`. Adding a field to the record fails to
//! compile until it is mapped here, and the set of keys the host can see is
//! the closed list in `keys`.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::options::{Body, RequestOptions};

/// Key names understood by the host's fetch primitive.
pub mod keys {
    pub const METHOD: &str = "Method";
    pub const HEADERS: &str = "Headers";
    pub const BODY: &str = "Body";
    pub const MODE: &str = "Mode";
    pub const CREDENTIALS: &str = "Credentials";
    pub const CACHE: &str = "Cache";
    pub const REDIRECT: &str = "Redirect";
    pub const REFERRER: &str = "Referrer";
    pub const REFERRER_POLICY: &str = "ReferrerPolicy";
    pub const INTEGRITY: &str = "Integrity";
    pub const KEEP_ALIVE: &str = "KeepAlive";
}

/// Every key `map_options` may emit.
pub const RECOGNIZED_KEYS: [&str; 11] = [
    keys::METHOD,
    keys::HEADERS,
    keys::BODY,
    keys::MODE,
    keys::CREDENTIALS,
    keys::CACHE,
    keys::REDIRECT,
    keys::REFERRER,
    keys::REFERRER_POLICY,
    keys::INTEGRITY,
    keys::KEEP_ALIVE,
];

/// Untyped configuration object passed to the host.
///
/// A missing key means "use the host's default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappedConfig(Map<String, Value>);

impl MappedConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value under `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.0.get(keys::HEADERS).and_then(Value::as_object)
    }

    /// Decoded request body text.
    pub fn body(&self) -> Option<&str> {
        self.get_str(keys::BODY)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Compact JSON text of the configuration.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }
}

/// Convert request options into the host's configuration object.
///
/// `None` yields an empty configuration. A present body is taken out of
/// `options` and read to the end before this returns, so mapping the same
/// options twice never sees the body again. The body is decoded as text
/// (lossy UTF-8); binary payloads are not preserved.
///
/// Enumerated values are copied verbatim and never validated. A cancellation
/// signal is accepted and ignored.
pub fn map_options(options: Option<&mut RequestOptions>) -> Result<MappedConfig, FetchError> {
    let mut config = MappedConfig::default();
    let Some(options) = options else {
        return Ok(config);
    };

    let RequestOptions {
        method,
        headers,
        body,
        mode,
        credentials,
        cache,
        redirect,
        referrer,
        referrer_policy,
        integrity,
        keep_alive,
        signal,
    } = options;

    // The body goes first: a failed read must leave nothing half-mapped.
    if let Some(body) = body.take() {
        let text = read_body(body)?;
        config.insert(keys::BODY, text);
    }

    if let Some(method) = method {
        config.insert(keys::METHOD, method.as_str());
    }
    if !headers.is_empty() {
        config.insert(keys::HEADERS, map_headers(headers));
    }
    if let Some(mode) = mode {
        config.insert(keys::MODE, mode.as_str());
    }
    if let Some(credentials) = credentials {
        config.insert(keys::CREDENTIALS, credentials.as_str());
    }
    if let Some(cache) = cache {
        config.insert(keys::CACHE, cache.as_str());
    }
    if let Some(redirect) = redirect {
        config.insert(keys::REDIRECT, redirect.as_str());
    }
    if let Some(referrer) = referrer {
        config.insert(keys::REFERRER, referrer.as_str());
    }
    if let Some(policy) = referrer_policy {
        config.insert(keys::REFERRER_POLICY, policy.as_str());
    }
    if let Some(integrity) = integrity {
        config.insert(keys::INTEGRITY, integrity.as_str());
    }
    if let Some(keep_alive) = keep_alive {
        config.insert(keys::KEEP_ALIVE, *keep_alive);
    }
    if let Some(signal) = signal {
        tracing::debug!(aborted = signal.is_aborted(), "abort signal is not wired to the host; ignoring");
    }

    Ok(config)
}

/// Copy headers into an untyped object. Names are kept as given.
fn map_headers(headers: &HashMap<String, String>) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    Value::Object(map)
}

fn read_body(body: Body) -> Result<String, FetchError> {
    let mut reader = body.into_reader();
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(FetchError::BodyRead)?;
    tracing::trace!(len = bytes.len(), "request body read");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

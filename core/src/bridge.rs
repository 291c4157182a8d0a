//! Blocking fetch on top of the host's asynchronous fetch primitive.
//!
//! # Design
//! The host is reached through two traits. `ExternalFetch::fetch` starts a
//! request and later settles a `ResponseCallback` once response metadata is
//! available; `HostResponse::text` decodes the body and settles a
//! `TextCallback`. The second stage is only requested from inside the first
//! continuation, so "response received" always precedes "body decoded".
//!
//! The decoded text travels through a `oneshot` channel: one slot, one send,
//! one receive, owned by a single call. The calling thread parks on that
//! channel until the chain settles.
//!
//! # Threading
//! The host's continuations usually run on its own event loop. `fetch` blocks
//! the calling thread, so it must not be called from the thread that runs
//! that loop, or the call will wait for callbacks that can never run. A host
//! that settles continuations synchronously inside `fetch`/`text` is fine on
//! any thread.

use std::fmt;
use std::sync::Arc;

use futures::channel::oneshot;
use uuid::Uuid;

use crate::error::FetchError;
use crate::mapping::{map_options, MappedConfig};
use crate::options::RequestOptions;

/// Reason the host gave for rejecting a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Continuation for the "response received" stage.
pub type ResponseCallback = Box<dyn FnOnce(Result<Box<dyn HostResponse>, Rejection>) + Send>;

/// Continuation for the "body decoded as text" stage.
pub type TextCallback = Box<dyn FnOnce(Result<String, Rejection>) + Send>;

/// The host's asynchronous fetch primitive.
///
/// Implementations start the request and return immediately; the callback is
/// invoked once, from any thread, when the response metadata is available or
/// the request fails. Dropping the callback unsettled makes the waiting call
/// return `FetchError::Abandoned`.
pub trait ExternalFetch: Send + Sync {
    fn fetch(&self, url: &str, config: MappedConfig, on_response: ResponseCallback);
}

/// A response handed back by the host.
pub trait HostResponse: Send {
    /// Decode the whole body as text and settle `on_text` with it.
    fn text(self: Box<Self>, on_text: TextCallback);
}

impl<T: ExternalFetch + ?Sized> ExternalFetch for &T {
    fn fetch(&self, url: &str, config: MappedConfig, on_response: ResponseCallback) {
        (**self).fetch(url, config, on_response)
    }
}

impl<T: ExternalFetch + ?Sized> ExternalFetch for Arc<T> {
    fn fetch(&self, url: &str, config: MappedConfig, on_response: ResponseCallback) {
        (**self).fetch(url, config, on_response)
    }
}

impl<T: ExternalFetch + ?Sized> ExternalFetch for Box<T> {
    fn fetch(&self, url: &str, config: MappedConfig, on_response: ResponseCallback) {
        (**self).fetch(url, config, on_response)
    }
}

/// Fetch `url` through `host` and block until the whole body is decoded.
///
/// The options are mapped (draining any body) before the host is invoked; a
/// body read failure returns without touching the host. Response status and
/// headers are not surfaced: a non-2xx response still yields its body.
pub fn fetch<H>(host: &H, url: &str, mut options: Option<RequestOptions>) -> Result<Vec<u8>, FetchError>
where
    H: ExternalFetch + ?Sized,
{
    if url.is_empty() {
        return Err(FetchError::EmptyUrl);
    }

    let call_id = Uuid::new_v4();
    let span = tracing::debug_span!("fetch", %call_id, url);
    let _guard = span.enter();

    let config = map_options(options.as_mut())?;
    tracing::debug!(keys = config.len(), "invoking host fetch");

    let (tx, rx) = oneshot::channel::<Result<String, FetchError>>();
    host.fetch(
        url,
        config,
        Box::new(move |settled: Result<Box<dyn HostResponse>, Rejection>| match settled {
            Ok(response) => {
                tracing::trace!(%call_id, "response received, requesting text");
                response.text(Box::new(move |text: Result<String, Rejection>| {
                    tracing::trace!(%call_id, ok = text.is_ok(), "response text settled");
                    let _ = tx.send(text.map_err(FetchError::TextRejected));
                }));
            }
            Err(rejection) => {
                tracing::trace!(%call_id, %rejection, "fetch rejected");
                let _ = tx.send(Err(FetchError::FetchRejected(rejection)));
            }
        }),
    );

    let text = match futures::executor::block_on(rx) {
        Ok(settled) => settled?,
        Err(oneshot::Canceled) => {
            tracing::warn!(%call_id, "host dropped the pending call");
            return Err(FetchError::Abandoned);
        }
    };
    tracing::debug!(len = text.len(), "fetch complete");
    Ok(text.into_bytes())
}

/// A host bound to the blocking fetch call.
#[derive(Debug, Clone)]
pub struct Fetcher<H> {
    host: H,
}

impl<H: ExternalFetch> Fetcher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// See [`fetch`].
    pub fn fetch(&self, url: &str, options: Option<RequestOptions>) -> Result<Vec<u8>, FetchError> {
        fetch(&self.host, url, options)
    }
}

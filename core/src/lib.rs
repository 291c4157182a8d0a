//! Blocking fetch over a host-supplied asynchronous fetch primitive.
//!
//! # Overview
//! Code that cannot await (a worker thread, a foreign caller behind a C ABI)
//! asks for a URL and gets the full response body back from a plain function
//! call. The network itself belongs to the host: it receives a URL plus a
//! generic configuration object and settles two continuations, "response
//! received" and "body decoded as text".
//!
//! # Design
//! - `RequestOptions` is the typed record callers fill in; `map_options`
//!   turns it into a `MappedConfig` (an untyped JSON object) through an
//!   explicit field-to-key table.
//! - `ExternalFetch` / `HostResponse` are the seam to the host. Continuations
//!   are boxed `FnOnce` callbacks, so each stage settles at most once.
//! - `fetch` chains the two continuations into a single-slot channel and
//!   blocks on it. It must not run on the thread that drives the host's event
//!   loop, unless the host settles callbacks synchronously.

pub mod bridge;
pub mod error;
pub mod mapping;
pub mod options;

pub use bridge::{fetch, ExternalFetch, Fetcher, HostResponse, Rejection, ResponseCallback, TextCallback};
pub use error::FetchError;
pub use mapping::{map_options, MappedConfig};
pub use options::{
    AbortSignal, Body, Cache, Credentials, Method, Mode, Redirect, Referrer, ReferrerPolicy, RequestOptions,
};

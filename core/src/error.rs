//! Error types for the fetch bridge.
//!
//! # Design
//! Every failure is local to one call. Body-read failures happen before the
//! host is ever invoked; host rejections are split by stage so a caller can
//! tell "the request failed" from "the response body could not be decoded".

use thiserror::Error;

use crate::bridge::Rejection;

/// Errors returned by `fetch` and `map_options`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request target was an empty string.
    #[error("request url must not be empty")]
    EmptyUrl,

    /// The request body could not be read to completion.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// The host rejected the request before a response was available.
    #[error("fetch rejected: {0}")]
    FetchRejected(Rejection),

    /// The host produced a response but failed to decode its body as text.
    #[error("response text rejected: {0}")]
    TextRejected(Rejection),

    /// The host dropped a continuation without settling it.
    #[error("host abandoned the call without settling it")]
    Abandoned,
}

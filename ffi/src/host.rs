//! `ExternalFetch` implemented by a C host through a function-pointer table.
//!
//! # Design
//! Each call gets a numeric id. Before the host function runs, the pending
//! continuation is parked under that id; the host later settles it by id
//! through `fetch_bridge_resolve_response`, `fetch_bridge_resolve_text` or
//! `fetch_bridge_reject`, from whatever thread runs its event loop. The
//! pending table lock is never held while calling into the host or into a
//! continuation, so a host may settle synchronously from inside its own
//! `fetch`/`text` function.

use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use fetch_bridge::{
    ExternalFetch, HostResponse, MappedConfig, Rejection, ResponseCallback, TextCallback,
};
use thiserror::Error;

/// Starts a fetch. `url` and `config_json` are only valid during the call.
/// The host must eventually settle `call_id` with
/// `fetch_bridge_resolve_response` or `fetch_bridge_reject`.
pub type FfiFetchFn =
    extern "C" fn(user_data: *mut c_void, call_id: u64, url: *const c_char, config_json: *const c_char);

/// Starts decoding the body of the host response `response` as text. The host
/// must eventually settle `call_id` with `fetch_bridge_resolve_text` or
/// `fetch_bridge_reject`.
pub type FfiTextFn = extern "C" fn(user_data: *mut c_void, call_id: u64, response: u64);

/// Host functions supplied by the embedder.
///
/// `user_data` is passed back verbatim. The host guarantees both functions
/// and `user_data` may be used from any thread.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiHostVtable {
    pub user_data: *mut c_void,
    pub fetch: Option<FfiFetchFn>,
    pub text: Option<FfiTextFn>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettleError {
    #[error("no pending call with id {0}")]
    UnknownCall(u64),
    #[error("call {0} is pending in the other stage")]
    WrongStage(u64),
}

enum Pending {
    Response(ResponseCallback),
    Text(TextCallback),
}

struct Shared {
    user_data: *mut c_void,
    fetch: FfiFetchFn,
    text: FfiTextFn,
    next_call: AtomicU64,
    pending: Mutex<HashMap<u64, Pending>>,
}

// SAFETY: the embedder promises (see `FfiHostVtable`) that `user_data` and
// both functions are usable from any thread; everything else is synchronized.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

impl Shared {
    fn park(&self, call_id: u64, pending: Pending) {
        self.lock().insert(call_id, pending);
    }

    fn take(&self, call_id: u64) -> Option<Pending> {
        self.lock().remove(&call_id)
    }

    /// Remove `call_id` only if it waits for a response. Checked and removed
    /// under one lock, so a settle for the other stage never sees a gap.
    fn take_response(&self, call_id: u64) -> Result<ResponseCallback, SettleError> {
        let mut pending = self.lock();
        match pending.remove(&call_id) {
            Some(Pending::Response(on_response)) => Ok(on_response),
            Some(text) => {
                pending.insert(call_id, text);
                Err(SettleError::WrongStage(call_id))
            }
            None => Err(SettleError::UnknownCall(call_id)),
        }
    }

    /// Remove `call_id` only if it waits for text.
    fn take_text(&self, call_id: u64) -> Result<TextCallback, SettleError> {
        let mut pending = self.lock();
        match pending.remove(&call_id) {
            Some(Pending::Text(on_text)) => Ok(on_text),
            Some(response) => {
                pending.insert(call_id, response);
                Err(SettleError::WrongStage(call_id))
            }
            None => Err(SettleError::UnknownCall(call_id)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Pending>> {
        // A continuation never runs under this lock, so poisoning only means
        // a panic between insert and remove; the map itself is still sound.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reject(&self, call_id: u64, message: String) -> Result<(), SettleError> {
        match self.take(call_id) {
            Some(Pending::Response(on_response)) => on_response(Err(Rejection::new(message))),
            Some(Pending::Text(on_text)) => on_text(Err(Rejection::new(message))),
            None => return Err(SettleError::UnknownCall(call_id)),
        }
        Ok(())
    }
}

/// A C host, usable as the bridge's `ExternalFetch`.
#[derive(Clone)]
pub struct FfiHost {
    shared: Arc<Shared>,
}

impl FfiHost {
    /// Returns `None` if either host function is missing.
    pub fn new(vtable: FfiHostVtable) -> Option<Self> {
        Some(Self {
            shared: Arc::new(Shared {
                user_data: vtable.user_data,
                fetch: vtable.fetch?,
                text: vtable.text?,
                next_call: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Number of calls waiting on the host.
    pub fn pending_calls(&self) -> usize {
        self.shared.lock().len()
    }

    /// Settle the "response received" stage of `call_id`.
    pub fn resolve_response(&self, call_id: u64, response: u64) -> Result<(), SettleError> {
        let on_response = self.shared.take_response(call_id)?;
        on_response(Ok(Box::new(FfiResponse {
            shared: Arc::clone(&self.shared),
            call_id,
            response,
        })));
        Ok(())
    }

    /// Settle the "body decoded" stage of `call_id`.
    pub fn resolve_text(&self, call_id: u64, text: String) -> Result<(), SettleError> {
        let on_text = self.shared.take_text(call_id)?;
        on_text(Ok(text));
        Ok(())
    }

    /// Reject whichever stage `call_id` is waiting in.
    pub fn reject(&self, call_id: u64, message: impl Into<String>) -> Result<(), SettleError> {
        self.shared.reject(call_id, message.into())
    }

    /// Drop `call_id` without settling it. The waiting fetch returns
    /// `FetchError::Abandoned`.
    pub fn abandon(&self, call_id: u64) -> Result<(), SettleError> {
        // Dropped outside the lock: the drop wakes the waiting caller.
        let pending = self.shared.take(call_id).ok_or(SettleError::UnknownCall(call_id))?;
        drop(pending);
        Ok(())
    }
}

impl ExternalFetch for FfiHost {
    fn fetch(&self, url: &str, config: MappedConfig, on_response: ResponseCallback) {
        let call_id = self.shared.next_call.fetch_add(1, Ordering::Relaxed);
        self.shared.park(call_id, Pending::Response(on_response));

        let (url, config_json) = match (CString::new(url), CString::new(config.to_json())) {
            (Ok(url), Ok(config_json)) => (url, config_json),
            (url, _) => {
                let field = if url.is_err() { "url" } else { "config" };
                if let Err(e) = self.shared.reject(call_id, format!("{field} contains a NUL byte")) {
                    tracing::warn!(call_id, error = %e, "could not reject call");
                }
                return;
            }
        };
        tracing::debug!(call_id, "handing fetch to host");
        (self.shared.fetch)(self.shared.user_data, call_id, url.as_ptr(), config_json.as_ptr());
    }
}

struct FfiResponse {
    shared: Arc<Shared>,
    call_id: u64,
    response: u64,
}

impl HostResponse for FfiResponse {
    fn text(self: Box<Self>, on_text: TextCallback) {
        self.shared.park(self.call_id, Pending::Text(on_text));
        tracing::debug!(call_id = self.call_id, response = self.response, "requesting text from host");
        (self.shared.text)(self.shared.user_data, self.call_id, self.response);
    }
}

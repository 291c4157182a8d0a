//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Inputs (`FfiRequestOptions`, `FfiHeader`) are owned by the C caller and
//! only read for the duration of a call. Outputs (`FfiFetchResult`, C
//! strings) are allocated here and released by the matching
//! `fetch_bridge_free_*` function.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use fetch_bridge::{AbortSignal, Body, FetchError, Fetcher, RequestOptions};

use crate::host::FfiHost;

/// Opaque handle to a bridge. C callers receive a pointer to this and pass
/// it back into every FFI function.
pub struct FfiBridge {
    pub(crate) fetcher: Fetcher<FfiHost>,
}

// ---------------------------------------------------------------------------
// Request options (caller-provided, read only)
// ---------------------------------------------------------------------------

/// A single header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// Request options as C-compatible plain data.
///
/// Null string pointers mean "not set". `body` null means no body; a non-null
/// `body` with `body_len == 0` is an empty body. `keep_alive` is tri-state:
/// -1 = not set, 0 = false, 1 = true.
#[repr(C)]
pub struct FfiRequestOptions {
    pub method: *const c_char,
    pub headers: *const FfiHeader,
    pub headers_len: u32,
    pub body: *const u8,
    pub body_len: usize,
    pub mode: *const c_char,
    pub credentials: *const c_char,
    pub cache: *const c_char,
    pub redirect: *const c_char,
    pub referrer: *const c_char,
    pub referrer_policy: *const c_char,
    pub integrity: *const c_char,
    pub keep_alive: i32,
    /// Attach a (currently inert) abort signal.
    pub has_signal: bool,
}

/// Read an optional C string. Null is `Ok(None)`; invalid UTF-8 is an error
/// naming the field.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn opt_str(ptr: *const c_char, field: &str) -> Result<Option<String>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|_| format!("{field} is not valid UTF-8"))
}

impl FfiRequestOptions {
    /// Copy the C data into core `RequestOptions`.
    ///
    /// # Safety
    /// Every non-null pointer must be valid for the lengths given.
    pub(crate) unsafe fn to_core(&self) -> Result<RequestOptions, String> {
        let mut options = RequestOptions::new();
        options.method = opt_str(self.method, "method")?.map(Into::into);
        options.mode = opt_str(self.mode, "mode")?.map(Into::into);
        options.credentials = opt_str(self.credentials, "credentials")?.map(Into::into);
        options.cache = opt_str(self.cache, "cache")?.map(Into::into);
        options.redirect = opt_str(self.redirect, "redirect")?.map(Into::into);
        options.referrer = opt_str(self.referrer, "referrer")?.map(Into::into);
        options.referrer_policy = opt_str(self.referrer_policy, "referrer_policy")?.map(Into::into);
        options.integrity = opt_str(self.integrity, "integrity")?;

        if !self.headers.is_null() && self.headers_len > 0 {
            let headers = std::slice::from_raw_parts(self.headers, self.headers_len as usize);
            for (i, header) in headers.iter().enumerate() {
                let key = opt_str(header.key, "header key")?.ok_or_else(|| format!("header {i} has a null key"))?;
                let value = opt_str(header.value, "header value")?.unwrap_or_default();
                options.headers.insert(key, value);
            }
        }

        if !self.body.is_null() {
            let bytes = std::slice::from_raw_parts(self.body, self.body_len).to_vec();
            options.body = Some(Body::from(bytes));
        }

        options.keep_alive = match self.keep_alive {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        };
        if self.has_signal {
            options.signal = Some(AbortSignal::new());
        }
        Ok(options)
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Status codes returned across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidArg = 2,
    EmptyUrl = 3,
    BodyRead = 4,
    FetchRejected = 5,
    TextRejected = 6,
    Abandoned = 7,
    Panic = 8,
    /// No pending call has this id.
    UnknownCall = 9,
    /// The call is pending, but in the other stage.
    WrongStage = 10,
}

impl From<&FetchError> for FfiErrorCode {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::EmptyUrl => FfiErrorCode::EmptyUrl,
            FetchError::BodyRead(_) => FfiErrorCode::BodyRead,
            FetchError::FetchRejected(_) => FfiErrorCode::FetchRejected,
            FetchError::TextRejected(_) => FfiErrorCode::TextRejected,
            FetchError::Abandoned => FfiErrorCode::Abandoned,
        }
    }
}

/// Result envelope for `fetch_bridge_fetch`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `body` holds
/// `body_len` bytes (null when the body is empty). On failure `body` is null
/// and `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiFetchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiFetchResult {
    pub(crate) fn ok(body: Vec<u8>) -> *mut Self {
        let body_len = body.len();
        let body = if body.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(body.into_boxed_slice()) as *mut u8
        };
        Box::into_raw(Box::new(FfiFetchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            body,
            body_len,
        }))
    }

    pub(crate) fn error(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiFetchResult {
            error_code,
            error_message: into_c_string(msg),
            body: std::ptr::null_mut(),
            body_len: 0,
        }))
    }

    pub(crate) fn from_error(err: FetchError) -> *mut Self {
        Self::error(FfiErrorCode::from(&err), &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }
}

/// Allocate a C string, dropping interior NULs rather than failing.
pub(crate) fn into_c_string(s: &str) -> *mut c_char {
    let cleaned: String = s.chars().filter(|&c| c != '\0').collect();
    CString::new(cleaned).unwrap_or_default().into_raw()
}

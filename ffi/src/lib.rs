//! C-ABI wrapper around `fetch-bridge-core`.
//!
//! # Overview
//! Lets a native embedder supply the asynchronous fetch primitive (for
//! example a JS engine's `fetch`) as two C callbacks, and lets foreign code
//! call a blocking `fetch_bridge_fetch` on top of it.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The host settles each stage of a call by id with
//!   `fetch_bridge_resolve_response`, `fetch_bridge_resolve_text` or
//!   `fetch_bridge_reject`, from any thread. `fetch_bridge_abandon` drops a
//!   call the host will never settle.
//! - `fetch_bridge_fetch` blocks the calling thread. It must not be called
//!   from the thread that settles the host's callbacks.
//! - The C caller owns all returned pointers and must call the matching
//!   `fetch_bridge_free_*` function to release them.

pub mod host;
pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fetch_bridge::{map_options, Fetcher};
use tracing_subscriber::EnvFilter;

pub use host::{FfiFetchFn, FfiHost, FfiHostVtable, FfiTextFn, SettleError};
use types::*;

// ---------------------------------------------------------------------------
// Bridge lifecycle
// ---------------------------------------------------------------------------

/// Create a bridge over the host functions in `host`.
///
/// Returns null if either host function is null or if an internal panic
/// occurs. The caller must free the returned pointer with `fetch_bridge_free`
/// once no call is in flight.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_new(host: FfiHostVtable) -> *mut FfiBridge {
    catch_unwind(|| match FfiHost::new(host) {
        Some(host) => Box::into_raw(Box::new(FfiBridge {
            fetcher: Fetcher::new(host),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a bridge created by `fetch_bridge_new`. Safe to call with null.
///
/// Freeing while a `fetch_bridge_fetch` call is still blocked on this bridge
/// is undefined behaviour.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free(bridge: *mut FfiBridge) {
    if !bridge.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(bridge) });
        }));
    }
}

/// Install a stderr `tracing` subscriber filtered by `FETCH_BRIDGE_LOG`
/// (default `warn`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_init_logging() -> bool {
    catch_unwind(|| {
        let filter = EnvFilter::try_from_env("FETCH_BRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Fetch `url` and block until the whole response body is available.
///
/// `options` may be null (all host defaults). Returns a result envelope
/// that must be freed with `fetch_bridge_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_fetch(
    bridge: *const FfiBridge,
    url: *const c_char,
    options: *const FfiRequestOptions,
) -> *mut FfiFetchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if bridge.is_null() {
            return FfiFetchResult::null_arg("bridge");
        }
        if url.is_null() {
            return FfiFetchResult::null_arg("url");
        }
        let bridge = unsafe { &*bridge };
        let url = match unsafe { opt_str(url, "url") } {
            Ok(Some(url)) => url,
            Ok(None) => return FfiFetchResult::null_arg("url"),
            Err(msg) => return FfiFetchResult::error(FfiErrorCode::InvalidArg, &msg),
        };
        let options = if options.is_null() {
            None
        } else {
            match unsafe { (*options).to_core() } {
                Ok(options) => Some(options),
                Err(msg) => return FfiFetchResult::error(FfiErrorCode::InvalidArg, &msg),
            }
        };

        match bridge.fetcher.fetch(&url, options) {
            Ok(body) => FfiFetchResult::ok(body),
            Err(e) => FfiFetchResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in fetch_bridge_fetch"))
}

/// Map `options` to the JSON configuration the host would receive.
///
/// Null `options` maps to `{}`. Returns null if an option is not valid
/// UTF-8. Free the result with `fetch_bridge_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_map_options(options: *const FfiRequestOptions) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        let mut options = if options.is_null() {
            None
        } else {
            match unsafe { (*options).to_core() } {
                Ok(options) => Some(options),
                Err(_) => return std::ptr::null_mut(),
            }
        };
        match map_options(options.as_mut()) {
            Ok(config) => into_c_string(&config.to_json()),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Host completions
// ---------------------------------------------------------------------------

fn settle_code(result: Result<(), SettleError>) -> FfiErrorCode {
    match result {
        Ok(()) => FfiErrorCode::Ok,
        Err(SettleError::UnknownCall(call_id)) => {
            tracing::warn!(call_id, "host settled an unknown call");
            FfiErrorCode::UnknownCall
        }
        Err(SettleError::WrongStage(call_id)) => {
            tracing::warn!(call_id, "host settled the wrong stage");
            FfiErrorCode::WrongStage
        }
    }
}

/// Report that the response for `call_id` is available as host handle
/// `response`. The bridge answers by calling the host's `text` function.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_resolve_response(
    bridge: *const FfiBridge,
    call_id: u64,
    response: u64,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if bridge.is_null() {
            return FfiErrorCode::NullArg;
        }
        let bridge = unsafe { &*bridge };
        settle_code(bridge.fetcher.host().resolve_response(call_id, response))
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Deliver the decoded body text for `call_id`. `text` holds `len` bytes of
/// UTF-8 (invalid sequences are replaced); it may be null when `len` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_resolve_text(
    bridge: *const FfiBridge,
    call_id: u64,
    text: *const u8,
    len: usize,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if bridge.is_null() || (text.is_null() && len > 0) {
            return FfiErrorCode::NullArg;
        }
        let bridge = unsafe { &*bridge };
        let text = if len == 0 {
            String::new()
        } else {
            String::from_utf8_lossy(unsafe { std::slice::from_raw_parts(text, len) }).into_owned()
        };
        settle_code(bridge.fetcher.host().resolve_text(call_id, text))
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Reject whichever stage `call_id` is waiting in. `message` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_reject(
    bridge: *const FfiBridge,
    call_id: u64,
    message: *const c_char,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if bridge.is_null() {
            return FfiErrorCode::NullArg;
        }
        let bridge = unsafe { &*bridge };
        let message = match unsafe { opt_str(message, "message") } {
            Ok(Some(message)) => message,
            Ok(None) => "rejected by host".to_string(),
            Err(msg) => msg,
        };
        settle_code(bridge.fetcher.host().reject(call_id, message))
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Drop `call_id` without settling it, for a host that will never answer
/// (for example while shutting down its event loop). The blocked fetch
/// returns `FfiErrorCode::Abandoned`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_abandon(bridge: *const FfiBridge, call_id: u64) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if bridge.is_null() {
            return FfiErrorCode::NullArg;
        }
        let bridge = unsafe { &*bridge };
        settle_code(bridge.fetcher.host().abandon(call_id))
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFetchResult` returned by `fetch_bridge_fetch`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.body.is_null() {
            let body = std::ptr::slice_from_raw_parts_mut(result.body, result.body_len);
            drop(unsafe { Box::from_raw(body) });
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_bridge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::{c_void, CStr};
    use std::sync::{mpsc, Mutex};
    use std::thread;

    /// How the simulated host settles calls.
    #[derive(Clone, Copy)]
    enum Behavior {
        /// Answer with the request body, or the URL when there is none.
        Echo,
        RejectFetch,
        RejectText,
        /// Settle each stage in the wrong order first, then correctly.
        WrongStageFirst,
        /// Never settle; drop the call instead.
        Abandon,
    }

    enum Job {
        Fetch { call_id: u64, url: String, config: String },
        Text { call_id: u64, response: u64 },
    }

    /// `user_data` of the simulated host: queues work for its loop thread.
    struct TestHost {
        jobs: Mutex<mpsc::Sender<Job>>,
        configs: Mutex<Vec<String>>,
    }

    extern "C" fn host_fetch(user_data: *mut c_void, call_id: u64, url: *const c_char, config_json: *const c_char) {
        let host = unsafe { &*(user_data as *const TestHost) };
        let url = unsafe { CStr::from_ptr(url) }.to_str().unwrap().to_string();
        let config = unsafe { CStr::from_ptr(config_json) }.to_str().unwrap().to_string();
        host.configs.lock().unwrap().push(config.clone());
        host.jobs.lock().unwrap().send(Job::Fetch { call_id, url, config }).unwrap();
    }

    extern "C" fn host_text(user_data: *mut c_void, call_id: u64, response: u64) {
        let host = unsafe { &*(user_data as *const TestHost) };
        host.jobs.lock().unwrap().send(Job::Text { call_id, response }).unwrap();
    }

    /// The host's event loop: settles every job through the public C API.
    fn run_loop(bridge: usize, jobs: mpsc::Receiver<Job>, behavior: Behavior) {
        let bridge = bridge as *const FfiBridge;
        let mut responses: HashMap<u64, String> = HashMap::new();
        let mut next_response = 100;
        for job in jobs {
            match (job, behavior) {
                (Job::Fetch { call_id, .. }, Behavior::Abandon) => {
                    assert_eq!(fetch_bridge_abandon(bridge, call_id), FfiErrorCode::Ok);
                }
                (Job::Fetch { call_id, .. }, Behavior::RejectFetch) => {
                    let msg = CString::new("connection refused").unwrap();
                    assert_eq!(fetch_bridge_reject(bridge, call_id, msg.as_ptr()), FfiErrorCode::Ok);
                }
                (Job::Fetch { call_id, url, config }, _) => {
                    if let Behavior::WrongStageFirst = behavior {
                        let early = b"early";
                        let code = fetch_bridge_resolve_text(bridge, call_id, early.as_ptr(), early.len());
                        assert_eq!(code, FfiErrorCode::WrongStage);
                    }
                    let config: serde_json::Value = serde_json::from_str(&config).unwrap();
                    let body = config["Body"].as_str().map(str::to_string).unwrap_or(url);
                    next_response += 1;
                    responses.insert(next_response, body);
                    assert_eq!(fetch_bridge_resolve_response(bridge, call_id, next_response), FfiErrorCode::Ok);
                }
                (Job::Text { call_id, .. }, Behavior::RejectText) => {
                    assert_eq!(fetch_bridge_reject(bridge, call_id, std::ptr::null()), FfiErrorCode::Ok);
                }
                (Job::Text { call_id, response }, _) => {
                    if let Behavior::WrongStageFirst = behavior {
                        assert_eq!(fetch_bridge_resolve_response(bridge, call_id, response), FfiErrorCode::WrongStage);
                    }
                    let body = responses.remove(&response).unwrap();
                    let code = fetch_bridge_resolve_text(bridge, call_id, body.as_ptr(), body.len());
                    assert_eq!(code, FfiErrorCode::Ok);
                }
            }
        }
    }

    struct Harness {
        bridge: *mut FfiBridge,
        host: *mut TestHost,
    }

    impl Harness {
        fn new(behavior: Behavior) -> Self {
            let (tx, rx) = mpsc::channel();
            let host = Box::into_raw(Box::new(TestHost {
                jobs: Mutex::new(tx),
                configs: Mutex::new(Vec::new()),
            }));
            let bridge = fetch_bridge_new(FfiHostVtable {
                user_data: host as *mut c_void,
                fetch: Some(host_fetch),
                text: Some(host_text),
            });
            assert!(!bridge.is_null());
            let addr = bridge as usize;
            thread::spawn(move || run_loop(addr, rx, behavior));
            Self { bridge, host }
        }

        fn configs(&self) -> Vec<String> {
            unsafe { &*self.host }.configs.lock().unwrap().clone()
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            fetch_bridge_free(self.bridge);
            // Dropping the sender ends the loop thread.
            drop(unsafe { Box::from_raw(self.host) });
        }
    }

    fn empty_options() -> FfiRequestOptions {
        FfiRequestOptions {
            method: std::ptr::null(),
            headers: std::ptr::null(),
            headers_len: 0,
            body: std::ptr::null(),
            body_len: 0,
            mode: std::ptr::null(),
            credentials: std::ptr::null(),
            cache: std::ptr::null(),
            redirect: std::ptr::null(),
            referrer: std::ptr::null(),
            referrer_policy: std::ptr::null(),
            integrity: std::ptr::null(),
            keep_alive: -1,
            has_signal: false,
        }
    }

    fn result_body(result: *mut FfiFetchResult) -> Vec<u8> {
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        if r.body.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(r.body, r.body_len) }.to_vec()
        }
    }

    #[test]
    fn new_without_host_functions_returns_null() {
        let bridge = fetch_bridge_new(FfiHostVtable {
            user_data: std::ptr::null_mut(),
            fetch: None,
            text: Some(host_text),
        });
        assert!(bridge.is_null());
    }

    #[test]
    fn free_null_bridge_is_safe() {
        fetch_bridge_free(std::ptr::null_mut());
    }

    #[test]
    fn post_json_is_echoed() {
        let harness = Harness::new(Behavior::Echo);
        let url = CString::new("/api/items").unwrap();
        let method = CString::new("POST").unwrap();
        let key = CString::new("Content-Type").unwrap();
        let value = CString::new("application/json").unwrap();
        let headers = [FfiHeader {
            key: key.as_ptr(),
            value: value.as_ptr(),
        }];
        let body = br#"{"one":"two"}"#;
        let options = FfiRequestOptions {
            method: method.as_ptr(),
            headers: headers.as_ptr(),
            headers_len: 1,
            body: body.as_ptr(),
            body_len: body.len(),
            ..empty_options()
        };

        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), &options);
        assert_eq!(result_body(result), body);
        fetch_bridge_free_result(result);

        let config: serde_json::Value = serde_json::from_str(&harness.configs()[0]).unwrap();
        assert_eq!(
            config,
            serde_json::json!({
                "Method": "POST",
                "Headers": {"Content-Type": "application/json"},
                "Body": r#"{"one":"two"}"#,
            })
        );
    }

    #[test]
    fn null_options_send_empty_config() {
        let harness = Harness::new(Behavior::Echo);
        let url = CString::new("/plain").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        assert_eq!(result_body(result), b"/plain");
        fetch_bridge_free_result(result);
        assert_eq!(harness.configs(), vec!["{}".to_string()]);
    }

    #[test]
    fn empty_body_comes_back_as_null_pointer() {
        let harness = Harness::new(Behavior::Echo);
        let url = CString::new("/empty").unwrap();
        let body: [u8; 0] = [];
        let options = FfiRequestOptions {
            body: body.as_ptr(),
            body_len: 0,
            ..empty_options()
        };
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), &options);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.body.is_null());
        assert_eq!(r.body_len, 0);
        fetch_bridge_free_result(result);
    }

    #[test]
    fn fetch_rejection_is_reported() {
        let harness = Harness::new(Behavior::RejectFetch);
        let url = CString::new("/down").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::FetchRejected);
        assert!(r.body.is_null());
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(msg, "fetch rejected: connection refused");
        fetch_bridge_free_result(result);
    }

    #[test]
    fn text_rejection_is_reported() {
        let harness = Harness::new(Behavior::RejectText);
        let url = CString::new("/binary").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::TextRejected);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(msg, "response text rejected: rejected by host");
        fetch_bridge_free_result(result);
    }

    #[test]
    fn wrong_stage_settles_are_refused_and_call_completes() {
        let harness = Harness::new(Behavior::WrongStageFirst);
        let url = CString::new("/ordered").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        assert_eq!(result_body(result), b"/ordered");
        fetch_bridge_free_result(result);
        assert_eq!(unsafe { &*harness.bridge }.fetcher.host().pending_calls(), 0);
    }

    #[test]
    fn abandoned_call_is_reported() {
        let harness = Harness::new(Behavior::Abandon);
        let url = CString::new("/never").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Abandoned);
        assert!(r.body.is_null());
        fetch_bridge_free_result(result);
        assert_eq!(fetch_bridge_abandon(harness.bridge, 9999), FfiErrorCode::UnknownCall);
        assert_eq!(fetch_bridge_abandon(std::ptr::null(), 1), FfiErrorCode::NullArg);
    }

    #[test]
    fn empty_url_is_reported() {
        let harness = Harness::new(Behavior::Echo);
        let url = CString::new("").unwrap();
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::EmptyUrl);
        fetch_bridge_free_result(result);
        assert!(harness.configs().is_empty());
    }

    #[test]
    fn null_arguments_are_reported() {
        let url = CString::new("/x").unwrap();
        let result = fetch_bridge_fetch(std::ptr::null(), url.as_ptr(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        fetch_bridge_free_result(result);

        let harness = Harness::new(Behavior::Echo);
        let result = fetch_bridge_fetch(harness.bridge, std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        fetch_bridge_free_result(result);
    }

    #[test]
    fn invalid_utf8_option_is_rejected_before_the_host() {
        let harness = Harness::new(Behavior::Echo);
        let url = CString::new("/x").unwrap();
        let method = CString::new(vec![0xff, 0xfe]).unwrap();
        let options = FfiRequestOptions {
            method: method.as_ptr(),
            ..empty_options()
        };
        let result = fetch_bridge_fetch(harness.bridge, url.as_ptr(), &options);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidArg);
        fetch_bridge_free_result(result);
        assert!(harness.configs().is_empty());
    }

    #[test]
    fn settling_unknown_calls_is_reported() {
        let harness = Harness::new(Behavior::Echo);
        assert_eq!(fetch_bridge_resolve_response(harness.bridge, 9999, 1), FfiErrorCode::UnknownCall);
        let text = b"late";
        assert_eq!(
            fetch_bridge_resolve_text(harness.bridge, 9999, text.as_ptr(), text.len()),
            FfiErrorCode::UnknownCall
        );
        assert_eq!(fetch_bridge_reject(harness.bridge, 9999, std::ptr::null()), FfiErrorCode::UnknownCall);
        assert_eq!(fetch_bridge_resolve_response(std::ptr::null(), 1, 1), FfiErrorCode::NullArg);
        assert_eq!(harness.configs().len(), 0);
    }

    #[test]
    fn concurrent_fetches_do_not_cross_talk() {
        let harness = Harness::new(Behavior::Echo);
        let addr = harness.bridge as usize;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                thread::spawn(move || {
                    let url = CString::new(format!("/items/{i}")).unwrap();
                    let result = fetch_bridge_fetch(addr as *const FfiBridge, url.as_ptr(), std::ptr::null());
                    let body = result_body(result);
                    fetch_bridge_free_result(result);
                    (i, body)
                })
            })
            .collect();

        for handle in handles {
            let (i, body) = handle.join().unwrap();
            assert_eq!(body, format!("/items/{i}").into_bytes());
        }
        assert_eq!(unsafe { &*harness.bridge }.fetcher.host().pending_calls(), 0);
    }

    #[test]
    fn map_options_renders_json() {
        let cache = CString::new("no-store").unwrap();
        let referrer = CString::new("https://example.com/").unwrap();
        let options = FfiRequestOptions {
            cache: cache.as_ptr(),
            referrer: referrer.as_ptr(),
            keep_alive: 1,
            has_signal: true,
            ..empty_options()
        };
        let json = fetch_bridge_map_options(&options);
        assert!(!json.is_null());
        let text = unsafe { CStr::from_ptr(json) }.to_str().unwrap();
        let config: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(
            config,
            serde_json::json!({
                "Cache": "no-store",
                "Referrer": "https://example.com/",
                "KeepAlive": true,
            })
        );
        fetch_bridge_free_string(json);
    }

    #[test]
    fn map_null_options_is_empty_object() {
        let json = fetch_bridge_map_options(std::ptr::null());
        assert_eq!(unsafe { CStr::from_ptr(json) }.to_str().unwrap(), "{}");
        fetch_bridge_free_string(json);
    }

    #[test]
    fn map_options_rejects_null_header_key() {
        let value = CString::new("v").unwrap();
        let headers = [FfiHeader {
            key: std::ptr::null(),
            value: value.as_ptr(),
        }];
        let options = FfiRequestOptions {
            headers: headers.as_ptr(),
            headers_len: 1,
            ..empty_options()
        };
        assert!(fetch_bridge_map_options(&options).is_null());
    }

    #[test]
    fn free_result_null_is_safe() {
        fetch_bridge_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        fetch_bridge_free_string(std::ptr::null_mut());
    }
}

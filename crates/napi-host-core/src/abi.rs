//! Raw Node-API types
//!
//! Names follow the C headers so extension code reads the same on both
//! sides of the boundary. Handles are opaque pointers; the host never
//! dereferences one it did not hand out itself.

#![allow(non_camel_case_types, non_upper_case_globals)]

use libc::{c_char, c_int, c_void};

use crate::status::Status;

macro_rules! opaque_handles {
    ($($handle:ident => $target:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $target {
                _private: [u8; 0],
            }

            pub type $handle = *mut $target;
        )*
    };
}

opaque_handles! {
    napi_env => napi_env__,
    napi_value => napi_value__,
    napi_ref => napi_ref__,
    napi_threadsafe_function => napi_threadsafe_function__,
    napi_async_work => napi_async_work__,
    napi_async_cleanup_hook_handle => napi_async_cleanup_hook_handle__,
    napi_module => napi_module__,
}

/// Env handle accepted by entry points that never run JavaScript.
pub type node_api_basic_env = napi_env;

/// Sentinel length meaning "NUL-terminated".
pub const NAPI_AUTO_LENGTH: usize = usize::MAX;

pub type napi_finalize =
    unsafe extern "C" fn(env: napi_env, finalize_data: *mut c_void, finalize_hint: *mut c_void);

pub type napi_async_execute_callback = unsafe extern "C" fn(env: napi_env, data: *mut c_void);

pub type napi_async_complete_callback =
    unsafe extern "C" fn(env: napi_env, status: Status, data: *mut c_void);

pub type napi_threadsafe_function_call_js = unsafe extern "C" fn(
    env: napi_env,
    js_callback: napi_value,
    context: *mut c_void,
    data: *mut c_void,
);

pub type napi_cleanup_hook = unsafe extern "C" fn(arg: *mut c_void);

pub type napi_async_cleanup_hook =
    unsafe extern "C" fn(handle: napi_async_cleanup_hook_handle, arg: *mut c_void);

pub type napi_fatal_error_fn = unsafe extern "C" fn(
    location: *const c_char,
    location_len: usize,
    message: *const c_char,
    message_len: usize,
);

pub type napi_module_register_fn = unsafe extern "C" fn(module: *mut napi_module);

/// `napi_threadsafe_function_call_mode` as it crosses the boundary
///
/// Kept as a plain integer: any value may arrive from C.
pub type napi_threadsafe_function_call_mode = c_int;

/// `napi_threadsafe_function_release_mode` as it crosses the boundary
pub type napi_threadsafe_function_release_mode = c_int;

pub const napi_tsfn_nonblocking: napi_threadsafe_function_call_mode = 0;
pub const napi_tsfn_blocking: napi_threadsafe_function_call_mode = 1;
pub const napi_tsfn_release: napi_threadsafe_function_release_mode = 0;
pub const napi_tsfn_abort: napi_threadsafe_function_release_mode = 1;

/// Decoded call mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Fail with `queue_full` when the queue is saturated
    NonBlocking = 0,
    /// Wait for queue space (or closing)
    Blocking = 1,
}

/// Decoded release mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Drop one acquisition
    Release = 0,
    /// Close immediately; pending and future calls fail with `closing`
    Abort = 1,
}

impl CallMode {
    /// Decode a raw mode; `None` for values outside the enumeration
    pub fn from_raw(raw: napi_threadsafe_function_call_mode) -> Option<Self> {
        match raw {
            napi_tsfn_nonblocking => Some(CallMode::NonBlocking),
            napi_tsfn_blocking => Some(CallMode::Blocking),
            _ => None,
        }
    }

    pub fn into_raw(self) -> napi_threadsafe_function_call_mode {
        match self {
            CallMode::NonBlocking => napi_tsfn_nonblocking,
            CallMode::Blocking => napi_tsfn_blocking,
        }
    }
}

impl ReleaseMode {
    /// Decode a raw mode; `None` for values outside the enumeration
    pub fn from_raw(raw: napi_threadsafe_function_release_mode) -> Option<Self> {
        match raw {
            napi_tsfn_release => Some(ReleaseMode::Release),
            napi_tsfn_abort => Some(ReleaseMode::Abort),
            _ => None,
        }
    }

    pub fn into_raw(self) -> napi_threadsafe_function_release_mode {
        match self {
            ReleaseMode::Release => napi_tsfn_release,
            ReleaseMode::Abort => napi_tsfn_abort,
        }
    }
}

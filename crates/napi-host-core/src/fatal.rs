//! Unrecoverable error path
//!
//! Node-API treats a broken environment as fatal: the process cannot
//! continue safely, so the only exit is to report and abort.

use std::borrow::Cow;
use std::ffi::CStr;

use libc::c_char;

use crate::abi::NAPI_AUTO_LENGTH;
use crate::weak;

/// Format a fatal error line
///
/// The location is omitted when empty.
pub fn format_fatal(location: &str, message: &str) -> String {
    if location.is_empty() {
        format!("Fatal Node-API error: {}", message)
    } else {
        format!("Fatal Node-API error: {} {}", location, message)
    }
}

/// Report `message` and abort the process
///
/// Routes through the injected host's `napi_fatal_error` when one is
/// present, so the engine can attach its own diagnostics.
pub fn fatal_error(location: &str, message: &str) -> ! {
    crate::log_error!("{}", format_fatal(location, message));

    if let Some(f) = weak::injected_host().napi_fatal_error {
        unsafe {
            f(
                location.as_ptr() as *const c_char,
                location.len(),
                message.as_ptr() as *const c_char,
                message.len(),
            );
        }
    } else {
        eprintln!("{}", format_fatal(location, message));
    }
    std::process::abort()
}

/// Read a (pointer, length) string as passed across the ABI
///
/// `NAPI_AUTO_LENGTH` means NUL-terminated; null reads as empty.
///
/// # Safety
///
/// `ptr` must be null or valid for `len` bytes (or up to its NUL when
/// `len` is `NAPI_AUTO_LENGTH`).
pub unsafe fn string_from_raw(ptr: *const c_char, len: usize) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let bytes: Cow<'_, [u8]> = if len == NAPI_AUTO_LENGTH {
        Cow::Borrowed(CStr::from_ptr(ptr).to_bytes())
    } else {
        Cow::Borrowed(std::slice::from_raw_parts(ptr as *const u8, len))
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fatal() {
        assert_eq!(
            format_fatal("tsfn.rs:42", "reference failed"),
            "Fatal Node-API error: tsfn.rs:42 reference failed"
        );
        assert_eq!(format_fatal("", "boom"), "Fatal Node-API error: boom");
    }

    #[test]
    fn test_string_from_raw() {
        let text = b"location\0";
        let auto = unsafe { string_from_raw(text.as_ptr() as *const c_char, NAPI_AUTO_LENGTH) };
        assert_eq!(auto, "location");

        let sized = unsafe { string_from_raw(text.as_ptr() as *const c_char, 3) };
        assert_eq!(sized, "loc");

        let null = unsafe { string_from_raw(core::ptr::null(), 5) };
        assert!(null.is_empty());
    }
}

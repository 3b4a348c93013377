//! MultiHost
//!
//! Owns the wrapped envs it hands out. Dropping a `MultiHost` erases them
//! along with every function and hook handle created through them; stale
//! handles then resolve to `invalid_arg`.

use std::fmt;
use std::sync::Arc;

use libc::c_char;
use napi_host_core::abi::{napi_env, napi_fatal_error_fn, napi_module, napi_module_register_fn};
use napi_host_core::fatal::{format_fatal, string_from_raw};
use napi_host_core::{log_debug, log_error, HandleId, HostTable};
use parking_lot::Mutex;

use crate::forward;
use crate::wrapped::{erase_env, wrap_env};

unsafe extern "C" fn default_module_register(_module: *mut napi_module) {
    log_error!("napi_module_register is not implemented for this MultiHost");
    eprintln!("napi_module_register is not implemented for this MultiHost");
    std::process::abort();
}

unsafe extern "C" fn default_fatal_error(
    location: *const c_char,
    location_len: usize,
    message: *const c_char,
    message_len: usize,
) {
    let location = string_from_raw(location, location_len);
    let message = string_from_raw(message, message_len);
    let line = format_fatal(&location, &message);
    log_error!("{}", line);
    eprintln!("{}", line);
    std::process::abort();
}

/// Routes Node-API calls to one of several hosts
///
/// ```
/// use std::sync::Arc;
/// use napi_host_core::abi::napi_env;
/// use napi_multihost::{HostTable, MultiHost};
///
/// let multi = MultiHost::new(None, None);
/// let host = Arc::new(HostTable::default());
/// let env = multi.wrap(0x10usize as napi_env, &host);
/// assert!(!env.is_null());
/// assert_eq!(multi.env_count(), 1);
/// ```
pub struct MultiHost {
    table: HostTable,
    envs: Mutex<Vec<HandleId>>,
}

impl MultiHost {
    /// Create a multiplexer
    ///
    /// `module_register` and `fatal_error` are process-wide and are not
    /// routed per host. When `None`, module registration aborts and fatal
    /// errors print and abort.
    pub fn new(
        module_register: Option<napi_module_register_fn>,
        fatal_error: Option<napi_fatal_error_fn>,
    ) -> Self {
        let table = HostTable {
            napi_create_object: Some(forward::napi_create_object),
            napi_get_undefined: Some(forward::napi_get_undefined),
            napi_get_global: Some(forward::napi_get_global),
            napi_call_function: Some(forward::napi_call_function),
            napi_create_reference: Some(forward::napi_create_reference),
            napi_delete_reference: Some(forward::napi_delete_reference),
            napi_get_reference_value: Some(forward::napi_get_reference_value),
            napi_add_env_cleanup_hook: Some(forward::napi_add_env_cleanup_hook),
            napi_remove_env_cleanup_hook: Some(forward::napi_remove_env_cleanup_hook),
            napi_add_async_cleanup_hook: Some(forward::napi_add_async_cleanup_hook),
            napi_remove_async_cleanup_hook: Some(forward::napi_remove_async_cleanup_hook),
            napi_create_async_work: Some(forward::napi_create_async_work),
            napi_delete_async_work: Some(forward::napi_delete_async_work),
            napi_queue_async_work: Some(forward::napi_queue_async_work),
            napi_cancel_async_work: Some(forward::napi_cancel_async_work),
            napi_create_threadsafe_function: Some(forward::napi_create_threadsafe_function),
            napi_get_threadsafe_function_context: Some(
                forward::napi_get_threadsafe_function_context,
            ),
            napi_call_threadsafe_function: Some(forward::napi_call_threadsafe_function),
            napi_acquire_threadsafe_function: Some(forward::napi_acquire_threadsafe_function),
            napi_release_threadsafe_function: Some(forward::napi_release_threadsafe_function),
            napi_ref_threadsafe_function: Some(forward::napi_ref_threadsafe_function),
            napi_unref_threadsafe_function: Some(forward::napi_unref_threadsafe_function),
            napi_module_register: Some(module_register.unwrap_or(default_module_register)),
            napi_fatal_error: Some(fatal_error.unwrap_or(default_fatal_error)),
        };
        Self {
            table,
            envs: Mutex::new(Vec::new()),
        }
    }

    /// Wrap `env` so calls made with the result reach `host`
    ///
    /// Only a weak reference to `host` is kept; once the last strong
    /// reference is dropped, calls through the wrapped env fail with
    /// `generic_failure`.
    pub fn wrap(&self, env: napi_env, host: &Arc<HostTable>) -> napi_env {
        let id = wrap_env(env, host);
        self.envs.lock().push(id);
        log_debug!("wrapped env {:p} as {}", env, id);
        id.into_raw()
    }

    /// Forwarding table to inject
    pub fn table(&self) -> HostTable {
        self.table
    }

    /// Number of envs wrapped by this multiplexer
    pub fn env_count(&self) -> usize {
        self.envs.lock().len()
    }
}

impl Drop for MultiHost {
    fn drop(&mut self) {
        for id in self.envs.get_mut().drain(..) {
            erase_env(id);
        }
    }
}

impl fmt::Debug for MultiHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiHost")
            .field("envs", &self.env_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete() {
        let multi = MultiHost::new(None, None);
        assert_eq!(multi.table().provided(), HostTable::ENTRIES);
        assert!(multi.table().missing().is_empty());
    }

    #[test]
    fn test_drop_erases_envs() {
        let before = crate::live_envs();
        let host = Arc::new(HostTable::default());
        {
            let multi = MultiHost::new(None, None);
            multi.wrap(0x1 as napi_env, &host);
            multi.wrap(0x2 as napi_env, &host);
            assert_eq!(multi.env_count(), 2);
            assert!(crate::live_envs() >= before + 2);
        }
        assert_eq!(crate::live_envs(), before);
    }
}

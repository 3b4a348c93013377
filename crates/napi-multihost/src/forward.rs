//! Forwarding entry points
//!
//! Each entry unwraps its handle argument, upgrades the owning host and
//! calls the host's own entry with the raw handle. Handles the host hands
//! back (threadsafe functions, cleanup hook handles) are wrapped before the
//! caller sees them.

use libc::c_void;
use napi_host_core::abi::*;
use napi_host_core::{log_error, HandleId, Status};

use crate::wrapped::{
    bind_function, erase_function, erase_hook, reserve_function, resolve_env, resolve_function,
    resolve_hook, wrap_hook,
};

fn missing(name: &str) -> Status {
    log_error!("Node-API function '{}' is not provided by the host", name);
    Status::GenericFailure
}

macro_rules! try_status {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(status) => return status,
        }
    };
}

/// Entries whose first argument is an env
macro_rules! env_forwarders {
    ($($name:ident($env:ident: $env_ty:ty $(, $arg:ident: $ty:ty)*);)*) => {
        $(
            pub(crate) unsafe extern "C" fn $name($env: $env_ty $(, $arg: $ty)*) -> Status {
                let (raw, host) = try_status!(resolve_env($env, stringify!($name)));
                match host.$name {
                    Some(f) => f(raw $(, $arg)*),
                    None => missing(stringify!($name)),
                }
            }
        )*
    };
}

/// Entries whose first argument is a threadsafe function
macro_rules! function_forwarders {
    ($($name:ident($func:ident: napi_threadsafe_function $(, $arg:ident: $ty:ty)*);)*) => {
        $(
            pub(crate) unsafe extern "C" fn $name(
                $func: napi_threadsafe_function $(, $arg: $ty)*
            ) -> Status {
                let (raw, host) = try_status!(resolve_function($func, stringify!($name)));
                match host.$name {
                    Some(f) => f(raw $(, $arg)*),
                    None => missing(stringify!($name)),
                }
            }
        )*
    };
}

/// Entries taking both an env and a threadsafe function
macro_rules! env_function_forwarders {
    ($($name:ident;)*) => {
        $(
            pub(crate) unsafe extern "C" fn $name(
                env: node_api_basic_env,
                func: napi_threadsafe_function,
            ) -> Status {
                let (raw_env, host) = try_status!(resolve_env(env, stringify!($name)));
                let (raw_func, _) = try_status!(resolve_function(func, stringify!($name)));
                match host.$name {
                    Some(f) => f(raw_env, raw_func),
                    None => missing(stringify!($name)),
                }
            }
        )*
    };
}

env_forwarders! {
    napi_create_object(env: napi_env, result: *mut napi_value);
    napi_get_undefined(env: napi_env, result: *mut napi_value);
    napi_get_global(env: napi_env, result: *mut napi_value);
    napi_call_function(
        env: napi_env,
        recv: napi_value,
        func: napi_value,
        argc: usize,
        argv: *const napi_value,
        result: *mut napi_value
    );
    napi_create_reference(
        env: napi_env,
        value: napi_value,
        initial_refcount: u32,
        result: *mut napi_ref
    );
    napi_delete_reference(env: napi_env, reference: napi_ref);
    napi_get_reference_value(env: napi_env, reference: napi_ref, result: *mut napi_value);
    napi_add_env_cleanup_hook(
        env: node_api_basic_env,
        fun: Option<napi_cleanup_hook>,
        arg: *mut c_void
    );
    napi_remove_env_cleanup_hook(
        env: node_api_basic_env,
        fun: Option<napi_cleanup_hook>,
        arg: *mut c_void
    );
    napi_create_async_work(
        env: napi_env,
        async_resource: napi_value,
        async_resource_name: napi_value,
        execute: Option<napi_async_execute_callback>,
        complete: Option<napi_async_complete_callback>,
        data: *mut c_void,
        result: *mut napi_async_work
    );
    napi_delete_async_work(env: node_api_basic_env, work: napi_async_work);
    napi_queue_async_work(env: node_api_basic_env, work: napi_async_work);
    napi_cancel_async_work(env: node_api_basic_env, work: napi_async_work);
}

function_forwarders! {
    napi_get_threadsafe_function_context(func: napi_threadsafe_function, result: *mut *mut c_void);
    napi_call_threadsafe_function(
        func: napi_threadsafe_function,
        data: *mut c_void,
        is_blocking: napi_threadsafe_function_call_mode
    );
    napi_acquire_threadsafe_function(func: napi_threadsafe_function);
    napi_release_threadsafe_function(func: napi_threadsafe_function, mode: napi_threadsafe_function_release_mode);
}

env_function_forwarders! {
    napi_ref_threadsafe_function;
    napi_unref_threadsafe_function;
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe extern "C" fn napi_create_threadsafe_function(
    env: napi_env,
    func: napi_value,
    async_resource: napi_value,
    async_resource_name: napi_value,
    max_queue_size: usize,
    initial_thread_count: usize,
    thread_finalize_data: *mut c_void,
    thread_finalize_cb: Option<napi_finalize>,
    context: *mut c_void,
    call_js_cb: Option<napi_threadsafe_function_call_js>,
    result: *mut napi_threadsafe_function,
) -> Status {
    if result.is_null() {
        return Status::InvalidArg;
    }
    let (raw, host) = try_status!(resolve_env(env, "napi_create_threadsafe_function"));
    let Some(f) = host.napi_create_threadsafe_function else {
        return missing("napi_create_threadsafe_function");
    };
    let id = try_status!(reserve_function(env, "napi_create_threadsafe_function"));
    let finalizer = Box::into_raw(Box::new(FunctionFinalizer {
        function: id,
        finalize_cb: thread_finalize_cb,
        finalize_data: thread_finalize_data,
    }));
    let status = f(
        raw,
        func,
        async_resource,
        async_resource_name,
        max_queue_size,
        initial_thread_count,
        finalizer as *mut c_void,
        Some(finalize_function),
        context,
        call_js_cb,
        result,
    );
    if status.is_ok() {
        *result = bind_function(id, *result);
    } else {
        drop(Box::from_raw(finalizer));
        erase_function(id);
    }
    status
}

/// Stands in for the extension's finalizer so the wrapped entry goes away
/// with the host's function
struct FunctionFinalizer {
    function: HandleId,
    finalize_cb: Option<napi_finalize>,
    finalize_data: *mut c_void,
}

unsafe extern "C" fn finalize_function(env: napi_env, data: *mut c_void, hint: *mut c_void) {
    let finalizer = Box::from_raw(data as *mut FunctionFinalizer);
    if let Some(finalize) = finalizer.finalize_cb {
        finalize(env, finalizer.finalize_data, hint);
    }
    erase_function(finalizer.function);
}

pub(crate) unsafe extern "C" fn napi_add_async_cleanup_hook(
    env: node_api_basic_env,
    hook: Option<napi_async_cleanup_hook>,
    arg: *mut c_void,
    remove_handle: *mut napi_async_cleanup_hook_handle,
) -> Status {
    let (raw, host) = try_status!(resolve_env(env, "napi_add_async_cleanup_hook"));
    let Some(f) = host.napi_add_async_cleanup_hook else {
        return missing("napi_add_async_cleanup_hook");
    };
    let status = f(raw, hook, arg, remove_handle);
    if status.is_ok() && !remove_handle.is_null() {
        *remove_handle = wrap_hook(env, *remove_handle);
    }
    status
}

pub(crate) unsafe extern "C" fn napi_remove_async_cleanup_hook(
    remove_handle: napi_async_cleanup_hook_handle,
) -> Status {
    let (raw, host) = try_status!(resolve_hook(remove_handle, "napi_remove_async_cleanup_hook"));
    let Some(f) = host.napi_remove_async_cleanup_hook else {
        return missing("napi_remove_async_cleanup_hook");
    };
    let status = f(raw);
    if status.is_ok() {
        erase_hook(remove_handle);
    }
    status
}

//! Node-API entry points
//!
//! Same names, signatures and status codes as the reference ABI, so
//! unmodified extension code can call them. Handles are ids; a handle that
//! does not resolve is `invalid_arg`.

use libc::c_void;
use napi_host_core::abi::*;
use napi_host_core::{log_debug, CallMode, HandleId, HostTable, ReleaseMode, Status};

use crate::async_work;
use crate::environment;
use crate::tsfn::{ThreadSafeFunction, TsfnOptions};

pub unsafe extern "C" fn napi_create_async_work(
    env: napi_env,
    _async_resource: napi_value,
    _async_resource_name: napi_value,
    execute: Option<napi_async_execute_callback>,
    complete: Option<napi_async_complete_callback>,
    data: *mut c_void,
    result: *mut napi_async_work,
) -> Status {
    let (Some(execute), Some(complete)) = (execute, complete) else {
        return Status::InvalidArg;
    };
    if result.is_null() {
        return Status::InvalidArg;
    }
    let id = async_work::create(env, execute, complete, data);
    *result = id.into_raw();
    Status::Ok
}

pub unsafe extern "C" fn napi_delete_async_work(
    _env: node_api_basic_env,
    work: napi_async_work,
) -> Status {
    Status::from_result(async_work::delete(HandleId::from_raw(work)))
}

pub unsafe extern "C" fn napi_queue_async_work(
    env: node_api_basic_env,
    work: napi_async_work,
) -> Status {
    Status::from_result(async_work::queue(env, HandleId::from_raw(work)))
}

pub unsafe extern "C" fn napi_cancel_async_work(
    _env: node_api_basic_env,
    work: napi_async_work,
) -> Status {
    Status::from_result(async_work::cancel(HandleId::from_raw(work)))
}

#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn napi_create_threadsafe_function(
    env: napi_env,
    func: napi_value,
    _async_resource: napi_value,
    _async_resource_name: napi_value,
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
    if func.is_null() && call_js_cb.is_none() {
        log_debug!("napi_create_threadsafe_function: neither func nor call_js_cb given");
        return Status::InvalidArg;
    }

    let mut options = TsfnOptions::new(env)
        .func(func)
        .max_queue_size(max_queue_size)
        .initial_thread_count(initial_thread_count)
        .context(context);
    options.finalize_cb = thread_finalize_cb;
    options.finalize_data = thread_finalize_data;
    options.call_js_cb = call_js_cb;

    let function = ThreadSafeFunction::create(environment::call_invoker_weak(env), options);
    *result = function.handle();
    Status::Ok
}

pub unsafe extern "C" fn napi_get_threadsafe_function_context(
    func: napi_threadsafe_function,
    result: *mut *mut c_void,
) -> Status {
    if result.is_null() {
        return Status::InvalidArg;
    }
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => {
            *result = function.context();
            Status::Ok
        }
        None => Status::InvalidArg,
    }
}

pub unsafe extern "C" fn napi_call_threadsafe_function(
    func: napi_threadsafe_function,
    data: *mut c_void,
    is_blocking: napi_threadsafe_function_call_mode,
) -> Status {
    let Some(mode) = CallMode::from_raw(is_blocking) else {
        return Status::InvalidArg;
    };
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => Status::from_result(function.call(data, mode)),
        None => Status::InvalidArg,
    }
}

pub unsafe extern "C" fn napi_acquire_threadsafe_function(func: napi_threadsafe_function) -> Status {
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => Status::from_result(function.acquire()),
        None => Status::InvalidArg,
    }
}

pub unsafe extern "C" fn napi_release_threadsafe_function(
    func: napi_threadsafe_function,
    mode: napi_threadsafe_function_release_mode,
) -> Status {
    let Some(mode) = ReleaseMode::from_raw(mode) else {
        return Status::InvalidArg;
    };
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => Status::from_result(function.release(mode)),
        None => Status::InvalidArg,
    }
}

pub unsafe extern "C" fn napi_ref_threadsafe_function(
    _env: node_api_basic_env,
    func: napi_threadsafe_function,
) -> Status {
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => {
            function.ref_();
            Status::Ok
        }
        None => Status::InvalidArg,
    }
}

pub unsafe extern "C" fn napi_unref_threadsafe_function(
    _env: node_api_basic_env,
    func: napi_threadsafe_function,
) -> Status {
    match ThreadSafeFunction::from_handle(func) {
        Some(function) => {
            function.unref();
            Status::Ok
        }
        None => Status::InvalidArg,
    }
}

/// Table carrying the runtime's async-work and threadsafe-function entries
///
/// Overlay it on an engine table before injecting:
///
/// ```ignore
/// napi_host_core::inject_host(engine_table.overlay(&runtime_table()));
/// ```
pub fn runtime_table() -> HostTable {
    HostTable {
        napi_create_async_work: Some(napi_create_async_work),
        napi_delete_async_work: Some(napi_delete_async_work),
        napi_queue_async_work: Some(napi_queue_async_work),
        napi_cancel_async_work: Some(napi_cancel_async_work),
        napi_create_threadsafe_function: Some(napi_create_threadsafe_function),
        napi_get_threadsafe_function_context: Some(napi_get_threadsafe_function_context),
        napi_call_threadsafe_function: Some(napi_call_threadsafe_function),
        napi_acquire_threadsafe_function: Some(napi_acquire_threadsafe_function),
        napi_release_threadsafe_function: Some(napi_release_threadsafe_function),
        napi_ref_threadsafe_function: Some(napi_ref_threadsafe_function),
        napi_unref_threadsafe_function: Some(napi_unref_threadsafe_function),
        ..HostTable::default()
    }
}

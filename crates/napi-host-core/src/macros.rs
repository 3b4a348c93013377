//! Entry point list
//!
//! Every status-returning Node-API function the host routes, with its
//! exact C signature. Other modules pass a callback macro that receives the
//! whole list and generates table fields, forwarders or wrappers from it.

macro_rules! node_api_functions {
    ($callback:ident) => {
        $callback! {
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
            napi_add_async_cleanup_hook(
                env: node_api_basic_env,
                hook: Option<napi_async_cleanup_hook>,
                arg: *mut c_void,
                remove_handle: *mut napi_async_cleanup_hook_handle
            );
            napi_remove_async_cleanup_hook(remove_handle: napi_async_cleanup_hook_handle);
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
            napi_create_threadsafe_function(
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
                result: *mut napi_threadsafe_function
            );
            napi_get_threadsafe_function_context(
                func: napi_threadsafe_function,
                result: *mut *mut c_void
            );
            napi_call_threadsafe_function(
                func: napi_threadsafe_function,
                data: *mut c_void,
                is_blocking: napi_threadsafe_function_call_mode
            );
            napi_acquire_threadsafe_function(func: napi_threadsafe_function);
            napi_release_threadsafe_function(func: napi_threadsafe_function, mode: napi_threadsafe_function_release_mode);
            napi_ref_threadsafe_function(env: node_api_basic_env, func: napi_threadsafe_function);
            napi_unref_threadsafe_function(env: node_api_basic_env, func: napi_threadsafe_function);
        }
    };
}

/// Number of status-returning entries in `node_api_functions!`
macro_rules! count_entries {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_entries!($($tail)*) };
}

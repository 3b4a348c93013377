//! Calls made through wrapped handles reach the right host

use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use libc::c_void;
use napi_host_core::abi::*;
use napi_host_core::{inject_host, weak, HostTable, Status};
use napi_multihost::MultiHost;

static FOO_CALLS: AtomicUsize = AtomicUsize::new(0);
static BAR_CALLS: AtomicUsize = AtomicUsize::new(0);
static RESET_CALLS: AtomicUsize = AtomicUsize::new(0);
static TSFN_CALLS: AtomicUsize = AtomicUsize::new(0);
static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);
static INJECTED_CALLS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn foo_create_object(_env: napi_env, _result: *mut napi_value) -> Status {
    FOO_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

unsafe extern "C" fn bar_create_object(_env: napi_env, _result: *mut napi_value) -> Status {
    BAR_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

unsafe extern "C" fn reset_create_object(_env: napi_env, _result: *mut napi_value) -> Status {
    RESET_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

unsafe extern "C" fn injected_create_object(env: napi_env, _result: *mut napi_value) -> Status {
    // The host sees its own raw env, never the wrapped one
    assert_eq!(env as usize, 0xABC);
    INJECTED_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn create_threadsafe_function(
    _env: napi_env,
    _func: napi_value,
    _async_resource: napi_value,
    _async_resource_name: napi_value,
    _max_queue_size: usize,
    _initial_thread_count: usize,
    _thread_finalize_data: *mut c_void,
    _thread_finalize_cb: Option<napi_finalize>,
    _context: *mut c_void,
    _call_js_cb: Option<napi_threadsafe_function_call_js>,
    result: *mut napi_threadsafe_function,
) -> Status {
    TSFN_CALLS.fetch_add(1, Ordering::SeqCst);
    *result = 0x7777 as napi_threadsafe_function;
    Status::Ok
}

unsafe extern "C" fn release_threadsafe_function(
    func: napi_threadsafe_function,
    _mode: napi_threadsafe_function_release_mode,
) -> Status {
    assert_eq!(func as usize, 0x7777);
    TSFN_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

unsafe extern "C" fn add_async_cleanup_hook(
    _env: node_api_basic_env,
    _hook: Option<napi_async_cleanup_hook>,
    _arg: *mut c_void,
    remove_handle: *mut napi_async_cleanup_hook_handle,
) -> Status {
    HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    *remove_handle = 0x8888 as napi_async_cleanup_hook_handle;
    Status::Ok
}

unsafe extern "C" fn remove_async_cleanup_hook(remove_handle: napi_async_cleanup_hook_handle) -> Status {
    assert_eq!(remove_handle as usize, 0x8888);
    HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    Status::Ok
}

fn create_object(table: &HostTable, env: napi_env) -> Status {
    let mut result: napi_value = ptr::null_mut();
    unsafe { table.napi_create_object.unwrap()(env, &mut result) }
}

#[test]
fn test_is_injectable() {
    let multi = MultiHost::new(None, None);
    inject_host(multi.table());

    let host = Arc::new(HostTable {
        napi_create_object: Some(injected_create_object),
        ..HostTable::default()
    });
    let env = multi.wrap(0xABC as napi_env, &host);

    let mut result: napi_value = ptr::null_mut();
    assert_eq!(unsafe { weak::napi_create_object(env, &mut result) }, Status::Ok);
    assert_eq!(INJECTED_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_propagates_to_the_right_host() {
    let foo = Arc::new(HostTable {
        napi_create_object: Some(foo_create_object),
        ..HostTable::default()
    });
    let bar = Arc::new(HostTable {
        napi_create_object: Some(bar_create_object),
        ..HostTable::default()
    });

    let multi = MultiHost::new(None, None);
    let table = multi.table();
    let foo_env = multi.wrap(ptr::null_mut(), &foo);
    let bar_env = multi.wrap(ptr::null_mut(), &bar);
    assert_ne!(foo_env, bar_env);

    assert_eq!(FOO_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(BAR_CALLS.load(Ordering::SeqCst), 0);

    assert_eq!(create_object(&table, foo_env), Status::Ok);
    assert_eq!(FOO_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(BAR_CALLS.load(Ordering::SeqCst), 0);

    assert_eq!(create_object(&table, bar_env), Status::Ok);
    assert_eq!(FOO_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(BAR_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dropped_host_fails_without_touching_others() {
    let host = Arc::new(HostTable {
        napi_create_object: Some(reset_create_object),
        ..HostTable::default()
    });
    let other = Arc::new(HostTable {
        napi_create_object: Some(reset_create_object),
        ..HostTable::default()
    });

    let multi = MultiHost::new(None, None);
    let table = multi.table();
    let env = multi.wrap(ptr::null_mut(), &host);
    let other_env = multi.wrap(ptr::null_mut(), &other);

    assert_eq!(create_object(&table, env), Status::Ok);
    assert_eq!(RESET_CALLS.load(Ordering::SeqCst), 1);

    drop(host);
    assert_eq!(create_object(&table, env), Status::GenericFailure);
    assert_eq!(RESET_CALLS.load(Ordering::SeqCst), 1);

    assert_eq!(create_object(&table, other_env), Status::Ok);
    assert_eq!(RESET_CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_wraps_threadsafe_functions() {
    let host = Arc::new(HostTable {
        napi_create_threadsafe_function: Some(create_threadsafe_function),
        napi_release_threadsafe_function: Some(release_threadsafe_function),
        ..HostTable::default()
    });

    let multi = MultiHost::new(None, None);
    let table = multi.table();
    let env = multi.wrap(ptr::null_mut(), &host);
    let before = napi_multihost::live_functions();

    let mut tsfn: napi_threadsafe_function = ptr::null_mut();
    let status = unsafe {
        table.napi_create_threadsafe_function.unwrap()(
            env,
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            0,
            1,
            ptr::null_mut(),
            None,
            ptr::null_mut(),
            None,
            &mut tsfn,
        )
    };
    assert_eq!(status, Status::Ok);
    assert_eq!(TSFN_CALLS.load(Ordering::SeqCst), 1);
    assert_ne!(tsfn as usize, 0x7777, "caller must see the wrapped handle");
    assert!(napi_multihost::live_functions() > before);

    let status = unsafe { table.napi_release_threadsafe_function.unwrap()(tsfn, napi_tsfn_release) };
    assert_eq!(status, Status::Ok);
    assert_eq!(TSFN_CALLS.load(Ordering::SeqCst), 2);

    // Entries the host leaves out fail without reaching it
    let status = unsafe { table.napi_acquire_threadsafe_function.unwrap()(tsfn) };
    assert_eq!(status, Status::GenericFailure);

    drop(multi);
    let status = unsafe { table.napi_release_threadsafe_function.unwrap()(tsfn, napi_tsfn_release) };
    assert_eq!(status, Status::InvalidArg);
    assert_eq!(TSFN_CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_wraps_async_cleanup_hooks() {
    let host = Arc::new(HostTable {
        napi_add_async_cleanup_hook: Some(add_async_cleanup_hook),
        napi_remove_async_cleanup_hook: Some(remove_async_cleanup_hook),
        ..HostTable::default()
    });

    let multi = MultiHost::new(None, None);
    let table = multi.table();
    let env = multi.wrap(ptr::null_mut(), &host);

    let mut handle: napi_async_cleanup_hook_handle = ptr::null_mut();
    let status = unsafe {
        table.napi_add_async_cleanup_hook.unwrap()(env, None, ptr::null_mut(), &mut handle)
    };
    assert_eq!(status, Status::Ok);
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 1);
    assert_ne!(handle as usize, 0x8888);

    let status = unsafe { table.napi_remove_async_cleanup_hook.unwrap()(handle) };
    assert_eq!(status, Status::Ok);
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 2);

    // The wrapper is gone once the hook is removed
    let status = unsafe { table.napi_remove_async_cleanup_hook.unwrap()(handle) };
    assert_eq!(status, Status::InvalidArg);
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unknown_and_stale_envs() {
    let host = Arc::new(HostTable::default());
    let multi = MultiHost::new(None, None);
    let table = multi.table();

    assert_eq!(create_object(&table, 0xDEAD_BEEF as napi_env), Status::InvalidArg);

    let env = multi.wrap(ptr::null_mut(), &host);
    // Present host, missing entry
    assert_eq!(create_object(&table, env), Status::GenericFailure);

    drop(multi);
    assert_eq!(create_object(&table, env), Status::InvalidArg);
}

//! Wrapped handles
//!
//! A wrapped handle is an id in one of three process-wide registries. The
//! entry keeps the host's raw handle and a weak reference to the host's
//! table; resolving checks both.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{Arc, Weak};

use napi_host_core::abi::{
    napi_async_cleanup_hook_handle, napi_async_cleanup_hook_handle__, napi_env, napi_env__,
    napi_threadsafe_function, napi_threadsafe_function__,
};
use napi_host_core::{log_error, HandleId, HandleRegistry, HostTable, SendPtr, Status};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

static ENVS: Lazy<HandleRegistry<WrappedEnv>> = Lazy::new(HandleRegistry::new);
static FUNCTIONS: Lazy<HandleRegistry<WrappedThreadsafeFunction>> =
    Lazy::new(HandleRegistry::new);
static HOOKS: Lazy<HandleRegistry<WrappedCleanupHook>> = Lazy::new(HandleRegistry::new);

pub(crate) struct WrappedEnv {
    raw: SendPtr<napi_env__>,
    host: Weak<HostTable>,
    functions: Mutex<Vec<HandleId>>,
    hooks: Mutex<Vec<HandleId>>,
}

pub(crate) struct WrappedThreadsafeFunction {
    /// Null until the host has created the function
    raw: AtomicPtr<napi_threadsafe_function__>,
    env: HandleId,
    host: Weak<HostTable>,
}

pub(crate) struct WrappedCleanupHook {
    raw: SendPtr<napi_async_cleanup_hook_handle__>,
    env: HandleId,
    host: Weak<HostTable>,
}

/// Number of wrapped envs alive in the process
pub fn live_envs() -> usize {
    ENVS.len()
}

/// Number of wrapped threadsafe functions alive in the process
pub fn live_functions() -> usize {
    FUNCTIONS.len()
}

/// Number of wrapped async cleanup hook handles alive in the process
pub fn live_hooks() -> usize {
    HOOKS.len()
}

fn upgrade(host: &Weak<HostTable>, name: &str) -> Result<Arc<HostTable>, Status> {
    host.upgrade().ok_or_else(|| {
        log_error!("Node-API function '{}' called after host was destroyed", name);
        Status::GenericFailure
    })
}

pub(crate) fn wrap_env(raw: napi_env, host: &Arc<HostTable>) -> HandleId {
    let (id, _) = ENVS.insert(WrappedEnv {
        raw: SendPtr::new(raw),
        host: Arc::downgrade(host),
        functions: Mutex::new(Vec::new()),
        hooks: Mutex::new(Vec::new()),
    });
    id
}

/// Erase a wrapped env and every handle created through it
pub(crate) fn erase_env(id: HandleId) {
    if let Some(env) = ENVS.remove(id) {
        for function in env.functions.lock().drain(..) {
            FUNCTIONS.remove(function);
        }
        for hook in env.hooks.lock().drain(..) {
            HOOKS.remove(hook);
        }
    }
}

/// Raw env and live host behind a wrapped env
pub(crate) fn resolve_env(env: napi_env, name: &str) -> Result<(napi_env, Arc<HostTable>), Status> {
    let id = HandleId::from_raw(env);
    let wrapped = ENVS.get(id).ok_or_else(|| {
        log_error!("Node-API function '{}' called with an unknown env {:p}", name, env);
        Status::InvalidArg
    })?;
    let host = upgrade(&wrapped.host, name)?;
    Ok((wrapped.raw.get(), host))
}

/// Reserve a wrapped threadsafe function under the wrapped env `env`
///
/// The id exists before the host creates the function, so the host's
/// finalizer can name it. [`bind_function`] fills in the raw handle.
pub(crate) fn reserve_function(env: napi_env, name: &str) -> Result<HandleId, Status> {
    let env_id = HandleId::from_raw(env);
    let wrapped_env = ENVS.get(env_id).ok_or_else(|| {
        log_error!("Node-API function '{}' called with an unknown env {:p}", name, env);
        Status::InvalidArg
    })?;
    let (id, _) = FUNCTIONS.insert(WrappedThreadsafeFunction {
        raw: AtomicPtr::new(ptr::null_mut()),
        env: env_id,
        host: wrapped_env.host.clone(),
    });
    wrapped_env.functions.lock().push(id);
    Ok(id)
}

/// Attach the host's raw handle to a reserved function; returns the
/// wrapped handle
pub(crate) fn bind_function(id: HandleId, raw: napi_threadsafe_function) -> napi_threadsafe_function {
    if let Some(wrapped) = FUNCTIONS.get(id) {
        wrapped.raw.store(raw, Ordering::Release);
    }
    id.into_raw()
}

/// Forget a wrapped threadsafe function once the host finalized it
pub(crate) fn erase_function(id: HandleId) {
    if let Some(function) = FUNCTIONS.remove(id) {
        if let Some(env) = ENVS.get(function.env) {
            env.functions.lock().retain(|f| *f != id);
        }
    }
}

/// Raw function and live host behind a wrapped threadsafe function
pub(crate) fn resolve_function(
    func: napi_threadsafe_function,
    name: &str,
) -> Result<(napi_threadsafe_function, Arc<HostTable>), Status> {
    let unknown = || {
        log_error!("Node-API function '{}' called with an unknown threadsafe function", name);
        Status::InvalidArg
    };
    let wrapped = FUNCTIONS.get(HandleId::from_raw(func)).ok_or_else(unknown)?;
    let raw = wrapped.raw.load(Ordering::Acquire);
    if raw.is_null() {
        return Err(unknown());
    }
    let host = upgrade(&wrapped.host, name)?;
    Ok((raw, host))
}

/// Register a cleanup hook handle created through the wrapped env `env`
pub(crate) fn wrap_hook(
    env: napi_env,
    raw: napi_async_cleanup_hook_handle,
) -> napi_async_cleanup_hook_handle {
    let env_id = HandleId::from_raw(env);
    let Some(wrapped_env) = ENVS.get(env_id) else {
        return raw;
    };
    let (id, _) = HOOKS.insert(WrappedCleanupHook {
        raw: SendPtr::new(raw),
        env: env_id,
        host: wrapped_env.host.clone(),
    });
    wrapped_env.hooks.lock().push(id);
    id.into_raw()
}

/// Raw hook handle and live host behind a wrapped hook handle
pub(crate) fn resolve_hook(
    handle: napi_async_cleanup_hook_handle,
    name: &str,
) -> Result<(napi_async_cleanup_hook_handle, Arc<HostTable>), Status> {
    let wrapped = HOOKS.get(HandleId::from_raw(handle)).ok_or_else(|| {
        log_error!("Node-API function '{}' called with an unknown cleanup hook handle", name);
        Status::InvalidArg
    })?;
    let host = upgrade(&wrapped.host, name)?;
    Ok((wrapped.raw.get(), host))
}

/// Forget a wrapped hook handle after the host removed the hook
pub(crate) fn erase_hook(handle: napi_async_cleanup_hook_handle) {
    let id = HandleId::from_raw(handle);
    if let Some(hook) = HOOKS.remove(id) {
        if let Some(env) = ENVS.get(hook.env) {
            env.hooks.lock().retain(|h| *h != id);
        }
    }
}


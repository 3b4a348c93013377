//! Per-environment call invoker binding
//!
//! The embedder binds one invoker per `napi_env` at startup. Only a weak
//! reference is kept: when the embedder drops its invoker, every primitive
//! created in that environment sees "dispatcher unavailable".

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use napi_host_core::abi::napi_env;
use napi_host_core::{CallInvoker, Task};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

static INVOKERS: Lazy<Mutex<HashMap<usize, Weak<dyn CallInvoker>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Placeholder type for a weak reference that never upgrades
struct Unbound;

impl CallInvoker for Unbound {
    fn invoke_async(&self, task: Task) -> Result<(), Task> {
        Err(task)
    }

    fn invoke_sync(&self, task: Task) -> Result<(), Task> {
        Err(task)
    }
}

/// A weak invoker reference that is always expired
pub fn unbound() -> Weak<dyn CallInvoker> {
    Weak::<Unbound>::new()
}

/// Bind `invoker` to `env`, replacing any previous binding
pub fn set_call_invoker<I>(env: napi_env, invoker: &Arc<I>)
where
    I: CallInvoker + 'static,
{
    let invoker: Arc<dyn CallInvoker> = invoker.clone();
    INVOKERS
        .lock()
        .insert(env as usize, Arc::downgrade(&invoker));
    napi_host_core::log_debug!("call invoker bound to env {:p}", env);
}

/// The invoker bound to `env`, if it is still alive
pub fn call_invoker(env: napi_env) -> Option<Arc<dyn CallInvoker>> {
    INVOKERS.lock().get(&(env as usize)).and_then(Weak::upgrade)
}

/// Weak form of the binding; expired when nothing is bound
pub fn call_invoker_weak(env: napi_env) -> Weak<dyn CallInvoker> {
    INVOKERS
        .lock()
        .get(&(env as usize))
        .cloned()
        .unwrap_or_else(unbound)
}

/// Remove the binding for `env`; returns whether one existed
pub fn clear_call_invoker(env: napi_env) -> bool {
    INVOKERS.lock().remove(&(env as usize)).is_some()
}

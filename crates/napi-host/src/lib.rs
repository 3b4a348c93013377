//! # napi-host
//!
//! Node-API for embedders that have no libuv event loop.
//!
//! Threadsafe functions and async work are implemented on top of a
//! per-environment [`CallInvoker`], the one hook the embedder supplies to
//! run a task on its interpreter thread. Everything else is forwarded to
//! the engine's own function table.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use napi_host::{attach, install, HostTable, ThreadInvoker};
//!
//! // Entry points the engine implements itself
//! let engine = HostTable {
//!     napi_create_reference: Some(engine_create_reference),
//!     napi_get_reference_value: Some(engine_get_reference_value),
//!     napi_delete_reference: Some(engine_delete_reference),
//!     napi_get_undefined: Some(engine_get_undefined),
//!     napi_call_function: Some(engine_call_function),
//!     ..HostTable::default()
//! };
//! install(engine);
//!
//! // One invoker per interpreter thread
//! let invoker = Arc::new(ThreadInvoker::spawn()?);
//! attach(env, &invoker);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Native addon                       │
//! │        napi_create_threadsafe_function, ...          │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │          Injected HostTable (weak forwarders)        │
//! └──────────────────────────────────────────────────────┘
//!              │                          │
//!              ▼                          ▼
//!    ┌──────────────────┐       ┌──────────────────┐
//!    │  Runtime entries │       │  Engine entries  │
//!    │ tsfn, async work │       │ values, refs, ...│
//!    └──────────────────┘       └──────────────────┘
//!              │
//!              ▼
//!    ┌──────────────────┐
//!    │   CallInvoker    │
//!    │ (interpreter hop)│
//!    └──────────────────┘
//! ```
//!
//! Several engines in one process are routed with [`MultiHost`].

use std::sync::Arc;

// Re-export core types
pub use napi_host_core::{
    abi,
    CallInvoker,
    CallMode,
    HandleId,
    HostError,
    HostResult,
    HostTable,
    ReleaseMode,
    Status,
    Task,
    NAPI_AUTO_LENGTH,
};
pub use napi_host_core::{fatal_error, inject_host, injected_host, weak};

// Re-export logging
pub use napi_host_core::{log_debug, log_error, log_info, log_trace, log_warn};
pub use napi_host_core::logger::{self, init as init_logging, set_flush_enabled, set_log_level, LogLevel};

// Re-export runtime types
pub use napi_host_runtime::{
    async_work,
    config,
    configure,
    call_invoker,
    clear_call_invoker,
    runtime_table,
    set_call_invoker,
    AsyncJob,
    DeliveryMode,
    InvokerConfig,
    InvokerStats,
    JobState,
    ManualInvoker,
    RuntimeConfig,
    ThreadInvoker,
    ThreadSafeFunction,
    TsfnOptions,
};

pub use napi_multihost::MultiHost;

use abi::napi_env;

/// Inject `engine` with the runtime entries laid over it
///
/// Threadsafe-function and async-work entries always come from the
/// runtime; every other entry is the engine's. Returns the injected table.
pub fn install(engine: HostTable) -> HostTable {
    logger::init();
    let table = engine.overlay(&runtime_table());
    let missing = table.missing();
    if !missing.is_empty() {
        log_debug!("installed host is missing {} entries: {:?}", missing.len(), missing);
    }
    inject_host(table);
    table
}

/// Bind `invoker` as the interpreter-thread dispatcher for `env`
///
/// Only a weak reference is kept: the caller owns the invoker, and work
/// for `env` stops being dispatched once it is dropped.
pub fn attach<I>(env: napi_env, invoker: &Arc<I>)
where
    I: CallInvoker + 'static,
{
    set_call_invoker(env, invoker);
}

/// Unbind the dispatcher for `env`; returns whether one was bound
pub fn detach(env: napi_env) -> bool {
    clear_call_invoker(env)
}

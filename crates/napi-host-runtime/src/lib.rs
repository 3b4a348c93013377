//! # napi-host-runtime
//!
//! Node-API concurrency primitives for hosts that have no event loop of
//! their own. Work that must run on the interpreter thread is handed to a
//! per-environment [`CallInvoker`].
//!
//! ## Modules
//!
//! - `config` - Runtime and invoker configuration
//! - `environment` - Per-environment call invoker binding
//! - `tsfn` - Threadsafe functions (bounded queue, acquire/release, finalize)
//! - `async_work` - Async work jobs and their state machine
//! - `api` - `extern "C"` entry points and the runtime host table
//! - `invoker` - Host-side call invokers (manual pump, dedicated thread)

pub mod config;
pub mod environment;
pub mod tsfn;
pub mod async_work;
pub mod api;
pub mod invoker;

// Re-exports for convenience
pub use config::{config, configure, DeliveryMode, InvokerConfig, RuntimeConfig};
pub use environment::{call_invoker, clear_call_invoker, set_call_invoker};
pub use tsfn::{ThreadSafeFunction, TsfnOptions};
pub use async_work::{AsyncJob, JobState};
pub use api::runtime_table;
pub use invoker::{InvokerStats, ManualInvoker, ThreadInvoker};

pub use napi_host_core::{CallInvoker, HostError, HostResult, Status};

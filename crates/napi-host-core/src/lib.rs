//! # napi-host-core
//!
//! Core types shared by the Node-API host crates.
//!
//! This crate knows nothing about threadsafe functions or async work; it
//! provides the vocabulary the runtime and the multiplexer are written in.
//!
//! ## Modules
//!
//! - `abi` - Opaque handle types, callback typedefs, call/release modes
//! - `status` - Node-API status codes
//! - `error` - Rust-side error type and its status mapping
//! - `id` - Process-unique handle ids and their allocator
//! - `registry` - Id-indexed registry of shared objects
//! - `send_ptr` - Raw pointer wrapper that may cross threads
//! - `invoker` - The task dispatcher trait (interpreter-thread hop)
//! - `host` - Function table describing one Node-API implementation
//! - `weak` - Swappable process-wide table and forwarding entry points
//! - `fatal` - Unrecoverable error path
//! - `logger` - Leveled, tagged logging macros

#![allow(clippy::missing_safety_doc)]

#[macro_use]
mod macros;

pub mod abi;
pub mod status;
pub mod error;
pub mod id;
pub mod registry;
pub mod send_ptr;
pub mod invoker;
pub mod host;
pub mod weak;
pub mod fatal;
pub mod logger;

// Re-exports for convenience
pub use abi::{CallMode, ReleaseMode, NAPI_AUTO_LENGTH};
pub use status::Status;
pub use error::{HostError, HostResult};
pub use id::{next_handle_id, HandleId, IdAllocator};
pub use registry::HandleRegistry;
pub use send_ptr::SendPtr;
pub use invoker::{CallInvoker, Task};
pub use host::HostTable;
pub use weak::{inject_host, injected_host};
pub use fatal::fatal_error;
pub use logger::LogLevel;

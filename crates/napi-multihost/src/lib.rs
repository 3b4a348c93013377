//! # napi-multihost
//!
//! Lets several independently configured Node-API hosts share one process.
//!
//! Each host is a [`HostTable`]. [`MultiHost::wrap`] pairs a host's raw
//! `napi_env` with a weak reference to its table and returns a wrapped env.
//! The table returned by [`MultiHost::table`] forwards every call made with a
//! wrapped handle to the owning host. Handles created through a wrapped env
//! (threadsafe functions, async cleanup hooks) are wrapped too, so later
//! calls that only carry those handles still reach the right host.
//!
//! ## Modules
//!
//! - `wrapped` - Wrapped handle types and their registries
//! - `forward` - `extern "C"` forwarding entry points
//! - `multi` - The `MultiHost` owner and its default entry points

mod wrapped;
mod forward;
mod multi;

pub use multi::MultiHost;
pub use wrapped::{live_envs, live_functions, live_hooks};

pub use napi_host_core::HostTable;

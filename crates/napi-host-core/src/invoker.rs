//! Interpreter-thread dispatcher
//!
//! The host has no event loop of its own. Everything that must happen on
//! the interpreter thread is handed to a `CallInvoker` supplied by the
//! embedder, one per environment.

/// Unit of work run on the interpreter thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on the single interpreter thread
///
/// **Contract:**
/// - `invoke_async()` never blocks the caller; tasks run later, FIFO.
/// - `invoke_sync()` returns only after the task has run. Called from the
///   interpreter thread itself, it runs the task inline.
/// - An invoker that can no longer run tasks (shut down, unbound) hands
///   the task back as `Err` instead of dropping it, so the caller can run
///   or discard it itself.
/// - The core holds invokers weakly. An expired invoker is a delivery
///   failure, never a crash.
pub trait CallInvoker: Send + Sync {
    /// Schedule `task` and return immediately
    fn invoke_async(&self, task: Task) -> Result<(), Task>;

    /// Run `task` on the interpreter thread and wait for it
    fn invoke_sync(&self, task: Task) -> Result<(), Task>;
}

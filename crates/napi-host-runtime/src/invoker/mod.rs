//! Host-side call invokers
//!
//! Embedders normally supply their own `CallInvoker` backed by the
//! engine's JS thread. These two cover tests, benches and tools:
//!
//! - [`ManualInvoker`] - tasks wait until the owning thread pumps them
//! - [`ThreadInvoker`] - a dedicated thread plays the interpreter thread

mod manual;
mod thread;

pub use manual::ManualInvoker;
pub use thread::{InvokerStats, ThreadInvoker};

use std::sync::Arc;
use std::time::Duration;

use napi_host_core::Task;
use parking_lot::{Condvar, Mutex};

/// One-shot signal for `invoke_sync` waiters
#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    cv: Condvar,
}

impl Completion {
    fn signal(&self) {
        let mut done = self.done.lock();
        *done = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock();
        self.cv.wait_while(&mut done, |done| !*done);
    }

    /// Wait up to `timeout`; returns whether the signal arrived
    fn wait_for(&self, timeout: Duration) -> bool {
        let mut done = self.done.lock();
        if !*done {
            self.cv.wait_for(&mut done, timeout);
        }
        *done
    }
}

/// Signals its completion when dropped, whether the task ran or was
/// discarded by a shutting-down invoker
struct SignalOnDrop(Arc<Completion>);

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        self.0.signal();
    }
}

/// Wrap `task` so that `Completion::wait` returns once it ran or was dropped
fn with_completion(task: Task) -> (Task, Arc<Completion>) {
    let completion = Arc::new(Completion::default());
    let guard = SignalOnDrop(Arc::clone(&completion));
    let wrapped: Task = Box::new(move || {
        let _guard = guard;
        task();
    });
    (wrapped, completion)
}

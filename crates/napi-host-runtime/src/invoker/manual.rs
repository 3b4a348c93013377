//! Manually pumped invoker
//!
//! The thread that creates a `ManualInvoker` is its interpreter thread.
//! Tasks accumulate in a lock-free FIFO until that thread (or a test
//! standing in for it) calls `run_pending` / `run_one`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_queue::SegQueue;
use napi_host_core::{CallInvoker, Task};

use super::with_completion;

pub struct ManualInvoker {
    tasks: SegQueue<Task>,
    owner: ThreadId,
    executed: AtomicU64,
}

impl ManualInvoker {
    pub fn new() -> Self {
        Self {
            tasks: SegQueue::new(),
            owner: thread::current().id(),
            executed: AtomicU64::new(0),
        }
    }

    /// True when called on the thread that owns this invoker
    #[inline]
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Run the oldest pending task; returns false when none was queued
    pub fn run_one(&self) -> bool {
        match self.tasks.pop() {
            Some(task) => {
                task();
                self.executed.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks queued by the
    /// tasks themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut n = 0;
        while self.run_one() {
            n += 1;
        }
        n
    }

    /// Pump until `done()` holds or `timeout` elapses
    pub fn run_until<F>(&self, mut done: F, timeout: Duration) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::yield_now();
        }
    }

    /// Tasks waiting to be pumped
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks run so far
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

impl Default for ManualInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl CallInvoker for ManualInvoker {
    fn invoke_async(&self, task: Task) -> Result<(), Task> {
        self.tasks.push(task);
        Ok(())
    }

    fn invoke_sync(&self, task: Task) -> Result<(), Task> {
        if self.is_owner_thread() {
            task();
            self.executed.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        let (task, completion) = with_completion(task);
        self.tasks.push(task);
        completion.wait();
        Ok(())
    }
}

impl std::fmt::Debug for ManualInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualInvoker")
            .field("pending", &self.pending())
            .field("executed", &self.executed())
            .finish()
    }
}

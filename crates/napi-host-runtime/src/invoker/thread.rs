//! Dedicated interpreter thread
//!
//! A single thread runs submitted tasks in FIFO order and parks on a
//! condvar while idle. It stands in for the engine's JS thread when no
//! engine is present.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_queue::SegQueue;
use napi_host_core::{log_debug, log_warn, CallInvoker, Task};
use parking_lot::{Condvar, Mutex};

use super::with_completion;
use crate::config::InvokerConfig;

/// How often a sync waiter checks that the interpreter thread is alive
const SYNC_POLL: Duration = Duration::from_millis(50);

/// Statistics from interpreter thread execution
#[derive(Debug, Clone, Default)]
pub struct InvokerStats {
    /// Tasks run on the interpreter thread
    pub tasks_run: u64,

    /// Tasks submitted with `invoke_sync`
    pub sync_tasks: u64,

    /// Times the thread parked with an empty queue
    pub parks: u64,

    /// Tasks still queued when the thread exited
    pub dropped: u64,
}

struct Shared {
    tasks: SegQueue<Task>,
    shutdown: AtomicBool,
    /// bool = wake pending
    wake: Mutex<bool>,
    cv: Condvar,
    sync_tasks: AtomicU64,
}

impl Shared {
    fn wake(&self) {
        let mut pending = self.wake.lock();
        *pending = true;
        self.cv.notify_one();
    }

    fn park(&self, timeout: Duration) {
        let mut pending = self.wake.lock();
        if *pending {
            *pending = false;
            return;
        }
        if !self.tasks.is_empty() || self.shutdown.load(Ordering::Acquire) {
            return;
        }
        self.cv.wait_for(&mut pending, timeout);
        *pending = false;
    }
}

/// Call invoker backed by one dedicated thread
pub struct ThreadInvoker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<InvokerStats>>>,
    thread_id: ThreadId,
}

impl ThreadInvoker {
    /// Spawn the interpreter thread
    pub fn new(config: InvokerConfig) -> std::io::Result<Self> {
        config
            .validate()
            .map_err(|msg| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg))?;

        let shared = Arc::new(Shared {
            tasks: SegQueue::new(),
            shutdown: AtomicBool::new(false),
            wake: Mutex::new(false),
            cv: Condvar::new(),
            sync_tasks: AtomicU64::new(0),
        });

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let loop_shared = Arc::clone(&shared);
        let park_timeout = config.park_timeout;
        let handle = builder.spawn(move || run_loop(loop_shared, park_timeout))?;
        let thread_id = handle.thread().id();

        log_debug!("interpreter thread '{}' started", config.thread_name);

        Ok(Self {
            shared,
            handle: Mutex::new(Some(handle)),
            thread_id,
        })
    }

    /// Spawn with the default configuration
    pub fn spawn() -> std::io::Result<Self> {
        Self::new(InvokerConfig::default())
    }

    /// True when called on the interpreter thread
    #[inline]
    pub fn is_invoker_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Request shutdown without waiting
    pub fn request_shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wake();
    }

    /// Request shutdown and wait for the thread to exit
    ///
    /// Tasks still queued are dropped. Returns `None` when called on the
    /// interpreter thread itself or when the thread was already joined.
    pub fn shutdown(&self) -> Option<InvokerStats> {
        self.request_shutdown();
        if self.is_invoker_thread() {
            return None;
        }
        let handle = self.handle.lock().take()?;
        match handle.join() {
            Ok(mut stats) => {
                stats.sync_tasks = self.shared.sync_tasks.load(Ordering::Relaxed);
                Some(stats)
            }
            Err(_) => {
                log_warn!("interpreter thread panicked");
                None
            }
        }
    }

    /// True once the interpreter thread has exited or was joined
    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Tasks waiting to run
    pub fn pending(&self) -> usize {
        self.shared.tasks.len()
    }
}

impl CallInvoker for ThreadInvoker {
    fn invoke_async(&self, task: Task) -> Result<(), Task> {
        if self.is_shutdown_requested() {
            log_warn!("task submitted after interpreter thread shutdown; rejected");
            return Err(task);
        }
        self.shared.tasks.push(task);
        self.shared.wake();
        Ok(())
    }

    fn invoke_sync(&self, task: Task) -> Result<(), Task> {
        if self.is_invoker_thread() {
            self.shared.sync_tasks.fetch_add(1, Ordering::Relaxed);
            task();
            return Ok(());
        }
        if self.is_shutdown_requested() {
            log_warn!("sync task submitted after interpreter thread shutdown; rejected");
            return Err(task);
        }
        self.shared.sync_tasks.fetch_add(1, Ordering::Relaxed);
        let (task, completion) = with_completion(task);
        self.shared.tasks.push(task);
        self.shared.wake();
        while !completion.wait_for(SYNC_POLL) {
            if self.is_finished() {
                // Already queued; the exiting thread drops it
                log_warn!("interpreter thread exited before running a sync task");
                return Ok(());
            }
        }
        Ok(())
    }
}

impl Drop for ThreadInvoker {
    fn drop(&mut self) {
        self.request_shutdown();
        if !self.is_invoker_thread() {
            if let Some(handle) = self.handle.get_mut().take() {
                let _ = handle.join();
            }
        }
    }
}

fn run_loop(shared: Arc<Shared>, park_timeout: Duration) -> InvokerStats {
    let mut stats = InvokerStats::default();

    while !shared.shutdown.load(Ordering::Acquire) {
        let mut ran_any = false;
        while let Some(task) = shared.tasks.pop() {
            task();
            stats.tasks_run += 1;
            ran_any = true;
            if shared.shutdown.load(Ordering::Acquire) {
                break;
            }
        }
        if !ran_any {
            stats.parks += 1;
            shared.park(park_timeout);
        }
    }

    // Dropping a queued sync task releases its waiter
    while let Some(task) = shared.tasks.pop() {
        drop(task);
        stats.dropped += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_async_tasks_run_in_order() {
        let invoker = ThreadInvoker::spawn().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..100 {
            let seen = Arc::clone(&seen);
            invoker.invoke_async(Box::new(move || seen.lock().push(i))).ok().unwrap();
        }
        // A sync task runs after every task queued before it
        invoker.invoke_sync(Box::new(|| {})).ok().unwrap();
        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());

        let stats = invoker.shutdown().unwrap();
        assert_eq!(stats.tasks_run, 101);
        assert_eq!(stats.sync_tasks, 1);
    }

    #[test]
    fn test_sync_runs_on_interpreter_thread() {
        let invoker = ThreadInvoker::new(InvokerConfig::new().thread_name("napi-test-js")).unwrap();
        let name = Arc::new(Mutex::new(None));
        let name2 = Arc::clone(&name);
        invoker.invoke_sync(Box::new(move || {
            *name2.lock() = thread::current().name().map(str::to_owned);
        }))
        .ok().unwrap();
        assert_eq!(name.lock().as_deref(), Some("napi-test-js"));
    }

    #[test]
    fn test_nested_sync_runs_inline() {
        let invoker = Arc::new(ThreadInvoker::spawn().unwrap());
        let inner = Arc::clone(&invoker);
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);
        invoker.invoke_sync(Box::new(move || {
            inner
                .invoke_sync(Box::new(move || {
                    count2.fetch_add(1, Ordering::SeqCst);
                }))
                .ok().unwrap();
        }))
        .ok().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        invoker.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_is_handed_back() {
        let invoker = ThreadInvoker::spawn().unwrap();
        invoker.shutdown().unwrap();
        assert!(invoker.shutdown().is_none());

        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);
        let rejected = invoker
            .invoke_async(Box::new(move || {
                count2.fetch_add(1, Ordering::SeqCst);
            }))
            .err()
            .unwrap();
        // Must not block
        assert!(invoker.invoke_sync(Box::new(|| {})).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(invoker.pending(), 0);

        // The caller still owns the task and may run it itself
        rejected();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = ThreadInvoker::new(InvokerConfig::new().thread_name("")).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}

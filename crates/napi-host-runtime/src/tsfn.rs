//! Threadsafe functions
//!
//! A threadsafe function is callable from any thread; every call is
//! queued and delivered on the interpreter thread through the
//! environment's call invoker, one item per dispatch task.
//!
//! # Lifecycle
//!
//! ```text
//! create ──► open ──(release to 0, queue empty / abort)──► closing ──► finalized
//!              │                                                         ▲
//!              └──(last drain with no holders)──────────────────────────┘
//! ```
//!
//! - `closing`, `aborted` and `finalize_scheduled` each flip false→true once.
//! - `closing` and `aborted` are only written with the queue lock held, so
//!   a producer blocked on the queue condvar cannot miss the transition.
//! - The finalizer runs at most once; afterwards the handle no longer
//!   resolves.

use std::collections::VecDeque;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use libc::c_void;
use napi_host_core::abi::{
    napi_env, napi_env__, napi_finalize, napi_ref__, napi_threadsafe_function,
    napi_threadsafe_function_call_js, napi_value,
};
use napi_host_core::{
    fatal_error, log_debug, log_trace, log_warn, weak, CallInvoker, CallMode, HandleId,
    HandleRegistry, HostError, HostResult, ReleaseMode, SendPtr, Status, Task,
};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

use crate::config::{self, DeliveryMode};

static FUNCTIONS: Lazy<HandleRegistry<ThreadSafeFunction>> = Lazy::new(HandleRegistry::new);

/// Parameters for [`ThreadSafeFunction::create`]
#[derive(Clone, Copy)]
pub struct TsfnOptions {
    pub env: napi_env,
    /// JS function to call when no `call_js_cb` is given (may be null)
    pub func: napi_value,
    /// 0 means unbounded
    pub max_queue_size: usize,
    pub initial_thread_count: usize,
    pub finalize_data: *mut c_void,
    pub finalize_cb: Option<napi_finalize>,
    pub context: *mut c_void,
    pub call_js_cb: Option<napi_threadsafe_function_call_js>,
    pub delivery: DeliveryMode,
}

impl TsfnOptions {
    pub fn new(env: napi_env) -> Self {
        Self {
            env,
            func: ptr::null_mut(),
            max_queue_size: 0,
            initial_thread_count: 1,
            finalize_data: ptr::null_mut(),
            finalize_cb: None,
            context: ptr::null_mut(),
            call_js_cb: None,
            delivery: config::config().delivery,
        }
    }

    pub fn func(mut self, func: napi_value) -> Self {
        self.func = func;
        self
    }

    pub fn max_queue_size(mut self, n: usize) -> Self {
        self.max_queue_size = n;
        self
    }

    pub fn initial_thread_count(mut self, n: usize) -> Self {
        self.initial_thread_count = n;
        self
    }

    pub fn finalizer(mut self, cb: napi_finalize, data: *mut c_void) -> Self {
        self.finalize_cb = Some(cb);
        self.finalize_data = data;
        self
    }

    pub fn context(mut self, context: *mut c_void) -> Self {
        self.context = context;
        self
    }

    pub fn call_js(mut self, cb: napi_threadsafe_function_call_js) -> Self {
        self.call_js_cb = Some(cb);
        self
    }

    pub fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = mode;
        self
    }
}

pub struct ThreadSafeFunction {
    id: HandleId,
    invoker: Weak<dyn CallInvoker>,
    env: SendPtr<napi_env__>,
    function_ref: AtomicPtr<napi_ref__>,
    context: SendPtr<c_void>,
    finalize_data: SendPtr<c_void>,
    finalize_cb: Option<napi_finalize>,
    call_js_cb: Option<napi_threadsafe_function_call_js>,
    max_queue_size: usize,
    delivery: DeliveryMode,

    thread_count: AtomicUsize,
    aborted: AtomicBool,
    closing: AtomicBool,
    finalize_scheduled: AtomicBool,
    referenced: AtomicBool,

    queue: Mutex<VecDeque<SendPtr<c_void>>>,
    /// Signalled when a bounded queue frees a slot or closing begins
    space: Condvar,
}

impl ThreadSafeFunction {
    /// Create and register a threadsafe function
    ///
    /// Aborts the process if a reference to `options.func` cannot be
    /// created; the environment is unusable at that point.
    pub fn create(invoker: Weak<dyn CallInvoker>, options: TsfnOptions) -> Arc<Self> {
        let mut function_ref = ptr::null_mut();
        if !options.func.is_null() {
            let status =
                unsafe { weak::napi_create_reference(options.env, options.func, 1, &mut function_ref) };
            if status != Status::Ok {
                fatal_error("", "Failed to create JS function reference");
            }
        }

        let (id, function) = FUNCTIONS.insert_with(|id| ThreadSafeFunction {
            id,
            invoker,
            env: SendPtr::new(options.env),
            function_ref: AtomicPtr::new(function_ref),
            context: SendPtr::new(options.context),
            finalize_data: SendPtr::new(options.finalize_data),
            finalize_cb: options.finalize_cb,
            call_js_cb: options.call_js_cb,
            max_queue_size: options.max_queue_size,
            delivery: options.delivery,
            thread_count: AtomicUsize::new(options.initial_thread_count),
            aborted: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            finalize_scheduled: AtomicBool::new(false),
            referenced: AtomicBool::new(true),
            queue: Mutex::new(VecDeque::new()),
            space: Condvar::new(),
        });

        log_debug!(
            "threadsafe function {} created (max_queue_size={}, threads={})",
            id,
            options.max_queue_size,
            options.initial_thread_count
        );
        function
    }

    /// Look up a live threadsafe function
    pub fn get(id: HandleId) -> Option<Arc<Self>> {
        FUNCTIONS.get(id)
    }

    /// Look up by opaque handle
    pub fn from_handle(handle: napi_threadsafe_function) -> Option<Arc<Self>> {
        Self::get(HandleId::from_raw(handle))
    }

    /// Number of threadsafe functions not yet finalized
    pub fn live_count() -> usize {
        FUNCTIONS.len()
    }

    #[inline]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Opaque handle handed to extension code
    #[inline]
    pub fn handle(&self) -> napi_threadsafe_function {
        self.id.into_raw()
    }

    #[inline]
    pub fn context(&self) -> *mut c_void {
        self.context.get()
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count.load(Ordering::SeqCst)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub fn is_finalize_scheduled(&self) -> bool {
        self.finalize_scheduled.load(Ordering::Acquire)
    }

    /// Queue `data` for delivery on the interpreter thread
    ///
    /// When the invoker has gone away or rejects the task, the item is
    /// queued, a diagnostic is logged and the call still succeeds; it will
    /// never be delivered.
    pub fn call(self: &Arc<Self>, data: *mut c_void, mode: CallMode) -> HostResult<()> {
        if self.is_aborted() || self.is_closing() {
            return Err(HostError::Closing);
        }

        {
            let mut queue = self.queue.lock();
            if self.is_closing() {
                return Err(HostError::Closing);
            }
            let max = self.max_queue_size;
            if max > 0 && queue.len() >= max {
                if mode == CallMode::NonBlocking {
                    return Err(HostError::QueueFull);
                }
                self.space
                    .wait_while(&mut queue, |q| q.len() >= max && !self.is_closing());
                if self.is_closing() {
                    return Err(HostError::Closing);
                }
            }
            queue.push_back(SendPtr::new(data));
        }

        let Some(invoker) = self.invoker.upgrade() else {
            log_warn!(
                "no call invoker for threadsafe function {}; queued item will not be delivered",
                self.id
            );
            return Ok(());
        };

        let this = Arc::clone(self);
        let task: Task = Box::new(move || this.drain_one());
        let submitted = match self.delivery {
            DeliveryMode::Async => invoker.invoke_async(task),
            DeliveryMode::Sync => invoker.invoke_sync(task),
        };
        if submitted.is_err() {
            log_warn!(
                "call invoker rejected threadsafe function {}; queued item will not be delivered",
                self.id
            );
        }
        Ok(())
    }

    /// Add a holder
    pub fn acquire(&self) -> HostResult<()> {
        if self.is_closing() {
            return Err(HostError::Closing);
        }
        self.thread_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Drop a holder, or close immediately with `ReleaseMode::Abort`
    pub fn release(self: &Arc<Self>, mode: ReleaseMode) -> HostResult<()> {
        if self.is_closing() {
            return Err(HostError::Closing);
        }

        if mode == ReleaseMode::Abort {
            let _queue = self.queue.lock();
            self.aborted.store(true, Ordering::Release);
            self.closing.store(true, Ordering::Release);
            self.space.notify_all();
        }

        let prev = match self
            .thread_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
        {
            Ok(n) | Err(n) => n,
        };
        let remaining = prev.saturating_sub(1);

        if mode == ReleaseMode::Abort {
            log_debug!("threadsafe function {} aborted", self.id);
            self.finalize();
        } else if remaining == 0 && self.queue.lock().is_empty() {
            self.finalize();
        }
        Ok(())
    }

    /// Mark as keeping the (absent) event loop alive
    ///
    /// There is no loop to keep alive; the flag is only observable state.
    pub fn ref_(&self) {
        self.referenced.store(true, Ordering::Relaxed);
    }

    /// Clear the keep-alive flag; see [`ref_`](Self::ref_)
    pub fn unref(&self) {
        self.referenced.store(false, Ordering::Relaxed);
    }

    pub fn is_referenced(&self) -> bool {
        self.referenced.load(Ordering::Relaxed)
    }

    /// Dispatch task body: deliver exactly one queued item
    fn drain_one(self: Arc<Self>) {
        let (item, empty) = {
            let mut queue = self.queue.lock();
            let item = queue.pop_front();
            if item.is_some() && self.max_queue_size > 0 {
                self.space.notify_one();
            }
            (item, queue.is_empty())
        };

        if let Some(data) = item {
            if !self.is_aborted() {
                self.deliver(data.get());
            }
        }

        if empty && self.thread_count.load(Ordering::SeqCst) == 0 && !self.is_closing() {
            self.finalize();
        }
    }

    fn deliver(&self, data: *mut c_void) {
        let env = self.env.get();
        let function_ref = self.function_ref.load(Ordering::Acquire);

        let mut func: napi_value = ptr::null_mut();
        if !function_ref.is_null() {
            let status = unsafe { weak::napi_get_reference_value(env, function_ref, &mut func) };
            if status != Status::Ok {
                log_warn!("threadsafe function {}: cannot resolve JS function ({})", self.id, status);
                func = ptr::null_mut();
            }
        }

        if let Some(call_js) = self.call_js_cb {
            log_trace!("threadsafe function {}: call_js", self.id);
            unsafe { call_js(env, func, self.context.get(), data) };
        } else if !func.is_null() {
            let mut recv: napi_value = ptr::null_mut();
            let mut result: napi_value = ptr::null_mut();
            let status = unsafe {
                weak::napi_get_undefined(env, &mut recv);
                weak::napi_call_function(env, recv, func, 0, ptr::null(), &mut result)
            };
            if status != Status::Ok {
                log_warn!("threadsafe function {}: JS call failed ({})", self.id, status);
            }
        }
    }

    /// Schedule the one-time teardown
    fn finalize(self: &Arc<Self>) {
        if self
            .finalize_scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        {
            let _queue = self.queue.lock();
            self.closing.store(true, Ordering::Release);
            self.space.notify_all();
        }

        let this = Arc::clone(self);
        let task: Task = Box::new(move || this.run_finalizer());
        let rejected = match self.invoker.upgrade() {
            Some(invoker) => invoker.invoke_async(task).err(),
            None => Some(task),
        };
        // No dispatcher to hop to: finalize on the calling thread
        if let Some(task) = rejected {
            log_debug!("no dispatcher for threadsafe function {}; finalizing inline", self.id);
            task();
        }
    }

    fn run_finalizer(&self) {
        let env = self.env.get();
        if let Some(finalize) = self.finalize_cb {
            unsafe { finalize(env, self.finalize_data.get(), self.context.get()) };
        }

        let function_ref = self.function_ref.swap(ptr::null_mut(), Ordering::AcqRel);
        if !function_ref.is_null() {
            unsafe { weak::napi_delete_reference(env, function_ref) };
        }

        FUNCTIONS.remove(self.id);
        log_debug!("threadsafe function {} finalized", self.id);
    }
}

impl std::fmt::Debug for ThreadSafeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadSafeFunction")
            .field("id", &self.id)
            .field("thread_count", &self.thread_count())
            .field("max_queue_size", &self.max_queue_size)
            .field("closing", &self.is_closing())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ManualInvoker;
    use std::sync::atomic::AtomicUsize;

    static DELIVERED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_call_js(
        _env: napi_env,
        _js_cb: napi_value,
        _context: *mut c_void,
        _data: *mut c_void,
    ) {
        DELIVERED.fetch_add(1, Ordering::SeqCst);
    }

    fn invoker_pair() -> (Arc<ManualInvoker>, Weak<dyn CallInvoker>) {
        let invoker = Arc::new(ManualInvoker::new());
        let dynamic: Arc<dyn CallInvoker> = invoker.clone();
        let weak = Arc::downgrade(&dynamic);
        (invoker, weak)
    }

    fn options() -> TsfnOptions {
        TsfnOptions::new(0x10 as napi_env)
            .call_js(count_call_js)
            .delivery(DeliveryMode::Async)
    }

    #[test]
    fn test_handle_resolves_until_finalized() {
        let (invoker, weak) = invoker_pair();
        let tsfn = ThreadSafeFunction::create(weak, options());
        let handle = tsfn.handle();
        assert!(ThreadSafeFunction::from_handle(handle).is_some());

        tsfn.release(ReleaseMode::Release).unwrap();
        assert!(tsfn.is_closing());
        invoker.run_pending();
        assert!(ThreadSafeFunction::from_handle(handle).is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let (_invoker, weak) = invoker_pair();
        let a = ThreadSafeFunction::create(weak.clone(), options());
        let b = ThreadSafeFunction::create(weak, options());
        assert_ne!(a.id(), b.id());
        assert!(a.id().is_some());
    }

    #[test]
    fn test_acquire_after_close_fails() {
        let (invoker, weak) = invoker_pair();
        let tsfn = ThreadSafeFunction::create(weak, options());
        tsfn.acquire().unwrap();
        assert_eq!(tsfn.thread_count(), 2);

        tsfn.release(ReleaseMode::Abort).unwrap();
        assert!(tsfn.is_aborted());
        assert_eq!(tsfn.acquire(), Err(HostError::Closing));
        assert_eq!(tsfn.release(ReleaseMode::Release), Err(HostError::Closing));
        assert_eq!(tsfn.call(ptr::null_mut(), CallMode::NonBlocking), Err(HostError::Closing));
        invoker.run_pending();
    }

    #[test]
    fn test_ref_unref_flag_only() {
        let (_invoker, weak) = invoker_pair();
        let tsfn = ThreadSafeFunction::create(weak, options());
        assert!(tsfn.is_referenced());
        tsfn.unref();
        assert!(!tsfn.is_referenced());
        tsfn.ref_();
        assert!(tsfn.is_referenced());
        assert_eq!(tsfn.thread_count(), 1);
        assert!(!tsfn.is_closing());
    }

    #[test]
    fn test_context_returned_unchanged() {
        let (_invoker, weak) = invoker_pair();
        let mut ctx = 5u8;
        let ctx_ptr = &mut ctx as *mut u8 as *mut c_void;
        let tsfn = ThreadSafeFunction::create(weak, options().context(ctx_ptr));
        assert_eq!(tsfn.context(), ctx_ptr);
    }

    #[test]
    fn test_non_blocking_queue_full() {
        let (invoker, weak) = invoker_pair();
        let tsfn = ThreadSafeFunction::create(weak, options().max_queue_size(2));
        tsfn.call(ptr::null_mut(), CallMode::NonBlocking).unwrap();
        tsfn.call(ptr::null_mut(), CallMode::NonBlocking).unwrap();
        assert_eq!(
            tsfn.call(ptr::null_mut(), CallMode::NonBlocking),
            Err(HostError::QueueFull)
        );
        assert_eq!(tsfn.queue_len(), 2);

        assert!(invoker.run_one());
        tsfn.call(ptr::null_mut(), CallMode::NonBlocking).unwrap();
        invoker.run_pending();
        assert_eq!(tsfn.queue_len(), 0);
    }

    struct Rejecting;

    impl CallInvoker for Rejecting {
        fn invoke_async(&self, task: Task) -> Result<(), Task> {
            Err(task)
        }

        fn invoke_sync(&self, task: Task) -> Result<(), Task> {
            Err(task)
        }
    }

    static REJECTED_FINALIZED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_finalize(_env: napi_env, _data: *mut c_void, _hint: *mut c_void) {
        REJECTED_FINALIZED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_rejecting_invoker_finalizes_inline() {
        let invoker: Arc<dyn CallInvoker> = Arc::new(Rejecting);
        let tsfn = ThreadSafeFunction::create(
            Arc::downgrade(&invoker),
            options().finalizer(count_finalize, ptr::null_mut()),
        );
        let handle = tsfn.handle();

        // Accepted but never delivered
        tsfn.call(ptr::null_mut(), CallMode::NonBlocking).unwrap();
        assert_eq!(tsfn.queue_len(), 1);

        tsfn.release(ReleaseMode::Abort).unwrap();
        assert_eq!(REJECTED_FINALIZED.load(Ordering::SeqCst), 1);
        assert!(ThreadSafeFunction::from_handle(handle).is_none());
    }
}

//! Async work
//!
//! A job pairs an `execute` step with a `complete` step. Queueing hands the
//! job to the environment's call invoker; the dispatched task runs
//! `execute` unless the job was cancelled first, then always runs
//! `complete`.
//!
//! # State machine
//!
//! ```text
//! Created ──queue──► Queued ──task runs──► Completed
//!    │                  │                      ▲
//!    │                cancel                   │
//!    │                  ▼                      │
//!    └────cancel───► Cancelled ──task runs─────┘   (execute skipped)
//!                     │    ▲
//!                     └────┘ queue (once; state kept)
//!
//! any state except Completed ──delete──► Deleted
//! ```
//!
//! A job is dispatched at most once. Queueing a cancelled job still
//! submits the task, so `complete` reports `cancelled`.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use libc::c_void;
use napi_host_core::abi::{
    napi_async_complete_callback, napi_async_execute_callback, napi_async_work, napi_env,
    napi_env__,
};
use napi_host_core::{
    log_debug, log_warn, HandleId, HandleRegistry, HostError, HostResult, SendPtr, Status, Task,
};
use once_cell::sync::Lazy;

use crate::environment;

static JOBS: Lazy<HandleRegistry<AsyncJob>> = Lazy::new(HandleRegistry::new);

/// Async job state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created = 0,
    Queued = 1,
    Completed = 2,
    Cancelled = 3,
    Deleted = 4,
}

impl From<u8> for JobState {
    fn from(v: u8) -> Self {
        match v {
            0 => JobState::Created,
            1 => JobState::Queued,
            2 => JobState::Completed,
            3 => JobState::Cancelled,
            _ => JobState::Deleted,
        }
    }
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Queued => "queued",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Deleted => "deleted",
        }
    }
}

pub struct AsyncJob {
    id: HandleId,
    state: AtomicU8,
    /// Set once the dispatch task was handed to an invoker
    dispatched: AtomicBool,
    env: SendPtr<napi_env__>,
    execute: napi_async_execute_callback,
    complete: napi_async_complete_callback,
    data: SendPtr<c_void>,
}

impl AsyncJob {
    /// Create and register a job in state `Created`
    pub fn create(
        env: napi_env,
        execute: napi_async_execute_callback,
        complete: napi_async_complete_callback,
        data: *mut c_void,
    ) -> Arc<Self> {
        let (id, job) = JOBS.insert_with(|id| AsyncJob {
            id,
            state: AtomicU8::new(JobState::Created as u8),
            dispatched: AtomicBool::new(false),
            env: SendPtr::new(env),
            execute,
            complete,
            data: SendPtr::new(data),
        });
        log_debug!("async work {} created", id);
        job
    }

    pub fn get(id: HandleId) -> Option<Arc<Self>> {
        JOBS.get(id)
    }

    pub fn from_handle(work: napi_async_work) -> Option<Arc<Self>> {
        Self::get(HandleId::from_raw(work))
    }

    /// Number of registered jobs
    pub fn live_count() -> usize {
        JOBS.len()
    }

    #[inline]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[inline]
    pub fn handle(&self) -> napi_async_work {
        self.id.into_raw()
    }

    #[inline]
    pub fn state(&self) -> JobState {
        JobState::from(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: JobState, to: JobState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Hand the job to the invoker bound to `env`
    pub fn queue(self: &Arc<Self>, env: napi_env) -> HostResult<()> {
        let Some(invoker) = environment::call_invoker(env) else {
            log_warn!("no call invoker for env {:p}; async work {} not queued", env, self.id);
            return Err(HostError::NoInvoker);
        };

        match self.state() {
            JobState::Created | JobState::Cancelled => {}
            state => return Err(HostError::NotQueueable(state.as_str())),
        }
        if self.dispatched.swap(true, Ordering::AcqRel) {
            return Err(HostError::NotQueueable(JobState::Queued.as_str()));
        }
        // A concurrent cancel wins; the task then reports `cancelled`
        let _ = self.transition(JobState::Created, JobState::Queued);

        let job = Arc::downgrade(self);
        let complete_env = SendPtr::new(env);
        let task: Task = Box::new(move || match job.upgrade() {
            Some(job) => job.run(complete_env.get()),
            None => log_debug!("async work deleted before it ran"),
        });
        if invoker.invoke_async(task).is_err() {
            let _ = self.transition(JobState::Queued, JobState::Created);
            self.dispatched.store(false, Ordering::Release);
            log_warn!("call invoker for env {:p} rejected async work {}", env, self.id);
            return Err(HostError::NoInvoker);
        }
        Ok(())
    }

    /// Dispatch task body
    fn run(&self, env: napi_env) {
        let state = self.state();
        if state == JobState::Deleted {
            log_debug!("async work {} deleted before it ran", self.id);
            return;
        }

        let ran = state == JobState::Queued;
        if ran {
            unsafe { (self.execute)(self.env.get(), self.data.get()) };
        }

        let status = if ran { Status::Ok } else { Status::Cancelled };
        unsafe { (self.complete)(env, status, self.data.get()) };

        // Deleted stays terminal
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (JobState::from(s) != JobState::Deleted).then_some(JobState::Completed as u8)
            });
    }

    /// Prevent a not-yet-started execute step
    ///
    /// Best-effort: a job whose execute step already started still
    /// completes with `ok`.
    pub fn cancel(&self) -> HostResult<()> {
        loop {
            let current = self.state();
            match current {
                JobState::Completed => return Err(HostError::AlreadyCompleted),
                JobState::Deleted => return Err(HostError::AlreadyDeleted),
                JobState::Cancelled => return Ok(()),
                JobState::Created | JobState::Queued => {
                    if self.transition(current, JobState::Cancelled) {
                        log_debug!("async work {} cancelled", self.id);
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for AsyncJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncJob")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Create a job
pub fn create(
    env: napi_env,
    execute: napi_async_execute_callback,
    complete: napi_async_complete_callback,
    data: *mut c_void,
) -> HandleId {
    AsyncJob::create(env, execute, complete, data).id()
}

/// Queue the job `id` on the invoker bound to `env`
pub fn queue(env: napi_env, id: HandleId) -> HostResult<()> {
    let job = AsyncJob::get(id).ok_or(HostError::InvalidArg)?;
    job.queue(env)
}

/// Cancel the job `id`
pub fn cancel(id: HandleId) -> HostResult<()> {
    let job = AsyncJob::get(id).ok_or(HostError::InvalidArg)?;
    job.cancel()
}

/// Remove the job `id` from the registry
pub fn delete(id: HandleId) -> HostResult<()> {
    let job = JOBS.remove(id).ok_or(HostError::InvalidArg)?;
    job.state.store(JobState::Deleted as u8, Ordering::Release);
    log_debug!("async work {} deleted", id);
    Ok(())
}

//! Error types for the Node-API host

use core::fmt;

use crate::status::Status;

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised by the host core
///
/// Every variant maps to exactly one [`Status`]; the ABI layer returns that
/// status, Rust callers get the richer variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Handle not found or required pointer was null
    InvalidArg,

    /// Allocation or registry failure
    GenericFailure,

    /// Threadsafe function is closing or was aborted
    Closing,

    /// Bounded queue is saturated (non-blocking call)
    QueueFull,

    /// Async work was cancelled before it executed
    Cancelled,

    /// No dispatcher is bound to the environment, or it expired
    NoInvoker,

    /// Async work already ran its completion step
    AlreadyCompleted,

    /// Async work was deleted
    AlreadyDeleted,

    /// Async work cannot be queued from its current state
    NotQueueable(&'static str),

    /// Host behind a wrapped handle was destroyed
    HostGone,

    /// Host does not provide the named entry point
    Unimplemented(&'static str),
}

impl HostError {
    /// Status reported across the ABI for this error
    pub const fn status(&self) -> Status {
        match self {
            HostError::InvalidArg | HostError::NoInvoker => Status::InvalidArg,
            HostError::Closing => Status::Closing,
            HostError::QueueFull => Status::QueueFull,
            HostError::Cancelled => Status::Cancelled,
            HostError::GenericFailure
            | HostError::AlreadyCompleted
            | HostError::AlreadyDeleted
            | HostError::NotQueueable(_)
            | HostError::HostGone
            | HostError::Unimplemented(_) => Status::GenericFailure,
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::InvalidArg => write!(f, "invalid argument"),
            HostError::GenericFailure => write!(f, "generic failure"),
            HostError::Closing => write!(f, "threadsafe function is closing"),
            HostError::QueueFull => write!(f, "threadsafe function queue is full"),
            HostError::Cancelled => write!(f, "async work cancelled"),
            HostError::NoInvoker => write!(f, "no call invoker bound to environment"),
            HostError::AlreadyCompleted => write!(f, "async work already completed"),
            HostError::AlreadyDeleted => write!(f, "async work already deleted"),
            HostError::NotQueueable(state) => write!(f, "async work cannot be queued while {}", state),
            HostError::HostGone => write!(f, "host was destroyed"),
            HostError::Unimplemented(name) => write!(f, "host does not implement {}", name),
        }
    }
}

impl std::error::Error for HostError {}

impl From<HostError> for Status {
    fn from(e: HostError) -> Self {
        e.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", HostError::QueueFull), "threadsafe function queue is full");
        assert_eq!(
            format!("{}", HostError::Unimplemented("napi_create_object")),
            "host does not implement napi_create_object"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(HostError::NoInvoker.status(), Status::InvalidArg);
        assert_eq!(HostError::AlreadyCompleted.status(), Status::GenericFailure);
        assert_eq!(HostError::AlreadyDeleted.status(), Status::GenericFailure);
        let status: Status = HostError::Closing.into();
        assert_eq!(status, Status::Closing);
    }
}

//! Node-API status codes

use core::fmt;

use crate::error::HostResult;

/// `napi_status`, with the reference numeric values
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    InvalidArg = 1,
    ObjectExpected = 2,
    StringExpected = 3,
    NameExpected = 4,
    FunctionExpected = 5,
    NumberExpected = 6,
    BooleanExpected = 7,
    ArrayExpected = 8,
    GenericFailure = 9,
    PendingException = 10,
    Cancelled = 11,
    EscapeCalledTwice = 12,
    HandleScopeMismatch = 13,
    CallbackScopeMismatch = 14,
    QueueFull = 15,
    Closing = 16,
    BigintExpected = 17,
    DateExpected = 18,
    ArraybufferExpected = 19,
    DetachableArraybufferExpected = 20,
    WouldDeadlock = 21,
    NoExternalBuffersAllowed = 22,
    CannotRunJs = 23,
}

impl Status {
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Raw integer value as seen by C callers
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Collapse a core result into the status returned across the ABI
    #[inline]
    pub fn from_result(result: HostResult<()>) -> Status {
        match result {
            Ok(()) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Status::Ok => "ok",
            Status::InvalidArg => "Invalid argument",
            Status::ObjectExpected => "An object was expected",
            Status::StringExpected => "A string was expected",
            Status::NameExpected => "A string or symbol was expected",
            Status::FunctionExpected => "A function was expected",
            Status::NumberExpected => "A number was expected",
            Status::BooleanExpected => "A boolean was expected",
            Status::ArrayExpected => "An array was expected",
            Status::GenericFailure => "Unknown failure",
            Status::PendingException => "An exception is pending",
            Status::Cancelled => "The async work item was cancelled",
            Status::EscapeCalledTwice => "napi_escape_handle already called on scope",
            Status::HandleScopeMismatch => "Invalid handle scope usage",
            Status::CallbackScopeMismatch => "Invalid callback scope usage",
            Status::QueueFull => "Thread-safe function queue is full",
            Status::Closing => "Thread-safe function handle is closing",
            Status::BigintExpected => "A bigint was expected",
            Status::DateExpected => "A date was expected",
            Status::ArraybufferExpected => "An arraybuffer was expected",
            Status::DetachableArraybufferExpected => "A detachable arraybuffer was expected",
            Status::WouldDeadlock => "Main thread would deadlock",
            Status::NoExternalBuffersAllowed => "External buffers are not allowed",
            Status::CannotRunJs => "Cannot run JavaScript",
        };
        f.write_str(msg)
    }
}

//! Leveled logging for the Node-API host
//!
//! Every line is tagged `[NodeApiHost]` so host output can be told apart
//! from the embedding app's own logs.
//!
//! # Environment Variables
//!
//! - `NAPI_HOST_LOG_LEVEL=<level>` - 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `NAPI_HOST_FLUSH_LOG=1` - Flush after each line (useful for debugging crashes)
//!
//! # Usage
//!
//! ```ignore
//! use napi_host_core::{log_debug, log_error};
//!
//! log_debug!("threadsafe function {} created", id);
//! log_error!("no call invoker for env {:p}", env);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Tag prepended to every line
pub const TAG: &str = "[NodeApiHost]";

/// Log levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit, as accepted in `NAPI_HOST_LOG_LEVEL`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }

    /// Level used when nothing is configured
    pub const fn default_level() -> Self {
        if cfg!(debug_assertions) {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }
}

/// Receives every emitted record, in addition to the platform output
pub type LogSink = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::default_level() as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static SINK: Lazy<RwLock<Option<LogSink>>> = Lazy::new(|| RwLock::new(None));

/// Initialize logging from environment variables
///
/// Called automatically on first log. Values set programmatically before
/// the first log are overwritten only when the variable is present.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    if let Ok(val) = std::env::var("NAPI_HOST_FLUSH_LOG") {
        let flush = matches!(val.as_str(), "1" | "true" | "yes" | "on");
        FLUSH_ENABLED.store(flush, Ordering::Relaxed);
    }

    if let Ok(val) = std::env::var("NAPI_HOST_LOG_LEVEL") {
        if let Some(level) = LogLevel::parse(&val) {
            LOG_LEVEL.store(level as u8, Ordering::Relaxed);
        }
    }
}

#[inline]
pub fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically
pub fn set_log_level(level: LogLevel) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Set flush mode programmatically
pub fn set_flush_enabled(enabled: bool) {
    init();
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level as u8 <= log_level() as u8
}

/// Install a capture sink, replacing any previous one
pub fn set_sink(sink: LogSink) {
    *SINK.write() = Some(sink);
}

/// Remove the capture sink
pub fn clear_sink() {
    *SINK.write() = None;
}

fn write_platform(level: LogLevel, line: &str) {
    cfg_if::cfg_if! {
        if #[cfg(any(target_vendor = "apple", target_os = "android"))] {
            let out = std::io::stderr();
        } else {
            let out = std::io::stdout();
        }
    }
    let mut handle = out.lock();
    let _ = writeln!(handle, "{} {} {}", TAG, level.prefix(), line);
    if flush_enabled() {
        let _ = handle.flush();
    }
}

/// Internal: leveled print
#[doc(hidden)]
pub fn _log_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let line = args.to_string();

    // Clone out so the sink runs without the lock held
    let sink = SINK.read().clone();
    if let Some(sink) = sink {
        sink(level, &line);
    }

    write_platform(level, &line);
}

// ============================================================================
// Public Macros
// ============================================================================

/// Error level log (shown unless logging is off)
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        $crate::logger::_log_impl(
            $crate::logger::LogLevel::Error,
            format_args!($($arg)*)
        );
    }};
}

/// Warning level log
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::logger::_log_impl(
            $crate::logger::LogLevel::Warn,
            format_args!($($arg)*)
        );
    }};
}

/// Info level log
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::logger::_log_impl(
            $crate::logger::LogLevel::Info,
            format_args!($($arg)*)
        );
    }};
}

/// Debug level log
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        $crate::logger::_log_impl(
            $crate::logger::LogLevel::Debug,
            format_args!($($arg)*)
        );
    }};
}

/// Trace level log (most verbose)
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        $crate::logger::_log_impl(
            $crate::logger::LogLevel::Trace,
            format_args!($($arg)*)
        );
    }};
}

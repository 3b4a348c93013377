//! Runtime configuration

use std::time::Duration;

use napi_host_core::logger::{self, LogLevel};
use once_cell::sync::OnceCell;

/// How threadsafe-function dispatch tasks are submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// `invoke_async`: the producer returns as soon as the item is queued
    #[default]
    Async,
    /// `invoke_sync`: the producer waits until the item was delivered
    Sync,
}

/// Configuration for the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Default delivery mode for new threadsafe functions
    pub delivery: DeliveryMode,

    /// Log level applied on `configure`
    pub log_level: LogLevel,

    /// Flush log output after every line
    pub flush_logs: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryMode::Async,
            log_level: LogLevel::default_level(),
            flush_logs: false,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `NAPI_HOST_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(val) = lookup("NAPI_HOST_SYNC_DELIVERY") {
            if is_truthy(&val) {
                config.delivery = DeliveryMode::Sync;
            }
        }
        if let Some(level) = lookup("NAPI_HOST_LOG_LEVEL").and_then(|v| LogLevel::parse(&v)) {
            config.log_level = level;
        }
        if let Some(val) = lookup("NAPI_HOST_FLUSH_LOG") {
            config.flush_logs = is_truthy(&val);
        }
        config
    }

    /// Set delivery mode
    pub fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = mode;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Enable or disable per-line flushing
    pub fn flush_logs(mut self, enable: bool) -> Self {
        self.flush_logs = enable;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.flush_logs && self.log_level == LogLevel::Off {
            return Err("flush_logs requires logging to be enabled");
        }
        Ok(())
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(val.trim(), "1" | "true" | "yes" | "on")
}

static CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

/// Install the process-wide configuration
///
/// Succeeds once; later calls (or a call after `config()` already fell back
/// to the environment) are rejected.
pub fn configure(config: RuntimeConfig) -> Result<(), &'static str> {
    config.validate()?;
    CONFIG
        .set(config)
        .map_err(|_| "runtime already configured")?;
    logger::set_log_level(config.log_level);
    logger::set_flush_enabled(config.flush_logs);
    Ok(())
}

/// The installed configuration, or one read from the environment
pub fn config() -> RuntimeConfig {
    *CONFIG.get_or_init(RuntimeConfig::from_env)
}

/// Configuration for a `ThreadInvoker`
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Thread name
    /// Default: "napi-js"
    pub thread_name: String,

    /// Stack size for the interpreter thread (None = system default)
    pub stack_size: Option<usize>,

    /// Maximum time the idle thread parks before re-checking its queue
    /// Default: 10ms
    pub park_timeout: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            thread_name: "napi-js".into(),
            stack_size: None,
            park_timeout: Duration::from_millis(10),
        }
    }
}

impl InvokerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set thread name
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set stack size
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Set idle park timeout
    pub fn park_timeout(mut self, d: Duration) -> Self {
        self.park_timeout = d;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.thread_name.is_empty() {
            return Err("thread_name must not be empty");
        }
        if self.thread_name.contains('\0') {
            return Err("thread_name must not contain NUL");
        }
        if matches!(self.stack_size, Some(n) if n < 64 * 1024) {
            return Err("stack_size must be at least 64KiB");
        }
        if self.park_timeout.is_zero() {
            return Err("park_timeout must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.delivery, DeliveryMode::Async);
        assert_eq!(config.log_level, LogLevel::default_level());
        assert!(!config.flush_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("NAPI_HOST_SYNC_DELIVERY", "1"),
            ("NAPI_HOST_LOG_LEVEL", "trace"),
            ("NAPI_HOST_FLUSH_LOG", "yes"),
        ]));
        assert_eq!(config.delivery, DeliveryMode::Sync);
        assert_eq!(config.log_level, LogLevel::Trace);
        assert!(config.flush_logs);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("NAPI_HOST_SYNC_DELIVERY", "maybe"),
            ("NAPI_HOST_LOG_LEVEL", "verbose"),
        ]));
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_builder_and_validate() {
        let config = RuntimeConfig::new()
            .delivery(DeliveryMode::Sync)
            .log_level(LogLevel::Off)
            .flush_logs(true);
        assert!(config.validate().is_err());
        assert!(config.flush_logs(false).validate().is_ok());
    }

    #[test]
    fn test_invoker_config_validate() {
        assert!(InvokerConfig::default().validate().is_ok());
        assert!(InvokerConfig::new().thread_name("").validate().is_err());
        assert!(InvokerConfig::new().stack_size(1024).validate().is_err());
        assert!(InvokerConfig::new()
            .park_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(InvokerConfig::new()
            .thread_name("js")
            .stack_size(1 << 20)
            .validate()
            .is_ok());
    }
}

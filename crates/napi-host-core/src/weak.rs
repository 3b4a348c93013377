//! Swappable process-wide host
//!
//! Extension code links against these forwarders instead of against an
//! engine. The embedder injects a `HostTable` at startup (and may swap it
//! later); each forwarder copies the current entry out of the table and
//! calls it with the lock released.
//!
//! With the `export-symbols` feature the forwarders are exported under
//! their C names so prebuilt extensions resolve against them.

use libc::{c_char, c_void};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::abi::*;
use crate::fatal;
use crate::host::HostTable;
use crate::status::Status;

static HOST: Lazy<RwLock<HostTable>> = Lazy::new(|| RwLock::new(HostTable::default()));

/// Replace the process-wide host table
pub fn inject_host(table: HostTable) {
    crate::log_debug!("injecting host with {} entries", table.provided());
    *HOST.write() = table;
}

/// Copy of the current process-wide host table
pub fn injected_host() -> HostTable {
    *HOST.read()
}

macro_rules! define_weak_forwarders {
    ($($name:ident($($arg:ident: $ty:ty),* $(,)?);)*) => {
        $(
            #[cfg_attr(feature = "export-symbols", no_mangle)]
            pub unsafe extern "C" fn $name($($arg: $ty),*) -> Status {
                let entry = HOST.read().$name;
                match entry {
                    Some(f) => f($($arg),*),
                    None => {
                        crate::log_error!(
                            "{} is not provided by the injected host",
                            stringify!($name)
                        );
                        Status::GenericFailure
                    }
                }
            }
        )*
    };
}

node_api_functions!(define_weak_forwarders);

/// Report an unrecoverable error and terminate the process
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "C" fn napi_fatal_error(
    location: *const c_char,
    location_len: usize,
    message: *const c_char,
    message_len: usize,
) -> ! {
    let location = fatal::string_from_raw(location, location_len);
    let message = fatal::string_from_raw(message, message_len);
    fatal::fatal_error(&location, &message)
}

/// Register a module with the injected host
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "C" fn napi_module_register(module: *mut napi_module) {
    let entry = HOST.read().napi_module_register;
    match entry {
        Some(f) => f(module),
        None => {
            crate::log_error!("napi_module_register is not provided by the injected host");
            std::process::abort();
        }
    }
}

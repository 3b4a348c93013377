//! Node-API function table
//!
//! A `HostTable` describes one complete Node-API implementation as a set of
//! optional entry points. The engine supplies one, the runtime supplies the
//! threadsafe-function and async-work entries, and the multiplexer builds
//! one that forwards through wrapped handles.

use core::fmt;

use libc::c_void;

use crate::abi::*;
use crate::status::Status;

macro_rules! define_host_table {
    ($($name:ident($($arg:ident: $ty:ty),* $(,)?);)*) => {
        /// Function table for one Node-API host
        ///
        /// Entries left `None` are reported as `generic_failure` by whoever
        /// forwards through the table.
        #[derive(Clone, Copy, Default)]
        pub struct HostTable {
            $(pub $name: Option<unsafe extern "C" fn($($ty),*) -> Status>,)*
            pub napi_module_register: Option<napi_module_register_fn>,
            pub napi_fatal_error: Option<napi_fatal_error_fn>,
        }

        impl HostTable {
            /// Total number of entry points a table can carry
            pub const ENTRIES: usize = count_entries!($($name)*) + 2;

            /// Merge two tables; populated entries of `over` win
            pub fn overlay(&self, over: &HostTable) -> HostTable {
                HostTable {
                    $($name: over.$name.or(self.$name),)*
                    napi_module_register: over.napi_module_register.or(self.napi_module_register),
                    napi_fatal_error: over.napi_fatal_error.or(self.napi_fatal_error),
                }
            }

            /// Number of populated entries
            pub fn provided(&self) -> usize {
                let mut n = 0;
                $(if self.$name.is_some() { n += 1; })*
                if self.napi_module_register.is_some() { n += 1; }
                if self.napi_fatal_error.is_some() { n += 1; }
                n
            }

            /// Names of the entries left empty
            pub fn missing(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(if self.$name.is_none() { names.push(stringify!($name)); })*
                if self.napi_module_register.is_none() { names.push("napi_module_register"); }
                if self.napi_fatal_error.is_none() { names.push("napi_fatal_error"); }
                names
            }
        }
    };
}

node_api_functions!(define_host_table);

impl fmt::Debug for HostTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTable")
            .field("provided", &self.provided())
            .field("entries", &Self::ENTRIES)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn create_object_a(_env: napi_env, _result: *mut napi_value) -> Status {
        Status::Ok
    }

    unsafe extern "C" fn create_object_b(_env: napi_env, _result: *mut napi_value) -> Status {
        Status::GenericFailure
    }

    unsafe extern "C" fn acquire(_func: napi_threadsafe_function) -> Status {
        Status::Ok
    }

    #[test]
    fn test_default_is_empty() {
        let table = HostTable::default();
        assert_eq!(table.provided(), 0);
        assert_eq!(table.missing().len(), HostTable::ENTRIES);
    }

    #[test]
    fn test_overlay_prefers_overlay_entries() {
        let base = HostTable {
            napi_create_object: Some(create_object_a),
            ..HostTable::default()
        };
        let over = HostTable {
            napi_create_object: Some(create_object_b),
            napi_acquire_threadsafe_function: Some(acquire),
            ..HostTable::default()
        };

        let merged = base.overlay(&over);
        assert_eq!(merged.provided(), 2);
        let f = merged.napi_create_object.unwrap();
        let status = unsafe { f(core::ptr::null_mut(), core::ptr::null_mut()) };
        assert_eq!(status, Status::GenericFailure);

        // Empty overlay keeps the base
        let kept = base.overlay(&HostTable::default());
        let f = kept.napi_create_object.unwrap();
        assert_eq!(unsafe { f(core::ptr::null_mut(), core::ptr::null_mut()) }, Status::Ok);
    }

    #[test]
    fn test_missing_names() {
        let table = HostTable {
            napi_create_object: Some(create_object_a),
            ..HostTable::default()
        };
        let missing = table.missing();
        assert!(!missing.contains(&"napi_create_object"));
        assert!(missing.contains(&"napi_call_threadsafe_function"));
        assert!(missing.contains(&"napi_fatal_error"));
    }

    #[test]
    fn test_debug() {
        let debug = format!("{:?}", HostTable::default());
        assert!(debug.contains("provided: 0"));
    }
}

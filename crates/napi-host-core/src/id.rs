//! Handle identifiers
//!
//! External handles are numeric ids, not object addresses. A stale handle
//! therefore misses in its registry instead of aliasing reused memory.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier behind an opaque handle
///
/// The value 0 is reserved as the null handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HandleId(u64);

impl HandleId {
    /// Sentinel for a null handle
    pub const NONE: HandleId = HandleId(0);

    #[inline]
    pub const fn new(id: u64) -> Self {
        HandleId(id)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Encode as an opaque handle pointer
    ///
    /// The pointer is never dereferenced; it only carries the id.
    #[inline]
    pub fn into_raw<T>(self) -> *mut T {
        self.0 as usize as *mut T
    }

    /// Decode an opaque handle pointer
    #[inline]
    pub fn from_raw<T>(raw: *mut T) -> Self {
        HandleId(raw as usize as u64)
    }
}

impl From<u64> for HandleId {
    #[inline]
    fn from(id: u64) -> Self {
        HandleId(id)
    }
}

impl From<HandleId> for u64 {
    #[inline]
    fn from(id: HandleId) -> Self {
        id.0
    }
}

impl fmt::Debug for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "HandleId(NONE)")
        } else {
            write!(f, "HandleId({})", self.0)
        }
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Default for HandleId {
    fn default() -> Self {
        HandleId::NONE
    }
}

/// Monotonic id source; ids start at 1 and are never handed out twice
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next(&self) -> HandleId {
        HandleId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared by every registry, so one id never names two kinds of handle
static HANDLE_IDS: IdAllocator = IdAllocator::new();

/// Next process-unique handle id
#[inline]
pub fn next_handle_id() -> HandleId {
    HANDLE_IDS.next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::napi_threadsafe_function;

    #[test]
    fn test_handle_id_none() {
        assert!(HandleId::NONE.is_none());
        assert!(HandleId::default().is_none());
        assert!(HandleId::new(7).is_some());
    }

    #[test]
    fn test_raw_round_trip() {
        let id = HandleId::new(42);
        let raw: napi_threadsafe_function = id.into_raw();
        assert_eq!(HandleId::from_raw(raw), id);
        assert!(HandleId::from_raw(core::ptr::null_mut::<u8>()).is_none());
    }

    #[test]
    fn test_allocator_monotonic() {
        let ids = IdAllocator::new();
        let a = ids.next();
        let b = ids.next();
        assert_eq!(a.as_u64(), 1);
        assert!(b > a);
    }

    #[test]
    fn test_process_ids_skip_none() {
        let a = next_handle_id();
        let b = next_handle_id();
        assert!(a.is_some());
        assert!(b > a);
    }

    #[test]
    fn test_allocator_concurrent_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..1000).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}

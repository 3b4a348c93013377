//! Raw pointer that may cross threads
//!
//! Node-API hands the host opaque user pointers (data, context, env) that
//! must travel with dispatcher tasks. The host only stores and returns
//! them; whoever dereferences one owns the synchronization contract.

use core::fmt;

#[repr(transparent)]
pub struct SendPtr<T>(pub *mut T);

// Safety: the host never dereferences a SendPtr; it only moves the address
unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    pub const fn new(ptr: *mut T) -> Self {
        SendPtr(ptr)
    }

    #[inline]
    pub const fn null() -> Self {
        SendPtr(core::ptr::null_mut())
    }

    #[inline]
    pub fn get(self) -> *mut T {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

impl<T> PartialEq for SendPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for SendPtr<T> {}

impl<T> fmt::Debug for SendPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SendPtr({:p})", self.0)
    }
}

impl<T> Default for SendPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crosses_threads() {
        let mut value = 7u32;
        let ptr = SendPtr::new(&mut value as *mut u32);
        let addr = std::thread::spawn(move || ptr.get() as usize).join().unwrap();
        assert_eq!(addr, &mut value as *mut u32 as usize);
    }

    #[test]
    fn test_null() {
        let ptr: SendPtr<u8> = SendPtr::default();
        assert!(ptr.is_null());
        assert_eq!(ptr, SendPtr::null());
    }
}

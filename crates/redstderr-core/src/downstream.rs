//! The genuine write primitive, seen from the interceptor's side.

use libc::{c_int, c_void, size_t, ssize_t};

/// C signature of `write(2)`.
pub type WriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;

/// Something that performs a physical transfer without re-entering the
/// interposed `write`.
///
/// Production uses the resolved [`WriteFn`]; tests substitute recorders.
pub trait RawWrite {
    /// Transfer `count` bytes from `buf` to `fd`, returning what `write(2)`
    /// would return.
    ///
    /// # Safety
    ///
    /// `buf` must be valid for reads of `count` bytes.
    unsafe fn raw_write(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t;
}

impl RawWrite for WriteFn {
    #[inline(always)]
    unsafe fn raw_write(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
        (self)(fd, buf, count)
    }
}

impl<W: RawWrite + ?Sized> RawWrite for &W {
    #[inline(always)]
    unsafe fn raw_write(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
        (**self).raw_write(fd, buf, count)
    }
}

/// Reinterpret a resolved symbol address as the `write` signature.
///
/// # Safety
///
/// `addr` must be non-null and point at a function with the `write(2)` ABI.
#[inline(always)]
pub unsafe fn as_write_fn(addr: *mut c_void) -> WriteFn {
    std::mem::transmute::<*mut c_void, WriteFn>(addr)
}

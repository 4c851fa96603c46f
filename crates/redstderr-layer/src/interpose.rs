//! The exported `write`.
//!
//! Linux: a plain `#[no_mangle] write` that `LD_PRELOAD` puts ahead of libc.
//! macOS: a `__DATA,__interpose` tuple that dyld applies to every image but
//! this one, so calls from inside the layer still reach libsystem's `write`.

use libc::{c_int, c_void, size_t, ssize_t};
use redstderr_core::intercept_write;

/// Shared body of the interposed `write` on both platforms.
pub unsafe extern "C" fn write_inception(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    let real = crate::reals::real_write();
    crate::profile::record(fd, count);
    intercept_write(&real, fd, buf, count)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    write_inception(fd, buf, count)
}

#[cfg(target_os = "macos")]
#[repr(C)]
pub struct Interpose {
    pub new_func: *const (),
    pub old_func: *const (),
}

#[cfg(target_os = "macos")]
unsafe impl Sync for Interpose {}

#[cfg(target_os = "macos")]
extern "C" {
    #[link_name = "write"]
    fn real_write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t;
}

#[cfg(target_os = "macos")]
#[link_section = "__DATA,__interpose"]
#[used]
pub static IT_WRITE: Interpose = Interpose {
    new_func: write_inception as _,
    old_func: real_write as _,
};

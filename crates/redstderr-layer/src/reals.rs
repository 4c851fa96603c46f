//! Real Symbol Storage
//!
//! On Linux the genuine `write` is found with `dlsym(RTLD_NEXT)` and kept in
//! [`REAL_WRITE`]. On macOS dyld fills the `old_func` slot of the interpose
//! tuple, so no lookup is needed.

use redstderr_core::downstream::as_write_fn;
use redstderr_core::WriteFn;
#[cfg(not(target_os = "macos"))]
use redstderr_core::{DlsymNext, NextSymbol};

#[cfg(not(target_os = "macos"))]
pub static REAL_WRITE: NextSymbol = NextSymbol::new(c"write");

/// The genuine `write`.
///
/// Resolves on first use if another library's constructor writes before
/// ours has run. Never returns on resolution failure.
#[cfg(not(target_os = "macos"))]
#[inline(always)]
pub unsafe fn real_write() -> WriteFn {
    match REAL_WRITE.resolve(&DlsymNext) {
        Ok(p) => as_write_fn(p),
        Err(e) => crate::state::resolution_failed(&e),
    }
}

#[cfg(target_os = "macos")]
#[inline(always)]
pub unsafe fn real_write() -> WriteFn {
    as_write_fn(crate::interpose::IT_WRITE.old_func as *mut libc::c_void)
}

/// Whether the genuine `write` is available without a lookup.
pub fn is_resolved() -> bool {
    #[cfg(target_os = "macos")]
    {
        true
    }
    #[cfg(not(target_os = "macos"))]
    {
        REAL_WRITE.is_resolved()
    }
}

/// Write diagnostics to fd 2 without going through the interposed `write`.
///
/// Uses the resolved `write` when there is one, otherwise the raw system
/// call, so it is safe to call while reporting a resolution failure.
pub(crate) unsafe fn diag_write(bytes: &[u8]) {
    #[cfg(target_os = "macos")]
    {
        let _ = real_write()(2, bytes.as_ptr().cast(), bytes.len());
    }
    #[cfg(not(target_os = "macos"))]
    {
        match REAL_WRITE.get() {
            Ok(p) => {
                let _ = as_write_fn(p)(2, bytes.as_ptr().cast(), bytes.len());
            }
            Err(_) => raw_stderr(bytes),
        }
    }
}

#[cfg(target_os = "linux")]
unsafe fn raw_stderr(bytes: &[u8]) {
    let _ = libc::syscall(
        libc::SYS_write,
        2 as libc::c_long,
        bytes.as_ptr(),
        bytes.len(),
    );
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
unsafe fn raw_stderr(_bytes: &[u8]) {}

//! # redstderr
//!
//! LD_PRELOAD / DYLD_INSERT_LIBRARIES layer that wraps every non-empty
//! write to fd 2 in ANSI red. Activation is entirely the launcher's job:
//!
//! ```bash
//! LD_PRELOAD=target/release/libredstderr.so some-command
//! DYLD_INSERT_LIBRARIES=target/release/libredstderr.dylib some-command
//! ```
//!
//! # Safety rules for anything reachable from `write`
//!
//! - No heap allocation, no `println!`/`eprintln!` (they re-enter `write`).
//! - No `panic!`; fatal conditions call `libc::abort()`.
//! - Diagnostics go through `reals::diag_write`, never the interposed path.
//!
//! Colored writes are three downstream writes and are not atomic across
//! threads: concurrent stderr writers may interleave color sequences.

// Allow unsafe FFI functions without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]

// Macros must be defined before modules that use them
#[macro_use]
pub mod macros;

pub mod interpose;
pub mod profile;
pub mod reals;
pub mod state;

#[cfg(target_os = "macos")]
pub use interpose::*;
pub use state::LOGGER;

use std::sync::atomic::Ordering;

/// Static constructor for Linux: resolve the genuine `write` and read the
/// environment before the host's `main` runs. Uses the .init_array section.
#[cfg(target_os = "linux")]
#[link_section = ".init_array"]
#[used]
pub static REDSTDERR_INIT_LINUX: unsafe extern "C" fn() = {
    unsafe extern "C" fn init() {
        crate::state::layer_init();
    }
    init
};

/// Static constructor for macOS.
#[cfg(target_os = "macos")]
#[link_section = "__DATA,__mod_init_func"]
#[used]
pub static REDSTDERR_INIT_MACOS: unsafe extern "C" fn() = {
    unsafe extern "C" fn init() {
        crate::state::layer_init();
    }
    init
};

/// Writes a NUL-terminated JSON snapshot of the layer into `buf`.
/// Returns the length written (excluding the NUL), or -1 if `buf` is too small.
#[no_mangle]
pub unsafe extern "C" fn redstderr_get_telemetry(
    buf: *mut libc::c_char,
    buf_size: usize,
) -> libc::c_int {
    use std::fmt::Write;
    if buf.is_null() || buf_size == 0 {
        return -1;
    }

    let mut scratch = [0u8; 1024];
    let mut writer = redstderr_core::fmt::StackWriter::new(&mut scratch);
    let p = &crate::profile::PROFILE;

    let _ = writeln!(writer, "{{");
    let _ = writeln!(writer, "  \"pid\": {},", libc::getpid());
    let _ = writeln!(
        writer,
        "  \"init_state\": \"{}\",",
        crate::state::init_state().name()
    );
    let _ = writeln!(
        writer,
        "  \"downstream_resolved\": {},",
        crate::reals::is_resolved()
    );
    let _ = writeln!(
        writer,
        "  \"profile_enabled\": {},",
        crate::profile::PROFILE_ENABLED.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        writer,
        "  \"colored_calls\": {},",
        p.colored_calls.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        writer,
        "  \"colored_bytes\": {},",
        p.colored_bytes.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        writer,
        "  \"passthrough_calls\": {},",
        p.passthrough_calls.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        writer,
        "  \"zero_length_stderr_calls\": {},",
        p.zero_length_stderr_calls.load(Ordering::Relaxed)
    );
    let _ = writeln!(writer, "  \"log_bytes\": {}", LOGGER.total());
    let _ = write!(writer, "}}");

    if writer.truncated() {
        return -1;
    }
    let out = writer.as_bytes();
    let len = out.len();
    if len >= buf_size {
        return -1;
    }

    std::ptr::copy_nonoverlapping(out.as_ptr(), buf as *mut u8, len);
    *buf.add(len) = 0;

    len as libc::c_int
}

/// Copies the retained layer log to `fd`, bypassing coloring.
/// Returns bytes written, or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn redstderr_dump_log(fd: libc::c_int) -> libc::ssize_t {
    LOGGER.dump(fd)
}

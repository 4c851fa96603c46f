//! Child process for the preload tests.
//!
//! Issues raw `write(2)` calls to fds 2, 1, 2 (empty) and -1, then reports
//! their results on stdout. When `libredstderr` is loaded it also prints the
//! layer's telemetry and dumps its log to stdout.

use libc::{c_char, c_int, c_void, ssize_t};
use std::ffi::CStr;

type TelemetryFn = unsafe extern "C" fn(*mut c_char, usize) -> c_int;
type DumpLogFn = unsafe extern "C" fn(c_int) -> ssize_t;

fn raw_write(fd: c_int, bytes: &[u8]) -> (ssize_t, i32) {
    let ret = unsafe { libc::write(fd, bytes.as_ptr() as *const c_void, bytes.len()) };
    let errno = if ret < 0 {
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    } else {
        0
    };
    (ret, errno)
}

fn lookup(name: &CStr) -> *mut c_void {
    unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) }
}

fn main() {
    let (stderr_ret, _) = raw_write(2, b"hello");
    let (stdout_ret, _) = raw_write(1, b"hello");
    let (empty_ret, _) = raw_write(2, b"");
    let (bad_ret, bad_errno) = raw_write(-1, b"x");

    println!();
    println!(
        "results: {} {} {} {} errno={}",
        stderr_ret, stdout_ret, empty_ret, bad_ret, bad_errno
    );

    let telemetry = lookup(c"redstderr_get_telemetry");
    if telemetry.is_null() {
        println!("telemetry: absent");
    } else {
        let f = unsafe { std::mem::transmute::<*mut c_void, TelemetryFn>(telemetry) };
        let mut buf = [0 as c_char; 1024];
        let n = unsafe { f(buf.as_mut_ptr(), buf.len()) };
        if n < 0 {
            println!("telemetry: error");
        } else {
            let json = unsafe { CStr::from_ptr(buf.as_ptr()) };
            println!("telemetry: {}", json.to_string_lossy().replace('\n', " "));
        }
    }

    let dump = lookup(c"redstderr_dump_log");
    if !dump.is_null() {
        let f = unsafe { std::mem::transmute::<*mut c_void, DumpLogFn>(dump) };
        let n = unsafe { f(1) };
        println!("dump: {}", n);
    }
}

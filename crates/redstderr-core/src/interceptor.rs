//! The interposed `write` decision.

use crate::ansi::{COLOR_RESET, COLOR_START};
use crate::downstream::RawWrite;
use libc::{c_int, c_void, size_t, ssize_t};

pub const STDERR_FD: c_int = libc::STDERR_FILENO;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Wrapped in color start / reset.
    Colored,
    /// Handed to the downstream `write` untouched.
    Passthrough,
}

/// Only non-empty writes to fd 2 are colored.
#[inline(always)]
pub fn route(fd: c_int, count: size_t) -> Route {
    if fd == STDERR_FD && count > 0 {
        Route::Colored
    } else {
        Route::Passthrough
    }
}

/// Perform one interposed `write` against `real`.
///
/// Colored writes emit `COLOR_START`, the payload and `COLOR_RESET` as three
/// separate downstream transfers. Their results are ignored and the caller
/// is told `count` bytes were written: the control bytes are not part of
/// the caller's payload, and a short or failed sub-write is not reported.
///
/// Passthrough writes return the downstream result as is, errno included.
///
/// # Safety
///
/// `buf` must be valid for reads of `count` bytes.
#[inline]
pub unsafe fn intercept_write<W: RawWrite + ?Sized>(
    real: &W,
    fd: c_int,
    buf: *const c_void,
    count: size_t,
) -> ssize_t {
    match route(fd, count) {
        Route::Colored => {
            let _ = real.raw_write(fd, COLOR_START.as_ptr().cast(), COLOR_START.len());
            let _ = real.raw_write(fd, buf, count);
            let _ = real.raw_write(fd, COLOR_RESET.as_ptr().cast(), COLOR_RESET.len());
            count as ssize_t
        }
        Route::Passthrough => real.raw_write(fd, buf, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records each downstream transfer and answers with `reply`
    /// (`None` means "wrote everything").
    struct Recorder {
        transfers: RefCell<Vec<(c_int, Vec<u8>)>>,
        reply: Option<ssize_t>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                transfers: RefCell::new(Vec::new()),
                reply: None,
            }
        }

        fn replying(reply: ssize_t) -> Self {
            Self {
                transfers: RefCell::new(Vec::new()),
                reply: Some(reply),
            }
        }

        fn transfers(&self) -> Vec<(c_int, Vec<u8>)> {
            self.transfers.borrow().clone()
        }
    }

    impl RawWrite for Recorder {
        unsafe fn raw_write(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
            let bytes = if count == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(buf as *const u8, count).to_vec()
            };
            self.transfers.borrow_mut().push((fd, bytes));
            self.reply.unwrap_or(count as ssize_t)
        }
    }

    fn write(real: &Recorder, fd: c_int, payload: &[u8]) -> ssize_t {
        unsafe { intercept_write(real, fd, payload.as_ptr().cast(), payload.len()) }
    }

    #[test]
    fn test_route() {
        assert_eq!(route(2, 1), Route::Colored);
        assert_eq!(route(2, 0), Route::Passthrough);
        assert_eq!(route(1, 5), Route::Passthrough);
        assert_eq!(route(-1, 5), Route::Passthrough);
    }

    #[test]
    fn test_stderr_hello_is_three_transfers() {
        let rec = Recorder::new();
        assert_eq!(write(&rec, 2, b"hello"), 5);
        assert_eq!(
            rec.transfers(),
            vec![
                (2, b"\x1b[31m".to_vec()),
                (2, b"hello".to_vec()),
                (2, b"\x1b[0m".to_vec()),
            ]
        );
    }

    #[test]
    fn test_stdout_hello_is_one_transfer() {
        let rec = Recorder::new();
        assert_eq!(write(&rec, 1, b"hello"), 5);
        assert_eq!(rec.transfers(), vec![(1, b"hello".to_vec())]);
    }

    #[test]
    fn test_zero_length_stderr_is_delegated() {
        let rec = Recorder::new();
        assert_eq!(write(&rec, 2, b""), 0);
        assert_eq!(rec.transfers(), vec![(2, Vec::new())]);
    }

    #[test]
    fn test_colored_count_excludes_control_bytes() {
        // Downstream claims a short write; the caller still sees its count.
        let rec = Recorder::replying(1);
        assert_eq!(write(&rec, 2, b"payload"), 7);
        assert_eq!(rec.transfers().len(), 3);
    }

    #[test]
    fn test_colored_failures_are_masked() {
        let rec = Recorder::replying(-1);
        assert_eq!(write(&rec, 2, b"oops"), 4);
    }

    #[test]
    fn test_passthrough_propagates_downstream_result() {
        let rec = Recorder::replying(-1);
        assert_eq!(write(&rec, 1, b"hello"), -1);

        let rec = Recorder::replying(3);
        assert_eq!(write(&rec, 7, b"hello"), 3);
    }

    #[test]
    fn test_payload_is_not_modified() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let rec = Recorder::new();
        assert_eq!(write(&rec, 2, &payload), 256);
        assert_eq!(rec.transfers()[1].1, payload);
    }
}

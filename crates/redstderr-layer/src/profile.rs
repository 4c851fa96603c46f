//! Per-route call counters.
//!
//! Zero-overhead when disabled (REDSTDERR_PROFILE unset): one relaxed load
//! per write. When enabled, the totals are logged at exit and exposed through
//! `redstderr_get_telemetry`.

use redstderr_core::{Route, STDERR_FD};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Master enable flag, set from the environment at load time.
pub static PROFILE_ENABLED: AtomicBool = AtomicBool::new(false);

pub static PROFILE: LayerProfile = LayerProfile::new();

#[repr(C)]
pub struct LayerProfile {
    pub colored_calls: AtomicU64,
    /// Payload bytes only; control sequences are not counted.
    pub colored_bytes: AtomicU64,
    pub passthrough_calls: AtomicU64,
    pub zero_length_stderr_calls: AtomicU64,
}

impl LayerProfile {
    pub const fn new() -> Self {
        Self {
            colored_calls: AtomicU64::new(0),
            colored_bytes: AtomicU64::new(0),
            passthrough_calls: AtomicU64::new(0),
            zero_length_stderr_calls: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn record(&self, route: Route, fd: libc::c_int, count: libc::size_t) {
        match route {
            Route::Colored => {
                self.colored_calls.fetch_add(1, Ordering::Relaxed);
                self.colored_bytes.fetch_add(count as u64, Ordering::Relaxed);
            }
            Route::Passthrough => {
                self.passthrough_calls.fetch_add(1, Ordering::Relaxed);
                if fd == STDERR_FD {
                    self.zero_length_stderr_calls.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

impl Default for LayerProfile {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
pub fn record(fd: libc::c_int, count: libc::size_t) {
    if PROFILE_ENABLED.load(Ordering::Relaxed) {
        PROFILE.record(redstderr_core::route(fd, count), fd, count);
    }
}

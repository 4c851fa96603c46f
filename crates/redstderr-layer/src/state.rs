// =============================================================================
// state.rs — load-time initialization and process-wide layer state
// =============================================================================
//
// Everything here runs inside whatever process the layer was preloaded into,
// often before its allocator or Rust runtime is in a usable state:
//
//   - no heap allocation (String, Vec, Box) on any path reachable from write()
//   - no println!/eprintln!: they would re-enter the interposed write()
//   - diagnostics go through reals::diag_write(), which bypasses interposition
// =============================================================================

use redstderr_core::fmt::StackWriter;
use redstderr_core::{LayerConfig, LogLevel, ResolveError};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// Constructor has not run yet. A write arriving now resolves lazily.
    Loading = 0,
    /// Downstream `write` resolved, config read.
    Ready = 1,
    /// Resolution failed; the process is aborting.
    Failed = 2,
}

impl InitState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Ready,
            2 => Self::Failed,
            _ => Self::Loading,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
        }
    }
}

pub(crate) static INIT_STATE: AtomicU8 = AtomicU8::new(InitState::Loading as u8);
pub(crate) static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
pub static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn init_state() -> InitState {
    InitState::from_u8(INIT_STATE.load(Ordering::Acquire))
}

#[inline(always)]
pub fn log_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && LOG_LEVEL.load(Ordering::Relaxed) <= level as u8
}

/// Load-time constructor body. Runs once, before the host's `main`.
pub(crate) unsafe extern "C" fn layer_init() {
    if INIT_STATE.load(Ordering::Acquire) != InitState::Loading as u8 {
        return;
    }

    let config = LayerConfig::from_env();
    apply_config(&config);

    #[cfg(not(target_os = "macos"))]
    {
        use redstderr_core::DlsymNext;
        match crate::reals::REAL_WRITE.resolve(&DlsymNext) {
            Ok(addr) => layer_debug!(
                "resolved downstream {} at {:p}",
                crate::reals::REAL_WRITE.name().to_string_lossy(),
                addr
            ),
            Err(e) => resolution_failed(&e),
        }
    }

    INIT_STATE.store(InitState::Ready as u8, Ordering::Release);
    layer_info!(
        "layer ready (log_level={}, debug={}, profile={})",
        config.log_level.tag(),
        config.debug,
        config.profile
    );

    if config.profile {
        libc::atexit(report_profile_atexit);
    }
}

fn apply_config(config: &LayerConfig) {
    DEBUG_ENABLED.store(config.debug, Ordering::Relaxed);
    LOG_LEVEL.store(config.log_level as u8, Ordering::Relaxed);
    crate::profile::PROFILE_ENABLED.store(config.profile, Ordering::Relaxed);
}

/// Fail fast: report why the genuine `write` is missing, then abort rather
/// than ever call through a null pointer.
#[cold]
pub(crate) fn resolution_failed(err: &ResolveError) -> ! {
    INIT_STATE.store(InitState::Failed as u8, Ordering::Release);

    let mut buf = [0u8; 256];
    let mut w = StackWriter::new(&mut buf);
    let _ = err.write_fatal(&mut w);
    LOGGER.log(w.as_bytes());
    unsafe {
        crate::reals::diag_write(w.as_bytes());
        libc::abort()
    }
}

extern "C" fn report_profile_atexit() {
    let p = &crate::profile::PROFILE;
    layer_info!(
        "profile: colored_calls={} colored_bytes={} passthrough_calls={} zero_length_stderr_calls={}",
        p.colored_calls.load(Ordering::Relaxed),
        p.colored_bytes.load(Ordering::Relaxed),
        p.passthrough_calls.load(Ordering::Relaxed),
        p.zero_length_stderr_calls.load(Ordering::Relaxed)
    );
}

/// Append a formatted line to the ring buffer, echoing it to fd 2 when
/// `REDSTDERR_DEBUG` is set.
pub(crate) fn emit_log(msg: &[u8]) {
    LOGGER.log(msg);
    if DEBUG_ENABLED.load(Ordering::Relaxed) {
        unsafe { crate::reals::diag_write(msg) };
    }
}

// ============================================================================
// Zero-allocation ring-buffer logger
// ============================================================================

pub(crate) const LOG_BUF_SIZE: usize = 64 * 1024;

/// Lock-free byte ring. Concurrent writers reserve disjoint ranges with a
/// single `fetch_add`; once the ring wraps, the oldest bytes are overwritten.
pub struct Logger {
    buffer: [AtomicU8; LOG_BUF_SIZE],
    pub(crate) head: AtomicUsize,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub const fn new() -> Self {
        Self {
            buffer: [const { AtomicU8::new(0) }; LOG_BUF_SIZE],
            head: AtomicUsize::new(0),
        }
    }

    pub(crate) fn log(&self, msg: &[u8]) {
        let len = msg.len();
        if len > LOG_BUF_SIZE {
            return;
        }

        let start = self.head.fetch_add(len, Ordering::SeqCst);
        for (i, b) in msg.iter().enumerate() {
            self.buffer[(start + i) % LOG_BUF_SIZE].store(*b, Ordering::Relaxed);
        }
    }

    /// Total bytes ever logged, including those since overwritten.
    pub fn total(&self) -> usize {
        self.head.load(Ordering::SeqCst)
    }

    /// Copy the retained log, oldest first, to `fd` via the genuine `write`.
    /// Returns the number of bytes written or -1 on the first failure.
    pub(crate) unsafe fn dump(&self, fd: libc::c_int) -> libc::ssize_t {
        let head = self.head.load(Ordering::SeqCst);
        let start = head.saturating_sub(LOG_BUF_SIZE);
        let real = crate::reals::real_write();

        let mut chunk = [0u8; 512];
        let mut written: libc::ssize_t = 0;
        let mut i = start;
        while i < head {
            let n = std::cmp::min(chunk.len(), head - i);
            for (j, slot) in chunk[..n].iter_mut().enumerate() {
                *slot = self.buffer[(i + j) % LOG_BUF_SIZE].load(Ordering::Relaxed);
            }
            let mut off = 0;
            while off < n {
                let ret = real(fd, chunk[off..].as_ptr().cast(), n - off);
                if ret <= 0 {
                    return -1;
                }
                off += ret as usize;
            }
            written += n as libc::ssize_t;
            i += n;
        }
        written
    }
}

pub static LOGGER: Logger = Logger::new();

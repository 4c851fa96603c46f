//! Level-gated, allocation-free logging into the layer's ring buffer.
//!
//! # Usage:
//! ```ignore
//! layer_debug!("resolved downstream write at {:p}", addr);
//! ```

#[macro_export]
macro_rules! layer_log_at_level {
    ($level:expr, $($arg:tt)*) => {
        {
            let level: redstderr_core::LogLevel = $level;
            if $crate::state::log_enabled(level) {
                // Stack-based formatting to avoid heap allocation
                use std::fmt::Write;
                let mut buf = [0u8; 512];
                let mut wrapper = redstderr_core::fmt::StackWriter::new(&mut buf);
                let pid = unsafe { libc::getpid() };
                let _ = write!(wrapper, "[REDSTDERR][{}][{}] ", pid, level.tag());
                let _ = write!(wrapper, $($arg)*);
                let _ = writeln!(wrapper);
                $crate::state::emit_log(wrapper.as_bytes());
            }
        }
    };
}

#[macro_export]
macro_rules! layer_trace { ($($arg:tt)*) => { $crate::layer_log_at_level!(redstderr_core::LogLevel::Trace, $($arg)*) }; }
#[macro_export]
macro_rules! layer_debug { ($($arg:tt)*) => { $crate::layer_log_at_level!(redstderr_core::LogLevel::Debug, $($arg)*) }; }
#[macro_export]
macro_rules! layer_info { ($($arg:tt)*) => { $crate::layer_log_at_level!(redstderr_core::LogLevel::Info, $($arg)*) }; }
#[macro_export]
macro_rules! layer_warn { ($($arg:tt)*) => { $crate::layer_log_at_level!(redstderr_core::LogLevel::Warn, $($arg)*) }; }
#[macro_export]
macro_rules! layer_error { ($($arg:tt)*) => { $crate::layer_log_at_level!(redstderr_core::LogLevel::Error, $($arg)*) }; }

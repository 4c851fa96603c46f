//! Runtime settings read from the environment at load time.
//!
//! There is no config file. Reads go through `getenv` and borrow the
//! environment block directly, so nothing allocates before the layer is
//! fully initialized. None of these settings affect coloring.

use std::ffi::CStr;

/// Echo layer log lines to fd 2 (uncolored, through the genuine `write`).
pub const ENV_DEBUG: &CStr = c"REDSTDERR_DEBUG";
/// Minimum level for the in-memory log: `trace|debug|info|warn|error|off`.
pub const ENV_LOG_LEVEL: &CStr = c"REDSTDERR_LOG_LEVEL";
/// Maintain per-route call counters.
pub const ENV_PROFILE: &CStr = c"REDSTDERR_PROFILE";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }

    /// Case-insensitive parse; anything unrecognized means `Info`.
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.eq_ignore_ascii_case(b"trace") {
            LogLevel::Trace
        } else if bytes.eq_ignore_ascii_case(b"debug") {
            LogLevel::Debug
        } else if bytes.eq_ignore_ascii_case(b"info") {
            LogLevel::Info
        } else if bytes.eq_ignore_ascii_case(b"warn") {
            LogLevel::Warn
        } else if bytes.eq_ignore_ascii_case(b"error") {
            LogLevel::Error
        } else if bytes.eq_ignore_ascii_case(b"off") {
            LogLevel::Off
        } else {
            LogLevel::Info
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerConfig {
    pub debug: bool,
    pub log_level: LogLevel,
    pub profile: bool,
}

impl LayerConfig {
    /// Read settings from the process environment.
    ///
    /// # Safety
    ///
    /// Must not race with `setenv`/`putenv` on another thread. The load-time
    /// constructor runs before application threads exist.
    pub unsafe fn from_env() -> Self {
        Self::from_lookup(|name| {
            let ptr = libc::getenv(name.as_ptr());
            if ptr.is_null() {
                None
            } else {
                Some(CStr::from_ptr(ptr).to_bytes())
            }
        })
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// A flag counts as set when the variable exists, whatever its value.
    pub fn from_lookup<'a, F>(mut get: F) -> Self
    where
        F: FnMut(&CStr) -> Option<&'a [u8]>,
    {
        Self {
            debug: get(ENV_DEBUG).is_some(),
            log_level: get(ENV_LOG_LEVEL).map(LogLevel::parse).unwrap_or_default(),
            profile: get(ENV_PROFILE).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a CStr, &'a [u8])]) -> impl FnMut(&CStr) -> Option<&'a [u8]> {
        move |name| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = LayerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, LayerConfig::default());
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert!(!cfg.debug);
        assert!(!cfg.profile);
    }

    #[test]
    fn test_flags_set_by_presence() {
        let vars: [(&CStr, &[u8]); 2] = [(ENV_DEBUG, b""), (ENV_PROFILE, b"0")];
        let cfg = LayerConfig::from_lookup(lookup(&vars));
        assert!(cfg.debug);
        assert!(cfg.profile);
    }

    #[test]
    fn test_log_level_parse_is_case_insensitive() {
        let vars: [(&CStr, &[u8]); 1] = [(ENV_LOG_LEVEL, b"DeBuG")];
        let cfg = LayerConfig::from_lookup(lookup(&vars));
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(LogLevel::parse(b"verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse(b""), LogLevel::Info);
        assert_eq!(LogLevel::parse(b"off"), LogLevel::Off);
    }

    #[test]
    fn test_from_u8_matches_discriminants() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Off,
        ] {
            assert_eq!(LogLevel::from_u8(level as u8), level);
        }
        assert_eq!(LogLevel::from_u8(200), LogLevel::Off);
    }
}

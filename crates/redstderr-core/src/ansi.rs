//! Terminal control sequences injected around stderr payloads.

/// `ESC [ 3 1 m`: select red foreground.
pub const COLOR_START: &[u8] = b"\x1b[31m";

/// `ESC [ 0 m`: reset to default rendition.
pub const COLOR_RESET: &[u8] = b"\x1b[0m";

/// Bytes one colored write adds to the physical stream but not to its
/// reported count.
pub const OVERHEAD: usize = COLOR_START.len() + COLOR_RESET.len();

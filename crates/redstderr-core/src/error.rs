//! Error types for symbol resolution.

use std::ffi::CStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// `dlsym(RTLD_NEXT, ..)` found nothing after this library.
    #[error("no downstream `{}` found after this library in the symbol chain", .symbol.to_string_lossy())]
    SymbolNotFound { symbol: &'static CStr },
    /// The handle was read before load-time resolution ran.
    #[error("`{}` used before load-time resolution", .symbol.to_string_lossy())]
    NotResolved { symbol: &'static CStr },
}

impl ResolveError {
    pub fn symbol(&self) -> &'static CStr {
        match self {
            Self::SymbolNotFound { symbol } | Self::NotResolved { symbol } => symbol,
        }
    }

    /// The one-line diagnostic printed before aborting.
    pub fn write_fatal<W: std::fmt::Write>(&self, out: &mut W) -> std::fmt::Result {
        writeln!(
            out,
            "[redstderr] fatal: cannot interpose `{}`: {}",
            self.symbol().to_string_lossy(),
            self
        )
    }
}

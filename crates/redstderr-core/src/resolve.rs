//! Next-in-chain symbol resolution.
//!
//! [`SymbolLookup`] answers "which implementation of this symbol would the
//! process have bound to if this library were not loaded"; [`DlsymNext`]
//! answers it with `dlsym(RTLD_NEXT, ..)`. [`NextSymbol`] stores the answer
//! once and hands it out to every later caller.

use crate::error::ResolveError;
use libc::c_void;
use std::ffi::CStr;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

pub trait SymbolLookup {
    /// Address of the next implementation of `symbol`, or null.
    ///
    /// # Safety
    ///
    /// Implementations may call into the dynamic loader; callers must not
    /// hold loader locks.
    unsafe fn lookup_next(&self, symbol: &CStr) -> *mut c_void;
}

/// Production lookup: the next occurrence after the calling object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlsymNext;

impl SymbolLookup for DlsymNext {
    unsafe fn lookup_next(&self, symbol: &CStr) -> *mut c_void {
        libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr())
    }
}

/// Write-once handle to the downstream implementation of one symbol.
///
/// Single writer (the load-time constructor, or the first caller if some
/// other library's constructor writes before ours runs), many readers.
/// Once published with Release ordering the address never changes, so the
/// hot path is a single Acquire load.
pub struct NextSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static CStr,
    lookups: AtomicUsize,
}

impl NextSymbol {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            name,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }

    pub fn is_resolved(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    /// How many times the underlying lookup has been consulted.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// The published address, without resolving.
    pub fn get(&self) -> Result<*mut c_void, ResolveError> {
        let p = self.ptr.load(Ordering::Acquire);
        if p.is_null() {
            Err(ResolveError::NotResolved { symbol: self.name })
        } else {
            Ok(p)
        }
    }

    /// Resolve through `lookup` unless an address is already published.
    ///
    /// A failed lookup publishes nothing and reports
    /// [`ResolveError::SymbolNotFound`]. If two threads race the first
    /// resolution, the first published address wins and both get it.
    ///
    /// # Safety
    ///
    /// See [`SymbolLookup::lookup_next`].
    pub unsafe fn resolve<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
    ) -> Result<*mut c_void, ResolveError> {
        let p = self.ptr.load(Ordering::Acquire);
        if !p.is_null() {
            return Ok(p);
        }
        self.resolve_slow(lookup)
    }

    #[cold]
    unsafe fn resolve_slow<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
    ) -> Result<*mut c_void, ResolveError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let f = lookup.lookup_next(self.name);
        if f.is_null() {
            return Err(ResolveError::SymbolNotFound { symbol: self.name });
        }
        match self
            .ptr
            .compare_exchange(ptr::null_mut(), f, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(f),
            Err(published) => Ok(published),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::WriteFn;

    struct CountingLookup {
        calls: AtomicUsize,
        addr: *mut c_void,
    }

    impl SymbolLookup for CountingLookup {
        unsafe fn lookup_next(&self, _symbol: &CStr) -> *mut c_void {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.addr
        }
    }

    fn libc_write_addr() -> *mut c_void {
        let f: WriteFn = libc::write;
        f as *mut c_void
    }

    #[test]
    fn test_resolves_exactly_once() {
        let sym = NextSymbol::new(c"write");
        let lookup = CountingLookup {
            calls: AtomicUsize::new(0),
            addr: libc_write_addr(),
        };

        for _ in 0..5 {
            let p = unsafe { sym.resolve(&lookup) }.unwrap();
            assert_eq!(p, libc_write_addr());
        }
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sym.lookups(), 1);
        assert!(sym.is_resolved());
    }

    #[test]
    fn test_missing_symbol_is_an_error() {
        let sym = NextSymbol::new(c"write");
        let lookup = CountingLookup {
            calls: AtomicUsize::new(0),
            addr: ptr::null_mut(),
        };

        let err = unsafe { sym.resolve(&lookup) }.unwrap_err();
        assert_eq!(err, ResolveError::SymbolNotFound { symbol: c"write" });
        assert!(!sym.is_resolved());
        assert_eq!(
            sym.get().unwrap_err(),
            ResolveError::NotResolved { symbol: c"write" }
        );
    }

    #[test]
    fn test_name_is_the_looked_up_symbol() {
        let sym = NextSymbol::new(c"write");
        assert_eq!(sym.name(), c"write");
        let err = unsafe {
            sym.resolve(&CountingLookup {
                calls: AtomicUsize::new(0),
                addr: ptr::null_mut(),
            })
        }
        .unwrap_err();
        assert_eq!(err.symbol(), sym.name());
    }

    #[test]
    fn test_get_before_resolve_reports_not_resolved() {
        let sym = NextSymbol::new(c"write");
        assert!(matches!(sym.get(), Err(ResolveError::NotResolved { .. })));
        assert_eq!(sym.lookups(), 0);
    }

    #[test]
    fn test_dlsym_next_finds_libc_write() {
        // From the test executable, the next `write` is libc's.
        let sym = NextSymbol::new(c"write");
        let p = unsafe { sym.resolve(&DlsymNext) }.unwrap();
        assert!(!p.is_null());
        assert_eq!(sym.get().unwrap(), p);
    }

    #[test]
    fn test_dlsym_next_unknown_symbol() {
        let sym = NextSymbol::new(c"redstderr_definitely_not_a_symbol");
        let err = unsafe { sym.resolve(&DlsymNext) }.unwrap_err();
        assert!(matches!(err, ResolveError::SymbolNotFound { .. }));
    }
}

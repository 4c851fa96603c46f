//! # redstderr-core
//!
//! The interception mechanism behind `libredstderr`: resolve the genuine
//! `write` from further down the dynamic symbol chain, then wrap every
//! non-empty write to fd 2 in ANSI red before handing it on.
//!
//! Nothing here exports C symbols. The preloadable artifact lives in
//! `redstderr-layer`, which wires these pieces to an exported `write`.
//! Keeping the decision logic in a plain rlib lets it run against fake
//! downstreams without recoloring the test harness itself.
//!
//! # Known hazard
//!
//! A colored write is three physical writes (color start, payload, reset).
//! They are not atomic with respect to other threads, so concurrent stderr
//! writers may interleave their sequences and leave mis-nested color codes
//! in the stream.

pub mod ansi;
pub mod config;
pub mod downstream;
pub mod error;
pub mod fmt;
pub mod interceptor;
pub mod resolve;

pub use config::{LayerConfig, LogLevel};
pub use downstream::{RawWrite, WriteFn};
pub use error::ResolveError;
pub use interceptor::{intercept_write, route, Route, STDERR_FD};
pub use resolve::{DlsymNext, NextSymbol, SymbolLookup};

//! Shared foundational types used across the Vesper hardware synthesis toolchain.
//!
//! This crate provides interned identifiers and the common result types used
//! by the IR, the pass framework, and the fuzzer.

#![warn(missing_docs)]

pub mod ident;
pub mod result;

pub use ident::{Ident, Interner};
pub use result::{InternalError, VesperResult};

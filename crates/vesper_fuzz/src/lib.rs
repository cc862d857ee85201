//! Fuzzer sample bundles for the Vesper toolchain.
//!
//! A [`Sample`] carries everything needed to reproduce one fuzzer run: the
//! input source text, the [`SampleOptions`] record controlling the pipeline,
//! a batch of argument vectors, and — for proc samples — the channel names.
//! Samples round-trip through a line-oriented text form and can be emitted
//! as self-contained crasher files.

#![warn(missing_docs)]

pub mod crasher;
pub mod error;
pub mod generator;
pub mod options;
pub mod sample;

pub use crasher::to_crasher_text;
pub use error::SampleError;
pub use generator::generate_arguments;
pub use options::{SampleOptions, SampleType};
pub use sample::Sample;

//! Transformation passes over VesperIR packages, and the pass-pipeline
//! framework that sequences them.
//!
//! A [`Pass`] is a deterministic unit-to-unit transformation reporting
//! whether it changed anything. A [`CompoundPass`] runs an ordered list of
//! children, running every invariant checker after each child. The framework
//! is generic over the unit type so the same machinery drives both plain
//! package passes and scheduling-domain passes.

#![warn(missing_docs)]

pub mod dce;
pub mod inlining;
pub mod pass;
pub mod useless_io;

pub use dce::DeadCodeEliminationPass;
pub use inlining::InliningPass;
pub use pass::{
    CancelSignal, CompoundPass, Pass, PassError, PassInvocation, PassOptions, PassResult,
    PassResults,
};
pub use useless_io::UselessIoRemovalPass;

//! Scheduling-domain passes.
//!
//! A scheduling pass operates on a [`SchedulingUnit`]: a package paired with
//! a per-function pipeline schedule. This crate provides the unit type, an
//! invariant checker, a stage-assignment pass, a wrapper that adapts plain
//! package passes into the scheduling domain, and the standard scheduling
//! pipeline built from all of them.

#![warn(missing_docs)]

pub mod checker;
pub mod pipeline;
pub mod pipeline_scheduling;
pub mod unit;
pub mod wrapper;

pub use checker::SchedulingChecker;
pub use pipeline::create_scheduling_pass_pipeline;
pub use pipeline_scheduling::PipelineSchedulingPass;
pub use unit::{PipelineSchedule, SchedulingUnit};
pub use wrapper::SchedulingWrapperPass;

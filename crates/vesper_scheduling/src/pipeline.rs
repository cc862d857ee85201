//! The standard scheduling pass pipeline.
//!
//! Used by the main driver as well as in testing.

use crate::checker::SchedulingChecker;
use crate::pipeline_scheduling::PipelineSchedulingPass;
use crate::unit::SchedulingUnit;
use crate::wrapper::SchedulingWrapperPass;
use vesper_passes::{CompoundPass, DeadCodeEliminationPass};

/// Builds the standard scheduling pipeline: the scheduling invariant
/// checker, stage assignment, then dead-code elimination adapted into the
/// scheduling domain.
pub fn create_scheduling_pass_pipeline() -> CompoundPass<SchedulingUnit> {
    let mut top = CompoundPass::new("scheduling", "Top level scheduling pass pipeline");
    top.add_invariant_checker(Box::new(SchedulingChecker));

    top.add_pass(Box::new(PipelineSchedulingPass));
    top.add_pass(Box::new(SchedulingWrapperPass::new(Box::new(
        DeadCodeEliminationPass,
    ))));

    top
}

//! The scheduling invariant checker.

use crate::unit::SchedulingUnit;
use std::collections::HashSet;
use vesper_passes::{Pass, PassError, PassOptions, PassResult, PassResults};

/// Verifies that every schedule is consistent with the package: scheduled
/// functions exist, every scheduled node is live, every live node is
/// scheduled, and no node is scheduled before one of its operands.
///
/// Never mutates the unit; intended as an invariant checker on the
/// scheduling pipeline.
pub struct SchedulingChecker;

impl Pass<SchedulingUnit> for SchedulingChecker {
    fn short_name(&self) -> &str {
        "scheduling_checker"
    }

    fn long_name(&self) -> &str {
        "Scheduling invariant checker"
    }

    fn run(
        &self,
        unit: &mut SchedulingUnit,
        _options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let known: HashSet<_> = unit.package.function_ids().into_iter().collect();
        for (fid, schedule) in unit.schedules() {
            if !known.contains(&fid) {
                return Err(PassError::InvariantViolation(format!(
                    "schedule refers to unknown function {fid}"
                )));
            }
            let f = unit.package.function(fid);
            let fname = unit.package.resolve(f.name);
            let live: HashSet<_> = f.node_ids().into_iter().collect();
            for (node, _) in schedule.iter() {
                if !live.contains(&node) {
                    return Err(PassError::InvariantViolation(format!(
                        "schedule of '{fname}' contains node {node} which is not in the function"
                    )));
                }
            }
            for &node in &f.node_ids() {
                if !schedule.contains(node) {
                    return Err(PassError::InvariantViolation(format!(
                        "node {node} of '{fname}' is not scheduled"
                    )));
                }
            }
            for node in f.nodes() {
                let stage = schedule.stage(node.id).unwrap_or(0);
                for &operand in &node.operands {
                    let operand_stage = schedule.stage(operand).unwrap_or(0);
                    if operand_stage > stage {
                        return Err(PassError::InvariantViolation(format!(
                            "node {} of '{fname}' is scheduled in stage {stage} before \
                             its operand {operand} in stage {operand_stage}",
                            node.id
                        )));
                    }
                }
            }
        }
        Ok(false)
    }
}

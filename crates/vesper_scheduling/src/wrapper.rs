//! Adapter that runs a plain package pass inside the scheduling pipeline.

use crate::unit::SchedulingUnit;
use std::collections::{BTreeMap, BTreeSet};
use vesper_ir::{FunctionId, NodeId, Package};
use vesper_passes::{Pass, PassError, PassOptions, PassResult, PassResults};

/// Runs a wrapped package pass and reconciles the schedule afterwards.
///
/// Nodes the wrapped pass removed are dropped from the schedule. Nodes it
/// added are an error by default — the schedule would silently miss them —
/// unless `reschedule_new_nodes` is set, in which case the whole schedule is
/// discarded and a scheduling pass must rerun before the schedule is
/// consumed. The wrapper reports the wrapped pass's changed flag.
pub struct SchedulingWrapperPass {
    wrapped: Box<dyn Pass<Package>>,
    reschedule_new_nodes: bool,
    short_name: String,
    long_name: String,
}

impl SchedulingWrapperPass {
    /// Wraps a pass with `reschedule_new_nodes` disabled.
    pub fn new(wrapped: Box<dyn Pass<Package>>) -> Self {
        Self::with_reschedule(wrapped, false)
    }

    /// Wraps a pass, choosing how added nodes are handled.
    pub fn with_reschedule(wrapped: Box<dyn Pass<Package>>, reschedule_new_nodes: bool) -> Self {
        let short_name = format!("scheduling_{}", wrapped.short_name());
        let long_name = format!("{} (scheduling)", wrapped.long_name());
        Self {
            wrapped,
            reschedule_new_nodes,
            short_name,
            long_name,
        }
    }
}

fn node_sets(package: &Package) -> BTreeMap<FunctionId, BTreeSet<NodeId>> {
    package
        .function_ids()
        .into_iter()
        .map(|fid| {
            (
                fid,
                package.function(fid).node_ids().into_iter().collect(),
            )
        })
        .collect()
}

impl Pass<SchedulingUnit> for SchedulingWrapperPass {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn long_name(&self) -> &str {
        &self.long_name
    }

    fn run(
        &self,
        unit: &mut SchedulingUnit,
        options: &PassOptions,
        results: &mut PassResults,
    ) -> PassResult<bool> {
        let before = node_sets(&unit.package);
        let changed = self.wrapped.run(&mut unit.package, options, results)?;
        let after = node_sets(&unit.package);

        let mut added: Vec<(FunctionId, NodeId)> = Vec::new();
        for (fid, after_nodes) in &after {
            let empty = BTreeSet::new();
            let before_nodes = before.get(fid).unwrap_or(&empty);
            for &node in after_nodes.difference(before_nodes) {
                added.push((*fid, node));
            }
        }
        if !added.is_empty() {
            if self.reschedule_new_nodes {
                log::debug!(
                    "{}: {} nodes added, discarding schedules",
                    self.short_name,
                    added.len()
                );
                unit.clear_schedules();
                return Ok(changed);
            }
            let (fid, node) = added[0];
            return Err(PassError::InvariantViolation(format!(
                "pass '{}' added node {node} to function '{}' with rescheduling disabled",
                self.wrapped.short_name(),
                unit.package.resolve(unit.package.function(fid).name)
            )));
        }

        for (fid, before_nodes) in &before {
            let empty = BTreeSet::new();
            let after_nodes = after.get(fid).unwrap_or(&empty);
            for &node in before_nodes.difference(after_nodes) {
                if let Some(schedule) = unit.schedule_mut(*fid) {
                    schedule.remove_node(node);
                }
            }
        }
        Ok(changed)
    }
}

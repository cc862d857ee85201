//! Stage assignment over the topological order.

use crate::unit::{PipelineSchedule, SchedulingUnit};
use vesper_ir::topo_sort;
use vesper_passes::{Pass, PassOptions, PassResult, PassResults};

/// Assigns every node of every function to a pipeline stage.
///
/// Uses an as-soon-as-possible placement with unit latency: sources land in
/// stage zero and every other node lands one stage after its latest operand.
/// The solver-backed scheduler that balances stages against a clock period
/// lives outside this crate; this pass keeps the pipeline runnable and
/// deterministic without it.
pub struct PipelineSchedulingPass;

impl Pass<SchedulingUnit> for PipelineSchedulingPass {
    fn short_name(&self) -> &str {
        "pipeline_scheduling"
    }

    fn long_name(&self) -> &str {
        "Pipeline scheduling"
    }

    fn run(
        &self,
        unit: &mut SchedulingUnit,
        options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut changed = false;
        for fid in unit.package.function_ids() {
            if options.cancel.is_requested() {
                return Ok(changed);
            }
            let f = unit.package.function(fid);
            let mut schedule = PipelineSchedule::new();
            for node_id in topo_sort(f) {
                let node = f.node(node_id);
                let stage = node
                    .operands
                    .iter()
                    .filter_map(|&operand| schedule.stage(operand))
                    .max()
                    .map_or(0, |deepest| deepest + 1);
                schedule.set_stage(node_id, stage);
            }
            if unit.schedule(fid) != Some(&schedule) {
                unit.set_schedule(fid, schedule);
                changed = true;
            }
        }
        log::debug!("pipeline_scheduling: changed={changed}");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_ir::{BinaryOp, NodeOp, Package, UnaryOp, Value};

    fn run(unit: &mut SchedulingUnit) -> bool {
        PipelineSchedulingPass
            .run(unit, &PassOptions::default(), &mut PassResults::new())
            .unwrap()
    }

    #[test]
    fn stages_follow_dependencies() {
        let mut p = Package::new("pkg");
        let fid = p.create_function("f");
        let b8 = p.types.bits(8);
        let f = p.function_mut(fid);
        let a = f
            .add_node(
                NodeOp::Literal {
                    value: Value::bits(8, 1),
                },
                vec![],
                b8,
            )
            .unwrap();
        let b = f
            .add_node(NodeOp::Unary { op: UnaryOp::Neg }, vec![a], b8)
            .unwrap();
        let c = f
            .add_node(NodeOp::Binary { op: BinaryOp::Add }, vec![a, b], b8)
            .unwrap();
        f.set_return_value(c).unwrap();

        let mut unit = SchedulingUnit::new(p);
        assert!(run(&mut unit));
        let schedule = unit.schedule(fid).unwrap();
        assert_eq!(schedule.stage(a), Some(0));
        assert_eq!(schedule.stage(b), Some(1));
        assert_eq!(schedule.stage(c), Some(2));
        assert_eq!(schedule.stage_count(), 3);
    }

    #[test]
    fn rescheduling_unchanged_package_reports_unchanged() {
        let mut p = Package::new("pkg");
        let fid = p.create_function("f");
        let b8 = p.types.bits(8);
        let f = p.function_mut(fid);
        let a = f
            .add_node(
                NodeOp::Literal {
                    value: Value::bits(8, 1),
                },
                vec![],
                b8,
            )
            .unwrap();
        f.set_return_value(a).unwrap();

        let mut unit = SchedulingUnit::new(p);
        assert!(run(&mut unit));
        assert!(!run(&mut unit));
    }

    #[test]
    fn empty_function_gets_empty_schedule() {
        let mut p = Package::new("pkg");
        let fid = p.create_function("f");
        let mut unit = SchedulingUnit::new(p);
        assert!(run(&mut unit));
        assert!(unit.schedule(fid).unwrap().is_empty());
    }
}

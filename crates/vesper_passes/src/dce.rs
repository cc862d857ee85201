//! Dead code elimination over every function of a package.
//!
//! Removes nodes with no users, working backwards so whole dead chains
//! disappear in one run. Parameters, side-effecting nodes, designated
//! return/next-state values, and block ports always stay.

use crate::pass::{Pass, PassOptions, PassResult, PassResults};
use std::collections::HashMap;
use vesper_ir::{FunctionBase, FunctionKind, NodeId, Package};

/// Dead code elimination pass.
pub struct DeadCodeEliminationPass;

impl Pass<Package> for DeadCodeEliminationPass {
    fn short_name(&self) -> &str {
        "dce"
    }

    fn long_name(&self) -> &str {
        "Dead Code Elimination"
    }

    fn run(
        &self,
        package: &mut Package,
        options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut changed = false;
        for id in package.function_ids() {
            if options.cancel.is_requested() {
                return Ok(changed);
            }
            changed |= run_on_function(package.function_mut(id))?;
        }
        Ok(changed)
    }
}

/// Returns `true` for nodes that must survive regardless of use count.
fn keep_alive(f: &FunctionBase, id: NodeId) -> bool {
    let node = f.node(id);
    if node.is_param() || node.op.is_side_effecting() {
        return true;
    }
    match f.kind() {
        FunctionKind::Function { return_value } => *return_value == Some(id),
        FunctionKind::Proc { next_state, .. } => *next_state == Some(id),
        FunctionKind::Block {
            input_ports,
            output_ports,
            ..
        } => input_ports.contains(&id) || output_ports.contains(&id),
    }
}

fn run_on_function(f: &mut FunctionBase) -> PassResult<bool> {
    let live = f.node_ids();
    let mut user_counts: HashMap<NodeId, usize> = live.iter().map(|&id| (id, 0)).collect();
    for &id in &live {
        for operand in f.node(id).unique_operands() {
            *user_counts.get_mut(&operand).unwrap() += 1;
        }
    }

    let mut worklist: Vec<NodeId> = live
        .iter()
        .copied()
        .filter(|&id| user_counts[&id] == 0 && !keep_alive(f, id))
        .collect();

    let mut changed = false;
    while let Some(id) = worklist.pop() {
        if f.is_dead(id) {
            continue;
        }
        let operands = f.node(id).unique_operands();
        f.remove_node(id)?;
        changed = true;
        for operand in operands {
            let count = user_counts.get_mut(&operand).unwrap();
            *count -= 1;
            if *count == 0 && !keep_alive(f, operand) {
                worklist.push(operand);
            }
        }
    }
    Ok(changed)
}

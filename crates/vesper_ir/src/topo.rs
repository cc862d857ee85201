//! Stable topological traversal of a function's node graph.
//!
//! Yields every node exactly once with operands before users. The order is
//! deterministic and stable: among simultaneously-ready nodes the traversal
//! follows the function's insertion order and operand order, never hash
//! iteration. This is a dependency-driven traversal, not a reversed DFS
//! post-order — for a staggered ladder it emits the shallow branch's nodes
//! interleaved by readiness rather than chasing one branch to the bottom
//! first (see the `ladder_differs_from_rpo` test).

use crate::function::FunctionBase;
use crate::ids::NodeId;
use std::collections::{HashMap, HashSet};

/// Returns the nodes of `f` in a stable topological order: for every node,
/// all of its operands appear earlier.
///
/// The ordering is computed up front, not incrementally. Callers guarantee
/// the operand graph is acyclic; on cyclic input the result is unspecified.
pub fn topo_sort(f: &FunctionBase) -> Vec<NodeId> {
    let mut order = reverse_order(f);
    order.reverse();
    order
}

/// Returns exactly [`topo_sort`] reversed — not an independent computation,
/// so `reverse(topo_sort(f)) == reverse_topo_sort(f)` always holds.
pub fn reverse_topo_sort(f: &FunctionBase) -> Vec<NodeId> {
    reverse_order(f)
}

/// The natural direction of the computation: a node is emitted once all of
/// its users have been emitted.
///
/// Sinks are seeded in reverse insertion order. When a node is emitted, each
/// operand whose last pending user it was becomes ready and is pushed; the
/// LIFO drain keeps the traversal on the most recently satisfied dependency
/// chain, which is what produces the stable insertion-order tie-break after
/// the final reversal.
fn reverse_order(f: &FunctionBase) -> Vec<NodeId> {
    let live = f.node_ids();
    let mut pending_users: HashMap<NodeId, usize> =
        live.iter().map(|&id| (id, 0usize)).collect();
    for &id in &live {
        // A node using the same operand through several edges still counts
        // as a single user of that operand.
        for operand in f.node(id).unique_operands() {
            *pending_users.get_mut(&operand).unwrap() += 1;
        }
    }

    let mut ordered = Vec::with_capacity(live.len());
    let mut emitted: HashSet<NodeId> = HashSet::with_capacity(live.len());
    let mut ready: Vec<NodeId> = Vec::new();
    for &seed in live.iter().rev() {
        if pending_users[&seed] != 0 || emitted.contains(&seed) {
            continue;
        }
        ready.push(seed);
        while let Some(id) = ready.pop() {
            if !emitted.insert(id) {
                continue;
            }
            ordered.push(id);
            for operand in f.node(id).unique_operands() {
                let count = pending_users.get_mut(&operand).unwrap();
                *count -= 1;
                if *count == 0 {
                    ready.push(operand);
                }
            }
        }
    }
    ordered
}

//! Removal of channel operations with constant predicates.
//!
//! A predicated send or receive whose predicate is a literal zero never
//! fires: it is deleted, unless it is the last operation on its channel
//! (removing that would change the channel's interface). A literal-one
//! predicate always fires, so the operation is replaced by its unpredicated
//! form. Deleted receives leave a zero literal of the channel payload type
//! in their place.

use crate::pass::{Pass, PassError, PassOptions, PassResult, PassResults};
use std::collections::HashMap;
use vesper_common::Ident;
use vesper_ir::{topo_sort, FunctionId, FunctionKind, NodeId, NodeOp, Package, Value};

/// Removes sends and receives with constant predicates.
pub struct UselessIoRemovalPass;

impl Pass<Package> for UselessIoRemovalPass {
    fn short_name(&self) -> &str {
        "useless_io_removal"
    }

    fn long_name(&self) -> &str {
        "Useless I/O Removal"
    }

    fn run(
        &self,
        package: &mut Package,
        options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let procs: Vec<FunctionId> = package
            .function_ids()
            .into_iter()
            .filter(|&id| matches!(package.function(id).kind(), FunctionKind::Proc { .. }))
            .collect();

        // Per-channel operation counts across the whole package, so the last
        // send/receive on a channel is never deleted.
        let mut send_count: HashMap<Ident, usize> = HashMap::new();
        let mut recv_count: HashMap<Ident, usize> = HashMap::new();
        for &id in &procs {
            for node in package.function(id).nodes() {
                match &node.op {
                    NodeOp::Send { channel, .. } => *send_count.entry(*channel).or_default() += 1,
                    NodeOp::Receive { channel, .. } => {
                        *recv_count.entry(*channel).or_default() += 1
                    }
                    _ => {}
                }
            }
        }

        let unit_ty = package.types.unit();
        let mut changed = false;
        for fid in procs {
            if options.cancel.is_requested() {
                return Ok(changed);
            }
            for nid in topo_sort(package.function(fid)) {
                if package.function(fid).is_dead(nid) {
                    continue;
                }
                let node = package.function(fid).node(nid);
                let op = node.op.clone();
                let operands = node.operands.clone();
                let loc = node.loc;
                match op {
                    NodeOp::Send {
                        channel,
                        predicated: true,
                    } => {
                        let data = operands[0];
                        let predicate = operands[1];
                        if is_literal_zero(package, fid, predicate)
                            && send_count[&channel] >= 2
                        {
                            let f = package.function_mut(fid);
                            let unit = f.add_node(
                                NodeOp::Literal {
                                    value: Value::unit(),
                                },
                                vec![],
                                unit_ty,
                            )?;
                            f.replace_uses_with(nid, unit)?;
                            f.remove_node(nid)?;
                            *send_count.get_mut(&channel).unwrap() -= 1;
                            changed = true;
                        } else if is_literal_one(package, fid, predicate) {
                            let f = package.function_mut(fid);
                            let send = f.add_node(
                                NodeOp::Send {
                                    channel,
                                    predicated: false,
                                },
                                vec![data],
                                unit_ty,
                            )?;
                            if let Some(loc) = loc {
                                f.set_loc(send, loc);
                            }
                            f.replace_uses_with(nid, send)?;
                            f.remove_node(nid)?;
                            changed = true;
                        }
                    }
                    NodeOp::Receive {
                        channel,
                        predicated: true,
                    } => {
                        let predicate = operands[0];
                        let ty = package.function(fid).node(nid).ty;
                        if is_literal_zero(package, fid, predicate)
                            && recv_count[&channel] >= 2
                        {
                            let payload_ty = package.channel_payload(channel).ok_or_else(|| {
                                PassError::InvariantViolation(format!(
                                    "receive {nid} names undeclared channel '{}'",
                                    package.resolve(channel)
                                ))
                            })?;
                            let zero = Value::zero_of(payload_ty, &package.types)?;
                            let f = package.function_mut(fid);
                            let literal =
                                f.add_node(NodeOp::Literal { value: zero }, vec![], payload_ty)?;
                            if let Some(loc) = loc {
                                f.set_loc(literal, loc);
                            }
                            f.replace_uses_with(nid, literal)?;
                            f.remove_node(nid)?;
                            *recv_count.get_mut(&channel).unwrap() -= 1;
                            changed = true;
                        } else if is_literal_one(package, fid, predicate) {
                            let f = package.function_mut(fid);
                            let recv = f.add_node(
                                NodeOp::Receive {
                                    channel,
                                    predicated: false,
                                },
                                vec![],
                                ty,
                            )?;
                            if let Some(loc) = loc {
                                f.set_loc(recv, loc);
                            }
                            f.replace_uses_with(nid, recv)?;
                            f.remove_node(nid)?;
                            changed = true;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(changed)
    }
}

fn is_literal_zero(package: &Package, fid: FunctionId, id: NodeId) -> bool {
    matches!(
        &package.function(fid).node(id).op,
        NodeOp::Literal {
            value: Value::Bits(b)
        } if b.is_zero()
    )
}

fn is_literal_one(package: &Package, fid: FunctionId, id: NodeId) -> bool {
    matches!(
        &package.function(fid).node(id).op,
        NodeOp::Literal {
            value: Value::Bits(b)
        } if b.is_one()
    )
}

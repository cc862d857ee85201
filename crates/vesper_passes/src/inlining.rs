//! Function inlining.
//!
//! Replaces every inlineable call site by a copy of the callee's body.
//! Functions are visited in call-graph post-order (leaves first), so by the
//! time a function is inlined into its callers it contains no inlineable
//! call sites of its own. A call site is inlineable iff its target carries
//! no foreign-function metadata; foreign call sites are retained verbatim.

use crate::pass::{Pass, PassError, PassOptions, PassResult, PassResults};
use std::collections::HashMap;
use vesper_ir::{
    functions_in_post_order, topo_sort, FunctionId, NodeId, NodeOp, Package, SourceSpan, TypeId,
};

/// Inlines invocations of package functions into their callers.
pub struct InliningPass;

impl Pass<Package> for InliningPass {
    fn short_name(&self) -> &str {
        "inlining"
    }

    fn long_name(&self) -> &str {
        "Inlines invocations of package functions"
    }

    fn run(
        &self,
        package: &mut Package,
        options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut changed = false;
        // The label prefix counter is monotone across every call site in the
        // package, which keeps rewritten cover/assert labels unique.
        let mut inline_count = 0usize;
        for fid in functions_in_post_order(package) {
            if options.cancel.is_requested() {
                return Ok(changed);
            }
            // Snapshot the call sites: nodes are added and removed while
            // inlining.
            let call_sites: Vec<NodeId> = package
                .function(fid)
                .nodes()
                .filter(|n| {
                    n.invoke_callee()
                        .is_some_and(|callee| !package.function(callee).is_foreign())
                })
                .map(|n| n.id)
                .collect();
            for invoke_id in call_sites {
                inline_invoke(package, fid, invoke_id, inline_count)?;
                inline_count += 1;
                changed = true;
            }
        }
        Ok(changed)
    }
}

/// The label given to an inlined cover/assert: the call stack plus a
/// package-wide counter, so duplicated labels stay distinguishable.
fn prefixed_label(caller: &str, inline_count: usize, callee: &str, label: &str) -> String {
    format!("{caller}_{inline_count}_{callee}_{label}")
}

/// Computes the name an inlined node should take at the call site.
///
/// Finds the callee parameter whose name is the longest prefix of the node's
/// name — the node's name is assumed to derive from that parameter — and
/// substitutes the respective argument's name for it. Returns `None` when no
/// named argument matches.
fn derived_name(
    node_name: &str,
    param_names: &[String],
    arg_names: &[Option<String>],
) -> Option<String> {
    let mut matched_len = 0usize;
    let mut derived = None;
    for (param_name, arg_name) in param_names.iter().zip(arg_names) {
        let Some(arg_name) = arg_name else { continue };
        if !param_name.is_empty()
            && node_name.starts_with(param_name.as_str())
            && param_name.len() > matched_len
        {
            matched_len = param_name.len();
            derived = Some(format!("{arg_name}{}", &node_name[param_name.len()..]));
        }
    }
    derived
}

/// One node of the callee, prepared for splicing into the caller.
struct ClonePlan {
    source: NodeId,
    op: NodeOp,
    operands: Vec<NodeId>,
    ty: TypeId,
    loc: Option<SourceSpan>,
    name: Option<String>,
}

/// Inlines a single call site: seeds the replacement map with the call
/// arguments, walks the callee in topological order cloning every non-param
/// node into the caller, then redirects the call site's uses to the mapped
/// return value and deletes it.
fn inline_invoke(
    package: &mut Package,
    caller_id: FunctionId,
    invoke_id: NodeId,
    inline_count: usize,
) -> PassResult<()> {
    // Read-only phase: plan every clone while the caller and callee are
    // borrowed shared. Mutation starts only once the plans are complete.
    let caller = package.function(caller_id);
    let invoke = caller.node(invoke_id);
    let Some(callee_id) = invoke.invoke_callee() else {
        return Err(PassError::InvariantViolation(format!(
            "node {invoke_id} is not an invoke"
        )));
    };
    let args = invoke.operands.clone();
    let invoke_named = invoke.name.is_some();
    let invoke_loc = invoke.loc;

    let callee = package.function(callee_id);
    let caller_name = package.resolve(caller.name).to_string();
    let callee_name = package.resolve(callee.name).to_string();
    let params = callee.params().to_vec();
    if params.len() != args.len() {
        return Err(PassError::InvariantViolation(format!(
            "call site {invoke_id} passes {} arguments to '{callee_name}' which has {} parameters",
            args.len(),
            params.len()
        )));
    }
    let param_names: Vec<String> = params
        .iter()
        .map(|&p| {
            callee
                .name_of(p)
                .map(|i| package.resolve(i).to_string())
                .unwrap_or_default()
        })
        .collect();
    let arg_names: Vec<Option<String>> = args
        .iter()
        .map(|&a| caller.name_of(a).map(|i| package.resolve(i).to_string()))
        .collect();
    let Some(callee_return) = callee.return_value() else {
        return Err(PassError::InvariantViolation(format!(
            "function '{callee_name}' has no return value"
        )));
    };

    let mut plans: Vec<ClonePlan> = Vec::new();
    for nid in topo_sort(callee) {
        if params.contains(&nid) {
            // Already bound to the call arguments.
            continue;
        }
        let node = callee.node(nid);
        if let Some(inner) = node.invoke_callee() {
            // Post-order processing guarantees the callee is invoke-free by
            // now, foreign call sites excepted.
            if !package.function(inner).is_foreign() {
                let node_desc = node
                    .name
                    .map(|i| package.resolve(i).to_string())
                    .unwrap_or_else(|| format!("node {nid}"));
                return Err(PassError::InvariantViolation(format!(
                    "non-foreign invoke remains in function to inline: {node_desc}: {}",
                    package.resolve(package.function(inner).name)
                )));
            }
        }

        let name = if nid == callee_return && invoke_named {
            // The clone stays unnamed so use-rewriting transfers the call
            // site's own name onto it.
            None
        } else if let Some(name_ident) = node.name {
            let node_name = package.resolve(name_ident);
            derived_name(node_name, &param_names, &arg_names).or(Some(node_name.to_string()))
        } else {
            None
        };

        let op = match &node.op {
            NodeOp::Cover { label } => NodeOp::Cover {
                label: package.intern(&prefixed_label(
                    &caller_name,
                    inline_count,
                    &callee_name,
                    package.resolve(*label),
                )),
            },
            NodeOp::Assert {
                label: Some(label),
                message,
            } => NodeOp::Assert {
                label: Some(package.intern(&prefixed_label(
                    &caller_name,
                    inline_count,
                    &callee_name,
                    package.resolve(*label),
                ))),
                message: message.clone(),
            },
            other => other.clone(),
        };

        plans.push(ClonePlan {
            source: nid,
            op,
            operands: node.operands.clone(),
            ty: node.ty,
            loc: node.loc.or(invoke_loc),
            name,
        });
    }

    // Mutate phase: splice the clones into the caller.
    let mut replacement: HashMap<NodeId, NodeId> =
        params.iter().copied().zip(args.iter().copied()).collect();
    for plan in plans {
        let operands = plan
            .operands
            .iter()
            .map(|o| {
                replacement.get(o).copied().ok_or_else(|| {
                    PassError::InvariantViolation(format!(
                        "operand {o} of inlined node {} was never cloned",
                        plan.source
                    ))
                })
            })
            .collect::<PassResult<Vec<NodeId>>>()?;
        let new_id = {
            let caller = package.function_mut(caller_id);
            let id = caller.add_node(plan.op, operands, plan.ty)?;
            if let Some(loc) = plan.loc {
                caller.set_loc(id, loc);
            }
            id
        };
        if let Some(name) = &plan.name {
            package.set_node_name(caller_id, new_id, name)?;
        }
        replacement.insert(plan.source, new_id);
    }

    let mapped_return = *replacement.get(&callee_return).ok_or_else(|| {
        PassError::InvariantViolation(format!(
            "return value of '{callee_name}' was never cloned"
        ))
    })?;
    let caller = package.function_mut(caller_id);
    caller.replace_uses_with(invoke_id, mapped_return)?;
    caller.remove_node(invoke_id)?;
    log::debug!("inlined '{callee_name}' into '{caller_name}' (call site {invoke_id})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_ir::{BinaryOp, ForeignFunctionData, UnaryOp, Value};

    fn run(package: &mut Package) -> bool {
        InliningPass
            .run(package, &PassOptions::default(), &mut PassResults::new())
            .unwrap()
    }

    fn no_inlineable_invokes(package: &Package) -> bool {
        package.functions().all(|f| {
            f.nodes().all(|n| {
                n.invoke_callee()
                    .map_or(true, |c| package.function(c).is_foreign())
            })
        })
    }

    /// Builds `fn negate(x) { x_negated = neg(x); ret x_negated }`.
    fn build_negate(p: &mut Package) -> FunctionId {
        let fid = p.create_function("negate");
        let b8 = p.types.bits(8);
        let x = p.intern("x");
        let f = p.function_mut(fid);
        let param = f.add_param(x, b8).unwrap();
        let neg = f
            .add_node(NodeOp::Unary { op: UnaryOp::Neg }, vec![param], b8)
            .unwrap();
        f.set_return_value(neg).unwrap();
        p.set_node_name(fid, neg, "x_negated").unwrap();
        fid
    }

    #[test]
    fn replaces_call_site_with_body() {
        let mut p = Package::new("pkg");
        let callee = build_negate(&mut p);
        let caller = p.create_function("main");
        let b8 = p.types.bits(8);
        let foo = p.intern("foo");
        let f = p.function_mut(caller);
        let arg = f.add_param(foo, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        assert!(run(&mut p));
        assert!(no_inlineable_invokes(&p));
        let f = p.function(caller);
        // One param plus the inlined neg.
        assert_eq!(f.node_count(), 2);
        let ret = f.return_value().unwrap();
        assert!(matches!(
            f.node(ret).op,
            NodeOp::Unary { op: UnaryOp::Neg }
        ));
        assert_eq!(f.node(ret).operands, vec![arg]);
    }

    #[test]
    fn rewrites_parameter_derived_names() {
        let mut p = Package::new("pkg");
        let callee = build_negate(&mut p);
        let caller = p.create_function("main");
        let b8 = p.types.bits(8);
        let foo = p.intern("foo");
        let f = p.function_mut(caller);
        let arg = f.add_param(foo, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(p.resolve(f.name_of(ret).unwrap()), "foo_negated");
    }

    #[test]
    fn named_call_site_transfers_its_name() {
        let mut p = Package::new("pkg");
        let callee = build_negate(&mut p);
        let caller = p.create_function("main");
        let b8 = p.types.bits(8);
        let foo = p.intern("foo");
        let f = p.function_mut(caller);
        let arg = f.add_param(foo, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b8)
            .unwrap();
        f.set_return_value(call).unwrap();
        p.set_node_name(caller, call, "result").unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(p.resolve(f.name_of(ret).unwrap()), "result");
    }

    #[test]
    fn longest_param_prefix_wins() {
        let mut p = Package::new("pkg");
        let callee = p.create_function("g");
        let b8 = p.types.bits(8);
        let x = p.intern("x");
        let x_lo = p.intern("x_lo");
        let f = p.function_mut(callee);
        let p0 = f.add_param(x, b8).unwrap();
        let p1 = f.add_param(x_lo, b8).unwrap();
        let sum = f
            .add_node(NodeOp::Binary { op: BinaryOp::Add }, vec![p0, p1], b8)
            .unwrap();
        f.set_return_value(sum).unwrap();
        // Derived from 'x_lo', not from 'x'.
        p.set_node_name(callee, sum, "x_lo_sum").unwrap();

        let caller = p.create_function("main");
        let a = p.intern("a");
        let b = p.intern("b");
        let f = p.function_mut(caller);
        let arg0 = f.add_param(a, b8).unwrap();
        let arg1 = f.add_param(b, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg0, arg1], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(p.resolve(f.name_of(ret).unwrap()), "b_sum");
    }

    #[test]
    fn chain_is_flattened_in_one_run() {
        let mut p = Package::new("pkg");
        let leaf = build_negate(&mut p);
        let b8 = p.types.bits(8);

        let mid = p.create_function("mid");
        let y = p.intern("y");
        let f = p.function_mut(mid);
        let param = f.add_param(y, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee: leaf }, vec![param], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        let top = p.create_function("top");
        let z = p.intern("z");
        let f = p.function_mut(top);
        let param = f.add_param(z, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee: mid }, vec![param], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        assert!(run(&mut p));
        assert!(no_inlineable_invokes(&p));
        // A second run finds nothing to do.
        assert!(!run(&mut p));
    }

    #[test]
    fn foreign_call_sites_are_retained() {
        let mut p = Package::new("pkg");
        let foreign = p.create_function("ext");
        let b8 = p.types.bits(8);
        let x = p.intern("x");
        let f = p.function_mut(foreign);
        let param = f.add_param(x, b8).unwrap();
        f.set_return_value(param).unwrap();
        f.set_foreign_function_data(Some(ForeignFunctionData {
            code_template: "ext_impl {fn}".to_string(),
        }));

        let caller = p.create_function("main");
        let a = p.intern("a");
        let f = p.function_mut(caller);
        let arg = f.add_param(a, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee: foreign }, vec![arg], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        assert!(!run(&mut p));
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(f.node(ret).invoke_callee(), Some(foreign));
        assert_eq!(f.node(ret).operands, vec![arg]);
    }

    #[test]
    fn cover_labels_get_call_stack_prefix() {
        let mut p = Package::new("pkg");
        let callee = p.create_function("checker");
        let b1 = p.types.bits(1);
        let c = p.intern("c");
        let label = p.intern("cond_seen");
        let f = p.function_mut(callee);
        let param = f.add_param(c, b1).unwrap();
        f.add_node(NodeOp::Cover { label }, vec![param], b1)
            .unwrap();
        f.set_return_value(param).unwrap();

        let caller = p.create_function("main");
        let a = p.intern("a");
        let f = p.function_mut(caller);
        let arg = f.add_param(a, b1).unwrap();
        let call0 = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b1)
            .unwrap();
        let call1 = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b1)
            .unwrap();
        let sum = f
            .add_node(NodeOp::Binary { op: BinaryOp::Or }, vec![call0, call1], b1)
            .unwrap();
        f.set_return_value(sum).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let mut labels: Vec<String> = f
            .nodes()
            .filter_map(|n| match &n.op {
                NodeOp::Cover { label } => Some(p.resolve(*label).to_string()),
                _ => None,
            })
            .collect();
        labels.sort();
        assert_eq!(
            labels,
            vec!["main_0_checker_cond_seen", "main_1_checker_cond_seen"]
        );
    }

    #[test]
    fn blank_locations_adopt_call_site_location() {
        let mut p = Package::new("pkg");
        let callee = build_negate(&mut p);
        let caller = p.create_function("main");
        let b8 = p.types.bits(8);
        let foo = p.intern("foo");
        let f = p.function_mut(caller);
        let arg = f.add_param(foo, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b8)
            .unwrap();
        let call_loc = SourceSpan::new(0, 10, 3);
        f.set_loc(call, call_loc);
        f.set_return_value(call).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(f.node(ret).loc, Some(call_loc));
    }

    #[test]
    fn non_blank_locations_are_kept() {
        let mut p = Package::new("pkg");
        let callee = p.create_function("g");
        let b8 = p.types.bits(8);
        let x = p.intern("x");
        let inner_loc = SourceSpan::new(1, 2, 3);
        let f = p.function_mut(callee);
        let param = f.add_param(x, b8).unwrap();
        let neg = f
            .add_node(NodeOp::Unary { op: UnaryOp::Neg }, vec![param], b8)
            .unwrap();
        f.set_loc(neg, inner_loc);
        f.set_return_value(neg).unwrap();

        let caller = p.create_function("main");
        let a = p.intern("a");
        let f = p.function_mut(caller);
        let arg = f.add_param(a, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg], b8)
            .unwrap();
        f.set_loc(call, SourceSpan::new(9, 9, 9));
        f.set_return_value(call).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(f.node(ret).loc, Some(inner_loc));
    }

    #[test]
    fn duplicate_args_inline_correctly() {
        let mut p = Package::new("pkg");
        let callee = p.create_function("both");
        let b8 = p.types.bits(8);
        let l = p.intern("l");
        let r = p.intern("r");
        let f = p.function_mut(callee);
        let p0 = f.add_param(l, b8).unwrap();
        let p1 = f.add_param(r, b8).unwrap();
        let sum = f
            .add_node(NodeOp::Binary { op: BinaryOp::Add }, vec![p0, p1], b8)
            .unwrap();
        f.set_return_value(sum).unwrap();

        let caller = p.create_function("main");
        let a = p.intern("a");
        let f = p.function_mut(caller);
        let arg = f.add_param(a, b8).unwrap();
        let call = f
            .add_node(NodeOp::Invoke { callee }, vec![arg, arg], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        run(&mut p);
        let f = p.function(caller);
        let ret = f.return_value().unwrap();
        assert_eq!(f.node(ret).operands, vec![arg, arg]);
    }
}

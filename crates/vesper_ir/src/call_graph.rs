//! Call-graph queries over a package.
//!
//! The call graph is derived from invoke nodes rather than stored: an edge
//! `f -> g` exists when `f` contains an invoke of `g`.

use crate::ids::FunctionId;
use crate::package::Package;
use std::collections::HashSet;

/// Returns the functions of the package in call-graph post-order: every
/// callee appears before all of its callers.
///
/// Functions with no call relationship keep their package creation order
/// relative to each other, which makes the result deterministic.
pub fn functions_in_post_order(package: &Package) -> Vec<FunctionId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for id in package.function_ids() {
        visit(package, id, &mut visited, &mut order);
    }
    order
}

fn visit(
    package: &Package,
    id: FunctionId,
    visited: &mut HashSet<FunctionId>,
    order: &mut Vec<FunctionId>,
) {
    if !visited.insert(id) {
        return;
    }
    for node in package.function(id).nodes() {
        if let Some(callee) = node.invoke_callee() {
            visit(package, callee, visited, order);
        }
    }
    order.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeOp;
    use crate::value::Value;

    /// Builds `top -> mid -> leaf` with `top` created first.
    fn call_chain() -> (Package, FunctionId, FunctionId, FunctionId) {
        let mut p = Package::new("pkg");
        let top = p.create_function("top");
        let mid = p.create_function("mid");
        let leaf = p.create_function("leaf");
        let b8 = p.types.bits(8);

        let f = p.function_mut(leaf);
        let lit = f
            .add_node(
                NodeOp::Literal {
                    value: Value::bits(8, 1),
                },
                vec![],
                b8,
            )
            .unwrap();
        f.set_return_value(lit).unwrap();

        let f = p.function_mut(mid);
        let call = f
            .add_node(NodeOp::Invoke { callee: leaf }, vec![], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        let f = p.function_mut(top);
        let call = f
            .add_node(NodeOp::Invoke { callee: mid }, vec![], b8)
            .unwrap();
        f.set_return_value(call).unwrap();

        (p, top, mid, leaf)
    }

    #[test]
    fn leaves_before_callers() {
        let (p, top, mid, leaf) = call_chain();
        assert_eq!(functions_in_post_order(&p), vec![leaf, mid, top]);
    }

    #[test]
    fn unrelated_functions_keep_creation_order() {
        let mut p = Package::new("pkg");
        let a = p.create_function("a");
        let b = p.create_function("b");
        assert_eq!(functions_in_post_order(&p), vec![a, b]);
    }

    #[test]
    fn shared_callee_listed_once() {
        let mut p = Package::new("pkg");
        let a = p.create_function("a");
        let b = p.create_function("b");
        let shared = p.create_function("shared");
        let b8 = p.types.bits(8);
        for caller in [a, b] {
            let f = p.function_mut(caller);
            let call = f
                .add_node(NodeOp::Invoke { callee: shared }, vec![], b8)
                .unwrap();
            f.set_return_value(call).unwrap();
        }
        assert_eq!(functions_in_post_order(&p), vec![shared, a, b]);
    }
}

//! IR nodes: the atomic entities of the operand graph.

use crate::ids::{FunctionId, NodeId, TypeId};
use crate::loc::SourceSpan;
use crate::value::Value;
use vesper_common::Ident;

/// A unary operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Two's-complement negation.
    Neg,
    /// Bitwise complement.
    Not,
}

/// A binary operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
}

/// The operation performed by a node. Operand arity and meaning:
///
/// - `Literal`, `Param`: no operands.
/// - `Unary`: one operand.
/// - `Binary`: two operands (duplicates allowed).
/// - `Invoke`: the arguments, positionally matching the callee's parameters.
/// - `Cover`, `Assert`: a single condition operand.
/// - `Select`: a selector followed by the case operands.
/// - `Send`: data, then the predicate when `predicated`.
/// - `Receive`: the predicate when `predicated`, otherwise none.
/// - `Tuple`: the element operands.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOp {
    /// A constant value.
    Literal {
        /// The literal's value.
        value: Value,
    },
    /// A function parameter.
    Param {
        /// Position in the function signature.
        index: usize,
    },
    /// A unary operation.
    Unary {
        /// The operation kind.
        op: UnaryOp,
    },
    /// A binary operation.
    Binary {
        /// The operation kind.
        op: BinaryOp,
    },
    /// A call to another function in the package.
    Invoke {
        /// The called function.
        callee: FunctionId,
    },
    /// A coverpoint with a user-visible label.
    Cover {
        /// The coverpoint label; must stay unique across transformations.
        label: Ident,
    },
    /// An assertion, optionally labeled.
    Assert {
        /// The assertion label, if any.
        label: Option<Ident>,
        /// The failure message.
        message: String,
    },
    /// A multiplexer: selector operand followed by case operands.
    Select,
    /// A send onto a channel.
    Send {
        /// The channel name.
        channel: Ident,
        /// Whether a predicate operand follows the data operand.
        predicated: bool,
    },
    /// A receive from a channel.
    Receive {
        /// The channel name.
        channel: Ident,
        /// Whether a predicate operand is present.
        predicated: bool,
    },
    /// A tuple former over its operands.
    Tuple,
}

impl NodeOp {
    /// Returns `true` for operations with observable effects that must
    /// survive dead-code elimination regardless of use count.
    pub fn is_side_effecting(&self) -> bool {
        matches!(
            self,
            NodeOp::Cover { .. }
                | NodeOp::Assert { .. }
                | NodeOp::Send { .. }
                | NodeOp::Receive { .. }
        )
    }
}

/// A node in the IR operand graph.
///
/// Nodes are owned by exactly one [`FunctionBase`](crate::function::FunctionBase)
/// for their entire lifetime; operand edges are lookup relations into the
/// same function's node arena and never cross functions.
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable identifier, unique within the owning function.
    pub id: NodeId,
    /// The operation this node performs.
    pub op: NodeOp,
    /// Ordered operand references; the same operand may appear repeatedly.
    pub operands: Vec<NodeId>,
    /// The result type.
    pub ty: TypeId,
    /// The assigned name, if any. Unique within the owning function.
    pub name: Option<Ident>,
    /// The source location, if known.
    pub loc: Option<SourceSpan>,
}

impl Node {
    /// Returns `true` if this node is an invoke.
    pub fn is_invoke(&self) -> bool {
        matches!(self.op, NodeOp::Invoke { .. })
    }

    /// Returns the called function for invoke nodes.
    pub fn invoke_callee(&self) -> Option<FunctionId> {
        match self.op {
            NodeOp::Invoke { callee } => Some(callee),
            _ => None,
        }
    }

    /// Returns `true` if this node is a parameter.
    pub fn is_param(&self) -> bool {
        matches!(self.op, NodeOp::Param { .. })
    }

    /// Returns the unique operands in first-occurrence order.
    ///
    /// Duplicate operand edges count once for dependency purposes.
    pub fn unique_operands(&self) -> Vec<NodeId> {
        let mut seen = Vec::new();
        for &op in &self.operands {
            if !seen.contains(&op) {
                seen.push(op);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_operands_dedupe_preserving_order() {
        let node = Node {
            id: NodeId::from_raw(2),
            op: NodeOp::Binary { op: BinaryOp::Add },
            operands: vec![
                NodeId::from_raw(1),
                NodeId::from_raw(0),
                NodeId::from_raw(1),
            ],
            ty: TypeId::from_raw(0),
            name: None,
            loc: None,
        };
        assert_eq!(
            node.unique_operands(),
            vec![NodeId::from_raw(1), NodeId::from_raw(0)]
        );
    }

    #[test]
    fn side_effecting_ops() {
        assert!(NodeOp::Cover {
            label: Ident::from_raw(0)
        }
        .is_side_effecting());
        assert!(NodeOp::Send {
            channel: Ident::from_raw(0),
            predicated: false
        }
        .is_side_effecting());
        assert!(!NodeOp::Tuple.is_side_effecting());
        assert!(!NodeOp::Literal {
            value: Value::bits(1, 0)
        }
        .is_side_effecting());
    }

    #[test]
    fn invoke_callee_accessor() {
        let node = Node {
            id: NodeId::from_raw(0),
            op: NodeOp::Invoke {
                callee: FunctionId::from_raw(3),
            },
            operands: vec![],
            ty: TypeId::from_raw(0),
            name: None,
            loc: None,
        };
        assert!(node.is_invoke());
        assert_eq!(node.invoke_callee(), Some(FunctionId::from_raw(3)));
    }
}

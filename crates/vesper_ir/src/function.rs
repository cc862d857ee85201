//! Function-like IR containers: functions, procs, and blocks.
//!
//! A [`FunctionBase`] owns its nodes in an insertion-ordered arena with
//! dead-marking: removal never reuses a slot, so [`NodeId`]s stay stable and
//! the insertion order — which the topological scheduler uses as its
//! tie-break — is always recoverable.

use crate::arena::Arena;
use crate::error::{IrError, IrResult};
use crate::ids::{FunctionId, NodeId, TypeId};
use crate::loc::SourceSpan;
use crate::node::{Node, NodeOp};
use std::collections::{HashMap, HashSet};
use vesper_common::Ident;

/// Metadata attached to functions with an external ABI.
///
/// A function carrying this data is opaque to the compiler: its call sites
/// must be preserved verbatim and are never inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignFunctionData {
    /// The instantiation template emitted for call sites at lowering time.
    pub code_template: String,
}

/// A state register owned by a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    /// The register name.
    pub name: Ident,
    /// The stored type.
    pub ty: TypeId,
}

/// The role-specific state of a [`FunctionBase`].
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// A pure function with a single designated return value.
    Function {
        /// The return value node, once set.
        return_value: Option<NodeId>,
    },
    /// A communicating process with recurrent state.
    Proc {
        /// The next-state value node, once set.
        next_state: Option<NodeId>,
        /// The channels this proc communicates over, in declaration order.
        channels: Vec<Ident>,
    },
    /// A structural block with ports and registers.
    Block {
        /// Nodes acting as input ports.
        input_ports: Vec<NodeId>,
        /// Nodes acting as output ports.
        output_ports: Vec<NodeId>,
        /// State registers.
        registers: Vec<Register>,
    },
}

/// A function, proc, or block owning an insertion-ordered set of nodes.
#[derive(Debug, Clone)]
pub struct FunctionBase {
    /// The ID of this function within its package.
    pub id: FunctionId,
    /// The function name.
    pub name: Ident,
    kind: FunctionKind,
    nodes: Arena<NodeId, Node>,
    order: Vec<NodeId>,
    dead: HashSet<NodeId>,
    params: Vec<NodeId>,
    names: HashMap<Ident, NodeId>,
    foreign: Option<ForeignFunctionData>,
}

impl FunctionBase {
    pub(crate) fn new(id: FunctionId, name: Ident, kind: FunctionKind) -> Self {
        Self {
            id,
            name,
            kind,
            nodes: Arena::new(),
            order: Vec::new(),
            dead: HashSet::new(),
            params: Vec::new(),
            names: HashMap::new(),
            foreign: None,
        }
    }

    /// Returns the role-specific state of this function.
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Appends a parameter node.
    ///
    /// Parameters form a distinguished prefix of the node set whose order
    /// matches the signature, so they must be added before any other node.
    pub fn add_param(&mut self, name: Ident, ty: TypeId) -> IrResult<NodeId> {
        if self.order.len() != self.params.len() {
            return Err(IrError::InvariantViolation(
                "parameters must precede all other nodes".to_string(),
            ));
        }
        if let Some(&holder) = self.names.get(&name) {
            return Err(IrError::InvariantViolation(format!(
                "parameter name already assigned to node {holder}"
            )));
        }
        let index = self.params.len();
        let id = self.alloc_node(NodeOp::Param { index }, vec![], ty)?;
        self.params.push(id);
        self.set_name(id, name)?;
        Ok(id)
    }

    /// Appends a new node with the given operation, operands, and type.
    ///
    /// Every operand must be a live node of this function; creation appends
    /// to the insertion order and assigns the next identifier. The node
    /// starts unnamed and without a source location.
    pub fn add_node(&mut self, op: NodeOp, operands: Vec<NodeId>, ty: TypeId) -> IrResult<NodeId> {
        if matches!(op, NodeOp::Param { .. }) {
            return Err(IrError::InvariantViolation(
                "parameters are created through add_param".to_string(),
            ));
        }
        self.alloc_node(op, operands, ty)
    }

    fn alloc_node(&mut self, op: NodeOp, operands: Vec<NodeId>, ty: TypeId) -> IrResult<NodeId> {
        for &operand in &operands {
            self.check_live(operand)?;
        }
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.alloc(Node {
            id,
            op,
            operands,
            ty,
            name: None,
            loc: None,
        });
        self.order.push(id);
        Ok(id)
    }

    fn check_live(&self, id: NodeId) -> IrResult<()> {
        if id.as_raw() as usize >= self.nodes.len() {
            return Err(IrError::InvariantViolation(format!(
                "operand {id} does not resolve to a node in this function"
            )));
        }
        if self.dead.contains(&id) {
            return Err(IrError::InvariantViolation(format!(
                "operand {id} refers to a removed node"
            )));
        }
        Ok(())
    }

    /// Returns the node with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not created by this function.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    /// Iterates over live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order
            .iter()
            .filter(|id| !self.dead.contains(*id))
            .map(|id| self.nodes.get(*id))
    }

    /// Returns the IDs of live nodes in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| !self.dead.contains(id))
            .collect()
    }

    /// Returns the number of live nodes.
    pub fn node_count(&self) -> usize {
        self.order.len() - self.dead.len()
    }

    /// Returns `true` if the node has been removed.
    pub fn is_dead(&self, id: NodeId) -> bool {
        self.dead.contains(&id)
    }

    /// Returns the parameter nodes in signature order.
    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    /// Returns the live nodes that use `id` as an operand, in insertion
    /// order. Each user appears once even if it references `id` repeatedly.
    pub fn users_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.operands.contains(&id))
            .map(|n| n.id)
            .collect()
    }

    /// Redirects every use of `old` to `new`, including the designated
    /// return/next-state value and block ports.
    ///
    /// If `old` carries an assigned name and `new` does not, the name moves
    /// to `new`; this is how a deleted node hands its identity to its
    /// replacement.
    pub fn replace_uses_with(&mut self, old: NodeId, new: NodeId) -> IrResult<()> {
        self.check_live(old)?;
        self.check_live(new)?;
        if old == new {
            return Ok(());
        }
        let ids = self.node_ids();
        for id in ids {
            let node = self.nodes.get_mut(id);
            for operand in &mut node.operands {
                if *operand == old {
                    *operand = new;
                }
            }
        }
        match &mut self.kind {
            FunctionKind::Function { return_value } => {
                if *return_value == Some(old) {
                    *return_value = Some(new);
                }
            }
            FunctionKind::Proc { next_state, .. } => {
                if *next_state == Some(old) {
                    *next_state = Some(new);
                }
            }
            FunctionKind::Block {
                input_ports,
                output_ports,
                ..
            } => {
                for port in input_ports.iter_mut().chain(output_ports.iter_mut()) {
                    if *port == old {
                        *port = new;
                    }
                }
            }
        }
        if self.nodes.get(new).name.is_none() {
            if let Some(name) = self.nodes.get(old).name {
                self.names.remove(&name);
                self.nodes.get_mut(old).name = None;
                self.names.insert(name, new);
                self.nodes.get_mut(new).name = Some(name);
            }
        }
        Ok(())
    }

    /// Removes a node. Fails while any use remains, so callers redirect
    /// uses first (see [`replace_uses_with`](Self::replace_uses_with)).
    pub fn remove_node(&mut self, id: NodeId) -> IrResult<()> {
        self.check_live(id)?;
        if self.node(id).is_param() {
            return Err(IrError::InvariantViolation(format!(
                "cannot remove parameter node {id}"
            )));
        }
        let users = self.users_of(id);
        if !users.is_empty() {
            return Err(IrError::InvariantViolation(format!(
                "cannot remove node {id}: still used by node {}",
                users[0]
            )));
        }
        let designated = match &self.kind {
            FunctionKind::Function { return_value } => *return_value == Some(id),
            FunctionKind::Proc { next_state, .. } => *next_state == Some(id),
            FunctionKind::Block {
                input_ports,
                output_ports,
                ..
            } => input_ports.contains(&id) || output_ports.contains(&id),
        };
        if designated {
            return Err(IrError::InvariantViolation(format!(
                "cannot remove designated node {id}"
            )));
        }
        if let Some(name) = self.nodes.get(id).name {
            self.names.remove(&name);
        }
        self.dead.insert(id);
        Ok(())
    }

    /// Returns the assigned name of a node, if any.
    pub fn name_of(&self, id: NodeId) -> Option<Ident> {
        self.node(id).name
    }

    /// Looks up a live node by its assigned name.
    pub fn node_by_name(&self, name: Ident) -> Option<NodeId> {
        self.names.get(&name).copied()
    }

    /// Assigns a name to a node. Names are unique within a function;
    /// assigning a name held by another live node fails.
    pub fn set_name(&mut self, id: NodeId, name: Ident) -> IrResult<()> {
        self.check_live(id)?;
        if let Some(&holder) = self.names.get(&name) {
            if holder != id {
                return Err(IrError::InvariantViolation(format!(
                    "name already assigned to node {holder}"
                )));
            }
            return Ok(());
        }
        if let Some(old) = self.nodes.get(id).name {
            self.names.remove(&old);
        }
        self.names.insert(name, id);
        self.nodes.get_mut(id).name = Some(name);
        Ok(())
    }

    /// Clears a node's assigned name, returning the previous name.
    pub fn clear_name(&mut self, id: NodeId) -> Option<Ident> {
        let name = self.nodes.get_mut(id).name.take();
        if let Some(name) = name {
            self.names.remove(&name);
        }
        name
    }

    /// Sets a node's source location.
    pub fn set_loc(&mut self, id: NodeId, loc: SourceSpan) {
        self.nodes.get_mut(id).loc = Some(loc);
    }

    /// Replaces the label of a cover node or labeled assert node.
    pub fn set_label(&mut self, id: NodeId, label: Ident) -> IrResult<()> {
        self.check_live(id)?;
        match &mut self.nodes.get_mut(id).op {
            NodeOp::Cover { label: l } => {
                *l = label;
                Ok(())
            }
            NodeOp::Assert { label: l, .. } => {
                *l = Some(label);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(format!(
                "node {id} carries no label"
            ))),
        }
    }

    /// Returns the designated return value (functions only).
    pub fn return_value(&self) -> Option<NodeId> {
        match &self.kind {
            FunctionKind::Function { return_value } => *return_value,
            _ => None,
        }
    }

    /// Designates the return value of a function.
    pub fn set_return_value(&mut self, id: NodeId) -> IrResult<()> {
        self.check_live(id)?;
        match &mut self.kind {
            FunctionKind::Function { return_value } => {
                *return_value = Some(id);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only functions have a return value".to_string(),
            )),
        }
    }

    /// Returns the designated next-state value (procs only).
    pub fn next_state(&self) -> Option<NodeId> {
        match &self.kind {
            FunctionKind::Proc { next_state, .. } => *next_state,
            _ => None,
        }
    }

    /// Designates the next-state value of a proc.
    pub fn set_next_state(&mut self, id: NodeId) -> IrResult<()> {
        self.check_live(id)?;
        match &mut self.kind {
            FunctionKind::Proc { next_state, .. } => {
                *next_state = Some(id);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only procs have a next-state value".to_string(),
            )),
        }
    }

    /// Returns the channels declared by a proc, in declaration order.
    pub fn channels(&self) -> &[Ident] {
        match &self.kind {
            FunctionKind::Proc { channels, .. } => channels,
            _ => &[],
        }
    }

    /// Declares a channel on a proc.
    pub fn add_channel(&mut self, name: Ident) -> IrResult<()> {
        match &mut self.kind {
            FunctionKind::Proc { channels, .. } => {
                channels.push(name);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only procs declare channels".to_string(),
            )),
        }
    }

    /// Marks a node as an input port of a block.
    pub fn add_input_port(&mut self, id: NodeId) -> IrResult<()> {
        self.check_live(id)?;
        match &mut self.kind {
            FunctionKind::Block { input_ports, .. } => {
                input_ports.push(id);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only blocks have ports".to_string(),
            )),
        }
    }

    /// Marks a node as an output port of a block.
    pub fn add_output_port(&mut self, id: NodeId) -> IrResult<()> {
        self.check_live(id)?;
        match &mut self.kind {
            FunctionKind::Block { output_ports, .. } => {
                output_ports.push(id);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only blocks have ports".to_string(),
            )),
        }
    }

    /// Adds a state register to a block.
    pub fn add_register(&mut self, register: Register) -> IrResult<()> {
        match &mut self.kind {
            FunctionKind::Block { registers, .. } => {
                registers.push(register);
                Ok(())
            }
            _ => Err(IrError::InvariantViolation(
                "only blocks have registers".to_string(),
            )),
        }
    }

    /// Returns the foreign-function metadata, if this function is foreign.
    pub fn foreign_function_data(&self) -> Option<&ForeignFunctionData> {
        self.foreign.as_ref()
    }

    /// Attaches or clears foreign-function metadata.
    pub fn set_foreign_function_data(&mut self, data: Option<ForeignFunctionData>) {
        self.foreign = data;
    }

    /// Returns `true` if this function has an external ABI.
    pub fn is_foreign(&self) -> bool {
        self.foreign.is_some()
    }
}

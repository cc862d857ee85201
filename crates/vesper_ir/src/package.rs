//! The top-level IR container.
//!
//! A [`Package`] owns its functions, the shared [`TypeDb`], the channel
//! table, and the string interner. All mutation flows through a single
//! logical owner at a time; the package is never shared across threads
//! during transformation.

use crate::arena::Arena;
use crate::error::{IrError, IrResult};
use crate::function::{FunctionBase, FunctionKind};
use crate::ids::{FunctionId, NodeId, TypeId};
use crate::types::TypeDb;
use std::collections::BTreeMap;
use vesper_common::{Ident, Interner};

/// A named container owning a set of functions, procs, and blocks.
#[derive(Debug)]
pub struct Package {
    name: String,
    functions: Arena<FunctionId, FunctionBase>,
    /// Global type definitions shared across all functions.
    pub types: TypeDb,
    channels: BTreeMap<Ident, TypeId>,
    interner: Interner,
}

impl Package {
    /// Creates a new, empty package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Arena::new(),
            types: TypeDb::new(),
            channels: BTreeMap::new(),
            interner: Interner::new(),
        }
    }

    /// Returns the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package's string interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Interns a string, returning its identifier.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    /// Resolves an identifier back to its string.
    pub fn resolve(&self, id: Ident) -> &str {
        self.interner.resolve(id)
    }

    /// Creates an empty function and returns its ID.
    pub fn create_function(&mut self, name: &str) -> FunctionId {
        self.create(name, FunctionKind::Function { return_value: None })
    }

    /// Creates an empty proc and returns its ID.
    pub fn create_proc(&mut self, name: &str) -> FunctionId {
        self.create(
            name,
            FunctionKind::Proc {
                next_state: None,
                channels: vec![],
            },
        )
    }

    /// Creates an empty block and returns its ID.
    pub fn create_block(&mut self, name: &str) -> FunctionId {
        self.create(
            name,
            FunctionKind::Block {
                input_ports: vec![],
                output_ports: vec![],
                registers: vec![],
            },
        )
    }

    fn create(&mut self, name: &str, kind: FunctionKind) -> FunctionId {
        let ident = self.interner.get_or_intern(name);
        let id = FunctionId::from_raw(self.functions.len() as u32);
        self.functions.alloc(FunctionBase::new(id, ident, kind));
        id
    }

    /// Returns the function with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not created by this package.
    pub fn function(&self, id: FunctionId) -> &FunctionBase {
        self.functions.get(id)
    }

    /// Returns mutable access to the function with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not created by this package.
    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionBase {
        self.functions.get_mut(id)
    }

    /// Iterates over functions in creation order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionBase> {
        self.functions.values()
    }

    /// Returns the function IDs in creation order.
    pub fn function_ids(&self) -> Vec<FunctionId> {
        self.functions.iter().map(|(id, _)| id).collect()
    }

    /// Looks up a function by name.
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        let ident = self.interner.get(name)?;
        self.functions
            .iter()
            .find(|(_, f)| f.name == ident)
            .map(|(id, _)| id)
    }

    /// Declares a package-level channel with the given payload type.
    pub fn add_channel(&mut self, name: &str, payload: TypeId) -> Ident {
        let ident = self.interner.get_or_intern(name);
        self.channels.insert(ident, payload);
        ident
    }

    /// Returns the payload type of a declared channel.
    pub fn channel_payload(&self, name: Ident) -> Option<TypeId> {
        self.channels.get(&name).copied()
    }

    /// Assigns a name to a node, uniquifying with a numeric suffix when the
    /// requested name is already held by a different node. Returns the
    /// identifier actually assigned.
    pub fn set_node_name(
        &mut self,
        function: FunctionId,
        node: NodeId,
        name: &str,
    ) -> IrResult<Ident> {
        let mut candidate = self.interner.get_or_intern(name);
        let f = self.functions.get_mut(function);
        let mut suffix = 1u32;
        loop {
            match f.node_by_name(candidate) {
                Some(holder) if holder != node => {
                    candidate = self.interner.get_or_intern(&format!("{name}__{suffix}"));
                    suffix += 1;
                    if suffix > f.node_count() as u32 + 1 {
                        return Err(IrError::InvariantViolation(format!(
                            "unable to uniquify name '{name}'"
                        )));
                    }
                }
                _ => {
                    f.set_name(node, candidate)?;
                    return Ok(candidate);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeOp;
    use crate::value::Value;

    #[test]
    fn create_and_find_functions() {
        let mut p = Package::new("pkg");
        let f = p.create_function("main");
        let g = p.create_proc("pump");
        assert_eq!(p.find_function("main"), Some(f));
        assert_eq!(p.find_function("pump"), Some(g));
        assert_eq!(p.find_function("absent"), None);
        assert_eq!(p.function_ids(), vec![f, g]);
    }

    #[test]
    fn channel_table() {
        let mut p = Package::new("pkg");
        let b8 = p.types.bits(8);
        let ch = p.add_channel("in0", b8);
        assert_eq!(p.channel_payload(ch), Some(b8));
        assert_eq!(p.channel_payload(p.intern("other")), None);
    }

    #[test]
    fn set_node_name_uniquifies() {
        let mut p = Package::new("pkg");
        let fid = p.create_function("f");
        let b8 = p.types.bits(8);
        let f = p.function_mut(fid);
        let a = f
            .add_node(
                NodeOp::Literal {
                    value: Value::bits(8, 0),
                },
                vec![],
                b8,
            )
            .unwrap();
        let b = f
            .add_node(
                NodeOp::Literal {
                    value: Value::bits(8, 1),
                },
                vec![],
                b8,
            )
            .unwrap();
        let first = p.set_node_name(fid, a, "acc").unwrap();
        let second = p.set_node_name(fid, b, "acc").unwrap();
        assert_eq!(p.resolve(first), "acc");
        assert_eq!(p.resolve(second), "acc__1");
    }

    #[test]
    fn functions_iterate_in_creation_order() {
        let mut p = Package::new("pkg");
        p.create_function("first");
        p.create_proc("second");
        p.create_block("third");
        let names: Vec<&str> = p.functions().map(|f| p.resolve(f.name)).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }
}

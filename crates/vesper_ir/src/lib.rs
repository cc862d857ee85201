//! VesperIR — the intermediate representation core of the Vesper hardware
//! synthesis toolchain.
//!
//! This crate defines the node-graph IR that every transformation in the
//! toolchain operates on, plus the traversal and diffing machinery that the
//! pass layers build upon:
//!
//! - **[`Arena`]** provides dense, ID-indexed storage for IR entities.
//! - **Opaque IDs** ([`NodeId`], [`FunctionId`], [`TypeId`]) are `Copy` +
//!   `Hash` for cheap references; operand edges are [`NodeId`]s into the
//!   owning [`FunctionBase`]'s node arena.
//! - **[`TypeDb`]** interns the type algebra for O(1) equality checks.
//! - **[`topo_sort`]/[`reverse_topo_sort`]** give the stable topological
//!   traversal order all transformations rely on.
//! - **[`zip_types`]/[`format_type_mismatch`]** render structural diffs
//!   between nominally identical types.

#![warn(missing_docs)]

pub mod arena;
pub mod call_graph;
pub mod error;
pub mod function;
pub mod ids;
pub mod loc;
pub mod node;
pub mod package;
pub mod topo;
pub mod type_diff;
pub mod types;
pub mod value;
pub mod zip_types;

pub use arena::{Arena, ArenaId};
pub use call_graph::functions_in_post_order;
pub use error::{IrError, IrResult};
pub use function::{ForeignFunctionData, FunctionBase, FunctionKind, Register};
pub use ids::{FunctionId, NodeId, TypeId};
pub use loc::SourceSpan;
pub use node::{BinaryOp, Node, NodeOp, UnaryOp};
pub use package::Package;
pub use topo::{reverse_topo_sort, topo_sort};
pub use type_diff::format_type_mismatch;
pub use types::{Type, TypeDb};
pub use value::{BitsValue, Value};
pub use zip_types::{zip_types, ZipParent, ZipTypesCallbacks};

//! The IR type algebra and the central type database.
//!
//! All types in a package are interned into a [`TypeDb`], which assigns each
//! unique type a [`TypeId`] for cheap comparison and storage. Structural
//! equality follows the variant tag and child structure; [`Type::Struct`]
//! additionally compares its nominal name, so two structs with identical
//! fields but different names intern to distinct IDs.

use crate::ids::TypeId;
use serde::{Deserialize, Serialize};
use vesper_common::{Ident, Interner};

/// A type in the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// A bit vector of known width. `Bits { width: 0 }` is legal and denotes
    /// the empty value.
    Bits {
        /// The number of bits.
        width: u32,
    },
    /// An anonymous product of element types.
    Tuple {
        /// The element types in order.
        elements: Vec<TypeId>,
    },
    /// A nominal product type with named fields.
    Struct {
        /// The nominal type name.
        name: Ident,
        /// Named fields with their types, in declaration order.
        fields: Vec<(Ident, TypeId)>,
    },
    /// A fixed-size homogeneous array.
    Array {
        /// The type of each element.
        element: TypeId,
        /// The number of elements.
        size: u32,
    },
    /// A channel carrying payloads of the given type.
    Chan {
        /// The payload type.
        payload: TypeId,
    },
    /// A function type.
    Function {
        /// Parameter types in order.
        params: Vec<TypeId>,
        /// The return type.
        ret: TypeId,
    },
    /// The type of a type — produced by `typeof`-style introspection.
    Meta {
        /// The underlying type.
        inner: TypeId,
    },
}

impl Type {
    /// Returns `true` if this type is an aggregate (has child types).
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, Type::Bits { .. })
    }
}

/// Central type database — interned types for cheap comparison.
///
/// Each unique [`Type`] is stored once and referenced by [`TypeId`], making
/// type equality an ID comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates a new, empty type database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, returning its [`TypeId`].
    ///
    /// If an identical type already exists, returns the existing ID.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        for (i, existing) in self.types.iter().enumerate() {
            if existing == &ty {
                return TypeId::from_raw(i as u32);
            }
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Interns a `bits[width]` type.
    pub fn bits(&mut self, width: u32) -> TypeId {
        self.intern(Type::Bits { width })
    }

    /// Interns the empty tuple (unit) type.
    pub fn unit(&mut self) -> TypeId {
        self.intern(Type::Tuple { elements: vec![] })
    }

    /// Returns a reference to the type with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.as_raw() as usize]
    }

    /// Returns the flat bit width of a type, if it has one.
    ///
    /// Channels, function types, and meta types have no data width.
    pub fn bit_width(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            Type::Bits { width } => Some(*width),
            Type::Tuple { elements } => elements
                .iter()
                .map(|e| self.bit_width(*e))
                .sum::<Option<u32>>(),
            Type::Struct { fields, .. } => fields
                .iter()
                .map(|(_, ty)| self.bit_width(*ty))
                .sum::<Option<u32>>(),
            Type::Array { element, size } => self.bit_width(*element).map(|w| w * size),
            Type::Chan { .. } | Type::Function { .. } | Type::Meta { .. } => None,
        }
    }

    /// Renders a type as canonical text, e.g. `bits[8]`,
    /// `(bits[8], bits[16])`, `Point{x: bits[8], y: bits[8]}`,
    /// `bits[8][4]`, `chan(bits[32])`, `typeof(bits[1])`.
    pub fn render(&self, id: TypeId, interner: &Interner) -> String {
        match self.get(id) {
            Type::Bits { width } => format!("bits[{width}]"),
            Type::Tuple { elements } => {
                let inner: Vec<String> =
                    elements.iter().map(|e| self.render(*e, interner)).collect();
                format!("({})", inner.join(", "))
            }
            Type::Struct { name, fields } => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(f, ty)| {
                        format!("{}: {}", interner.resolve(*f), self.render(*ty, interner))
                    })
                    .collect();
                format!("{}{{{}}}", interner.resolve(*name), inner.join(", "))
            }
            Type::Array { element, size } => {
                format!("{}[{size}]", self.render(*element, interner))
            }
            Type::Chan { payload } => format!("chan({})", self.render(*payload, interner)),
            Type::Function { params, ret } => {
                let inner: Vec<String> =
                    params.iter().map(|p| self.render(*p, interner)).collect();
                format!(
                    "fn({}) -> {}",
                    inner.join(", "),
                    self.render(*ret, interner)
                )
            }
            Type::Meta { inner } => format!("typeof({})", self.render(*inner, interner)),
        }
    }

    /// Returns the number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types have been interned.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

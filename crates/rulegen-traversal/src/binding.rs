use proc_macro2::Ident;
use rulegen_ast::ShapeId;

use crate::{RustType, TraversedShape};

/// A value in scope for a traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum TraversalBinding {
    /// Every member of the bound value is in scope. At most one
    /// global binding is consulted.
    Global {
        /// The local holding the value.
        ident: Ident,
        /// Its shape.
        shape: TraversedShape,
        /// Its type.
        ty: RustType,
    },
    /// The bound value is in scope under `name`.
    Named {
        /// The JMESPath identifier.
        name: String,
        /// The local holding the value.
        ident: Ident,
        /// Its shape.
        shape: TraversedShape,
        /// Its type.
        ty: RustType,
    },
}

impl TraversalBinding {
    /// The local holding the value.
    pub fn ident(&self) -> &Ident {
        match self {
            Self::Global { ident, .. } | Self::Named { ident, .. } => ident,
        }
    }

    /// The bound value's shape.
    pub fn shape(&self) -> &TraversedShape {
        match self {
            Self::Global { shape, .. } | Self::Named { shape, .. } => shape,
        }
    }

    /// The bound value's type.
    pub fn ty(&self) -> &RustType {
        match self {
            Self::Global { ty, .. } | Self::Named { ty, .. } => ty,
        }
    }
}

/// A root parameter of a generated traversal function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraversalRoot {
    /// The value whose members are in scope, passed as `root`.
    Global(ShapeId),
    /// A value in scope under a name.
    Named(String, ShapeId),
}

impl TraversalRoot {
    /// A global root of shape `shape`.
    pub fn global(shape: impl Into<ShapeId>) -> Self {
        Self::Global(shape.into())
    }

    /// A root of shape `shape` named `name`.
    pub fn named(name: impl Into<String>, shape: impl Into<ShapeId>) -> Self {
        Self::Named(name.into(), shape.into())
    }

    /// The root's shape.
    pub fn shape(&self) -> &ShapeId {
        match self {
            Self::Global(shape) | Self::Named(_, shape) => shape,
        }
    }
}

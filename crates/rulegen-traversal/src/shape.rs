use std::fmt;

use rulegen_ast::{Schema, Shape, ShapeId};

use crate::{TraversalError, ty::RustType};

/// The category of a value the traversal produces.
///
/// The optional [`ShapeId`] names the schema shape backing the
/// value. Computed values, like the result of `length(..)`,
/// have none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraversedShape {
    /// A list.
    Array {
        /// The list shape, if any.
        shape: Option<ShapeId>,
        /// The shape of each element.
        member: Box<TraversedShape>,
    },
    /// A structure or map.
    Object(Option<ShapeId>),
    /// A boolean.
    Bool(Option<ShapeId>),
    /// An enum.
    Enum(Option<ShapeId>),
    /// A number.
    Number(Option<ShapeId>),
    /// A string.
    String(Option<ShapeId>),
}

impl TraversedShape {
    /// An array of `member` that isn't backed by a schema
    /// shape.
    pub fn array_of(member: TraversedShape) -> Self {
        Self::Array {
            shape: None,
            member: Box::new(member),
        }
    }

    /// The schema shape backing this value.
    pub fn shape_id(&self) -> Option<&ShapeId> {
        match self {
            Self::Array { shape, .. }
            | Self::Object(shape)
            | Self::Bool(shape)
            | Self::Enum(shape)
            | Self::Number(shape)
            | Self::String(shape) => shape.as_ref(),
        }
    }

    /// The element shape, if this is an array.
    pub fn member(&self) -> Option<&TraversedShape> {
        match self {
            Self::Array { member, .. } => Some(member),
            _ => None,
        }
    }

    /// Reports whether this is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// Reports whether this is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Reports whether this is a string or an enum, which
    /// compare as strings.
    pub fn is_stringish(&self) -> bool {
        matches!(self, Self::String(_) | Self::Enum(_))
    }

    /// The name of the category, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Array { .. } => "array",
            Self::Object(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Enum(_) => "enum",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Reports whether `self` and `other` compare with one
    /// another.
    pub(crate) fn same_category(&self, other: &TraversedShape) -> bool {
        match (self, other) {
            (a, b) if a.is_stringish() && b.is_stringish() => true,
            (Self::Number(_), Self::Number(_)) | (Self::Bool(_), Self::Bool(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TraversedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { member, .. } => write!(f, "array of {member}"),
            other => f.write_str(other.kind()),
        }
    }
}

fn lookup<'a>(schema: &'a Schema, id: &ShapeId) -> Result<&'a Shape, TraversalError> {
    schema
        .get(id)
        .ok_or_else(|| TraversalError::invalid(format!("unknown shape `{id}`")))
}

fn unsupported(shape: &Shape) -> TraversalError {
    TraversalError::unsupported(format!("`{}` shapes", shape.kind()))
}

/// Classifies a schema shape.
///
/// Unions, blobs, timestamps, documents and arbitrary precision
/// numbers have no traversal representation.
pub fn classify(schema: &Schema, id: &ShapeId) -> Result<TraversedShape, TraversalError> {
    let shape = lookup(schema, id)?;
    let id = Some(id.clone());
    let traversed = match shape {
        Shape::Structure(_) | Shape::Map(_) => TraversedShape::Object(id),
        Shape::List(list) | Shape::Set(list) => TraversedShape::Array {
            shape: id,
            member: Box::new(classify(schema, &list.member)?),
        },
        Shape::Boolean => TraversedShape::Bool(id),
        Shape::Enum(_) => TraversedShape::Enum(id),
        Shape::Byte
        | Shape::Short
        | Shape::Integer
        | Shape::Long
        | Shape::Float
        | Shape::Double => TraversedShape::Number(id),
        Shape::String => TraversedShape::String(id),
        Shape::Union(_)
        | Shape::BigInteger
        | Shape::BigDecimal
        | Shape::Blob
        | Shape::Timestamp
        | Shape::Document => return Err(unsupported(shape)),
    };
    Ok(traversed)
}

/// The Rust type the data model uses for a schema shape.
pub fn rust_type(schema: &Schema, id: &ShapeId) -> Result<RustType, TraversalError> {
    let shape = lookup(schema, id)?;
    let ty = match shape {
        Shape::Structure(_) | Shape::Enum(_) => RustType::Opaque(id.type_name()),
        Shape::Map(map) => RustType::HashMap(
            Box::new(RustType::String),
            Box::new(rust_type(schema, &map.value)?),
        ),
        Shape::List(list) | Shape::Set(list) => {
            RustType::Vec(Box::new(rust_type(schema, &list.member)?))
        }
        Shape::Boolean => RustType::Bool,
        Shape::String => RustType::String,
        Shape::Byte => RustType::Integer(8),
        Shape::Short => RustType::Integer(16),
        Shape::Integer => RustType::Integer(32),
        Shape::Long => RustType::Integer(64),
        Shape::Float => RustType::Float(32),
        Shape::Double => RustType::Float(64),
        Shape::Union(_)
        | Shape::BigInteger
        | Shape::BigDecimal
        | Shape::Blob
        | Shape::Timestamp
        | Shape::Document => return Err(unsupported(shape)),
    };
    Ok(ty)
}

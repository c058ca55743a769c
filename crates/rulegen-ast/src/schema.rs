use std::{borrow::Borrow, fmt};

use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};

/// Identifies a [`Shape`] within a [`Schema`].
///
/// Ids may be namespaced (`com.example#Output`); only the part
/// after `#` is used to name generated Rust types.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Creates a shape id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The full id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its namespace.
    pub fn name(&self) -> &str {
        match self.0.rsplit_once('#') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ShapeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A collection of shapes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// All shapes, by id.
    pub shapes: IndexMap<ShapeId, Shape>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape, replacing any shape with the same id.
    #[must_use]
    pub fn with(mut self, id: impl Into<ShapeId>, shape: Shape) -> Self {
        self.shapes.insert(id.into(), shape);
        self
    }

    /// Looks up a shape.
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }
}

/// A schema shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    /// A structure with named members.
    Structure(Structure),
    /// A tagged union.
    Union(Structure),
    /// A map from strings to `value`.
    Map(MapShape),
    /// An ordered list.
    List(ListShape),
    /// A list of unique values.
    Set(ListShape),
    /// `true` or `false`.
    Boolean,
    /// A UTF-8 string.
    String,
    /// A string restricted to a fixed set of values.
    Enum(EnumShape),
    /// 8-bit signed integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Arbitrary precision integer.
    BigInteger,
    /// Arbitrary precision decimal.
    BigDecimal,
    /// Raw bytes.
    Blob,
    /// A point in time.
    Timestamp,
    /// Untyped data.
    Document,
}

impl Shape {
    /// The kind of shape, as written in schema files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structure(_) => "structure",
            Self::Union(_) => "union",
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Enum(_) => "enum",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigInteger => "bigInteger",
            Self::BigDecimal => "bigDecimal",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
            Self::Document => "document",
        }
    }
}

/// The members of a structure or union.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Members, in declaration order.
    #[serde(default)]
    pub members: IndexMap<String, Member>,
}

impl Structure {
    /// Adds a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, target: impl Into<ShapeId>, required: bool) -> Self {
        self.members.insert(
            name.into(),
            Member {
                target: target.into(),
                required,
            },
        );
        self
    }
}

/// A structure member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The member's shape.
    pub target: ShapeId,
    /// Whether the member is always present.
    #[serde(default)]
    pub required: bool,
}

/// A map shape. Keys are always strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapShape {
    /// The value shape.
    pub value: ShapeId,
}

/// A list or set shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListShape {
    /// The element shape.
    pub member: ShapeId,
}

/// An enum shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumShape {
    /// The allowed values.
    #[serde(default)]
    pub values: Vec<String>,
}

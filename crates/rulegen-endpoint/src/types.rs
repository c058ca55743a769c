use std::fmt;

use proc_macro2::TokenStream;
use quote::quote;

/// The static type of a rules value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RulesType {
    /// A string. Locals hold a `&str`.
    String,
    /// A `bool`.
    Bool,
    /// An integer. Only literals have this type, so they're
    /// emitted unsuffixed.
    Int,
    /// A list of strings. Locals hold a `&[String]`.
    StringArray,
    /// A value with named attributes.
    Record(RecordType),
    /// A value that may be absent.
    Option(Box<RulesType>),
}

impl RulesType {
    /// Shorthand for [`RulesType::Option`].
    pub fn option(inner: RulesType) -> Self {
        Self::Option(Box::new(inner))
    }

    /// Reports whether the type is optional.
    pub fn is_option(&self) -> bool {
        matches!(self, Self::Option(_))
    }

    /// Removes one level of optionality.
    pub fn unwrap_option(&self) -> &RulesType {
        match self {
            Self::Option(inner) => inner,
            ty => ty,
        }
    }

    /// Reports whether values of this type can be interpolated
    /// into a string template.
    pub fn is_displayable(&self) -> bool {
        matches!(self, Self::String | Self::Bool | Self::Int)
    }
}

impl fmt::Display for RulesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Bool => f.write_str("boolean"),
            Self::Int => f.write_str("integer"),
            Self::StringArray => f.write_str("string array"),
            Self::Record(record) => f.write_str(&record.name),
            Self::Option(inner) => write!(f, "optional {inner}"),
        }
    }
}

/// The type of a record such as a partition or a parsed URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordType {
    /// The record's name, used in diagnostics.
    pub name: String,
    /// The record's attributes.
    pub fields: Vec<RecordField>,
}

impl RecordType {
    /// Creates an empty record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds an attribute read by calling `accessor`.
    #[must_use]
    pub fn field(mut self, name: &str, accessor: &str, ty: RulesType) -> Self {
        self.fields.push(RecordField {
            name: name.to_owned(),
            accessor: accessor.to_owned(),
            ty,
        });
        self
    }

    /// Looks up an attribute by its rules name.
    pub fn get(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An attribute of a [`RecordType`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordField {
    /// The rules name, e.g. `dnsSuffix`.
    pub name: String,
    /// The method returning the attribute, e.g. `dns_suffix`.
    pub accessor: String,
    /// The attribute's type.
    pub ty: RulesType,
}

/// Whether an expression must produce a value that outlives
/// the resolver's locals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// A view is fine, e.g. a `&str` compared in a condition.
    Borrowed,
    /// The value is returned from the resolver, e.g. an endpoint
    /// URL or an error message.
    Owned,
}

/// A compiled rules expression.
#[derive(Clone, Debug)]
pub struct CompiledExpr {
    /// Evaluates the expression.
    pub tokens: TokenStream,
    /// The expression's type.
    pub ty: RulesType,
    /// Set when `tokens` evaluate to a `String` rather than a
    /// `&str`.
    pub owned: bool,
}

impl CompiledExpr {
    pub(crate) fn new(tokens: TokenStream, ty: RulesType) -> Self {
        Self {
            tokens,
            ty,
            owned: false,
        }
    }

    pub(crate) fn owned_string(tokens: TokenStream) -> Self {
        Self {
            tokens,
            ty: RulesType::String,
            owned: true,
        }
    }

    /// Converts an owned string to a `&str` borrowed from a
    /// temporary.
    pub(crate) fn into_borrowed(self) -> Self {
        if !self.owned {
            return self;
        }
        let tokens = self.tokens;
        Self {
            tokens: quote!(#tokens.as_str()),
            ty: self.ty,
            owned: false,
        }
    }
}

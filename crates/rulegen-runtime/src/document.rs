use std::collections::HashMap;

/// A JSON-like endpoint property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    /// A map of named values.
    Object(HashMap<String, Document>),
    /// A list of values.
    Array(Vec<Document>),
    /// An integer.
    Number(i64),
    /// A string.
    String(String),
    /// A boolean.
    Bool(bool),
    /// No value.
    Null,
}

impl Document {
    /// Returns the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object, if this is one.
    pub fn as_object(&self) -> Option<&HashMap<String, Document>> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<Document>> for Document {
    fn from(items: Vec<Document>) -> Self {
        Self::Array(items)
    }
}

impl From<HashMap<String, Document>> for Document {
    fn from(obj: HashMap<String, Document>) -> Self {
        Self::Object(obj)
    }
}

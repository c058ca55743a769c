use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::{Parameter, ShapeId};

// Strict and reserved keywords, plus the weak ones that can't
// be struct fields.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Reports whether `s` is a Rust keyword.
pub fn is_rust_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Converts a schema or ruleset name to a snake_case Rust
/// field name.
///
/// Keywords are returned unchanged, callers decide whether to
/// use a raw identifier.
pub fn field_name(name: &str) -> String {
    name.to_snake_case()
}

/// Converts a name to an UpperCamelCase Rust type name.
pub fn type_name(name: &str) -> String {
    name.to_upper_camel_case()
}

impl Parameter {
    /// The name of the field holding this parameter in the
    /// generated `Params` struct.
    pub fn field_name(&self) -> String {
        field_name(&self.name)
    }
}

impl ShapeId {
    /// The name of the Rust type generated for this shape.
    pub fn type_name(&self) -> String {
        type_name(self.name())
    }
}

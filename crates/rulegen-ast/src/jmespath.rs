//! The JMESPath expression tree.
//!
//! [`Display`](fmt::Display) renders an expression back to
//! JMESPath text. The output parses to an equivalent tree,
//! which is what error messages rely on.

use std::fmt;

/// A JMESPath expression.
#[derive(Clone, Debug, PartialEq)]
pub enum JmesExpr {
    /// `foo`
    Field(String),
    /// `left.right`
    Subexpression(Box<JmesExpr>, Box<JmesExpr>),
    /// `left[index]`
    Index {
        /// The indexed expression.
        left: Box<JmesExpr>,
        /// The index, negative values count from the end.
        index: i64,
    },
    /// `left[start:stop:step]`
    Slice {
        /// The sliced expression.
        left: Box<JmesExpr>,
        /// Start index.
        start: Option<i64>,
        /// Stop index.
        stop: Option<i64>,
        /// Step.
        step: Option<i64>,
    },
    /// `left[*].right`, or `left[].right` when `left` is a
    /// [`JmesExpr::Flatten`].
    Projection {
        /// The projected collection.
        left: Box<JmesExpr>,
        /// Applied to each element.
        right: Box<JmesExpr>,
    },
    /// `left[?condition].right`
    FilterProjection {
        /// The filtered collection.
        left: Box<JmesExpr>,
        /// Applied to each element that passes the filter.
        right: Box<JmesExpr>,
        /// The filter.
        condition: Box<JmesExpr>,
    },
    /// `left.*.right`
    ObjectProjection {
        /// The object whose values are projected.
        left: Box<JmesExpr>,
        /// Applied to each value.
        right: Box<JmesExpr>,
    },
    /// `expr[]`
    Flatten(Box<JmesExpr>),
    /// `[a, b]`
    MultiSelectList(Vec<JmesExpr>),
    /// `{k: a}`
    MultiSelectHash(Vec<(String, JmesExpr)>),
    /// `left <op> right`
    Comparator {
        /// The operator.
        op: Comparator,
        /// Left operand.
        left: Box<JmesExpr>,
        /// Right operand.
        right: Box<JmesExpr>,
    },
    /// `left && right`
    And(Box<JmesExpr>, Box<JmesExpr>),
    /// `left || right`
    Or(Box<JmesExpr>, Box<JmesExpr>),
    /// `!expr`
    Not(Box<JmesExpr>),
    /// `left | right`
    Pipe(Box<JmesExpr>, Box<JmesExpr>),
    /// `name(args...)`
    Function {
        /// The function name.
        name: String,
        /// Positional arguments.
        args: Vec<JmesExpr>,
    },
    /// A raw string or JSON literal.
    Literal(JmesLiteral),
    /// `@`
    Current,
    /// `&expr`
    ExpressionType(Box<JmesExpr>),
}

impl JmesExpr {
    /// Shorthand for [`JmesExpr::Field`].
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Shorthand for [`JmesExpr::Subexpression`].
    pub fn sub(left: JmesExpr, right: JmesExpr) -> Self {
        Self::Subexpression(Box::new(left), Box::new(right))
    }

    /// Binding power used to decide where parentheses are
    /// needed when rendering.
    fn precedence(&self) -> u8 {
        match self {
            Self::Pipe(..) => 1,
            Self::Or(..) => 2,
            Self::And(..) => 3,
            Self::Comparator { .. } => 5,
            Self::Not(_) => 45,
            Self::Projection { .. }
            | Self::FilterProjection { .. }
            | Self::ObjectProjection { .. }
            | Self::Flatten(_) => 9,
            _ => u8::MAX,
        }
    }

    fn is_current_or_flattened_current(&self) -> bool {
        match self {
            Self::Current => true,
            Self::Flatten(inner) => **inner == Self::Current,
            _ => false,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            fmt::Display::fmt(self, f)
        }
    }

    /// Renders the right-hand side of a projection.
    fn fmt_projection_rhs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => Ok(()),
            Self::Index { left, .. } | Self::Slice { left, .. } if **left == Self::Current => {
                fmt::Display::fmt(self, f)
            }
            Self::Projection { left, .. } | Self::FilterProjection { left, .. }
                if left.is_current_or_flattened_current() =>
            {
                fmt::Display::fmt(self, f)
            }
            _ => {
                f.write_str(".")?;
                self.fmt_operand(f, 10)
            }
        }
    }
}

impl fmt::Display for JmesExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => fmt_identifier(f, name),
            Self::Subexpression(left, right) => {
                left.fmt_operand(f, 10)?;
                f.write_str(".")?;
                right.fmt_operand(f, 10)
            }
            Self::Index { left, index } => {
                if **left != Self::Current {
                    left.fmt_operand(f, 10)?;
                }
                write!(f, "[{index}]")
            }
            Self::Slice {
                left,
                start,
                stop,
                step,
            } => {
                if **left != Self::Current {
                    left.fmt_operand(f, 10)?;
                }
                f.write_str("[")?;
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                f.write_str("]")
            }
            Self::Projection { left, right } => {
                match &**left {
                    Self::Flatten(inner) => {
                        if **inner != Self::Current {
                            inner.fmt_operand(f, 9)?;
                        }
                        f.write_str("[]")?;
                    }
                    Self::Slice { .. } => left.fmt(f)?,
                    Self::Current => f.write_str("[*]")?,
                    other => {
                        other.fmt_operand(f, 10)?;
                        f.write_str("[*]")?;
                    }
                }
                right.fmt_projection_rhs(f)
            }
            Self::FilterProjection {
                left,
                right,
                condition,
            } => {
                if **left != Self::Current {
                    left.fmt_operand(f, 10)?;
                }
                write!(f, "[?{condition}]")?;
                right.fmt_projection_rhs(f)
            }
            Self::ObjectProjection { left, right } => {
                if **left == Self::Current {
                    f.write_str("*")?;
                } else {
                    left.fmt_operand(f, 10)?;
                    f.write_str(".*")?;
                }
                right.fmt_projection_rhs(f)
            }
            Self::Flatten(inner) => {
                if **inner != Self::Current {
                    inner.fmt_operand(f, 9)?;
                }
                f.write_str("[]")
            }
            Self::MultiSelectList(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Self::MultiSelectHash(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_identifier(f, key)?;
                    write!(f, ": {value}")?;
                }
                f.write_str("}")
            }
            Self::Comparator { op, left, right } => {
                left.fmt_operand(f, 6)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, 6)
            }
            Self::And(left, right) => {
                left.fmt_operand(f, 3)?;
                f.write_str(" && ")?;
                right.fmt_operand(f, 4)
            }
            Self::Or(left, right) => {
                left.fmt_operand(f, 2)?;
                f.write_str(" || ")?;
                right.fmt_operand(f, 3)
            }
            Self::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_operand(f, 45)
            }
            Self::Pipe(left, right) => {
                left.fmt_operand(f, 1)?;
                f.write_str(" | ")?;
                right.fmt_operand(f, 2)
            }
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str(")")
            }
            Self::Literal(JmesLiteral::String(s)) => {
                f.write_str("'")?;
                for c in s.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            Self::Literal(lit) => write!(f, "`{lit}`"),
            Self::Current => f.write_str("@"),
            Self::ExpressionType(inner) => {
                f.write_str("&")?;
                inner.fmt_operand(f, 10)
            }
        }
    }
}

fn fmt_identifier(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        f.write_str(name)
    } else {
        fmt_json_string(f, name)
    }
}

fn fmt_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{:04x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// A comparison operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl Comparator {
    /// Reports whether the operator only tests for equality.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        };
        f.write_str(s)
    }
}

/// A literal value.
///
/// Raw string literals (`'foo'`) and JSON literals
/// (`` `"foo"` ``) both produce [`JmesLiteral::String`].
#[derive(Clone, Debug, PartialEq)]
pub enum JmesLiteral {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// An integral number.
    Int(i64),
    /// A number with a fractional part or exponent.
    Float(f64),
    /// A string.
    String(String),
    /// A JSON array.
    Array(Vec<JmesLiteral>),
    /// A JSON object.
    Object(Vec<(String, JmesLiteral)>),
}

impl JmesLiteral {
    /// The JSON type name of the literal.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// Renders the literal as JSON.
impl fmt::Display for JmesLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => fmt_json_string(f, s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Self::Object(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    fmt_json_string(f, k)?;
                    write!(f, ":{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

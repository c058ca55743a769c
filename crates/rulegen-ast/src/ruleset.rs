use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// An endpoint ruleset.
///
/// Parameters are kept in declaration order since generated
/// code binds them in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    /// The ruleset format version, e.g. `1.0`.
    pub version: String,
    /// The ruleset's input parameters.
    pub parameters: Vec<Parameter>,
    /// The top-level rules, evaluated in order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Looks up a parameter by its ruleset name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A ruleset input parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// The parameter name as written in the ruleset, e.g. `UseFIPS`.
    pub name: String,
    /// The parameter type.
    pub ty: ParameterType,
    /// Whether the caller must always provide a value.
    pub required: bool,
    /// The value used when the caller does not provide one.
    pub default: Option<ParameterValue>,
    /// The client configuration value that supplies this
    /// parameter, e.g. `AWS::Region`.
    pub built_in: Option<String>,
    /// Documentation for the parameter.
    pub documentation: Option<String>,
    /// Deprecation notice, if the parameter is deprecated.
    pub deprecated: Option<Deprecated>,
}

impl Parameter {
    /// Reports whether a value is always present after the
    /// parameters have been built.
    pub fn is_always_set(&self) -> bool {
        self.default.is_some() || self.required
    }
}

/// Deprecation metadata for a [`Parameter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecated {
    /// Explanation of the deprecation.
    #[serde(default)]
    pub message: Option<String>,
    /// When the parameter was deprecated.
    #[serde(default)]
    pub since: Option<String>,
}

/// The type of a ruleset [`Parameter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    /// A string.
    #[serde(alias = "string")]
    String,
    /// A boolean.
    #[serde(alias = "boolean")]
    Boolean,
    /// A list of strings.
    #[serde(alias = "stringArray")]
    StringArray,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Boolean => f.write_str("Boolean"),
            Self::StringArray => f.write_str("StringArray"),
        }
    }
}

/// A concrete parameter value, used for defaults and test
/// cases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A string value.
    String(String),
    /// A boolean value.
    Bool(bool),
    /// A list of strings.
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// Returns the [`ParameterType`] this value inhabits.
    pub fn ty(&self) -> ParameterType {
        match self {
            Self::String(_) => ParameterType::String,
            Self::Bool(_) => ParameterType::Boolean,
            Self::StringArray(_) => ParameterType::StringArray,
        }
    }
}

/// A single rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// Documentation for the rule.
    pub documentation: Option<String>,
    /// Conditions that must all hold for the rule to match.
    pub conditions: Vec<Condition>,
    /// What the rule produces once matched.
    pub kind: RuleKind,
}

/// The outcome of a matched [`Rule`].
#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    /// Resolve to an endpoint.
    Endpoint(EndpointTemplate),
    /// Fail with an error message.
    Error(Expr),
    /// Continue with a nested list of rules.
    Tree(Vec<Rule>),
}

impl RuleKind {
    /// A short name for the outcome, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Endpoint(_) => "endpoint",
            Self::Error(_) => "error",
            Self::Tree(_) => "tree",
        }
    }
}

/// The endpoint a rule resolves to.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointTemplate {
    /// The endpoint URL.
    pub url: Expr,
    /// Headers, each with one or more values.
    pub headers: Vec<(String, Vec<Expr>)>,
    /// Additional endpoint properties.
    pub properties: Vec<(String, Expr)>,
}

/// A rule condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    /// The function whose result decides the condition.
    pub function: FunctionCall,
    /// Binds the function's result for the rest of the rule.
    pub assign: Option<String>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.assign {
            write!(f, "{name} = ")?;
        }
        self.function.fmt(f)
    }
}

/// A function invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    /// The function name, e.g. `stringEquals` or `aws.partition`.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<Expr>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// A ruleset expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// A reference to a parameter or an assigned condition.
    Ref(String),
    /// A function invocation.
    Call(FunctionCall),
}

impl Expr {
    /// Shorthand for [`Expr::Ref`].
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// Shorthand for a string literal without placeholders.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Literal::String(Template::plain(s)))
    }

    /// Shorthand for [`Expr::Call`].
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call(FunctionCall {
            name: name.into(),
            args,
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => lit.fmt(f),
            Self::Ref(name) => f.write_str(name),
            Self::Call(call) => call.fmt(f),
        }
    }
}

/// A literal value.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// A string, possibly with `{..}` placeholders.
    String(Template),
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// An array of expressions.
    Array(Vec<Expr>),
    /// A record of named expressions.
    Record(Vec<(String, Expr)>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(t) => write!(f, "\"{t}\""),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A string template such as `https://{Region}.{PartitionResult#dnsSuffix}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    /// The template's pieces, in order.
    pub parts: Vec<TemplatePart>,
}

impl Template {
    /// A template without placeholders.
    pub fn plain(s: impl Into<String>) -> Self {
        let s = s.into();
        let parts = if s.is_empty() {
            Vec::new()
        } else {
            vec![TemplatePart::Literal(s)]
        };
        Self { parts }
    }

    /// Returns the text if the template has no placeholders.
    pub fn as_plain(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(s) => out.push_str(s),
                TemplatePart::Dynamic(_) => return None,
            }
        }
        Some(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                TemplatePart::Literal(s) => {
                    for c in s.chars() {
                        match c {
                            '{' => f.write_str("{{")?,
                            '}' => f.write_str("}}")?,
                            c => write!(f, "{c}")?,
                        }
                    }
                }
                TemplatePart::Dynamic(Expr::Call(call))
                    if call.name == "getAttr" && call.args.len() == 2 =>
                {
                    match (&call.args[0], &call.args[1]) {
                        (Expr::Ref(r), Expr::Literal(Literal::String(path))) => {
                            write!(f, "{{{r}#{path}}}")?
                        }
                        _ => write!(f, "{{{call}}}")?,
                    }
                }
                TemplatePart::Dynamic(expr) => write!(f, "{{{expr}}}")?,
            }
        }
        Ok(())
    }
}

/// A piece of a [`Template`].
#[derive(Clone, Debug, PartialEq)]
pub enum TemplatePart {
    /// Literal text.
    Literal(String),
    /// An interpolated expression.
    Dynamic(Expr),
}

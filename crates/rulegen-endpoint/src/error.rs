use std::fmt;

use buggy::Bug;

/// The kinds of ruleset compilation errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodegenErrorKind {
    /// A rule calls a function that isn't an intrinsic or in the
    /// registry.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// A rule refers to a name that isn't a parameter or an
    /// assigned condition.
    #[error("unknown reference `{0}`")]
    UnknownReference(String),
    /// A value has the wrong type for where it is used.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// A function argument or test parameter is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The ruleset uses a construct the compiler doesn't
    /// implement.
    #[error("{0} are not supported")]
    Unsupported(String),
    /// The ruleset has no rules. Callers must reject these
    /// before compiling.
    #[error("the ruleset has no rules")]
    EmptyRuleSet,
    /// An implementation bug.
    #[error("bug: {0}")]
    Bug(#[from] Bug),
}

/// An error produced while compiling a ruleset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenError(Box<CodegenErrorImpl>);

#[derive(Clone, Debug, PartialEq, Eq)]
struct CodegenErrorImpl {
    kind: CodegenErrorKind,
    rule: Option<String>,
}

impl CodegenError {
    pub(crate) fn new(kind: CodegenErrorKind) -> Self {
        Self(Box::new(CodegenErrorImpl { kind, rule: None }))
    }

    pub(crate) fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(CodegenErrorKind::TypeMismatch(msg.into()))
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CodegenErrorKind::InvalidArgument(msg.into()))
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::new(CodegenErrorKind::Unsupported(what.into()))
    }

    /// Records the rule that failed unless a more deeply nested
    /// rule already did.
    pub(crate) fn in_rule(mut self, path: &str) -> Self {
        if self.0.rule.is_none() {
            self.0.rule = Some(path.to_owned());
        }
        self
    }

    /// What went wrong.
    pub fn kind(&self) -> &CodegenErrorKind {
        &self.0.kind
    }

    /// The path of the innermost rule being compiled, e.g.
    /// `rules[1].rules[0]`.
    pub fn rule(&self) -> Option<&str> {
        self.0.rule.as_deref()
    }

    /// Reports whether this error is a defect in the compiler or
    /// its caller rather than in the ruleset.
    pub fn is_bug(&self) -> bool {
        matches!(
            self.0.kind,
            CodegenErrorKind::EmptyRuleSet | CodegenErrorKind::Bug(_)
        )
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.kind)?;
        if let Some(rule) = &self.0.rule {
            write!(f, "\nRule: {rule}")?;
        }
        Ok(())
    }
}

impl core::error::Error for CodegenError {}

impl From<Bug> for CodegenError {
    fn from(bug: Bug) -> Self {
        Self::new(CodegenErrorKind::Bug(bug))
    }
}

impl From<CodegenErrorKind> for CodegenError {
    fn from(kind: CodegenErrorKind) -> Self {
        Self::new(kind)
    }
}

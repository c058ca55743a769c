use std::fmt;

use buggy::Bug;

/// The kinds of traversal compilation errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TraversalErrorKind {
    /// The expression uses a construct the compiler doesn't
    /// implement. The message names the construct.
    #[error("{0} are not supported")]
    Unsupported(String),
    /// The expression doesn't make sense against the schema.
    #[error("invalid traversal: {0}")]
    Invalid(String),
    /// A field lookup found no bindings at all. This is a bug in
    /// whoever called the generator.
    #[error("no bindings in scope for `{0}`")]
    MissingBinding(String),
    /// An implementation bug.
    #[error("bug: {0}")]
    Bug(#[from] Bug),
}

/// An error produced while compiling a JMESPath expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraversalError(Box<TraversalErrorImpl>);

#[derive(Clone, Debug, PartialEq, Eq)]
struct TraversalErrorImpl {
    kind: TraversalErrorKind,
    expression: Option<String>,
}

impl TraversalError {
    pub(crate) fn new(kind: TraversalErrorKind) -> Self {
        Self(Box::new(TraversalErrorImpl {
            kind,
            expression: None,
        }))
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::new(TraversalErrorKind::Unsupported(what.into()))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::new(TraversalErrorKind::Invalid(msg.into()))
    }

    /// Records the top-level expression that failed, replacing
    /// whatever a nested call recorded.
    pub(crate) fn with_expression(mut self, expr: impl fmt::Display) -> Self {
        self.0.expression = Some(expr.to_string());
        self
    }

    /// What went wrong.
    pub fn kind(&self) -> &TraversalErrorKind {
        &self.0.kind
    }

    /// The expression being compiled, if known.
    pub fn expression(&self) -> Option<&str> {
        self.0.expression.as_deref()
    }

    /// Reports whether this error is a defect in the compiler
    /// rather than in its input.
    pub fn is_bug(&self) -> bool {
        matches!(
            self.0.kind,
            TraversalErrorKind::MissingBinding(_) | TraversalErrorKind::Bug(_)
        )
    }
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.kind)?;
        if let Some(expr) = &self.0.expression {
            write!(f, "\nExpression: {expr}")?;
        }
        Ok(())
    }
}

impl core::error::Error for TraversalError {}

impl From<Bug> for TraversalError {
    fn from(bug: Bug) -> Self {
        Self::new(TraversalErrorKind::Bug(bug))
    }
}

impl From<TraversalErrorKind> for TraversalError {
    fn from(kind: TraversalErrorKind) -> Self {
        Self::new(kind)
    }
}

use std::fmt;

use buggy::Bug;
use pest::error::{Error as PestError, InputLocation};

use crate::jmespath::Rule;

/// The kinds of errors a parse operation can produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The input could not be tokenized.
    Syntax,
    /// A token appeared where it isn't allowed.
    UnexpectedToken,
    /// The input ended early.
    UnexpectedEnd,
    /// A number is out of range.
    InvalidNumber,
    /// A string or JSON literal is badly formed.
    InvalidLiteral,
    /// A `{..}` string template is badly formed.
    InvalidTemplate,
    /// A ruleset, test or schema document is badly formed.
    InvalidDocument,
    /// An implementation bug.
    Bug,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "Syntax error"),
            Self::UnexpectedToken => write!(f, "Unexpected token"),
            Self::UnexpectedEnd => write!(f, "Unexpected end of input"),
            Self::InvalidNumber => write!(f, "Invalid number"),
            Self::InvalidLiteral => write!(f, "Invalid literal"),
            Self::InvalidTemplate => write!(f, "Invalid template"),
            Self::InvalidDocument => write!(f, "Invalid document"),
            Self::Bug => write!(f, "Bug"),
        }
    }
}

/// An error from one of the parsers in this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// A message describing the error.
    pub message: String,
    /// Byte offset of the error within the input, if known.
    pub offset: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, message: impl Into<String>, offset: Option<usize>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn at(kind: ParseErrorKind, message: impl Into<String>, offset: usize) -> Self {
        Self::new(kind, message, Some(offset))
    }

    pub(crate) fn document(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidDocument, message, None)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind)?;
        if let Some(offset) = self.offset {
            write!(f, "offset {offset}: ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl core::error::Error for ParseError {}

impl From<PestError<Rule>> for ParseError {
    fn from(e: PestError<Rule>) -> Self {
        let offset = match e.location {
            InputLocation::Pos(pos) | InputLocation::Span((pos, _)) => pos,
        };
        Self::at(ParseErrorKind::Syntax, e.variant.message(), offset)
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::document(e.to_string())
    }
}

impl From<Bug> for ParseError {
    fn from(bug: Bug) -> Self {
        Self::new(ParseErrorKind::Bug, bug.msg(), None)
    }
}

use std::borrow::Cow;

use crate::diagnostic::BoxError;

/// Endpoint resolution failed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ResolveEndpointError {
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxError>,
}

impl ResolveEndpointError {
    /// Creates an error with a message.
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the error that caused this one.
    #[must_use]
    pub fn with_source(self, source: Option<BoxError>) -> Self {
        Self { source, ..self }
    }
}

/// The parameters passed to a resolver were invalid.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParams {
    /// A required parameter was not set.
    #[error("a required field was missing: `{field}`")]
    MissingField {
        /// The parameter's field name.
        field: Cow<'static, str>,
    },
}

impl InvalidParams {
    /// A required parameter was not set.
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

//! Context collected while a resolver runs.

use std::error::Error;

/// A boxed error that can cross threads.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Records why a standard library function rejected its input.
///
/// Only the most recent error is kept. A resolver attaches it
/// to its [`ResolveEndpointError`](crate::ResolveEndpointError)
/// when no rule matches, which usually explains why.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    last_error: Option<BoxError>,
}

impl DiagnosticCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error, replacing any earlier one.
    pub fn report_error(&mut self, err: impl Into<BoxError>) {
        self.last_error = Some(err.into());
    }

    /// Returns the value of `result`, recording its error.
    pub fn capture<T, E: Into<BoxError>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report_error(err);
                None
            }
        }
    }

    /// Takes the most recent error.
    pub fn take_last_error(&mut self) -> Option<BoxError> {
        self.last_error.take()
    }
}

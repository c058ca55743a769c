//! Runtime support for endpoint resolvers generated by rulegen.
//!
//! Generated code refers to this crate by path, so everything
//! it names is public and kept stable.

#![warn(missing_docs)]

pub mod diagnostic;
mod document;
mod endpoint;
pub mod endpoint_lib;
mod error;
#[cfg(test)]
mod tests;

pub use diagnostic::DiagnosticCollector;
pub use document::Document;
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{InvalidParams, ResolveEndpointError};

//! The standard library available to endpoint rules.

pub mod host;
pub mod parse_url;
pub mod partition;
pub mod substring;
pub mod uri_encode;

//! The data model shared by the rulegen code generators.
//!
//! - [`RuleSet`] and friends describe an endpoint ruleset.
//! - [`JmesExpr`] is a parsed JMESPath expression.
//! - [`Schema`] describes the shapes JMESPath expressions
//!   traverse.
//! - [`TestSuite`] holds declarative endpoint tests.
//!
//! Parsing lives in `rulegen-lang`.

#![warn(missing_docs)]

mod jmespath;
mod ruleset;
mod schema;
mod testcase;
mod util;


pub use jmespath::*;
pub use ruleset::*;
pub use schema::*;
pub use testcase::*;
pub use util::{field_name, is_rust_keyword, type_name};

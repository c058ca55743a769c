//! Front ends for the rulegen code generators.
//!
//! Everything here turns text into the data model from
//! [`rulegen_ast`]:
//!
//! - [`parse_jmespath`] parses JMESPath expressions.
//! - [`parse_ruleset`] loads endpoint rulesets, including their
//!   `{Ref#attr}` string templates.
//! - [`parse_test_suite`] and [`parse_schema`] load the other
//!   JSON inputs.

#![warn(missing_docs)]

mod error;
mod jmespath;
mod ruleset;
mod template;
#[cfg(test)]
mod tests;

pub use rulegen_ast as ast;

pub use crate::{
    error::{ParseError, ParseErrorKind},
    jmespath::parse_jmespath,
    ruleset::{parse_ruleset, parse_schema, parse_test_suite},
    template::parse_template,
};

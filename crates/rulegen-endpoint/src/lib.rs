//! Compiles endpoint rulesets into Rust.
//!
//! [`generate_resolver`] turns a [`RuleSet`](rulegen_ast::RuleSet)
//! into:
//!
//! - `Params` and `ParamsBuilder`, the resolver's input.
//! - `DefaultResolver`, which holds the state of the runtime
//!   functions the rules use and exposes `resolve_endpoint`.
//! - `fn resolve_endpoint`, the compiled rules.
//!
//! Rules become nested `if`/`if let` statements evaluated in
//! order. Every level whose last rule can fail to match ends in
//! an error, so the resolver always returns.
//!
//! [`generate_tests`] turns declarative test cases into `#[test]`
//! functions for the generated resolver.
//!
//! The generated code depends on `rulegen-runtime`.

#![warn(missing_docs)]

mod error;
mod expr;
mod functions;
mod params;
mod resolver;
mod rules;
mod scope;
pub mod stdlib;
mod testgen;
mod types;

#[cfg(test)]
mod tests;

use proc_macro2::{Ident, Span};
use quote::format_ident;
use rulegen_ast::is_rust_keyword;

pub use error::{CodegenError, CodegenErrorKind};
pub use functions::{CallContext, CustomRuntimeFunction, FunctionRegistry, ResolverField};
pub use resolver::{EndpointConfig, generate_resolver};
pub use rules::{CompiledRuleset, RulesetCompiler};
pub use scope::{Binding, Scope};
pub use testgen::generate_tests;
pub use types::{CompiledExpr, Ownership, RecordField, RecordType, RulesType};

/// The local, `Params` field and builder method for a ruleset
/// name. Keywords become raw identifiers.
pub fn local_ident(name: &str) -> Ident {
    let mut local = rulegen_ast::field_name(name);
    if local.is_empty() || local.starts_with(|c: char| c.is_ascii_digit()) {
        local.insert(0, '_');
    }
    match local.as_str() {
        "self" | "Self" | "crate" | "super" => format_ident!("{local}_"),
        l if is_rust_keyword(l) => Ident::new_raw(l, Span::call_site()),
        l => format_ident!("{l}"),
    }
}

//! Compiles a subset of JMESPath into Rust code that traverses
//! typed data.
//!
//! The data is described by a [`Schema`](rulegen_ast::Schema)
//! whose structures, maps, lists and scalars map onto a data
//! model of plain Rust types (see [`rust_type`]). The generator
//! walks a parsed [`JmesExpr`](rulegen_ast::JmesExpr), inferring
//! the [`TraversedShape`] and [`RustType`] of every
//! sub-expression, and emits `let` statements computing it.
//!
//! Supported: fields, subexpressions, pipes, `@`, comparisons,
//! `&&`, `||`, `!`, boolean, number and string literals,
//! multi-select lists, projections, filter projections, object
//! projections over maps, flattening, and the `length`,
//! `contains` and `keys` functions. Everything else is rejected
//! with [`TraversalErrorKind::Unsupported`].
//!
//! Missing optional members make the traversal evaluate to
//! `None`, except inside projections, where they drop the
//! element instead.

#![warn(missing_docs)]

mod binding;
mod error;
mod expr;
mod functions;
mod generate;
mod naming;
mod shape;
mod ty;


pub use binding::{TraversalBinding, TraversalRoot};
pub use error::{TraversalError, TraversalErrorKind};
pub use expr::GeneratedExpression;
pub use generate::{TraversalGenerator, field_ident};
pub use naming::SafeNamer;
pub use shape::{TraversedShape, classify, rust_type};
pub use ty::RustType;

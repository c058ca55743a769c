use std::{fmt, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use proc_macro2::{Ident, TokenStream};

use crate::{RulesType, stdlib};

/// What a [`CustomRuntimeFunction`] can refer to when emitting
/// a call.
#[derive(Copy, Clone, Debug)]
pub struct CallContext<'a> {
    /// The path to `rulegen-runtime`.
    pub runtime: &'a syn::Path,
    /// The `&mut DiagnosticCollector` in scope.
    pub diagnostics: &'a Ident,
}

/// A field a function adds to the resolver struct.
#[derive(Clone, Debug)]
pub struct ResolverField {
    /// The field's name.
    pub ident: Ident,
    /// The field's type.
    pub ty: TokenStream,
    /// Initializes the field in `new`.
    pub init: TokenStream,
}

/// A function implemented by the runtime and callable from
/// rules.
pub trait CustomRuntimeFunction: fmt::Debug {
    /// The name rules call the function by, e.g.
    /// `aws.partition`.
    fn id(&self) -> &str;

    /// The types of the function's arguments.
    fn args(&self) -> Vec<RulesType>;

    /// The function's result type.
    fn return_type(&self) -> RulesType;

    /// Set when the result is an owned `String`.
    fn returns_owned(&self) -> bool {
        false
    }

    /// Emits a call with already compiled `args`.
    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream;

    /// State the resolver holds for the function. Its field is
    /// passed by reference to the compiled rules under the same
    /// name.
    fn resolver_field(&self, _runtime: &syn::Path) -> Option<ResolverField> {
        None
    }
}

/// The functions available to a ruleset.
///
/// Looking a function up marks it as used. Only used functions
/// contribute state to the generated resolver.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Rc<dyn CustomRuntimeFunction>>,
    used: IndexSet<String>,
}

impl FunctionRegistry {
    /// Creates a registry with no functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard library.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for f in stdlib::functions() {
            registry.register(f);
        }
        registry
    }

    /// Adds a function, replacing any with the same id.
    pub fn register(&mut self, f: Box<dyn CustomRuntimeFunction>) {
        self.functions.insert(f.id().to_owned(), Rc::from(f));
    }

    /// Looks up a function, marking it as used.
    pub fn lookup(&mut self, id: &str) -> Option<Rc<dyn CustomRuntimeFunction>> {
        let f = self.functions.get(id)?;
        self.used.insert(id.to_owned());
        Some(Rc::clone(f))
    }

    /// Reports whether a function has been looked up.
    pub fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    /// The functions looked up so far, in first-use order.
    pub fn used(&self) -> impl Iterator<Item = &dyn CustomRuntimeFunction> {
        self.used
            .iter()
            .filter_map(|id| self.functions.get(id))
            .map(|f| &**f)
    }

    /// Forgets which functions have been used.
    pub fn reset(&mut self) {
        self.used.clear();
    }
}

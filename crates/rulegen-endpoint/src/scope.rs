use std::rc::Rc;

use proc_macro2::Ident;

use crate::RulesType;

/// A local in generated code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// The local's identifier.
    pub ident: Ident,
    /// Its type.
    pub ty: RulesType,
}

/// The names in scope while compiling a rule.
///
/// Scopes are persistent: [`Scope::with_member`] returns a new
/// scope sharing its parent, so sibling rules never see each
/// other's bindings.
#[derive(Clone, Debug, Default)]
pub struct Scope(Option<Rc<ScopeNode>>);

#[derive(Debug)]
struct ScopeNode {
    name: String,
    binding: Binding,
    parent: Scope,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a scope where `name` is bound to `binding`,
    /// shadowing any earlier binding of `name`.
    #[must_use]
    pub fn with_member(&self, name: impl Into<String>, binding: Binding) -> Self {
        Self(Some(Rc::new(ScopeNode {
            name: name.into(),
            binding,
            parent: self.clone(),
        })))
    }

    /// Looks up the innermost binding of `name`.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        let mut node = self.0.as_deref();
        while let Some(n) = node {
            if n.name == name {
                return Some(&n.binding);
            }
            node = n.parent.0.as_deref();
        }
        None
    }

    /// Reports whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

use proc_macro2::Ident;
use quote::format_ident;

/// Hands out unique local identifiers.
///
/// One counter is shared by every prefix, so two names from the
/// same namer never collide. A namer lives for exactly one
/// top-level expression.
#[derive(Debug, Default)]
pub struct SafeNamer {
    next: usize,
}

impl SafeNamer {
    /// Creates a namer that starts at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `_{prefix}_{n}`.
    pub fn name(&mut self, prefix: &str) -> Ident {
        self.next = self.next.wrapping_add(1);
        format_ident!("_{}_{}", prefix, self.next)
    }
}

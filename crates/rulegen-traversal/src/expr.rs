use buggy::{Bug, bug};
use proc_macro2::{Ident, TokenStream};
use quote::{ToTokens, quote};

use crate::{RustType, SafeNamer, TraversalBinding, TraversedShape};

/// The result of compiling an expression.
///
/// `output` holds the statements that must run before `ident`
/// is usable. Transformations consume the expression and return
/// a new one whose output is the old output followed by the new
/// statements.
#[derive(Clone, Debug)]
pub struct GeneratedExpression {
    /// The local holding the value.
    pub ident: Ident,
    /// The value's shape.
    pub shape: TraversedShape,
    /// The value's type.
    pub ty: RustType,
    /// Statements computing the value.
    pub output: TokenStream,
}

impl GeneratedExpression {
    /// Creates an expression.
    pub fn new(ident: Ident, shape: TraversedShape, ty: RustType, output: TokenStream) -> Self {
        Self {
            ident,
            shape,
            ty,
            output,
        }
    }

    /// Refers to a bound value without emitting anything.
    pub fn from_binding(binding: &TraversalBinding) -> Self {
        Self::new(
            binding.ident().clone(),
            binding.shape().clone(),
            binding.ty().clone(),
            TokenStream::new(),
        )
    }

    /// Appends `let #ident = #value;`.
    pub(crate) fn then(self, ident: Ident, ty: RustType, value: TokenStream) -> Self {
        let mut output = self.output;
        output.extend(quote! { let #ident = #value; });
        Self {
            ident,
            shape: self.shape,
            ty,
            output,
        }
    }

    /// Binds the value to a new local wrapped in `Some`.
    pub fn lift_option(self, namer: &mut SafeNamer) -> Self {
        let src = &self.ident;
        let value = quote!(::std::option::Option::Some(#src));
        let ty = RustType::option(self.ty.clone());
        self.then(namer.name("opt"), ty, value)
    }

    /// Copies scalars out from behind references.
    ///
    /// `&bool`, `&i32` and friends become `bool`, `i32`, and so
    /// on. `Option<&T>` becomes `Option<T>`. Everything else is
    /// returned as is.
    pub fn dereference(self, namer: &mut SafeNamer) -> Self {
        let src = &self.ident;
        match &self.ty {
            RustType::Reference(inner) if inner.is_copy() => {
                let ty = (**inner).clone();
                let value = quote!(*#src);
                self.then(namer.name("deref"), ty, value).dereference(namer)
            }
            RustType::Option(inner) => match &**inner {
                RustType::Reference(referent) if referent.is_copy() && is_scalar(referent) => {
                    let ty = RustType::option((**referent).clone());
                    let value = quote!(#src.copied());
                    self.then(namer.name("deref"), ty, value)
                }
                _ => self,
            },
            _ => self,
        }
    }

    /// Converts strings and enums to `&str`, keeping any
    /// `Option`.
    pub fn convert_to_str_ref(self, namer: &mut SafeNamer) -> Result<Self, Bug> {
        let src = &self.ident;
        let expr = match &self.ty {
            ty if *ty == RustType::str_ref() => self,
            RustType::Reference(inner) => match &**inner {
                RustType::String | RustType::Opaque(_) => {
                    let value = quote!(#src.as_str());
                    self.then(namer.name("str"), RustType::str_ref(), value)
                }
                RustType::Reference(_) => {
                    let value = quote!(*#src);
                    let ty = (**inner).clone();
                    self.then(namer.name("deref"), ty, value)
                        .convert_to_str_ref(namer)?
                }
                _ => bug!("converting a non-string reference to `&str`"),
            },
            RustType::Option(inner) => match &**inner {
                ty if *ty == RustType::str_ref() => self,
                RustType::Reference(referent)
                    if matches!(**referent, RustType::String | RustType::Opaque(_)) =>
                {
                    let v = namer.name("v");
                    let value = quote!(#src.map(|#v| #v.as_str()));
                    let ty = RustType::option(RustType::str_ref());
                    self.then(namer.name("str"), ty, value)
                }
                _ => bug!("converting a non-string option to `&str`"),
            },
            _ => bug!("converting a non-string value to `&str`"),
        };
        Ok(expr)
    }

    /// Casts a number to `target`, which is `i64` or `f64`,
    /// keeping any `Option`.
    pub fn convert_to_number_primitive(
        self,
        target: &RustType,
        namer: &mut SafeNamer,
    ) -> Result<Self, Bug> {
        let expr = self.dereference(namer);
        if expr.ty == *target {
            return Ok(expr);
        }
        let src = &expr.ident;
        let target_tokens = target.to_tokens(&TokenStream::new(), None);
        match &expr.ty {
            RustType::Integer(_) | RustType::Float(_) => {
                let value = quote!(#src as #target_tokens);
                Ok(expr.then(namer.name("num"), target.clone(), value))
            }
            RustType::Option(inner) if matches!(**inner, RustType::Integer(_) | RustType::Float(_)) => {
                if **inner == *target {
                    return Ok(expr);
                }
                let v = namer.name("v");
                let value = quote!(#src.map(|#v| #v as #target_tokens));
                let ty = RustType::option(target.clone());
                Ok(expr.then(namer.name("num"), ty, value))
            }
            _ => bug!("converting a non-number to a number primitive"),
        }
    }
}

impl ToTokens for GeneratedExpression {
    /// Emits the statements followed by the identifier, which
    /// makes a block body evaluating to the value.
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.output.to_tokens(tokens);
        self.ident.to_tokens(tokens);
    }
}

fn is_scalar(ty: &RustType) -> bool {
    matches!(ty, RustType::Bool | RustType::Integer(_) | RustType::Float(_))
}
